//! Serial inertial transport

use std::io::Read;
use std::time::Duration;

use contracts::{ContractError, InertialTransport};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::info;

use crate::error::{IngestionError, Result};

/// Upper bound on an unterminated line before it is dropped
const MAX_LINE_BYTES: usize = 4096;

/// Splits a byte stream into lines
///
/// Partial lines stay buffered across reads. Bytes are decoded lossily
/// and surrounding whitespace (including `\r`) is trimmed.
#[derive(Debug, Default)]
pub struct LineAssembler {
    pending: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw bytes
    pub fn push(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Take the next complete line, if any
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.pending.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=pos).collect();
        Some(String::from_utf8_lossy(&line).trim().to_string())
    }

    /// Bytes waiting for a terminator
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop the unterminated tail
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Serial transport for UART inertial sensors (8N1, no flow control)
pub struct SerialTransport {
    name: String,
    port: Box<dyn SerialPort>,
    lines: LineAssembler,
    chunk: [u8; 256],
}

impl SerialTransport {
    /// Open a serial port
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyUSB0", "COM3")
    /// * `baud_rate` - Baud rate (e.g., 115200)
    /// * `timeout` - Blocking read timeout; a timeout yields "no record"
    pub fn open(path: &str, baud_rate: u32, timeout: Duration) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(|e| IngestionError::transport_open(path, e.to_string()))?;

        info!(port = %path, baud_rate, "opened inertial serial port");

        Ok(Self {
            name: path.to_string(),
            port,
            lines: LineAssembler::new(),
            chunk: [0u8; 256],
        })
    }
}

impl InertialTransport for SerialTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_line(&mut self) -> std::result::Result<Option<String>, ContractError> {
        loop {
            if let Some(line) = self.lines.next_line() {
                return Ok(Some(line));
            }

            if self.lines.pending_len() > MAX_LINE_BYTES {
                let dropped = self.lines.pending_len();
                self.lines.clear();
                return Err(ContractError::transport_read(
                    &self.name,
                    format!("dropped {dropped} bytes without a line terminator"),
                ));
            }

            match self.port.read(&mut self.chunk) {
                Ok(0) => return Ok(None),
                Ok(n) => self.lines.push(&self.chunk[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => return Ok(None),
                Err(e) => return Err(ContractError::transport_read(&self.name, e.to_string())),
            }
        }
    }
}
