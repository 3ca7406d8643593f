//! Inertial record decoding
//!
//! A record is one text line of exactly seven whitespace-separated
//! numbers: the device timestamp in microseconds followed by
//! `ax ay az gx gy gz`.

use crate::error::{IngestionError, Result};

/// Fields per record (timestamp + six channels)
pub const RECORD_FIELDS: usize = 7;

/// Decoded record, still on the device clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawImuRecord {
    /// Device free-running counter (microseconds)
    pub device_us: f64,

    /// `[ax, ay, az, gx, gy, gz]`
    pub channels: [f64; 6],
}

/// Decode one record line
///
/// # Errors
/// `FieldCount` when the line does not split into exactly seven fields,
/// `NonNumeric` when a field does not parse as a finite `f64`.
pub fn parse_record(line: &str) -> Result<RawImuRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != RECORD_FIELDS {
        return Err(IngestionError::FieldCount {
            expected: RECORD_FIELDS,
            actual: fields.len(),
        });
    }

    let mut values = [0.0f64; RECORD_FIELDS];
    for (index, (slot, field)) in values.iter_mut().zip(&fields).enumerate() {
        *slot = match field.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                return Err(IngestionError::NonNumeric {
                    index,
                    value: (*field).to_string(),
                })
            }
        };
    }

    let [device_us, ax, ay, az, gx, gy, gz] = values;
    Ok(RawImuRecord {
        device_us,
        channels: [ax, ay, az, gx, gy, gz],
    })
}
