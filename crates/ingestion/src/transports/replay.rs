//! 录制文件回放传输
//!
//! 按记录中的设备时间戳节奏回放文本日志。循环回放时时间戳被平移，
//! 使设备计数器在文件重新开始后仍然连续递增。

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use contracts::{ContractError, InertialTransport};
use tracing::{debug, info};

use crate::error::{IngestionError, Result};

/// 回放传输
pub struct ReplayTransport {
    name: String,
    path: PathBuf,
    reader: BufReader<File>,
    looping: bool,
    idle_wait: Duration,
    finished: bool,
    pacing: Option<Pacing>,
    /// 当前圈的时间戳平移量 (微秒)
    offset_us: f64,
    /// 本圈首条记录的原始时间戳
    first_raw_us: Option<f64>,
    /// 上一条记录 (平移后) 的时间戳与间隔
    last_us: Option<f64>,
    last_interval_us: f64,
}

/// 回放节奏基准
#[derive(Debug, Clone, Copy)]
struct Pacing {
    started: Instant,
    base_us: f64,
}

impl ReplayTransport {
    /// 打开录制文件
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| IngestionError::transport_open(path.display().to_string(), e.to_string()))?;

        info!(path = %path.display(), "opened inertial replay file");

        Ok(Self {
            name: format!("replay:{}", path.display()),
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            looping: false,
            idle_wait: Duration::from_millis(10),
            finished: false,
            pacing: None,
            offset_us: 0.0,
            first_raw_us: None,
            last_us: None,
            last_interval_us: 0.0,
        })
    }

    /// 文件结束后从头开始
    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// 文件结束后每次读取的等待时间
    pub fn with_idle_wait(mut self, wait: Duration) -> Self {
        self.idle_wait = wait;
        self
    }

    /// 是否已读完 (非循环模式)
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn rewind(&mut self) -> std::result::Result<(), ContractError> {
        self.reader.seek(SeekFrom::Start(0))?;
        if let (Some(last), Some(first)) = (self.last_us, self.first_raw_us) {
            // 下一圈从上一条记录之后一个采样间隔开始
            self.offset_us = last + self.last_interval_us - first;
        }
        self.first_raw_us = None;
        debug!(path = %self.path.display(), offset_us = self.offset_us, "replay restarted");
        Ok(())
    }

    /// 平移时间戳并按节奏等待
    fn shift_and_pace(&mut self, line: &str) -> String {
        let mut fields = line.splitn(2, char::is_whitespace);
        let head = fields.next().unwrap_or_default();
        let rest = fields.next().unwrap_or_default();

        let Ok(raw_us) = head.parse::<f64>() else {
            return line.to_string();
        };
        if !raw_us.is_finite() {
            return line.to_string();
        }

        self.first_raw_us.get_or_insert(raw_us);
        let shifted = raw_us + self.offset_us;
        if let Some(last) = self.last_us {
            if shifted > last {
                self.last_interval_us = shifted - last;
            }
        }
        self.last_us = Some(shifted);

        let pacing = *self.pacing.get_or_insert(Pacing {
            started: Instant::now(),
            base_us: shifted,
        });
        let due = Duration::from_secs_f64(((shifted - pacing.base_us) / 1_000_000.0).max(0.0));
        let elapsed = pacing.started.elapsed();
        if due > elapsed {
            std::thread::sleep(due - elapsed);
        }

        if self.offset_us == 0.0 {
            line.to_string()
        } else {
            format!("{shifted} {rest}")
        }
    }
}

impl InertialTransport for ReplayTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_line(&mut self) -> std::result::Result<Option<String>, ContractError> {
        if self.finished {
            std::thread::sleep(self.idle_wait);
            return Ok(None);
        }

        let mut buf = String::new();
        let n = self
            .reader
            .read_line(&mut buf)
            .map_err(|e| ContractError::transport_read(&self.name, e.to_string()))?;

        if n == 0 {
            if self.looping && self.last_us.is_some() {
                self.rewind()?;
            } else {
                info!(path = %self.path.display(), "replay file exhausted");
                self.finished = true;
            }
            return Ok(None);
        }

        let line = buf.trim();
        Ok(Some(self.shift_and_pace(line)))
    }
}
