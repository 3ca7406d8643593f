//! Mock 惯性传输
//!
//! 用于无硬件环境的运行与测试。

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use contracts::{rate_period, ContractError, InertialTransport};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// 标准重力加速度 (m/s²)
const GRAVITY: f64 = 9.81;

/// Mock 惯性传输
///
/// 以固定频率生成 7 字段文本记录，设备时间戳为自由运行的微秒计数器。
pub struct MockImuTransport {
    period: Duration,
    next_due: Instant,
    counter_us: u64,
    step_us: u64,
    rng: StdRng,
    /// 每 N 条插入一条损坏记录 (None = 不插入)
    corrupt_every: Option<u64>,
    emitted: u64,
}

impl MockImuTransport {
    /// 创建新的 Mock 传输
    pub fn new(rate_hz: f64) -> Self {
        let period = rate_period(rate_hz);
        Self {
            period,
            next_due: Instant::now(),
            counter_us: 0,
            step_us: period.as_micros() as u64,
            rng: StdRng::seed_from_u64(0x1a2b_3c4d),
            corrupt_every: None,
            emitted: 0,
        }
    }

    /// 固定随机种子
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// 周期性插入损坏记录，用于演练容错路径
    pub fn with_corruption(mut self, every: u64) -> Self {
        self.corrupt_every = (every > 0).then_some(every);
        self
    }

    /// 设备计数器起点 (微秒)
    pub fn with_counter_start(mut self, start_us: u64) -> Self {
        self.counter_us = start_us;
        self
    }

    fn next_record(&mut self) -> String {
        self.emitted += 1;
        let t = self.counter_us as f64 / 1_000_000.0;
        let noise = 0.02;

        if let Some(every) = self.corrupt_every {
            if self.emitted % every == 0 {
                return format!("{} 0.0 0.0", self.counter_us);
            }
        }

        let ax = 0.1 * (t * 1.3).sin() + self.rng.random_range(-noise..noise);
        let ay = 0.1 * (t * 0.7).cos() + self.rng.random_range(-noise..noise);
        let az = GRAVITY + self.rng.random_range(-noise..noise);
        let gx = 0.05 * (t * 2.0).sin();
        let gy = 0.05 * (t * 1.1).cos();
        let gz = self.rng.random_range(-0.005..0.005);

        format!(
            "{} {ax:.5} {ay:.5} {az:.5} {gx:.5} {gy:.5} {gz:.5}",
            self.counter_us
        )
    }
}

impl InertialTransport for MockImuTransport {
    fn name(&self) -> &str {
        "mock-imu"
    }

    fn read_line(&mut self) -> Result<Option<String>, ContractError> {
        let now = Instant::now();
        if self.next_due > now {
            std::thread::sleep(self.next_due - now);
        }
        self.next_due += self.period;

        let line = self.next_record();
        self.counter_us += self.step_us;
        Ok(Some(line))
    }
}

/// 脚本化读取结果
#[derive(Debug, Clone)]
pub enum ScriptedRead {
    /// 一行文本
    Line(String),
    /// 读取超时
    Idle,
    /// 读取失败
    Error(String),
}

impl ScriptedRead {
    pub fn line(line: impl Into<String>) -> Self {
        Self::Line(line.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }
}

/// 按脚本返回读取结果的传输
///
/// 脚本耗尽后表现为持续超时。
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    reads: VecDeque<ScriptedRead>,
}

impl ScriptedTransport {
    pub fn new(reads: impl IntoIterator<Item = ScriptedRead>) -> Self {
        Self {
            reads: reads.into_iter().collect(),
        }
    }

    /// 由文本行构造
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(lines.into_iter().map(|l| ScriptedRead::Line(l.into())))
    }

    /// 剩余脚本条数
    pub fn remaining(&self) -> usize {
        self.reads.len()
    }
}

impl InertialTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted-imu"
    }

    fn read_line(&mut self) -> Result<Option<String>, ContractError> {
        match self.reads.pop_front() {
            Some(ScriptedRead::Line(line)) => Ok(Some(line)),
            Some(ScriptedRead::Idle) => Ok(None),
            Some(ScriptedRead::Error(message)) => {
                Err(ContractError::transport_read("scripted-imu", message))
            }
            None => {
                debug!("scripted transport exhausted");
                std::thread::sleep(Duration::from_millis(1));
                Ok(None)
            }
        }
    }
}
