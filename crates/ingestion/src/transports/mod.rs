//! 惯性传输实现
//!
//! - `serial`: 串口，逐行读取
//! - `replay`: 录制文件回放
//! - `mock`: 合成数据与脚本化读取 (测试用)

mod mock;
mod replay;
mod serial;

pub use mock::{MockImuTransport, ScriptedRead, ScriptedTransport};
pub use replay::ReplayTransport;
pub use serial::{LineAssembler, SerialTransport};

use contracts::{ImuConfig, ImuSourceKind, InertialTransport};

use crate::error::{IngestionError, Result};

/// 根据配置打开惯性传输
///
/// 设备无法打开时返回 `TransportOpen` (启动期致命错误)。
pub fn open_transport(config: &ImuConfig) -> Result<Box<dyn InertialTransport>> {
    match config.source {
        ImuSourceKind::Serial => Ok(Box::new(SerialTransport::open(
            &config.port,
            config.baud_rate,
            config.read_timeout(),
        )?)),
        ImuSourceKind::Replay => {
            let path = config.replay_path.as_deref().ok_or_else(|| {
                IngestionError::transport_open("replay", "no replay_path configured")
            })?;
            Ok(Box::new(
                ReplayTransport::open(path)?
                    .with_loop(config.replay_loop)
                    .with_idle_wait(config.read_timeout()),
            ))
        }
        ImuSourceKind::Mock => Ok(Box::new(MockImuTransport::new(config.mock_rate_hz))),
    }
}
