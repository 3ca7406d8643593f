//! Sync Engine 错误类型
//!
//! 每种错误只影响单次帧循环迭代，循环本身不会因此终止。

use contracts::ContractError;
use thiserror::Error;

/// 帧循环单次迭代错误
#[derive(Debug, Error)]
pub enum SyncError {
    /// 相机本次未返回帧 (瞬时)
    #[error("camera returned no frame")]
    NoFrame,

    /// 相机读取失败 (瞬时)
    #[error("camera read failed: {0}")]
    Camera(#[source] ContractError),

    /// 深度推理失败或 panic
    #[error("depth inference failed: {0}")]
    Inference(String),

    /// 深度图尺寸与模型输入不一致
    #[error("depth map shape mismatch: expected {}x{}, got {}x{}", expected.0, expected.1, actual.0, actual.1)]
    ShapeMismatch {
        /// 模型输入尺寸
        expected: (u32, u32),
        /// 实际输出尺寸
        actual: (u32, u32),
    },

    /// 帧编码失败
    #[error("frame encoding failed: {0}")]
    Encoding(#[source] ContractError),

    /// 其他契约错误
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl SyncError {
    /// 创建推理错误
    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// 是否属于"跳过"类 (无帧可处理)，而非失败
    pub fn is_skip(&self) -> bool {
        matches!(self, Self::NoFrame | Self::Camera(_))
    }
}

/// Sync Engine Result 类型别名
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skip_classification() {
        assert!(SyncError::NoFrame.is_skip());
        assert!(SyncError::Camera(ContractError::transport_read("cam", "eio")).is_skip());
        assert!(!SyncError::inference("oom").is_skip());
    }

    #[test]
    fn test_shape_mismatch_message() {
        let err = SyncError::ShapeMismatch {
            expected: (518, 518),
            actual: (256, 256),
        };
        assert_eq!(
            err.to_string(),
            "depth map shape mismatch: expected 518x518, got 256x256"
        );
    }
}
