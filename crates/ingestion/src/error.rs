//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 字段数量错误
    #[error("malformed record: expected {expected} fields, got {actual}")]
    FieldCount {
        /// 期望字段数
        expected: usize,
        /// 实际字段数
        actual: usize,
    },

    /// 字段不是有限数值
    #[error("malformed record: field {index} is not a finite number: '{value}'")]
    NonNumeric {
        /// 字段下标 (0 = 时间戳)
        index: usize,
        /// 原始文本
        value: String,
    },

    /// 传输无法打开 (启动时致命)
    #[error("failed to open transport '{source_name}': {message}")]
    TransportOpen {
        /// 传输名称
        source_name: String,
        /// 错误消息
        message: String,
    },
}

impl IngestionError {
    /// 创建传输打开错误
    pub fn transport_open(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TransportOpen {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
