//! Query 错误类型

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use contracts::ContractError;
use thiserror::Error;

/// 查询错误
#[derive(Debug, Error)]
pub enum QueryError {
    /// 尚未发布任何状态
    #[error("{0} not yet available")]
    Unavailable(&'static str),

    /// 响应编码失败
    #[error(transparent)]
    Encoding(#[from] ContractError),

    /// 编码任务异常退出
    #[error("encoding task failed: {0}")]
    Task(String),
}

impl QueryError {
    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Encoding(_) | Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for QueryError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}

/// Query Result 类型别名
pub type Result<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            QueryError::Unavailable("frame").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            QueryError::Encoding(ContractError::encoding("png", "boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_unavailable_message() {
        assert_eq!(
            QueryError::Unavailable("distance map").to_string(),
            "distance map not yet available"
        );
    }
}
