//! 存储层错误类型

use thiserror::Error;

/// 文档存储操作失败
#[derive(Debug, Error)]
pub enum StoreError {
    /// 同名资源或同 ID 文档已存在（HTTP 409）
    #[error("资源已存在: {0}")]
    Conflict(String),

    /// 数据库 / 容器不存在（HTTP 404）
    #[error("资源不存在: {0}")]
    NotFound(String),

    /// 请求被限流（HTTP 429）
    #[error("请求被限流，建议 {retry_after_ms:?} ms 后重试")]
    Throttled { retry_after_ms: Option<u64> },

    /// 请求体不合法，例如缺少分区键字段（HTTP 400）
    #[error("请求无效: {0}")]
    BadRequest(String),

    /// 其他服务端错误
    #[error("Cosmos DB 返回 HTTP {status}: {message}")]
    Service { status: u16, message: String },

    /// 获取访问令牌失败
    #[error("获取访问令牌失败: {0}")]
    Credential(String),

    /// 网络 / 传输层错误
    #[error("请求发送失败: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// 根据 HTTP 状态码归类服务端错误
    pub fn from_status(status: u16, message: String, retry_after_ms: Option<u64>) -> Self {
        match status {
            400 => Self::BadRequest(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            429 => Self::Throttled { retry_after_ms },
            _ => Self::Service { status, message },
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classification() {
        assert!(StoreError::from_status(409, "dup".into(), None).is_conflict());
        assert!(matches!(
            StoreError::from_status(404, "missing".into(), None),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            StoreError::from_status(429, String::new(), Some(120)),
            StoreError::Throttled {
                retry_after_ms: Some(120)
            }
        ));
        assert!(matches!(
            StoreError::from_status(503, "busy".into(), None),
            StoreError::Service { status: 503, .. }
        ));
    }

    #[test]
    fn test_display_contains_message() {
        let err = StoreError::from_status(500, "internal".into(), None);
        assert!(err.to_string().contains("internal"));
        assert!(err.to_string().contains("500"));
    }
}
