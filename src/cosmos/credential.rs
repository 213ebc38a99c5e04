//! 访问令牌提供者
//!
//! 认证流程完全交给调用方注入的凭据对象，这里只约定"能为指定 scope 产出有效令牌"

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// 访问令牌
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    /// 过期时间（未知时为 None）
    pub expires_on: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            expires_on: None,
        }
    }

    /// 检查是否已过期
    pub fn is_expired(&self) -> bool {
        self.expires_on.is_some_and(|t| t <= Utc::now())
    }
}

/// 令牌凭据
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn get_token(&self, scopes: &[&str]) -> anyhow::Result<AccessToken>;
}

/// 固定令牌凭据（预先获取的令牌 / 测试）
#[derive(Debug, Clone)]
pub struct StaticTokenCredential {
    token: AccessToken,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }

    pub fn with_expiry(mut self, expires_on: DateTime<Utc>) -> Self {
        self.token.expires_on = Some(expires_on);
        self
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self, _scopes: &[&str]) -> anyhow::Result<AccessToken> {
        if self.token.is_expired() {
            anyhow::bail!("静态令牌已过期");
        }
        Ok(self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_credential_returns_token() {
        let cred = StaticTokenCredential::new("abc");
        let token = cred.get_token(&["https://x/.default"]).await.unwrap();
        assert_eq!(token.token, "abc");
        assert!(!token.is_expired());
    }

    #[tokio::test]
    async fn test_static_credential_expired() {
        let cred = StaticTokenCredential::new("abc")
            .with_expiry(Utc::now() - chrono::Duration::minutes(1));
        assert!(cred.get_token(&[]).await.is_err());
    }
}
