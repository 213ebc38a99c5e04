//! 文档存储抽象
//!
//! 对话日志与遥测日志只依赖这一组操作，真实实现为 [`CosmosClient`](super::CosmosClient)，
//! 测试与本地开发使用 [`InMemoryStore`](super::InMemoryStore)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::error::StoreError;

/// 数据库或容器描述（只关心 id）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceId {
    pub id: String,
}

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// 分区文档存储
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 列出所有数据库
    async fn list_databases(&self) -> Result<Vec<ResourceId>, StoreError>;

    /// 创建数据库
    async fn create_database(&self, name: &str) -> Result<(), StoreError>;

    /// 列出数据库下的所有容器
    async fn list_containers(&self, database: &str) -> Result<Vec<ResourceId>, StoreError>;

    /// 创建容器，`partition_key_path` 形如 `/sessionID`
    async fn create_container(
        &self,
        database: &str,
        container: &str,
        partition_key_path: &str,
    ) -> Result<(), StoreError>;

    /// 写入一条新文档
    ///
    /// `body` 必须包含与容器分区键路径对应的字段，且值等于 `partition_key`
    async fn create_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &str,
        body: Value,
    ) -> Result<(), StoreError>;
}
