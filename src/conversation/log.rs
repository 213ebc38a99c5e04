//! 对话日志写入
//!
//! 每次调用写入一条不可变的对话文档。写入失败（网络、限流、ID 冲突）
//! 原样返回给调用方，不重试。

use std::sync::Arc;

use chrono::Local;

use super::model::{ConversationEntry, ConversationRecord};
use crate::cosmos::{CosmosClient, DocumentStore, LogContainer, StoreError, TokenCredential};
use crate::model::config::LogConfig;

/// 对话日志
#[derive(Debug, Clone)]
pub struct ConversationLog {
    container: LogContainer,
}

impl ConversationLog {
    /// 连接 Cosmos DB，确保数据库和容器存在
    pub async fn new(
        url: &str,
        credential: Arc<dyn TokenCredential>,
        database_name: &str,
        container_name: &str,
    ) -> anyhow::Result<Self> {
        let client = CosmosClient::new(url, credential)?;
        Ok(Self::with_store(Arc::new(client), database_name, container_name).await?)
    }

    /// 按配置中的对话数据库 / 容器连接
    pub async fn from_config(
        config: &LogConfig,
        credential: Arc<dyn TokenCredential>,
    ) -> anyhow::Result<Self> {
        let client = CosmosClient::from_config(config, credential)?;
        Ok(Self::with_store(
            Arc::new(client),
            &config.conversation_database,
            &config.conversation_container,
        )
        .await?)
    }

    /// 使用任意文档存储
    pub async fn with_store(
        store: Arc<dyn DocumentStore>,
        database_name: &str,
        container_name: &str,
    ) -> Result<Self, StoreError> {
        let container = LogContainer::open(store, database_name, container_name).await?;
        Ok(Self { container })
    }

    pub fn container(&self) -> &LogContainer {
        &self.container
    }

    /// 记录一轮对话，返回生成的记录 ID
    ///
    /// 存储层的任何错误都直接返回，调用方需要知道记录是否丢失
    pub async fn log_conversation(
        &self,
        session_id: &str,
        entry: ConversationEntry,
    ) -> Result<String, StoreError> {
        let record = ConversationRecord::new(&Local::now(), session_id, entry);
        let record_id = record.id.clone();
        let body = serde_json::to_value(&record)?;

        self.container.create_item(session_id, body).await?;

        tracing::debug!(
            session_id = %session_id,
            record_id = %record_id,
            "对话记录已写入"
        );
        Ok(record_id)
    }
}
