//! 日志容器：建立连接时确保数据库和容器存在
//!
//! 检查方式是列出全部数据库 / 容器并按 id 比对，适用于数量很少的场景。
//! 检查与创建之间存在竞态，创建时返回 Conflict 视为已存在。

use std::sync::Arc;

use serde_json::Value;

use super::error::StoreError;
use super::store::DocumentStore;

/// 日志容器的分区键路径
pub const PARTITION_KEY_PATH: &str = "/sessionID";

/// 确保数据库存在，返回是否新建
pub async fn ensure_database(store: &dyn DocumentStore, name: &str) -> Result<bool, StoreError> {
    let exists = store
        .list_databases()
        .await?
        .iter()
        .any(|db| db.id == name);
    if exists {
        tracing::debug!(database = %name, "数据库已存在");
        return Ok(false);
    }

    match store.create_database(name).await {
        Ok(()) => {
            tracing::info!(database = %name, "已创建数据库");
            Ok(true)
        }
        Err(e) if e.is_conflict() => {
            tracing::debug!(database = %name, "数据库已由其他客户端创建");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// 确保容器存在（分区键 `partition_key_path`），返回是否新建
pub async fn ensure_container(
    store: &dyn DocumentStore,
    database: &str,
    container: &str,
    partition_key_path: &str,
) -> Result<bool, StoreError> {
    let exists = store
        .list_containers(database)
        .await?
        .iter()
        .any(|c| c.id == container);
    if exists {
        tracing::debug!(database = %database, container = %container, "容器已存在");
        return Ok(false);
    }

    match store
        .create_container(database, container, partition_key_path)
        .await
    {
        Ok(()) => {
            tracing::info!(
                database = %database,
                container = %container,
                partition_key = %partition_key_path,
                "已创建容器"
            );
            Ok(true)
        }
        Err(e) if e.is_conflict() => Ok(false),
        Err(e) => Err(e),
    }
}

/// 已就绪的日志容器句柄
#[derive(Clone)]
pub struct LogContainer {
    store: Arc<dyn DocumentStore>,
    database: String,
    container: String,
}

impl LogContainer {
    /// 打开日志容器，必要时创建数据库和容器
    pub async fn open(
        store: Arc<dyn DocumentStore>,
        database: impl Into<String>,
        container: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let database = database.into();
        let container = container.into();

        ensure_database(store.as_ref(), &database).await?;
        ensure_container(store.as_ref(), &database, &container, PARTITION_KEY_PATH).await?;

        Ok(Self {
            store,
            database,
            container,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// 写入一条新文档，`session_id` 即分区键
    pub async fn create_item(&self, session_id: &str, body: Value) -> Result<(), StoreError> {
        self.store
            .create_item(&self.database, &self.container, session_id, body)
            .await
    }
}

impl std::fmt::Debug for LogContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogContainer")
            .field("database", &self.database)
            .field("container", &self.container)
            .finish()
    }
}
