//! 进程内文档存储
//!
//! 语义与 Cosmos DB 保持一致的部分：
//! - 重复创建数据库 / 容器 / 同 ID 文档返回 Conflict
//! - 数据库或容器不存在返回 NotFound
//! - 文档缺少分区键字段或值不一致返回 BadRequest

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use super::error::StoreError;
use super::store::{DocumentStore, ResourceId};

#[derive(Debug, Default)]
struct ContainerState {
    partition_key_path: String,
    /// 按写入顺序保存
    items: Vec<Value>,
}

#[derive(Debug, Default)]
struct DatabaseState {
    containers: HashMap<String, ContainerState>,
}

/// 内存存储
#[derive(Debug, Default)]
pub struct InMemoryStore {
    databases: RwLock<HashMap<String, DatabaseState>>,
    database_creates: AtomicUsize,
    container_creates: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 成功创建数据库的次数
    pub fn database_creates(&self) -> usize {
        self.database_creates.load(Ordering::Relaxed)
    }

    /// 成功创建容器的次数
    pub fn container_creates(&self) -> usize {
        self.container_creates.load(Ordering::Relaxed)
    }

    /// 容器声明的分区键路径
    pub fn partition_key_path(&self, database: &str, container: &str) -> Option<String> {
        self.databases
            .read()
            .get(database)?
            .containers
            .get(container)
            .map(|c| c.partition_key_path.clone())
    }

    /// 容器内全部文档（按写入顺序）
    pub fn items(&self, database: &str, container: &str) -> Vec<Value> {
        self.databases
            .read()
            .get(database)
            .and_then(|db| db.containers.get(container))
            .map(|c| c.items.clone())
            .unwrap_or_default()
    }

    /// 按 id 查找文档
    pub fn item(&self, database: &str, container: &str, id: &str) -> Option<Value> {
        self.items(database, container)
            .into_iter()
            .find(|item| item.get("id").and_then(Value::as_str) == Some(id))
    }
}

/// 读取 `/a/b` 形式路径指向的字段
fn field_at_path<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    path.trim_start_matches('/')
        .split('/')
        .try_fold(body, |value, segment| value.get(segment))
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list_databases(&self) -> Result<Vec<ResourceId>, StoreError> {
        let mut ids: Vec<ResourceId> = self
            .databases
            .read()
            .keys()
            .map(|id| ResourceId::new(id.clone()))
            .collect();
        ids.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(ids)
    }

    async fn create_database(&self, name: &str) -> Result<(), StoreError> {
        let mut databases = self.databases.write();
        if databases.contains_key(name) {
            return Err(StoreError::Conflict(format!("数据库 {} 已存在", name)));
        }
        databases.insert(name.to_string(), DatabaseState::default());
        self.database_creates.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn list_containers(&self, database: &str) -> Result<Vec<ResourceId>, StoreError> {
        let databases = self.databases.read();
        let db = databases
            .get(database)
            .ok_or_else(|| StoreError::NotFound(format!("数据库 {} 不存在", database)))?;
        let mut ids: Vec<ResourceId> = db
            .containers
            .keys()
            .map(|id| ResourceId::new(id.clone()))
            .collect();
        ids.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(ids)
    }

    async fn create_container(
        &self,
        database: &str,
        container: &str,
        partition_key_path: &str,
    ) -> Result<(), StoreError> {
        let mut databases = self.databases.write();
        let db = databases
            .get_mut(database)
            .ok_or_else(|| StoreError::NotFound(format!("数据库 {} 不存在", database)))?;
        if db.containers.contains_key(container) {
            return Err(StoreError::Conflict(format!("容器 {} 已存在", container)));
        }
        db.containers.insert(
            container.to_string(),
            ContainerState {
                partition_key_path: partition_key_path.to_string(),
                items: Vec::new(),
            },
        );
        self.container_creates.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn create_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &str,
        body: Value,
    ) -> Result<(), StoreError> {
        let mut databases = self.databases.write();
        let state = databases
            .get_mut(database)
            .and_then(|db| db.containers.get_mut(container))
            .ok_or_else(|| StoreError::NotFound(format!("容器 {}/{} 不存在", database, container)))?;

        let id = body
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::BadRequest("文档缺少字符串 id".to_string()))?;

        match field_at_path(&body, &state.partition_key_path).and_then(Value::as_str) {
            Some(value) if value == partition_key => {}
            Some(value) => {
                return Err(StoreError::BadRequest(format!(
                    "分区键不一致: 文档为 {}，请求为 {}",
                    value, partition_key
                )));
            }
            None => {
                return Err(StoreError::BadRequest(format!(
                    "文档缺少分区键字段 {}",
                    state.partition_key_path
                )));
            }
        }

        let duplicate = state
            .items
            .iter()
            .any(|item| item.get("id").and_then(Value::as_str) == Some(id));
        if duplicate {
            return Err(StoreError::Conflict(format!("文档 {} 已存在", id)));
        }

        state.items.push(body);
        Ok(())
    }
}
