//! 遥测写入
//!
//! 遥测是尽力而为的：[`TelemetryLog::record_telemetry`] 捕获构建和写入过程中的
//! 所有错误，记录 error 日志（错误信息、错误链、调用栈）后丢弃，绝不影响调用方流程。
//! 需要感知失败时使用 [`TelemetryLog::try_record_telemetry`]。

use std::backtrace::Backtrace;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;

use super::model::{TelemetryRecord, TelemetryType};
use crate::cosmos::{CosmosClient, DocumentStore, LogContainer, StoreError, TokenCredential};
use crate::model::config::LogConfig;

/// 遥测日志
#[derive(Debug, Clone)]
pub struct TelemetryLog {
    container: LogContainer,
}

impl TelemetryLog {
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

    /// 按配置中的遥测数据库 / 容器连接
    pub async fn from_config(
        config: &LogConfig,
        credential: Arc<dyn TokenCredential>,
    ) -> anyhow::Result<Self> {
        let client = CosmosClient::from_config(config, credential)?;
        Ok(Self::with_store(
            Arc::new(client),
            &config.telemetry_database,
            &config.telemetry_container,
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

    /// 记录一条遥测，失败只记日志
    ///
    /// `chat_start` 为被测操作开始时刻，`response_time` 取其到现在的秒数
    pub async fn record_telemetry(
        &self,
        telemetry_type: TelemetryType,
        session_id: &str,
        chat_start: Instant,
        error_message: &str,
    ) {
        let result = self
            .try_record_telemetry(telemetry_type, session_id, chat_start, error_message)
            .await;

        if let Err(e) = result {
            let report = anyhow::Error::from(e);
            tracing::error!(
                session_id = %session_id,
                telemetry_type = %telemetry_type,
                error_message = %error_message,
                "记录遥测失败: {:#}",
                report
            );
            tracing::error!(
                "遥测错误详情: {:?}\n调用栈:\n{}",
                report,
                Backtrace::force_capture()
            );
        }
    }

    /// 记录一条遥测，返回存储层错误
    pub async fn try_record_telemetry(
        &self,
        telemetry_type: TelemetryType,
        session_id: &str,
        chat_start: Instant,
        error_message: &str,
    ) -> Result<(), StoreError> {
        let now = Local::now();
        let response_time = chat_start.elapsed().as_secs_f64();
        let record =
            TelemetryRecord::new(&now, telemetry_type, session_id, response_time, error_message);
        let body = serde_json::to_value(&record)?;

        self.container.create_item(session_id, body).await?;

        tracing::debug!(
            session_id = %session_id,
            telemetry_type = %telemetry_type,
            response_time = response_time,
            "遥测记录已写入"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosmos::InMemoryStore;
    use crate::test_support::{FailingStore, capture_logs};
    use std::time::Duration;

    async fn open_log(store: Arc<InMemoryStore>) -> TelemetryLog {
        TelemetryLog::with_store(store, "statusdb", "telemetrylog")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_record_telemetry_persists_label_and_elapsed() {
        let store = Arc::new(InMemoryStore::new());
        let log = open_log(store.clone()).await;

        let start = Instant::now()
            .checked_sub(Duration::from_millis(1500))
            .unwrap();
        log.record_telemetry(TelemetryType::Chat, "sess-2", start, "")
            .await;

        let items = store.items("statusdb", "telemetrylog");
        assert_eq!(items.len(), 1);
        let doc = &items[0];
        assert_eq!(doc["telemetry_type"], "Chat Entry");
        assert_eq!(doc["sessionID"], "sess-2");
        assert_eq!(doc["error"], "");
        assert!(doc["id"].as_str().unwrap().ends_with("-sess-2"));

        let response_time = doc["response_time"].as_f64().unwrap();
        assert!(response_time >= 1.5, "response_time = {}", response_time);
        assert!(response_time < 60.0, "response_time = {}", response_time);
    }

    #[tokio::test]
    async fn test_record_telemetry_error_type_uses_label() {
        let store = Arc::new(InMemoryStore::new());
        let log = open_log(store.clone()).await;

        log.record_telemetry(TelemetryType::ChatError, "sess-3", Instant::now(), "timeout")
            .await;

        let doc = &store.items("statusdb", "telemetrylog")[0];
        assert_eq!(doc["telemetry_type"], "Chat Entry Error");
        assert_ne!(doc["telemetry_type"], "ChatError");
        assert_eq!(doc["error"], "timeout");
    }

    #[tokio::test]
    async fn test_record_telemetry_swallows_store_error() {
        let store = Arc::new(FailingStore::new(|| StoreError::Service {
            status: 503,
            message: "connection refused".to_string(),
        }));
        let log = TelemetryLog::with_store(store.clone(), "statusdb", "telemetrylog")
            .await
            .unwrap();

        let (logs, _guard) = capture_logs();
        log.record_telemetry(TelemetryType::ChatError, "sess-2", Instant::now(), "timeout")
            .await;

        let output = logs.contents();
        let error_events = output.lines().filter(|l| l.contains(" ERROR ")).count();
        assert!(error_events >= 2, "{}", output);
        assert!(output.contains("记录遥测失败"), "{}", output);
        let (_, detail) = output.split_once("遥测错误详情").unwrap();
        assert!(detail.contains("connection refused"), "{}", output);
        assert!(detail.contains("调用栈"), "{}", output);
        assert!(output.contains("connection refused"), "{}", output);
        assert!(output.contains("timeout"), "{}", output);
        assert!(store.inner.items("statusdb", "telemetrylog").is_empty());
    }

    #[tokio::test]
    async fn test_try_record_telemetry_returns_error() {
        let store = Arc::new(FailingStore::new(|| StoreError::Throttled {
            retry_after_ms: Some(50),
        }));
        let log = TelemetryLog::with_store(store, "statusdb", "telemetrylog")
            .await
            .unwrap();

        let err = log
            .try_record_telemetry(TelemetryType::Chat, "sess-4", Instant::now(), "")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Throttled {
                retry_after_ms: Some(50)
            }
        ));
    }

    #[tokio::test]
    async fn test_construction_creates_container_with_partition_key() {
        let store = Arc::new(InMemoryStore::new());
        open_log(store.clone()).await;
        open_log(store.clone()).await;

        assert_eq!(store.database_creates(), 1);
        assert_eq!(store.container_creates(), 1);
        assert_eq!(
            store.partition_key_path("statusdb", "telemetrylog").as_deref(),
            Some("/sessionID")
        );
    }
}
