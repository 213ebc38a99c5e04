//! 测试辅助：可注入失败的存储、日志捕获

use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

use crate::cosmos::{DocumentStore, InMemoryStore, ResourceId, StoreError};

/// 写入文档时总是失败的存储，其余操作委托给内存存储
pub(crate) struct FailingStore {
    pub inner: InMemoryStore,
    error: fn() -> StoreError,
}

impl FailingStore {
    pub fn new(error: fn() -> StoreError) -> Self {
        Self {
            inner: InMemoryStore::new(),
            error,
        }
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn list_databases(&self) -> Result<Vec<ResourceId>, StoreError> {
        self.inner.list_databases().await
    }

    async fn create_database(&self, name: &str) -> Result<(), StoreError> {
        self.inner.create_database(name).await
    }

    async fn list_containers(&self, database: &str) -> Result<Vec<ResourceId>, StoreError> {
        self.inner.list_containers(database).await
    }

    async fn create_container(
        &self,
        database: &str,
        container: &str,
        partition_key_path: &str,
    ) -> Result<(), StoreError> {
        self.inner
            .create_container(database, container, partition_key_path)
            .await
    }

    async fn create_item(
        &self,
        _database: &str,
        _container: &str,
        _partition_key: &str,
        _body: Value,
    ) -> Result<(), StoreError> {
        Err((self.error)())
    }
}

/// 捕获当前线程的 tracing 输出
#[derive(Clone, Default)]
pub(crate) struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

pub(crate) struct CaptureWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter(self.0.clone())
    }
}

/// 安装线程级 subscriber，guard 存活期间的日志写入返回的 [`LogCapture`]
pub(crate) fn capture_logs() -> (LogCapture, DefaultGuard) {
    let capture = LogCapture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (capture, guard)
}
