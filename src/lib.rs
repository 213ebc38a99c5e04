//! 对话记录与遥测记录持久化到 Cosmos DB
//!
//! - [`ConversationLog`]：记录完整对话轮次（审计/分析用），写入失败直接返回错误
//! - [`TelemetryLog`]：记录运行遥测（健康监控用），写入失败只记日志、不影响调用方

pub mod common;
pub mod conversation;
pub mod cosmos;
pub mod http_client;
pub mod model;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;

pub use conversation::{ConversationEntry, ConversationLog, ConversationRecord};
pub use cosmos::{
    CosmosClient, DocumentStore, InMemoryStore, StaticTokenCredential, StoreError,
    TokenCredential,
};
pub use model::config::LogConfig;
pub use telemetry::{TelemetryLog, TelemetryRecord, TelemetryType};
