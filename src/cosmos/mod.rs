//! 文档存储模块
//!
//! 提供存储抽象、Cosmos DB REST 实现、内存实现和访问令牌凭据

pub mod client;
pub mod container;
pub mod credential;
pub mod error;
pub mod memory;
pub mod store;

pub use client::CosmosClient;
pub use container::{LogContainer, PARTITION_KEY_PATH};
pub use credential::{AccessToken, StaticTokenCredential, TokenCredential};
pub use error::StoreError;
pub use memory::InMemoryStore;
pub use store::{DocumentStore, ResourceId};
