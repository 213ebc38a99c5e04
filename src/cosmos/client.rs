//! Cosmos DB REST 客户端
//!
//! 只实现日志写入需要的几个资源操作：
//! - 列出 / 创建数据库
//! - 列出 / 创建容器
//! - 创建文档
//!
//! 认证使用 AAD 令牌（`type=aad&ver=1.0&sig=<token>`），一致性级别固定为 Session。

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::credential::TokenCredential;
use super::error::StoreError;
use super::store::{DocumentStore, ResourceId};
use crate::http_client::build_client;
use crate::model::config::LogConfig;

/// REST API 版本
const API_VERSION: &str = "2018-12-31";

const HEADER_DATE: &str = "x-ms-date";
const HEADER_VERSION: &str = "x-ms-version";
const HEADER_CONSISTENCY: &str = "x-ms-consistency-level";
const HEADER_SESSION_TOKEN: &str = "x-ms-session-token";
const HEADER_CONTINUATION: &str = "x-ms-continuation";
const HEADER_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";
const HEADER_RETRY_AFTER: &str = "x-ms-retry-after-ms";

/// `GET /dbs` 响应
#[derive(Debug, Deserialize)]
struct DatabaseFeed {
    #[serde(rename = "Databases", default)]
    databases: Vec<ResourceId>,
}

/// `GET /dbs/{db}/colls` 响应
#[derive(Debug, Deserialize)]
struct ContainerFeed {
    #[serde(rename = "DocumentCollections", default)]
    containers: Vec<ResourceId>,
}

/// 服务端错误响应体
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Cosmos DB REST 客户端
pub struct CosmosClient {
    http: Client,
    endpoint: Url,
    scope: String,
    credential: Arc<dyn TokenCredential>,
    /// 每个容器最近一次返回的 session token（Session 一致性：读己之写）
    session_tokens: Mutex<HashMap<String, String>>,
}

impl CosmosClient {
    /// 使用默认 HTTP Client 创建
    ///
    /// 不设置请求超时，存储端无响应时调用会一直等待；需要超时请用 [`Self::from_config`]
    pub fn new(url: &str, credential: Arc<dyn TokenCredential>) -> anyhow::Result<Self> {
        let http = build_client(None, None)?;
        Self::with_http_client(url, credential, http)
    }

    /// 按配置创建（代理、请求超时）
    pub fn from_config(
        config: &LogConfig,
        credential: Arc<dyn TokenCredential>,
    ) -> anyhow::Result<Self> {
        let http = build_client(config.proxy_url.as_deref(), config.request_timeout())?;
        Self::with_http_client(&config.cosmos_url, credential, http)
    }

    /// 使用外部构建的 HTTP Client 创建（代理、超时等由调用方决定）
    pub fn with_http_client(
        url: &str,
        credential: Arc<dyn TokenCredential>,
        http: Client,
    ) -> anyhow::Result<Self> {
        let endpoint =
            Url::parse(url).with_context(|| format!("无效的 Cosmos DB 地址: {}", url))?;
        let scope = scope_for(&endpoint);
        Ok(Self {
            http,
            endpoint,
            scope,
            credential,
            session_tokens: Mutex::new(HashMap::new()),
        })
    }

    /// 账户地址
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// 构建带认证和公共头的请求
    async fn request(
        &self,
        method: Method,
        path: &str,
        session_key: Option<&str>,
    ) -> Result<RequestBuilder, StoreError> {
        let token = self
            .credential
            .get_token(&[self.scope.as_str()])
            .await
            .map_err(|e| StoreError::Credential(format!("{:#}", e)))?;

        let url = self
            .endpoint
            .join(path)
            .map_err(|e| StoreError::BadRequest(format!("无效的资源路径 {}: {}", path, e)))?;

        let mut builder = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, auth_header(&token.token))
            .header(HEADER_DATE, rfc1123_now())
            .header(HEADER_VERSION, API_VERSION)
            .header(HEADER_CONSISTENCY, "Session");

        if let Some(key) = session_key
            && let Some(session) = self.session_tokens.lock().get(key)
        {
            builder = builder.header(HEADER_SESSION_TOKEN, session.clone());
        }

        Ok(builder)
    }

    /// 发送请求，记录 session token，并把非 2xx 响应转换为 [`StoreError`]
    async fn execute(
        &self,
        builder: RequestBuilder,
        session_key: Option<&str>,
    ) -> Result<Response, StoreError> {
        let resp = builder.send().await?;

        if let Some(key) = session_key
            && let Some(session) = header_str(&resp, HEADER_SESSION_TOKEN)
        {
            self.session_tokens
                .lock()
                .insert(key.to_string(), session.to_string());
        }

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status().as_u16();
        let retry_after_ms = header_str(&resp, HEADER_RETRY_AFTER).and_then(|v| v.parse().ok());
        let body = resp.text().await.unwrap_or_default();
        Err(StoreError::from_status(
            status,
            error_message(&body),
            retry_after_ms,
        ))
    }

    /// 拉取完整列表（跟随 continuation 分页）
    async fn list_all<F, M>(&self, path: &str, extract: M) -> Result<Vec<ResourceId>, StoreError>
    where
        F: DeserializeOwned,
        M: Fn(F) -> Vec<ResourceId>,
    {
        let mut items = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut builder = self.request(Method::GET, path, None).await?;
            if let Some(ref token) = continuation {
                builder = builder.header(HEADER_CONTINUATION, token.clone());
            }

            let resp = self.execute(builder, None).await?;
            continuation = header_str(&resp, HEADER_CONTINUATION).map(str::to_string);
            let feed: F = resp.json().await?;
            items.extend(extract(feed));

            if continuation.is_none() {
                break;
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl DocumentStore for CosmosClient {
    async fn list_databases(&self) -> Result<Vec<ResourceId>, StoreError> {
        self.list_all("dbs", |feed: DatabaseFeed| feed.databases).await
    }

    async fn create_database(&self, name: &str) -> Result<(), StoreError> {
        let builder = self
            .request(Method::POST, "dbs", None)
            .await?
            .json(&json!({ "id": name }));
        self.execute(builder, None).await?;
        Ok(())
    }

    async fn list_containers(&self, database: &str) -> Result<Vec<ResourceId>, StoreError> {
        let path = format!("{}/colls", database_path(database));
        self.list_all(&path, |feed: ContainerFeed| feed.containers).await
    }

    async fn create_container(
        &self,
        database: &str,
        container: &str,
        partition_key_path: &str,
    ) -> Result<(), StoreError> {
        let path = format!("{}/colls", database_path(database));
        let builder = self
            .request(Method::POST, &path, None)
            .await?
            .json(&container_body(container, partition_key_path));
        self.execute(builder, None).await?;
        Ok(())
    }

    async fn create_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &str,
        body: Value,
    ) -> Result<(), StoreError> {
        let link = container_path(database, container);
        let path = format!("{}/docs", link);
        let payload = serde_json::to_vec(&body)?;
        let builder = self
            .request(Method::POST, &path, Some(&link))
            .await?
            .header(HEADER_PARTITION_KEY, partition_key_header(partition_key)?)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        self.execute(builder, Some(&link)).await?;
        Ok(())
    }
}

/// AAD 令牌的 scope：`<账户 origin>/.default`
fn scope_for(endpoint: &Url) -> String {
    format!("{}/.default", endpoint.origin().ascii_serialization())
}

/// `authorization` 头（整体 URL 编码）
fn auth_header(token: &str) -> String {
    let raw = format!("type=aad&ver=1.0&sig={}", token);
    urlencoding::encode(&raw).into_owned()
}

fn rfc1123_now() -> String {
    chrono::Utc::now()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

fn database_path(database: &str) -> String {
    format!("dbs/{}", urlencoding::encode(database))
}

fn container_path(database: &str, container: &str) -> String {
    format!(
        "{}/colls/{}",
        database_path(database),
        urlencoding::encode(container)
    )
}

fn container_body(container: &str, partition_key_path: &str) -> Value {
    json!({
        "id": container,
        "partitionKey": {
            "paths": [partition_key_path],
            "kind": "Hash",
            "version": 2
        }
    })
}

/// 分区键头的值是 JSON 数组，例如 `["sess-1"]`
///
/// 非 ASCII 字符转义为 `\uXXXX`（BMP 之外用 UTF-16 代理对），头部只含 ASCII
fn partition_key_header(partition_key: &str) -> Result<String, StoreError> {
    let json = serde_json::to_string(&[partition_key])?;
    Ok(escape_non_ascii(&json))
}

fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    let mut units = [0u16; 2];
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
            continue;
        }
        for unit in c.encode_utf16(&mut units) {
            out.push_str(&format!("\\u{:04x}", unit));
        }
    }
    out
}

fn header_str<'a>(resp: &'a Response, name: &str) -> Option<&'a str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

/// 从错误响应体中提取 message，解析失败时返回原文
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .unwrap_or_else(|| body.to_string())
}
