use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cosmos_chat_log::cosmos::{CosmosClient, DocumentStore, StaticTokenCredential};
use cosmos_chat_log::{ConversationEntry, ConversationLog, LogConfig, TelemetryLog, TelemetryType};

/// 访问令牌环境变量
const ENV_ACCESS_TOKEN: &str = "COSMOSDB_ACCESS_TOKEN";

#[derive(Parser, Debug)]
#[command(name = "cosmos-chat-log", version, about = "对话日志 / 遥测写入 Cosmos DB")]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = LogConfig::default_config_path())]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 确保对话与遥测的数据库 / 容器存在
    Check,
    /// 写入一条测试对话记录和一条测试遥测记录
    SendTest {
        /// 测试会话 ID
        #[arg(long, default_value = "cosmos-chat-log-test")]
        session_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = LogConfig::load(&args.config)?;
    config.apply_env_overrides();
    config.validate()?;

    let token = std::env::var(ENV_ACCESS_TOKEN)
        .with_context(|| format!("未设置环境变量 {}", ENV_ACCESS_TOKEN))?;
    let credential = Arc::new(StaticTokenCredential::new(token));
    let store: Arc<dyn DocumentStore> = Arc::new(CosmosClient::from_config(&config, credential)?);

    match args.command {
        Command::Check => check(&config, store).await,
        Command::SendTest { session_id } => send_test(&config, store, &session_id).await,
    }
}

async fn check(config: &LogConfig, store: Arc<dyn DocumentStore>) -> anyhow::Result<()> {
    let conversation = ConversationLog::with_store(
        store.clone(),
        &config.conversation_database,
        &config.conversation_container,
    )
    .await
    .context("初始化对话日志容器失败")?;
    let telemetry = TelemetryLog::with_store(
        store,
        &config.telemetry_database,
        &config.telemetry_container,
    )
    .await
    .context("初始化遥测容器失败")?;

    tracing::info!(
        "对话日志容器就绪: {}/{}",
        conversation.container().database(),
        conversation.container().container()
    );
    tracing::info!(
        "遥测容器就绪: {}/{}",
        telemetry.container().database(),
        telemetry.container().container()
    );
    Ok(())
}

async fn send_test(
    config: &LogConfig,
    store: Arc<dyn DocumentStore>,
    session_id: &str,
) -> anyhow::Result<()> {
    let started = Instant::now();

    let conversation = ConversationLog::with_store(
        store.clone(),
        &config.conversation_database,
        &config.conversation_container,
    )
    .await?;
    let telemetry = TelemetryLog::with_store(
        store,
        &config.telemetry_database,
        &config.telemetry_container,
    )
    .await?;

    let entry = ConversationEntry::new(
        "cosmos-chat-log 测试问题",
        "cosmos-chat-log 测试回答",
        started.elapsed().as_secs_f64(),
        "Positive",
        "",
        "N",
    );
    let record_id = conversation
        .log_conversation(session_id, entry)
        .await
        .context("写入测试对话记录失败")?;

    telemetry
        .try_record_telemetry(TelemetryType::Chat, session_id, started, "")
        .await
        .context("写入测试遥测记录失败")?;

    tracing::info!("测试记录已写入: {}", record_id);
    println!("{}", record_id);
    Ok(())
}
