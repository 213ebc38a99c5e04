//! 对话日志模块
//!
//! 记录完整对话轮次（用户输入、模型输出、响应耗时、用户反馈），用于审计和分析

pub mod log;
pub mod model;

pub use log::ConversationLog;
pub use model::{ConversationEntry, ConversationRecord};
