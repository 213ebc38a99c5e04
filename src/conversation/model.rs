//! 对话记录数据模型

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{display_datetime, record_id};

/// 一轮对话的内容（由调用方提供）
///
/// 六个值都必须给出；`model_response_time` 与 `error_flag` 的类型和单位由调用方决定，原样写入
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationEntry {
    /// 用户问题
    pub question: String,
    /// 模型回答
    pub model_response: String,
    /// 响应耗时
    pub model_response_time: Value,
    /// 反馈标签（例如 Positive / Negative）
    pub feedback: String,
    /// 反馈备注
    pub feedback_comment: String,
    /// 错误标记
    pub error_flag: Value,
}

impl ConversationEntry {
    pub fn new(
        question: impl Into<String>,
        model_response: impl Into<String>,
        model_response_time: impl Into<Value>,
        feedback: impl Into<String>,
        feedback_comment: impl Into<String>,
        error_flag: impl Into<Value>,
    ) -> Self {
        Self {
            question: question.into(),
            model_response: model_response.into(),
            model_response_time: model_response_time.into(),
            feedback: feedback.into(),
            feedback_comment: feedback_comment.into(),
            error_flag: error_flag.into(),
        }
    }
}

/// 写入 Cosmos DB 的对话文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub datetime: String,
    #[serde(rename = "sessionID")]
    pub session_id: String,
    pub user_input: String,
    pub model_response: String,
    pub model_response_time: Value,
    pub feedback: String,
    pub feedback_comment: String,
    pub error_flag: Value,
}

impl ConversationRecord {
    pub fn new(now: &DateTime<Local>, session_id: &str, entry: ConversationEntry) -> Self {
        Self {
            id: record_id(now, session_id),
            datetime: display_datetime(now),
            session_id: session_id.to_string(),
            user_input: entry.question,
            model_response: entry.model_response,
            model_response_time: entry.model_response_time,
            feedback: entry.feedback,
            feedback_comment: entry.feedback_comment,
            error_flag: entry.error_flag,
        }
    }
}
