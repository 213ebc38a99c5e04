//! 遥测记录数据模型

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::common::{display_datetime, record_id};

/// 遥测类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TelemetryType {
    /// 正常对话
    #[serde(rename = "Chat Entry")]
    Chat,
    /// 对话出错
    #[serde(rename = "Chat Entry Error")]
    ChatError,
}

impl TelemetryType {
    /// 写入存储的标签
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "Chat Entry",
            Self::ChatError => "Chat Entry Error",
        }
    }
}

impl fmt::Display for TelemetryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 写入 Cosmos DB 的遥测文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub id: String,
    pub datetime: String,
    pub telemetry_type: TelemetryType,
    #[serde(rename = "sessionID")]
    pub session_id: String,
    /// 响应耗时（秒）
    pub response_time: f64,
    /// 错误描述，无错误时为空串
    pub error: String,
}

impl TelemetryRecord {
    pub fn new(
        now: &DateTime<Local>,
        telemetry_type: TelemetryType,
        session_id: &str,
        response_time: f64,
        error_message: &str,
    ) -> Self {
        Self {
            id: record_id(now, session_id),
            datetime: display_datetime(now),
            telemetry_type,
            session_id: session_id.to_string(),
            response_time,
            error: error_message.to_string(),
        }
    }
}
