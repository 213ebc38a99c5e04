//! 公共工具模块

use chrono::{DateTime, Local};

/// 记录 ID 中时间戳部分的格式（本地时间，固定 6 位微秒，无时区）
const ID_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// 人类可读的时间格式（秒级精度）
const DISPLAY_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 生成记录 ID：`<ISO-8601 时间戳>-<session_id>`
///
/// 同一会话在同一微秒内的两次写入会得到相同 ID，由存储层以冲突错误拒绝
pub fn record_id(now: &DateTime<Local>, session_id: &str) -> String {
    format!("{}-{}", now.format(ID_TIMESTAMP_FORMAT), session_id)
}

/// 格式化为 `YYYY-MM-DD HH:MM:SS`
pub fn display_datetime(now: &DateTime<Local>) -> String {
    now.format(DISPLAY_DATETIME_FORMAT).to_string()
}
