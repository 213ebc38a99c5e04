//! 遥测模块
//!
//! 记录运行事件（类型、会话、响应耗时、错误信息），用于健康监控

pub mod log;
pub mod model;

pub use log::TelemetryLog;
pub use model::{TelemetryRecord, TelemetryType};
