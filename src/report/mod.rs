// ==========================================
// 机台排产系统 - 报告层
// ==========================================
// 职责: 排产消息格式化、通知发送、CSV 导出
// 红线: 只读排产结果，不修改台账
// ==========================================

pub mod csv_export;
pub mod error;
pub mod message;
pub mod notifier;

pub use csv_export::{CsvPlanExporter, ExportedFiles};
pub use error::{ReportError, ReportResult};
pub use message::{
    format_fatal_error, format_machine_plan_message, format_shortage_message, split_message,
    PlanMessages,
};
pub use notifier::{notify_chunked, FileNotifier, LogNotifier, PlanNotifier};
