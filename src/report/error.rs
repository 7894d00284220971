// ==========================================
// 机台排产系统 - 报告层错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("输出目录不可写: {path}: {message}")]
    OutputDirError { path: String, message: String },

    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("通知发送失败: {0}")]
    NotifyError(String),
}

pub type ReportResult<T> = Result<T, ReportError>;
