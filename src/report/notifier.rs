// ==========================================
// 机台排产系统 - 通知
// ==========================================
// 职责: 定义通知 trait，消息按长度上限切分后逐段发送
// 说明: 引擎与报告层不依赖具体通道
// ==========================================

use crate::report::message::split_message;
use chrono::Local;
use std::error::Error;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

pub type NotifyResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// 通知通道 trait
pub trait PlanNotifier: Send + Sync {
    /// 发送一段消息（调用方保证长度不超过上限）
    fn send(&self, message: &str) -> NotifyResult<()>;

    /// 通道名称，用于日志
    fn name(&self) -> &str;
}

/// 切分并逐段发送
///
/// # 返回
/// 成功发送的段数；任一段失败立即返回错误
pub fn notify_chunked(notifier: &dyn PlanNotifier, text: &str, max_len: usize) -> NotifyResult<usize> {
    let chunks = split_message(text, max_len);
    for (idx, chunk) in chunks.iter().enumerate() {
        notifier.send(chunk).map_err(|e| {
            warn!(channel = notifier.name(), part = idx + 1, total = chunks.len(), error = %e, "通知发送失败");
            e
        })?;
    }
    Ok(chunks.len())
}

// ==========================================
// LogNotifier - 写入 tracing 日志
// ==========================================
#[derive(Debug, Default)]
pub struct LogNotifier;

impl PlanNotifier for LogNotifier {
    fn send(&self, message: &str) -> NotifyResult<()> {
        info!(target: "machine_plan_aps::notify", "\n{}", message);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

// ==========================================
// FileNotifier - 追加到文本文件
// ==========================================
#[derive(Debug)]
pub struct FileNotifier {
    path: PathBuf,
}

impl FileNotifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PlanNotifier for FileNotifier {
    fn send(&self, message: &str) -> NotifyResult<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "===== {} =====", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(file, "{}", message)?;
        file.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
    }

    impl PlanNotifier for RecordingNotifier {
        fn send(&self, message: &str) -> NotifyResult<()> {
            self.sent.lock().unwrap().push(message.to_string());
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    #[test]
    fn test_notify_chunked_respects_limit() {
        let notifier = RecordingNotifier::default();
        let sent = notify_chunked(&notifier, "line one\nline two\nline three", 10).unwrap();

        let messages = notifier.sent.lock().unwrap();
        assert_eq!(sent, 3);
        assert!(messages.iter().all(|m| m.chars().count() <= 10));
    }

    #[test]
    fn test_file_notifier_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notify.log");
        let notifier = FileNotifier::new(&path);
        notifier.send("первое").unwrap();
        notifier.send("second").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("первое"));
        assert!(content.contains("second"));
        assert_eq!(content.matches("=====").count(), 4);
    }
}
