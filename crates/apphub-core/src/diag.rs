//! 追加写入的诊断日志文件（`Logs\agent-*.log`）。
//!
//! 约束：
//! - 尽力而为：任何写入失败只记录 `debug` 级别事件，绝不影响主流程
//! - 每次写入都重新打开文件，多进程同时追加时不持有句柄
//!
//! 作者：AppHub Agent 项目组（自动生成）
//! 创建时间：2026-10-18
//! 修改时间：2026-10-18

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::OffsetDateTime;
use tracing::debug;

/// 诊断日志文件。
#[derive(Debug, Clone)]
pub struct DiagLog {
    path: PathBuf,
}

impl DiagLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 写入一行带进程号与标签的记录。
    ///
    /// 行格式：
    /// - `[2026-10-18 09:30:00.123] PID=4242 PIPECLIENT TrySend OK ...`
    pub fn log(&self, tag: &str, message: &str) {
        let line = format!(
            "[{}] PID={} {} {}",
            timestamp_millis(),
            std::process::id(),
            tag,
            message
        );
        self.append_line(&line);
    }

    /// 追加一行原始文本（自动补换行，自动创建上级目录）。
    pub fn append_line(&self, line: &str) {
        if let Err(e) = self.try_append(line) {
            debug!("写入诊断日志失败 {}: {e}", self.path.display());
        }
    }

    fn try_append(&self, line: &str) -> std::io::Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")
    }
}

/// 截断过长文本（按字符计数），超出部分以 `...` 表示。
///
/// 用途：
/// - 地址/负载可能很长，写日志前统一截断，避免日志难以阅读
pub fn shorten(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

/// 秒级时间戳：`yyyy-MM-dd HH:mm:ss`。
pub fn timestamp() -> String {
    now()
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_default()
}

fn timestamp_millis() -> String {
    now()
        .format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
        ))
        .unwrap_or_default()
}
