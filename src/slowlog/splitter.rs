//! 原始日志切分
//!
//! 将一次读取到的日志文本切分为若干条日志。切分规则：
//!
//! - `# Time:` / `# User@Host:` 是日志的起始行；
//! - 当前日志已经出现过 `SET timestamp=` 行（即进入 SQL 正文）后，
//!   再遇到起始行才开始新的一条，因此连续的头部行始终属于同一条日志；
//! - 重启横幅、端口/套接字声明、列标题行在任何位置都直接丢弃；
//! - 第一个起始行之前的内容（尾部读取截断的半条日志）不归属任何日志。

use crate::slowlog::types::LogEntry;
use crate::slowlog::utils::{is_entry_start, is_noise_line, is_timestamp_marker};

/// 将原始文本切分为有序的日志列表；没有任何起始行时返回空列表。
#[must_use]
pub fn split_entries(raw: &str) -> Vec<LogEntry<'_>> {
    let mut entries = Vec::new();
    let mut current: Option<LogEntry<'_>> = None;
    let mut in_body = false;
    #[cfg(feature = "logging")]
    let mut skipped = 0usize;

    for (idx, line) in raw.lines().enumerate() {
        if is_noise_line(line) {
            #[cfg(feature = "logging")]
            tracing::trace!(line = idx + 1, "丢弃噪声行");
            continue;
        }

        if is_entry_start(line) && (current.is_none() || in_body) {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            current = Some(LogEntry::new(idx + 1));
            in_body = false;
        }

        match current.as_mut() {
            Some(entry) => {
                if !in_body && is_timestamp_marker(line) {
                    in_body = true;
                }
                entry.lines.push(line);
            }
            None => {
                #[cfg(feature = "logging")]
                {
                    skipped += 1;
                }
            }
        }
    }

    if let Some(entry) = current.take() {
        entries.push(entry);
    }

    #[cfg(feature = "logging")]
    tracing::debug!(
        entries = entries.len(),
        skipped,
        "日志切分完成"
    );

    entries
}
