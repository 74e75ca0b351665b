//! 慢查询日志解析器
//!
//! 负责把 [`split_entries`](crate::slowlog::splitter::split_entries) 切分出的
//! 单条日志转换为 [`SlowLogRecord`]。
//!
//! ## 解析流程
//!
//! ```text
//! 原始文本 → split_entries() → LogEntry → parse_entry() → SlowLogRecord
//!                                              ↓
//!                                 头部行 → parse_header_line() → coerce()
//!                                 use db;  → db
//!                                 SET timestamp=N; → time
//!                                 之后所有行 → sql
//! ```
//!
//! 缺少 `SET timestamp=` 的日志（尾部读取截断的首条日志）不会产生记录，也不算错误。

use crate::slowlog::coerce::coerce;
use crate::slowlog::header::parse_header_line;
use crate::slowlog::splitter::split_entries;
use crate::slowlog::types::{Field, FieldValue, LogEntry, SlowLogRecord};
use crate::slowlog::utils::{is_header_line, timestamp_marker, use_statement};

/// 慢查询日志解析器
pub struct SlowLogParser;

impl SlowLogParser {
    /// 解析单条日志，缺少时间戳标记时返回 `None`
    #[must_use]
    pub fn parse_entry(entry: &LogEntry<'_>) -> Option<SlowLogRecord> {
        let Some(marker_idx) = entry
            .lines
            .iter()
            .position(|line| timestamp_marker(line).is_some())
        else {
            #[cfg(feature = "logging")]
            tracing::debug!(
                line = entry.start_line,
                "日志缺少 SET timestamp 行，跳过"
            );
            return None;
        };

        let time = timestamp_marker(entry.lines[marker_idx])?;
        let mut record = SlowLogRecord::new(time);

        for line in &entry.lines[..marker_idx] {
            if is_header_line(line) {
                Self::apply_header(&mut record, line, entry.start_line);
            } else if let Some(db) = use_statement(line) {
                record.db = Some(db.to_string());
            }
        }

        record.sql = Self::extract_sql(&entry.lines[marker_idx + 1..]);

        #[cfg(feature = "logging")]
        tracing::trace!(line = entry.start_line, time, "日志解析成功");

        Some(record)
    }

    /// 解析整段原始文本：先切分，再逐条解析，丢弃无法解析的日志
    #[must_use]
    pub fn parse(raw: &str) -> Vec<SlowLogRecord> {
        let entries = split_entries(raw);
        let records: Vec<SlowLogRecord> =
            entries.iter().filter_map(Self::parse_entry).collect();

        #[cfg(feature = "logging")]
        tracing::debug!(
            entries = entries.len(),
            records = records.len(),
            dropped = entries.len() - records.len(),
            "慢查询日志解析完成"
        );

        records
    }

    fn apply_header(record: &mut SlowLogRecord, line: &str, start_line: usize) {
        for (field, token) in parse_header_line(line) {
            match field {
                // 用户名和主机名不做类型推断
                Field::User | Field::Host => {
                    record.set(field, FieldValue::Text(token.to_string()));
                }
                _ => {
                    let value = coerce(token);
                    if !field.kind().accepts(&value) {
                        #[cfg(feature = "logging")]
                        tracing::debug!(
                            line = start_line,
                            field = field.name(),
                            token,
                            "字段值类型与常见格式不符，按推断结果保留"
                        );
                    }
                    record.set(field, value);
                }
            }
        }
        #[cfg(not(feature = "logging"))]
        let _ = start_line;
    }

    /// SQL 正文：去掉末尾的空行，再去掉末尾一个分号及其后的空白，
    /// 其余空白原样保留
    fn extract_sql(body: &[&str]) -> String {
        let end = body
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .map_or(0, |idx| idx + 1);
        let mut sql = body[..end].join("\n");
        if let Some(statement) = sql.trim_end().strip_suffix(';') {
            let len = statement.len();
            sql.truncate(len);
        }
        sql
    }
}

/// 切分并解析原始文本，返回有序的记录列表
#[must_use]
pub fn parse_slow_logs(raw: &str) -> Vec<SlowLogRecord> {
    SlowLogParser::parse(raw)
}
