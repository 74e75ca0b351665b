//! 头部行解析
//!
//! 一条慢查询日志的头部由若干 `#` 开头的行组成，每行包含一个或多个
//! `Label: value` 字段。MySQL 与 Percona 的差异全部体现在 [`HEADER_LABELS`]
//! 这张表里，解析逻辑本身不区分方言。
//!
//! ```text
//! # Time: 120913 12:58:21
//! # User@Host: root[root] @ localhost []
//! # Thread_id: 45  Schema: sbtest  Last_errno: 0  Killed: 0
//! # Query_time: 34.452360  Lock_time: 0.000134  Rows_sent: 50  Rows_examined: 8800050
//! #   InnoDB_IO_r_ops: 58994  InnoDB_IO_r_bytes: 966557696  InnoDB_IO_r_wait: 8.327283
//! ```

use crate::slowlog::types::Field;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

/// 标签 → 字段 对照表（区分大小写）
pub const HEADER_LABELS: &[(&str, Field)] = &[
    ("Query_time", Field::QueryTime),
    ("Lock_time", Field::LockTime),
    ("Rows_sent", Field::RowsSent),
    ("Rows_examined", Field::RowsExamined),
    ("Thread_id", Field::ThreadId),
    ("Schema", Field::Schema),
    ("Last_errno", Field::LastErrno),
    ("Killed", Field::Killed),
    ("Rows_affected", Field::RowsAffected),
    ("Rows_read", Field::RowsRead),
    ("Bytes_sent", Field::BytesSent),
    ("Tmp_tables", Field::TmpTables),
    ("Tmp_disk_tables", Field::TmpDiskTables),
    ("Tmp_table_sizes", Field::TmpTableSizes),
    ("InnoDB_trx_id", Field::InnodbTrxId),
    ("QC_Hit", Field::QcHit),
    ("Full_scan", Field::FullScan),
    ("Full_join", Field::FullJoin),
    ("Tmp_table", Field::TmpTable),
    ("Tmp_table_on_disk", Field::TmpTableOnDisk),
    ("Filesort", Field::Filesort),
    ("Filesort_on_disk", Field::FilesortOnDisk),
    ("Merge_passes", Field::MergePasses),
    ("InnoDB_IO_r_ops", Field::InnodbIoROps),
    ("InnoDB_IO_r_bytes", Field::InnodbIoRBytes),
    ("InnoDB_IO_r_wait", Field::InnodbIoRWait),
    ("InnoDB_rec_lock_wait", Field::InnodbRecLockWait),
    ("InnoDB_queue_wait", Field::InnodbQueueWait),
    ("InnoDB_pages_distinct", Field::InnodbPagesDistinct),
];

lazy_static! {
    static ref LABEL_INDEX: HashMap<&'static str, Field> =
        HEADER_LABELS.iter().copied().collect();
    static ref LABEL_RE: Regex = Regex::new(r"[A-Za-z][A-Za-z0-9_]*:").unwrap();
    /// `user[login] @ host [ip]` 或 `user @ host [ip]`
    static ref USER_HOST_RE: Regex = Regex::new(
        r"^User@Host:\s+(\S*?)(?:\[([^\]]*)\])?\s+@\s+(\S*)\s*\[([^\]]*)\]"
    )
    .unwrap();
}

/// 解析一行头部，返回识别出的 (字段, 原始 token) 列表。
///
/// 未知标签被忽略；一个已知标签都没有的行返回空列表，而不是错误。
/// `# Time:` 行会被识别但不产生字段，记录时间以 `SET timestamp=` 为准。
#[must_use]
pub fn parse_header_line(line: &str) -> Vec<(Field, &str)> {
    let body = line.trim_start_matches('#').trim_start();

    if body.starts_with("Time:") {
        return Vec::new();
    }

    if body.starts_with("User@Host:") {
        return parse_user_host(body);
    }

    let labels = find_labels(body);
    let mut pairs = Vec::with_capacity(labels.len());
    for (i, &(_, value_start, label)) in labels.iter().enumerate() {
        // token 到下一个标签（包括未知标签）或行尾为止
        let value_end = labels.get(i + 1).map_or(body.len(), |next| next.0);
        let token = body[value_start..value_end].trim();
        if token.is_empty() {
            continue;
        }
        match LABEL_INDEX.get(label) {
            Some(field) => pairs.push((*field, token)),
            None => {
                #[cfg(feature = "logging")]
                tracing::trace!(label, "忽略未知头部字段");
            }
        }
    }
    pairs
}

/// 找出行内所有 `Label:`，返回 (标签起点, 值起点, 标签名)。
///
/// 标签前必须是行首或空白，冒号后必须是空白或行尾，
/// 这样 `13:39:11` 之类的值不会被当成标签。
fn find_labels(body: &str) -> Vec<(usize, usize, &str)> {
    LABEL_RE
        .find_iter(body)
        .filter(|m| {
            let before_ok = body[..m.start()]
                .chars()
                .next_back()
                .is_none_or(char::is_whitespace);
            let after_ok =
                body[m.end()..].chars().next().is_none_or(char::is_whitespace);
            before_ok && after_ok
        })
        .map(|m| (m.start(), m.end(), &body[m.start()..m.end() - 1]))
        .collect()
}

/// 解析 `User@Host:` 行。
///
/// 用户名优先取外层名字，为空时（MySQL 写成 `[user] @ ...`）取方括号内的登录名；
/// 主机优先取主机名，为空时取方括号内的 IP。
fn parse_user_host(body: &str) -> Vec<(Field, &str)> {
    let Some(caps) = USER_HOST_RE.captures(body) else {
        #[cfg(feature = "logging")]
        tracing::debug!(line = body, "User@Host 行格式无法识别");
        return Vec::new();
    };

    let non_empty = |idx: usize| {
        caps.get(idx).map(|m| m.as_str()).filter(|s| !s.is_empty())
    };

    let mut pairs = Vec::with_capacity(2);
    if let Some(user) = non_empty(1).or_else(|| non_empty(2)) {
        pairs.push((Field::User, user));
    }
    if let Some(host) = non_empty(3).or_else(|| non_empty(4)) {
        pairs.push((Field::Host, host));
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_host_mysql_empty_user() {
        let pairs = parse_header_line("# User@Host: [user] @ localhost []  Id:     8");
        assert_eq!(pairs, vec![(Field::User, "user"), (Field::Host, "localhost")]);
    }

    #[test]
    fn test_user_host_with_login() {
        let pairs = parse_header_line("# User@Host: root[root] @ localhost []");
        assert_eq!(pairs, vec![(Field::User, "root"), (Field::Host, "localhost")]);
    }

    #[test]
    fn test_user_host_ip_fallback() {
        let pairs = parse_header_line("# User@Host: user[user] @  [192.168.10.11]");
        assert_eq!(
            pairs,
            vec![(Field::User, "user"), (Field::Host, "192.168.10.11")]
        );
    }

    #[test]
    fn test_user_host_without_login() {
        let pairs = parse_header_line("# User@Host: app @ db1.local [10.0.0.2]");
        assert_eq!(pairs, vec![(Field::User, "app"), (Field::Host, "db1.local")]);
    }

    #[test]
    fn test_query_time_line() {
        let pairs = parse_header_line(
            "# Query_time: 2.001227  Lock_time: 0.000000 Rows_sent: 1  Rows_examined: 0",
        );
        assert_eq!(
            pairs,
            vec![
                (Field::QueryTime, "2.001227"),
                (Field::LockTime, "0.000000"),
                (Field::RowsSent, "1"),
                (Field::RowsExamined, "0"),
            ]
        );
    }

    #[test]
    fn test_indented_innodb_line() {
        let pairs = parse_header_line(
            "#   InnoDB_rec_lock_wait: 0.000000  InnoDB_queue_wait: 0.000000",
        );
        assert_eq!(
            pairs,
            vec![
                (Field::InnodbRecLockWait, "0.000000"),
                (Field::InnodbQueueWait, "0.000000"),
            ]
        );
    }

    #[test]
    fn test_similar_labels_are_distinct() {
        let pairs = parse_header_line(
            "# QC_Hit: No  Full_scan: Yes  Full_join: No  Tmp_table: Yes  Tmp_table_on_disk: Yes",
        );
        assert_eq!(pairs.len(), 5);
        assert_eq!(pairs[3], (Field::TmpTable, "Yes"));
        assert_eq!(pairs[4], (Field::TmpTableOnDisk, "Yes"));
    }

    #[test]
    fn test_unknown_labels_are_dropped() {
        assert!(parse_header_line("# Extra_field: 1").is_empty());
        let pairs = parse_header_line("# Bytes_sent: 10  Bytes_received: 20");
        assert_eq!(pairs, vec![(Field::BytesSent, "10")]);
    }

    #[test]
    fn test_empty_schema_does_not_swallow_next_label() {
        let pairs =
            parse_header_line("# Thread_id: 7  Schema:   Last_errno: 0  Killed: 0");
        assert_eq!(
            pairs,
            vec![
                (Field::ThreadId, "7"),
                (Field::LastErrno, "0"),
                (Field::Killed, "0"),
            ]
        );
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        assert!(parse_header_line("# query_time: 1.0").is_empty());
    }

    #[test]
    fn test_time_line_yields_nothing() {
        assert!(parse_header_line("# Time: 140326  0:36:56").is_empty());
        assert!(parse_header_line("# Time: 2021-07-01T00:00:00.000000Z").is_empty());
    }

    #[test]
    fn test_label_table_has_unique_labels() {
        assert_eq!(LABEL_INDEX.len(), HEADER_LABELS.len());
    }
}
