//! 慢查询日志的数据类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 原始字段经过类型推断后的值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// 纯数字（十进制）
    Integer(u64),
    /// `数字.数字` 形式的浮点数
    Float(f64),
    /// 其他任意文本，原样保留
    Text(String),
}

impl FieldValue {
    /// 以整数读取，非整数返回 `None`
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// 以浮点数读取，整数会被提升为浮点数
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Text(_) => None,
        }
    }

    /// 以文本读取，仅对 `Text` 生效
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

/// 字段通常出现的值类型
///
/// 只用于发现异常的日志内容，写入记录的始终是推断出的 [`FieldValue`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Text,
}

impl FieldKind {
    /// 推断出的值是否符合该类型；整数也算作合法的浮点数
    pub fn accepts(self, value: &FieldValue) -> bool {
        match (self, value) {
            (FieldKind::Integer, FieldValue::Integer(_)) => true,
            (FieldKind::Float, FieldValue::Integer(_) | FieldValue::Float(_)) => true,
            (FieldKind::Text, _) => true,
            _ => false,
        }
    }
}

/// 头部行中可以识别的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    User,
    Host,
    QueryTime,
    LockTime,
    RowsSent,
    RowsExamined,
    ThreadId,
    Schema,
    LastErrno,
    Killed,
    RowsAffected,
    RowsRead,
    BytesSent,
    TmpTables,
    TmpDiskTables,
    TmpTableSizes,
    InnodbTrxId,
    QcHit,
    FullScan,
    FullJoin,
    TmpTable,
    TmpTableOnDisk,
    Filesort,
    FilesortOnDisk,
    MergePasses,
    InnodbIoROps,
    InnodbIoRBytes,
    InnodbIoRWait,
    InnodbRecLockWait,
    InnodbQueueWait,
    InnodbPagesDistinct,
}

impl Field {
    /// 输出记录中的字段名
    pub const fn name(self) -> &'static str {
        match self {
            Field::User => "user",
            Field::Host => "host",
            Field::QueryTime => "query_time",
            Field::LockTime => "lock_time",
            Field::RowsSent => "rows_sent",
            Field::RowsExamined => "rows_examined",
            Field::ThreadId => "thread_id",
            Field::Schema => "schema",
            Field::LastErrno => "last_errno",
            Field::Killed => "killed",
            Field::RowsAffected => "rows_affected",
            Field::RowsRead => "rows_read",
            Field::BytesSent => "bytes_sent",
            Field::TmpTables => "tmp_tables",
            Field::TmpDiskTables => "tmp_disk_tables",
            Field::TmpTableSizes => "tmp_table_sizes",
            Field::InnodbTrxId => "innodb_trx_id",
            Field::QcHit => "qc_hit",
            Field::FullScan => "full_scan",
            Field::FullJoin => "full_join",
            Field::TmpTable => "tmp_table",
            Field::TmpTableOnDisk => "tmp_table_on_disk",
            Field::Filesort => "filesort",
            Field::FilesortOnDisk => "filesort_on_disk",
            Field::MergePasses => "merge_passes",
            Field::InnodbIoROps => "innodb_io_r_ops",
            Field::InnodbIoRBytes => "innodb_io_r_bytes",
            Field::InnodbIoRWait => "innodb_io_r_wait",
            Field::InnodbRecLockWait => "innodb_rec_lock_wait",
            Field::InnodbQueueWait => "innodb_queue_wait",
            Field::InnodbPagesDistinct => "innodb_pages_distinct",
        }
    }

    /// 字段通常出现的值类型
    pub const fn kind(self) -> FieldKind {
        match self {
            Field::QueryTime
            | Field::LockTime
            | Field::InnodbIoRWait
            | Field::InnodbRecLockWait
            | Field::InnodbQueueWait => FieldKind::Float,
            Field::RowsSent
            | Field::RowsExamined
            | Field::ThreadId
            | Field::LastErrno
            | Field::Killed
            | Field::RowsAffected
            | Field::RowsRead
            | Field::BytesSent
            | Field::TmpTables
            | Field::TmpDiskTables
            | Field::TmpTableSizes
            | Field::MergePasses
            | Field::InnodbIoROps
            | Field::InnodbIoRBytes
            | Field::InnodbPagesDistinct => FieldKind::Integer,
            Field::User
            | Field::Host
            | Field::Schema
            | Field::InnodbTrxId
            | Field::QcHit
            | Field::FullScan
            | Field::FullJoin
            | Field::TmpTable
            | Field::TmpTableOnDisk
            | Field::Filesort
            | Field::FilesortOnDisk => FieldKind::Text,
        }
    }
}

/// 从原始日志中切分出的一条日志（若干连续行）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogEntry<'a> {
    /// 该条日志首行在原始文本中的行号（从 1 开始）
    pub start_line: usize,
    /// 日志的所有行，不含换行符
    pub lines: Vec<&'a str>,
}

impl<'a> LogEntry<'a> {
    pub fn new(start_line: usize) -> Self {
        Self { start_line, lines: Vec::new() }
    }
}

/// 单条慢查询记录
///
/// 除 `time` 与 `sql` 外，所有字段只有在原始日志出现对应头部行时才存在。
/// 头部字段保存 [`coerce`](crate::slowlog::coerce::coerce) 的推断结果，
/// 同一个原始 token 无论出现在哪个标签后面都得到相同的值。
/// 序列化时缺失字段直接省略。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlowLogRecord {
    /// `SET timestamp=N;` 中的 Unix 时间戳
    pub time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_errno: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub killed: Option<FieldValue>,
    /// 执行耗时（秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_time: Option<FieldValue>,
    /// 锁等待耗时（秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_time: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_sent: Option<FieldValue>,
    /// 扫描行数，超出 `u64` 的计数以原始数字文本保存
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_examined: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows_read: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes_sent: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmp_tables: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmp_disk_tables: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmp_table_sizes: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innodb_trx_id: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qc_hit: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_scan: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_join: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmp_table: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmp_table_on_disk: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesort: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filesort_on_disk: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_passes: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innodb_io_r_ops: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innodb_io_r_bytes: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innodb_io_r_wait: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innodb_rec_lock_wait: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innodb_queue_wait: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innodb_pages_distinct: Option<FieldValue>,
    /// `use <db>;` 语句指定的库名
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,
    /// SQL 正文，保留原始换行，去掉末尾一个分号
    pub sql: String,
}

impl SlowLogRecord {
    /// 以 `time` 为基础创建一条空记录
    pub fn new(time: i64) -> Self {
        Self { time, ..Self::default() }
    }

    /// 将 `time` 转换为 UTC 时间
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time, 0)
    }

    /// 写入一个头部字段。
    ///
    /// `user` / `host` 是纯文本，非文本值按十进制写回；其余字段原样保存推断结果。
    pub fn set(&mut self, field: Field, value: FieldValue) {
        match field {
            Field::User => self.user = Some(into_text(value)),
            Field::Host => self.host = Some(into_text(value)),
            Field::ThreadId => self.thread_id = Some(value),
            Field::Schema => self.schema = Some(value),
            Field::LastErrno => self.last_errno = Some(value),
            Field::Killed => self.killed = Some(value),
            Field::QueryTime => self.query_time = Some(value),
            Field::LockTime => self.lock_time = Some(value),
            Field::RowsSent => self.rows_sent = Some(value),
            Field::RowsExamined => self.rows_examined = Some(value),
            Field::RowsAffected => self.rows_affected = Some(value),
            Field::RowsRead => self.rows_read = Some(value),
            Field::BytesSent => self.bytes_sent = Some(value),
            Field::TmpTables => self.tmp_tables = Some(value),
            Field::TmpDiskTables => self.tmp_disk_tables = Some(value),
            Field::TmpTableSizes => self.tmp_table_sizes = Some(value),
            Field::InnodbTrxId => self.innodb_trx_id = Some(value),
            Field::QcHit => self.qc_hit = Some(value),
            Field::FullScan => self.full_scan = Some(value),
            Field::FullJoin => self.full_join = Some(value),
            Field::TmpTable => self.tmp_table = Some(value),
            Field::TmpTableOnDisk => self.tmp_table_on_disk = Some(value),
            Field::Filesort => self.filesort = Some(value),
            Field::FilesortOnDisk => self.filesort_on_disk = Some(value),
            Field::MergePasses => self.merge_passes = Some(value),
            Field::InnodbIoROps => self.innodb_io_r_ops = Some(value),
            Field::InnodbIoRBytes => self.innodb_io_r_bytes = Some(value),
            Field::InnodbIoRWait => self.innodb_io_r_wait = Some(value),
            Field::InnodbRecLockWait => self.innodb_rec_lock_wait = Some(value),
            Field::InnodbQueueWait => self.innodb_queue_wait = Some(value),
            Field::InnodbPagesDistinct => self.innodb_pages_distinct = Some(value),
        }
    }
}

fn into_text(value: FieldValue) -> String {
    match value {
        FieldValue::Text(s) => s,
        other => other.to_string(),
    }
}
