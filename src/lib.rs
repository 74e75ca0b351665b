//! # slowlog-collector
//!
//! MySQL / Percona 慢查询日志采集与解析。
//!
//! - [`slowlog`]：纯同步的解析核心，原始文本 → [`SlowLogRecord`] 列表
//! - [`aggregator`]：通过命令执行通道和数据库变量读取日志并解析
//! - [`config`]：TOML 配置，默认值 + 按主机覆盖
//! - [`logging`]：基于 tracing 的日志初始化（`logging` feature）
//!
//! ```rust
//! use slowlog_collector::{FieldValue, parse_slow_logs};
//!
//! let raw = [
//!     "# Time: 140128 13:39:11",
//!     "# User@Host: [user] @ localhost []  Id:     8",
//!     "# Query_time: 2.001227  Lock_time: 0.000000 Rows_sent: 1  Rows_examined: 0",
//!     "SET timestamp=1390883951;",
//!     "select sleep(2);",
//! ]
//! .join("\n");
//!
//! let records = parse_slow_logs(&raw);
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].sql, "select sleep(2)");
//! assert_eq!(records[0].query_time, Some(FieldValue::Float(2.001227)));
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod slowlog;

pub use error::{Result, SlowlogError};
pub use slowlog::{FieldValue, SlowLogParser, SlowLogRecord, parse_slow_logs};
