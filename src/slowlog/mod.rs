//! 慢查询日志解析模块
//!
//! 提供 MySQL / Percona 慢查询日志的切分、解析、类型定义和工具函数

pub mod coerce;
pub mod header;
pub mod parser;
pub mod splitter;
pub mod types;
pub mod utils;

// 重新导出核心类型和函数
pub use coerce::coerce;
pub use header::{HEADER_LABELS, parse_header_line};
pub use parser::{SlowLogParser, parse_slow_logs};
pub use splitter::split_entries;
pub use types::{Field, FieldKind, FieldValue, LogEntry, SlowLogRecord};
