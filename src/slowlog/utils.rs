//! 慢查询日志行识别的工具函数

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// `SET timestamp=N;`，也兼容 `SET last_insert_id=1,insert_id=2,timestamp=N;`
    static ref TIMESTAMP_RE: Regex =
        Regex::new(r"^SET\s+(?:[^;]*,)?timestamp=(\d+);").unwrap();
    static ref USE_RE: Regex = Regex::new(r"^use (\w+);").unwrap();
    /// mysqld 重启时写入的横幅
    static ref BANNER_RE: Regex =
        Regex::new(r"^\S.*, Version: .*started with:\s*$").unwrap();
    static ref SOCKET_RE: Regex =
        Regex::new(r"^Tcp port: \d+\s+Unix socket: ").unwrap();
    static ref COLUMN_HEADER_RE: Regex =
        Regex::new(r"^Time\s+Id\s+Command\s+Argument\s*$").unwrap();
}

/// 是否为新日志的起始行（`# Time:` 或 `# User@Host:`）
#[must_use]
pub fn is_entry_start(line: &str) -> bool {
    line.starts_with("# Time: ") || line.starts_with("# User@Host: ")
}

/// 是否为 `#` 开头的头部行
#[must_use]
pub fn is_header_line(line: &str) -> bool {
    line.starts_with('#')
}

/// 是否为不属于任何日志的噪声行：重启横幅、端口/套接字声明和列标题行
#[must_use]
pub fn is_noise_line(line: &str) -> bool {
    BANNER_RE.is_match(line)
        || SOCKET_RE.is_match(line)
        || COLUMN_HEADER_RE.is_match(line)
}

/// 若为时间戳标记行，返回其中的 Unix 时间戳
#[must_use]
pub fn timestamp_marker(line: &str) -> Option<i64> {
    TIMESTAMP_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
}

/// 是否为时间戳标记行
#[must_use]
pub fn is_timestamp_marker(line: &str) -> bool {
    TIMESTAMP_RE.is_match(line)
}

/// 若为 `use <db>;` 语句，返回库名
#[must_use]
pub fn use_statement(line: &str) -> Option<&str> {
    USE_RE.captures(line).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}
