//! 慢查询日志采集
//!
//! [`SlowLogAggregator`] 把两个外部协作方组合起来：
//!
//! - [`RemoteExec`]：在数据库主机上执行 shell 命令，读取慢日志文件；
//! - [`VariableSource`]：读取 `slow_query_log_file`、`long_query_time` 等全局变量。
//!
//! 两个通道都由调用方显式创建后交给采集器，采集结束后调用
//! [`SlowLogAggregator::close`] 显式关闭。
//!
//! ```no_run
//! use slowlog_collector::aggregator::{LocalExec, MysqlVariables, SlowLogAggregator};
//! use slowlog_collector::config::MysqlSettings;
//!
//! let variables = MysqlVariables::new("localhost", MysqlSettings::default())?;
//! let mut aggregator = SlowLogAggregator::new("localhost", LocalExec::new(), variables)?;
//! let snapshot = aggregator.snapshot(1000)?;
//! println!("{} 条慢查询", snapshot.records.len());
//! aggregator.close()?;
//! # Ok::<(), slowlog_collector::error::SlowlogError>(())
//! ```

pub mod transport;
pub mod validate;
pub mod variables;

pub use transport::{LocalExec, RemoteExec, SshExec};
pub use validate::{shell_quote, validate_hostname, validate_identifiers};
pub use variables::{MysqlVariables, ServerVariables, VariableSource};

use crate::error::{Result, SlowlogError};
use crate::slowlog::parser::parse_slow_logs;
use crate::slowlog::types::{FieldValue, SlowLogRecord};
use crate::slowlog::utils::use_statement;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref SCHEMA_RE: Regex = Regex::new(r"Schema: (\w+)").unwrap();
}

/// 慢查询日志文件路径对应的变量名
pub const SLOW_QUERY_LOG_FILE: &str = "slow_query_log_file";
/// 慢查询阈值对应的变量名
pub const LONG_QUERY_TIME: &str = "long_query_time";

/// 一次采集的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlowLogSnapshot {
    pub hostname: String,
    pub log_file_path: String,
    /// 日志文件 inode，可用于判断文件是否被替换
    pub inode: Option<u64>,
    /// 日志文件总行数
    pub total_lines: Option<u64>,
    /// 慢查询阈值（秒）
    pub long_query_time: Option<f64>,
    /// 读取窗口之前最后一次 `use` / `Schema:` 指定的库名
    pub last_db: Option<String>,
    pub records: Vec<SlowLogRecord>,
}

impl SlowLogSnapshot {
    /// 每条记录一行 JSON
    pub fn to_json_lines(&self) -> Result<String> {
        let mut out = String::new();
        for record in &self.records {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        Ok(out)
    }
}

/// 单台主机的慢查询日志采集器
pub struct SlowLogAggregator<E, V> {
    hostname: String,
    exec: E,
    variables: V,
    cache: Option<ServerVariables>,
}

impl<E: RemoteExec, V: VariableSource> SlowLogAggregator<E, V> {
    /// 创建采集器；主机名非法时直接拒绝
    pub fn new(hostname: &str, exec: E, variables: V) -> Result<Self> {
        validate_hostname(hostname)?;
        Ok(Self {
            hostname: hostname.to_string(),
            exec,
            variables,
            cache: None,
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// 全部全局变量，首次调用时读取并缓存
    pub fn server_variables(&mut self) -> Result<&ServerVariables> {
        if self.cache.is_none() {
            let rows = self.variables.global_variables()?;
            #[cfg(feature = "logging")]
            tracing::debug!(host = %self.hostname, count = rows.len(), "缓存全局变量");
            self.cache = Some(ServerVariables::from_rows(rows));
        }
        self.cache
            .as_ref()
            .ok_or_else(|| SlowlogError::other("全局变量缓存为空"))
    }

    /// 读取单个全局变量
    pub fn show_variable(&mut self, name: &str) -> Result<Option<FieldValue>> {
        validate_identifiers(&[name])?;
        Ok(self.server_variables()?.get(name).cloned())
    }

    /// 慢查询日志文件路径
    pub fn log_file_path(&mut self) -> Result<String> {
        match self.show_variable(SLOW_QUERY_LOG_FILE)? {
            Some(value) => Ok(value.to_string()),
            None => Err(SlowlogError::database_error(format!(
                "{} 上没有 {SLOW_QUERY_LOG_FILE} 变量",
                self.hostname
            ))),
        }
    }

    /// 慢查询阈值（秒）
    pub fn long_query_time(&mut self) -> Result<Option<f64>> {
        Ok(self.show_variable(LONG_QUERY_TIME)?.and_then(|v| v.as_float()))
    }

    /// 日志文件 inode
    pub fn log_file_inode(&mut self) -> Result<Option<u64>> {
        let command = format!("ls -i {}", shell_quote(&self.log_file_path()?));
        let output = self.exec.exec(&command)?;
        Ok(parse_inode_output(&output))
    }

    /// 日志文件总行数
    pub fn log_file_lines(&mut self) -> Result<Option<u64>> {
        let command = format!("wc -l {}", shell_quote(&self.log_file_path()?));
        let output = self.exec.exec(&command)?;
        Ok(parse_line_count_output(&output))
    }

    /// 读取日志文件最后 `lines` 行的原始内容
    pub fn log_body(&mut self, lines: usize) -> Result<String> {
        if lines == 0 {
            return Err(SlowlogError::invalid_input("读取行数不能为0"));
        }
        let command = format!("tail -n {lines} {}", shell_quote(&self.log_file_path()?));
        self.exec.exec(&command)
    }

    /// 日志前 `lines_previously` 行中最后一次 `use` 或 `Schema:` 指定的库名
    pub fn last_db(&mut self, lines_previously: u64) -> Result<Option<String>> {
        if lines_previously == 0 {
            return Ok(None);
        }
        let command = format!(
            "sed -n '1,{lines_previously}p' {} | grep -E {}",
            shell_quote(&self.log_file_path()?),
            shell_quote("^use |Schema:"),
        );
        let output = self.exec.exec(&command)?;
        Ok(parse_last_db_output(&output))
    }

    /// 读取并解析最后 `lines` 行
    pub fn fetch_slow_logs(&mut self, lines: usize) -> Result<Vec<SlowLogRecord>> {
        let raw = self.log_body(lines)?;
        let records = parse_slow_logs(&raw);
        #[cfg(feature = "logging")]
        tracing::info!(
            host = %self.hostname,
            lines,
            records = records.len(),
            "读取慢查询日志完成"
        );
        Ok(records)
    }

    /// 完整的一次采集
    pub fn snapshot(&mut self, lines: usize) -> Result<SlowLogSnapshot> {
        let log_file_path = self.log_file_path()?;
        let long_query_time = self.long_query_time()?;
        let inode = self.log_file_inode()?;
        let total_lines = self.log_file_lines()?;

        // 读取窗口之前的行数，用于找出窗口开始时生效的库
        let preceding = total_lines
            .map(|total| total.saturating_sub(lines as u64))
            .unwrap_or(0);
        let last_db = self.last_db(preceding)?;
        let records = self.fetch_slow_logs(lines)?;

        Ok(SlowLogSnapshot {
            hostname: self.hostname.clone(),
            log_file_path,
            inode,
            total_lines,
            long_query_time,
            last_db,
            records,
        })
    }

    /// 关闭两个通道；两个都会尝试关闭，返回第一个错误
    pub fn close(mut self) -> Result<()> {
        let exec_result = self.exec.close();
        let variables_result = self.variables.close();
        #[cfg(feature = "logging")]
        tracing::debug!(host = %self.hostname, "关闭采集连接");
        exec_result.and(variables_result)
    }
}

/// 解析 `ls -i` 的输出，取第一个字段
pub fn parse_inode_output(output: &str) -> Option<u64> {
    first_number(output)
}

/// 解析 `wc -l` 的输出，取第一个字段
pub fn parse_line_count_output(output: &str) -> Option<u64> {
    first_number(output)
}

fn first_number(output: &str) -> Option<u64> {
    output.split_whitespace().next()?.parse().ok()
}

/// 解析 `grep -E '^use |Schema:'` 的输出：取最后一行，
/// 优先匹配 `use <db>;`，其次匹配 `Schema: <db>`
pub fn parse_last_db_output(output: &str) -> Option<String> {
    let last = output.lines().rev().find(|line| !line.trim().is_empty())?;
    if let Some(db) = use_statement(last) {
        return Some(db.to_string());
    }
    SCHEMA_RE
        .captures(last)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
