//! 配置管理模块
//!
//! 配置文件为 TOML 格式，`[default]` 段为所有主机的默认连接参数，
//! 以主机名命名的顶层表按深度合并的方式覆盖默认值：
//!
//! ```toml
//! [default]
//! fetch_lines_limit = 1000
//!
//! [default.ssh]
//! username = "admin"
//! port = 22
//!
//! [default.mysql]
//! port = 3306
//! username = "monitor"
//! password = "secret"
//!
//! [log]
//! level = "info"
//!
//! ["db1.example.com".mysql]
//! port = 3307
//! ```

use crate::error::{Result, SlowlogError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 主配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 默认配置
    #[serde(default)]
    pub default: DefaultSettings,
    /// 日志配置
    #[serde(default)]
    pub log: LogSettings,
    /// 其余顶层表：按主机名覆盖的配置
    #[serde(flatten)]
    pub hosts: toml::Table,
}

/// `[default]` 段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultSettings {
    /// 每次读取日志尾部的行数
    #[serde(default = "default_fetch_lines_limit")]
    pub fetch_lines_limit: usize,
    #[serde(default)]
    pub ssh: SshSettings,
    #[serde(default)]
    pub mysql: MysqlSettings,
}

/// SSH 连接参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshSettings {
    /// 登录用户，缺省时使用 ssh 客户端自身的默认值
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// 私钥文件路径
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_file: Option<String>,
    /// 额外的 `-o` 选项，例如 `StrictHostKeyChecking=no`
    #[serde(default)]
    pub options: Vec<String>,
}

/// MySQL 连接参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MysqlSettings {
    /// 数据库地址，缺省时连接被采集的主机本身
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default = "default_mysql_port")]
    pub port: u16,
    #[serde(default = "default_mysql_username")]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// 建立连接的超时时间（秒）
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// 某台主机合并后的连接参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    pub ssh: SshSettings,
    pub mysql: MysqlSettings,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// 日志级别 (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// 日志输出目录
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// 是否启用控制台输出
    #[serde(default = "default_true")]
    pub enable_stdout: bool,
}

fn default_fetch_lines_limit() -> usize {
    1000
}

fn default_ssh_port() -> u16 {
    22
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_mysql_username() -> String {
    "root".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            fetch_lines_limit: default_fetch_lines_limit(),
            ssh: SshSettings::default(),
            mysql: MysqlSettings::default(),
        }
    }
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            username: None,
            port: default_ssh_port(),
            identity_file: None,
            options: Vec::new(),
        }
    }
}

impl Default for MysqlSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: default_mysql_port(),
            username: default_mysql_username(),
            password: None,
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: default_log_dir(),
            enable_stdout: true,
        }
    }
}

#[cfg(feature = "logging")]
impl LogSettings {
    /// 转换为日志模块使用的配置
    pub fn to_log_config(&self) -> Result<crate::logging::LogConfig> {
        let level = crate::logging::parse_level(&self.level)?;
        Ok(crate::logging::LogConfig::new()
            .level(level)
            .log_dir(&self.log_dir)
            .enable_stdout(self.enable_stdout))
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// 从字符串加载配置
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        match self.log.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(SlowlogError::config_error(format!(
                    "无效的日志级别: {}",
                    self.log.level
                )));
            }
        }

        if self.default.fetch_lines_limit == 0 {
            return Err(SlowlogError::config_error("fetch_lines_limit 不能为0"));
        }

        for (name, value) in &self.hosts {
            if !value.is_table() {
                return Err(SlowlogError::config_error(format!(
                    "主机配置 [{name}] 必须是表"
                )));
            }
        }

        Ok(())
    }

    /// 默认读取的日志行数
    pub fn fetch_lines_limit(&self) -> usize {
        self.default.fetch_lines_limit
    }

    /// 获取某台主机的连接参数：`[default]` 与 `[<hostname>]` 深度合并，
    /// 只保留 `ssh` 和 `mysql` 两部分。
    pub fn connection_settings(&self, hostname: &str) -> Result<ConnectionSettings> {
        let defaults = ConnectionSettings {
            ssh: self.default.ssh.clone(),
            mysql: self.default.mysql.clone(),
        };

        let Some(host_table) = self.hosts.get(hostname).and_then(toml::Value::as_table)
        else {
            return Ok(defaults);
        };

        let mut merged = match toml::Value::try_from(&defaults) {
            Ok(toml::Value::Table(table)) => table,
            Ok(_) => return Err(SlowlogError::other("默认连接参数不是表")),
            Err(e) => {
                return Err(SlowlogError::config_error(format!(
                    "默认连接参数序列化失败: {e}"
                )));
            }
        };

        let overrides: toml::Table = host_table
            .iter()
            .filter(|(k, _)| k.as_str() == "ssh" || k.as_str() == "mysql")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        deep_merge(&mut merged, &overrides);

        #[cfg(feature = "logging")]
        tracing::debug!(hostname, "使用主机专属连接参数");

        Ok(toml::Value::Table(merged).try_into()?)
    }
}

/// 将 `overlay` 深度合并到 `base`：两边都是表时递归合并，否则以 `overlay` 为准
pub fn deep_merge(base: &mut toml::Table, overlay: &toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge(base_table, overlay_table);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}
