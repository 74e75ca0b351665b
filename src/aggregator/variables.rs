//! 数据库全局变量读取
//!
//! 采集只关心 `slow_query_log_file`、`long_query_time` 等少数几个变量，
//! 一次 `SHOW GLOBAL VARIABLES` 读取全部变量后缓存在 [`ServerVariables`] 中。

use crate::aggregator::validate::validate_hostname;
use crate::config::MysqlSettings;
use crate::error::{Result, SlowlogError};
use crate::slowlog::coerce::coerce;
use crate::slowlog::types::FieldValue;
use mysql::prelude::Queryable;
use mysql::{Conn, Opts, OptsBuilder};
use std::collections::HashMap;
use std::time::Duration;

/// 数据库变量来源
pub trait VariableSource {
    /// 读取全部全局变量，返回 (变量名, 原始值) 列表
    fn global_variables(&mut self) -> Result<Vec<(String, String)>>;

    /// 关闭数据库连接
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: VariableSource + ?Sized> VariableSource for Box<T> {
    fn global_variables(&mut self) -> Result<Vec<(String, String)>> {
        (**self).global_variables()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// 经过类型推断的全局变量表
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerVariables {
    values: HashMap<String, FieldValue>,
}

impl ServerVariables {
    /// 由原始 (变量名, 值) 列表构造，值按与日志字段相同的规则推断类型
    pub fn from_rows<I, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let values = rows
            .into_iter()
            .map(|(name, value)| (name.into(), coerce(value.as_ref())))
            .collect();
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }
}

/// 通过 MySQL 协议直连数据库读取变量
///
/// 连接在第一次读取时建立，查询失败后丢弃，下次读取时重新连接。
pub struct MysqlVariables {
    hostname: String,
    settings: MysqlSettings,
    conn: Option<Conn>,
    closed: bool,
}

impl MysqlVariables {
    /// `hostname` 是被采集的主机，`settings.host` 未配置时直接连接该主机
    pub fn new(hostname: &str, settings: MysqlSettings) -> Result<Self> {
        validate_hostname(hostname)?;
        if let Some(host) = &settings.host {
            validate_hostname(host)?;
        }
        Ok(Self {
            hostname: hostname.to_string(),
            settings,
            conn: None,
            closed: false,
        })
    }

    /// 连接地址
    pub fn address(&self) -> &str {
        self.settings.host.as_deref().unwrap_or(&self.hostname)
    }

    /// 由配置组装连接参数
    pub fn opts(&self) -> Opts {
        let builder = OptsBuilder::new()
            .ip_or_hostname(Some(self.address()))
            .tcp_port(self.settings.port)
            .user(Some(self.settings.username.as_str()))
            .pass(self.settings.password.as_deref())
            .tcp_connect_timeout(Some(Duration::from_secs(
                self.settings.connect_timeout_secs,
            )));
        Opts::from(builder)
    }

    fn connection(&mut self) -> Result<&mut Conn> {
        if self.closed {
            return Err(SlowlogError::database_error(format!(
                "{} 的数据库连接已关闭",
                self.address()
            )));
        }
        if self.conn.is_none() {
            #[cfg(feature = "logging")]
            tracing::debug!(
                address = self.address(),
                port = self.settings.port,
                user = %self.settings.username,
                "连接数据库"
            );
            let conn = Conn::new(self.opts()).map_err(|e| {
                SlowlogError::database_error(format!(
                    "连接 {}:{} 失败: {e}",
                    self.address(),
                    self.settings.port
                ))
            })?;
            self.conn = Some(conn);
        }
        self.conn
            .as_mut()
            .ok_or_else(|| SlowlogError::other("数据库连接为空"))
    }
}

impl VariableSource for MysqlVariables {
    fn global_variables(&mut self) -> Result<Vec<(String, String)>> {
        let rows = self
            .connection()?
            .query::<(String, Option<String>), _>("SHOW GLOBAL VARIABLES");

        match rows {
            Ok(rows) => {
                #[cfg(feature = "logging")]
                tracing::debug!(count = rows.len(), "读取全局变量完成");
                Ok(rows
                    .into_iter()
                    .map(|(name, value)| (name, value.unwrap_or_default()))
                    .collect())
            }
            Err(e) => {
                // 连接可能已经失效，下次重新建立
                self.conn = None;
                Err(SlowlogError::database_error(format!(
                    "SHOW GLOBAL VARIABLES 执行失败 ({}): {e}",
                    self.address()
                )))
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        if self.conn.take().is_some() {
            #[cfg(feature = "logging")]
            tracing::debug!(address = self.address(), "关闭数据库连接");
        }
        Ok(())
    }
}
