//! 日志初始化和配置模块
//!
//! 这个模块提供了统一的日志初始化功能，使用 tracing 库。
//! 默认配置：info 级别，输出到控制台和 logs 目录，按天滚动。

use std::io;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// 日志配置结构体
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// 日志级别
    pub level: Level,
    /// 日志文件目录
    pub log_dir: PathBuf,
    /// 是否输出到控制台
    pub enable_stdout: bool,
}

impl LogConfig {
    /// 创建新的日志配置，使用默认值
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置日志级别
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// 设置日志文件目录
    pub fn log_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// 设置是否输出到控制台
    pub fn enable_stdout(mut self, enable: bool) -> Self {
        self.enable_stdout = enable;
        self
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            log_dir: PathBuf::from("logs"),
            enable_stdout: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),
    #[error("日志配置错误: {0}")]
    Config(String),
    #[error("日志初始化错误: {0}")]
    Init(String),
}

/// 日志初始化结果
pub type LogResult<T> = Result<T, LogError>;

/// 解析日志级别字符串（trace / debug / info / warn / error）
pub fn parse_level(level: &str) -> LogResult<Level> {
    level
        .parse::<Level>()
        .map_err(|_| LogError::Config(format!("无效的日志级别: {level}")))
}

/// 初始化日志系统
///
/// - 控制台输出（可关闭）
/// - `log_dir` 目录下按天滚动的 `slowlog` 文件
/// - 环境变量 `RUST_LOG` 优先于配置的级别
///
/// 重复初始化不视为错误。
///
/// # Examples
///
/// ```no_run
/// use slowlog_collector::logging::{init_logging, LogConfig};
/// use tracing::Level;
///
/// let config = LogConfig::new().level(Level::DEBUG).log_dir("logs");
/// init_logging(config).unwrap();
/// ```
pub fn init_logging(config: LogConfig) -> LogResult<()> {
    std::fs::create_dir_all(&config.log_dir)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let subscriber = Registry::default().with(env_filter);

    let console_layer = config.enable_stdout.then(|| {
        fmt::layer()
            .with_writer(io::stderr)
            .with_timer(SystemTime)
            .with_target(true)
            .with_thread_ids(true)
            .with_ansi(true)
    });

    let file_appender =
        tracing_appender::rolling::daily(&config.log_dir, "slowlog");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_timer(SystemTime)
        .with_target(true)
        .with_thread_ids(true)
        .with_ansi(false);

    match subscriber.with(console_layer).with(file_layer).try_init() {
        Ok(()) => {
            // guard 被释放后文件输出会停止，进程内保持存活
            std::mem::forget(guard);
            tracing::info!(
                log_dir = %config.log_dir.display(),
                "日志系统初始化完成"
            );
            Ok(())
        }
        // 已经初始化过了
        Err(_) => Ok(()),
    }
}

/// 使用默认配置初始化日志系统
///
/// ```no_run
/// use slowlog_collector::logging::init_default_logging;
///
/// init_default_logging().unwrap();
/// ```
pub fn init_default_logging() -> LogResult<()> {
    init_logging(LogConfig::default())
}
