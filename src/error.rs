//! 错误类型定义
//!
//! 这个模块定义了库中使用的所有错误类型，使用 thiserror 提供丰富的错误信息。
//!
//! 解析核心本身不会失败：截断的日志被丢弃，未知头部行被忽略。
//! 这里的错误来自配置、参数校验以及远程命令 / 数据库这两个外部协作方。

/// 慢查询日志采集的结果类型
pub type Result<T> = std::result::Result<T, SlowlogError>;

/// 慢查询日志采集错误类型
#[derive(Debug, thiserror::Error)]
pub enum SlowlogError {
    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// 配置文件解析错误
    #[error("配置文件解析错误: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// JSON 序列化错误
    #[error("JSON 序列化错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 非法输入（主机名、变量名等），在调用外部命令之前被拒绝
    #[error("非法输入: {message}")]
    InvalidInput { message: String },

    /// 远程命令执行失败
    #[error("命令执行失败 `{command}`: {message}")]
    Transport { command: String, message: String },

    /// 数据库变量读取失败
    #[error("数据库错误: {message}")]
    Database { message: String },

    /// 日志错误（仅在启用 logging feature 时可用）
    #[cfg(feature = "logging")]
    #[error("日志错误: {0}")]
    Log(#[from] crate::logging::LogError),

    /// 其他错误
    #[error("未知错误: {0}")]
    Other(String),
}

impl SlowlogError {
    /// 创建一个配置错误
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        #[cfg(feature = "logging")]
        tracing::error!("配置错误: {}", message);
        Self::Config(message)
    }

    /// 创建一个非法输入错误
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        #[cfg(feature = "logging")]
        tracing::error!("非法输入: {}", message);
        Self::InvalidInput { message }
    }

    /// 创建一个命令执行错误
    pub fn transport_error<C: Into<String>, M: Into<String>>(
        command: C,
        message: M,
    ) -> Self {
        let command = command.into();
        let message = message.into();
        #[cfg(feature = "logging")]
        tracing::error!("命令执行失败 `{}`: {}", command, message);
        Self::Transport { command, message }
    }

    /// 创建一个数据库错误
    pub fn database_error<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        #[cfg(feature = "logging")]
        tracing::error!("数据库错误: {}", message);
        Self::Database { message }
    }

    /// 创建一个其他类型错误
    pub fn other<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        #[cfg(feature = "logging")]
        tracing::error!("未知错误: {}", message);
        Self::Other(message)
    }

    /// 检查是否为 IO 错误
    pub fn is_io_error(&self) -> bool {
        matches!(self, SlowlogError::Io(_))
    }

    /// 检查是否为配置错误（包括配置文件解析失败）
    pub fn is_config_error(&self) -> bool {
        matches!(self, SlowlogError::Config(_) | SlowlogError::TomlDe(_))
    }

    /// 检查是否为非法输入错误
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, SlowlogError::InvalidInput { .. })
    }

    /// 检查是否为命令执行错误
    pub fn is_transport_error(&self) -> bool {
        matches!(self, SlowlogError::Transport { .. })
    }

    /// 检查是否为数据库错误
    pub fn is_database_error(&self) -> bool {
        matches!(self, SlowlogError::Database { .. })
    }

    /// 检查是否为外部协作方（命令执行 / 数据库）错误
    pub fn is_collaborator_error(&self) -> bool {
        self.is_transport_error() || self.is_database_error()
    }

    /// 检查是否为其他错误
    pub fn is_other_error(&self) -> bool {
        matches!(self, SlowlogError::Other(_))
    }
}
