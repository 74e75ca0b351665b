//! 远程命令执行
//!
//! [`RemoteExec`] 是日志采集使用的命令执行通道：给定一条 shell 命令，
//! 返回其标准输出（无输出时为空字符串）。这里提供两个基于系统命令的实现：
//!
//! - [`SshExec`]：通过系统 `ssh` 客户端在数据库主机上执行，使用
//!   ControlMaster 在一次采集过程中复用同一条连接；
//! - [`LocalExec`]：在本机通过 `sh -c` 执行，适合采集程序与数据库同机部署。

use crate::aggregator::validate::validate_hostname;
use crate::config::SshSettings;
use crate::error::{Result, SlowlogError};
use std::path::PathBuf;
use std::process::{Command, Output};

/// 命令执行通道
pub trait RemoteExec {
    /// 执行一条 shell 命令，返回标准输出
    fn exec(&mut self, command: &str) -> Result<String>;

    /// 关闭通道，之后不应再调用 `exec`
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: RemoteExec + ?Sized> RemoteExec for Box<T> {
    fn exec(&mut self, command: &str) -> Result<String> {
        (**self).exec(command)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// ssh 连接失败时的退出码
const SSH_CONNECTION_FAILURE: i32 = 255;

/// 通过系统 ssh 客户端执行命令
#[derive(Debug)]
pub struct SshExec {
    hostname: String,
    settings: SshSettings,
    control_path: PathBuf,
    used: bool,
    closed: bool,
}

impl SshExec {
    /// 创建 ssh 执行通道，此时不会建立连接
    pub fn new(hostname: &str, settings: SshSettings) -> Result<Self> {
        validate_hostname(hostname)?;
        let control_path = std::env::temp_dir().join(format!(
            "slowlog-{}-{}.sock",
            std::process::id(),
            hostname
        ));
        Ok(Self {
            hostname: hostname.to_string(),
            settings,
            control_path,
            used: false,
            closed: false,
        })
    }

    /// 组装 ssh 的公共参数（不含远程命令）
    fn base_command(&self) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg("-p")
            .arg(self.settings.port.to_string())
            .arg("-o")
            .arg("BatchMode=yes")
            .arg("-o")
            .arg("ControlMaster=auto")
            .arg("-o")
            .arg(format!("ControlPath={}", self.control_path.display()))
            .arg("-o")
            .arg("ControlPersist=60");
        if let Some(identity) = &self.settings.identity_file {
            cmd.arg("-i").arg(identity);
        }
        for option in &self.settings.options {
            cmd.arg("-o").arg(option);
        }
        if let Some(user) = &self.settings.username {
            cmd.arg("-l").arg(user);
        }
        cmd.arg(&self.hostname);
        cmd
    }
}

impl RemoteExec for SshExec {
    fn exec(&mut self, command: &str) -> Result<String> {
        if self.closed {
            return Err(SlowlogError::transport_error(command, "ssh 连接已关闭"));
        }

        #[cfg(feature = "logging")]
        tracing::debug!(host = %self.hostname, command, "ssh 执行命令");

        let mut cmd = self.base_command();
        cmd.arg("--").arg(command);
        let output = run(&mut cmd, command)?;
        self.used = true;

        if output.status.code() == Some(SSH_CONNECTION_FAILURE) {
            return Err(SlowlogError::transport_error(
                command,
                format!(
                    "ssh 连接 {} 失败: {}",
                    self.hostname,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        stdout_of(&output, command)
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if !self.used {
            return Ok(());
        }

        let mut cmd = Command::new("ssh");
        cmd.arg("-o")
            .arg(format!("ControlPath={}", self.control_path.display()))
            .arg("-O")
            .arg("exit")
            .arg(&self.hostname);
        let output = run(&mut cmd, "ssh -O exit")?;
        if !output.status.success() {
            // 主连接可能已经因超时退出
            #[cfg(feature = "logging")]
            tracing::warn!(
                host = %self.hostname,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "关闭 ssh 主连接失败"
            );
        }
        Ok(())
    }
}

/// 在本机通过 `sh -c` 执行命令
#[derive(Debug, Default)]
pub struct LocalExec {
    closed: bool,
}

impl LocalExec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RemoteExec for LocalExec {
    fn exec(&mut self, command: &str) -> Result<String> {
        if self.closed {
            return Err(SlowlogError::transport_error(command, "执行通道已关闭"));
        }

        #[cfg(feature = "logging")]
        tracing::debug!(command, "本地执行命令");

        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        let output = run(&mut cmd, command)?;
        stdout_of(&output, command)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// 运行进程；无法启动时返回命令执行错误
fn run(cmd: &mut Command, command: &str) -> Result<Output> {
    cmd.output().map_err(|e| {
        SlowlogError::transport_error(command, format!("无法启动进程: {e}"))
    })
}

/// 取标准输出。
///
/// 非零退出码且没有任何输出、只有错误输出时视为执行失败；
/// 其余非零退出（例如 grep 没有匹配）只记录警告，由调用方根据输出判断。
fn stdout_of(output: &Output, command: &str) -> Result<String> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if output.stdout.is_empty() && !stderr.is_empty() {
            return Err(SlowlogError::transport_error(
                command,
                format!("退出码 {:?}: {stderr}", output.status.code()),
            ));
        }
        #[cfg(feature = "logging")]
        tracing::warn!(
            command,
            status = ?output.status.code(),
            stderr,
            "命令以非零状态退出"
        );
    }

    Ok(match String::from_utf8(output.stdout.clone()) {
        Ok(s) => s,
        Err(e) => {
            #[cfg(feature = "logging")]
            tracing::warn!(error = %e, "命令输出包含无效 UTF-8，按有损方式转换");
            #[cfg(not(feature = "logging"))]
            let _ = e;
            String::from_utf8_lossy(&output.stdout).into_owned()
        }
    })
}
