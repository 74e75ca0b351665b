//! 参数校验与 shell 转义
//!
//! 所有拼进 shell 命令的外部输入都要先经过这里，非法输入在到达
//! 命令执行方之前就被拒绝。

use crate::error::{Result, SlowlogError};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"\A[0-9a-zA-Z_\-]+\z").unwrap();
    static ref HOSTNAME_RE: Regex = Regex::new(r"\A[0-9a-zA-Z_.\-]+\z").unwrap();
}

/// 校验一组标识符（变量名、用户名等），只允许字母、数字、`_` 和 `-`
pub fn validate_identifiers(components: &[&str]) -> Result<()> {
    let invalids: Vec<&str> = components
        .iter()
        .copied()
        .filter(|c| !IDENTIFIER_RE.is_match(c))
        .collect();

    if invalids.is_empty() {
        Ok(())
    } else {
        Err(SlowlogError::invalid_input(format!("非法的绑定变量: {invalids:?}")))
    }
}

/// 校验主机名，不允许以 `-` 开头，避免被当成 ssh 选项
pub fn validate_hostname(hostname: &str) -> Result<()> {
    if HOSTNAME_RE.is_match(hostname) && !hostname.starts_with('-') {
        Ok(())
    } else {
        Err(SlowlogError::invalid_input(format!("非法的主机名: {hostname:?}")))
    }
}

/// 用单引号包裹，使任意字符串都能作为一个 shell 参数
#[must_use]
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
