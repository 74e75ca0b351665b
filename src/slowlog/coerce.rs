//! 字段值类型推断

use crate::slowlog::types::FieldValue;

/// 将原始文本转换为带类型的值。
///
/// 规则按整个 token 判断：
/// - `^[0-9]+$` → `Integer`
/// - `^[0-9]+\.[0-9]+$` → `Float`
/// - 其他 → 原样保留为 `Text`
///
/// 超出 `u64` 范围的纯数字不会被截断，而是以 `Text` 保留全部数字。
#[must_use]
pub fn coerce(token: &str) -> FieldValue {
    if is_digits(token) {
        return match token.parse::<u64>() {
            Ok(v) => FieldValue::Integer(v),
            Err(_) => {
                #[cfg(feature = "logging")]
                tracing::debug!(token, "整数超出 u64 范围，按文本保留");
                FieldValue::Text(token.to_string())
            }
        };
    }

    if let Some((int_part, frac_part)) = token.split_once('.') {
        if is_digits(int_part) && is_digits(frac_part) {
            if let Ok(v) = token.parse::<f64>() {
                return FieldValue::Float(v);
            }
        }
    }

    FieldValue::Text(token.to_string())
}

/// 非空且全部为 ASCII 数字
#[inline]
fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
