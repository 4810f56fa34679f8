use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit pattern is valid"));

/// Normalize a macro field to a non-negative integer.
///
/// Numbers are truncated toward zero and clamped at zero. Strings yield their
/// first run of digits (`"12g"` → 12, `"150 kcal"` → 150, `"12.5g"` → 12).
/// Anything without digits becomes 0.
///
/// Never fails: an unreadable label contributes nothing to a plate.
pub fn parse_macro(value: &Value) -> u32 {
    match value {
        Value::Number(n) => match n.as_u64() {
            Some(v) => u32::try_from(v).unwrap_or(u32::MAX),
            None => n.as_f64().map(clamp_float).unwrap_or(0),
        },
        Value::String(s) => parse_macro_str(s),
        _ => 0,
    }
}

/// String half of [`parse_macro`].
pub fn parse_macro_str(raw: &str) -> u32 {
    DIGIT_RUN
        .find(raw)
        .map(|m| m.as_str().parse::<u32>().unwrap_or(u32::MAX))
        .unwrap_or(0)
}

fn clamp_float(v: f64) -> u32 {
    if !v.is_finite() || v <= 0.0 {
        0
    } else if v >= u32::MAX as f64 {
        u32::MAX
    } else {
        v.trunc() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unit_suffixed_strings() {
        assert_eq!(parse_macro(&json!("12g")), 12);
        assert_eq!(parse_macro(&json!("150 kcal")), 150);
        assert_eq!(parse_macro(&json!("12.5g")), 12);
        assert_eq!(parse_macro(&json!("<1g")), 1);
    }

    #[test]
    fn test_no_digits_is_zero() {
        assert_eq!(parse_macro(&json!("")), 0);
        assert_eq!(parse_macro(&json!("N/A")), 0);
        assert_eq!(parse_macro(&Value::Null), 0);
        assert_eq!(parse_macro(&json!(true)), 0);
        assert_eq!(parse_macro(&json!(["12g"])), 0);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_macro(&json!(250)), 250);
        assert_eq!(parse_macro(&json!(7.9)), 7);
        assert_eq!(parse_macro(&json!(-4)), 0);
        assert_eq!(parse_macro(&json!(-4.5)), 0);
    }

    #[test]
    fn test_overflow_saturates() {
        assert_eq!(parse_macro(&json!("99999999999999999999g")), u32::MAX);
        assert_eq!(parse_macro(&json!(1e12)), u32::MAX);
        assert_eq!(parse_macro(&json!(10_000_000_000u64)), u32::MAX);
    }
}
