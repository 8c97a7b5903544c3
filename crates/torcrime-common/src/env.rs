//! Environment variable helpers
//!
//! Settings are read from the process environment (after `.env` has been
//! loaded by the binary). An unset or blank variable falls back to the
//! caller's default; a set but unparseable variable is an error rather than a
//! silent fallback.

use std::str::FromStr;

use crate::error::{CommonError, Result};

/// Read a string variable, treating blank values as unset
pub fn var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Read a string variable or fall back to `default`
pub fn var_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|| default.to_string())
}

/// Parse a variable into `T`, falling back to `default` when unset
pub fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| CommonError::invalid_setting(key, raw, std::any::type_name::<T>())),
        None => Ok(default),
    }
}

/// Parse a boolean flag, accepting `true/false`, `1/0`, `yes/no`, `on/off`
pub fn flag_or(key: &str, default: bool) -> Result<bool> {
    match var(key) {
        Some(raw) => match raw.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(CommonError::invalid_setting(key, raw, "a boolean")),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_parse_or_uses_default_when_unset() {
        std::env::remove_var("TORCRIME_TEST_NUMBER");
        assert_eq!(parse_or("TORCRIME_TEST_NUMBER", 7usize).unwrap(), 7);
    }

    #[test]
    #[serial]
    fn test_parse_or_rejects_garbage() {
        std::env::set_var("TORCRIME_TEST_NUMBER", "seven");
        let err = parse_or("TORCRIME_TEST_NUMBER", 7usize).unwrap_err();
        assert!(matches!(err, CommonError::InvalidSetting { .. }));
        std::env::remove_var("TORCRIME_TEST_NUMBER");
    }

    #[test]
    #[serial]
    fn test_blank_value_is_unset() {
        std::env::set_var("TORCRIME_TEST_STRING", "   ");
        assert_eq!(var("TORCRIME_TEST_STRING"), None);
        assert_eq!(var_or("TORCRIME_TEST_STRING", "fallback"), "fallback");
        std::env::remove_var("TORCRIME_TEST_STRING");
    }

    #[test]
    #[serial]
    fn test_flag_or() {
        std::env::set_var("TORCRIME_TEST_FLAG", "Yes");
        assert!(flag_or("TORCRIME_TEST_FLAG", false).unwrap());
        std::env::set_var("TORCRIME_TEST_FLAG", "off");
        assert!(!flag_or("TORCRIME_TEST_FLAG", true).unwrap());
        std::env::set_var("TORCRIME_TEST_FLAG", "maybe");
        assert!(flag_or("TORCRIME_TEST_FLAG", true).is_err());
        std::env::remove_var("TORCRIME_TEST_FLAG");
    }
}
