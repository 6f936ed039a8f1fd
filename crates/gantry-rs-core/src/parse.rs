//! String parsing helpers for configuration values.
//!
//! Environment variables arrive as strings; these helpers convert them to
//! the types settings need, with the permissive bool spellings and
//! comma-separated list convention the toolkit has always accepted.

use thiserror::Error;

/// A configuration value that could not be parsed.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The value is not one of the accepted bool spellings.
    #[error("`{0}` cannot be converted to bool")]
    InvalidBool(String),

    /// The value is not an integer.
    #[error("invalid integer: {0}")]
    InvalidInt(#[from] std::num::ParseIntError),

    /// The value is an integer but does not fit the target type.
    #[error("`{value}` is out of range for {name}")]
    OutOfRange { name: &'static str, value: i64 },
}

/// Parses `"true"`/`"True"`/`"TRUE"`/`"1"` (and the `false` spellings).
pub fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" | "True" | "TRUE" | "1" => Ok(true),
        "false" | "False" | "FALSE" | "0" => Ok(false),
        other => Err(ParseError::InvalidBool(other.to_string())),
    }
}

/// Splits a comma-separated value into trimmed items.
pub fn parse_list(value: &str) -> Vec<String> {
    value.split(',').map(|v| v.trim().to_string()).collect()
}

/// Parses a comma-separated list of integers.
pub fn parse_int_list(value: &str) -> Result<Vec<i64>, ParseError> {
    value
        .split(',')
        .map(|v| v.trim().parse::<i64>().map_err(ParseError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool_spellings() {
        for v in ["true", "True", "TRUE", "1"] {
            assert!(parse_bool(v).unwrap());
        }
        for v in ["false", "False", "FALSE", "0"] {
            assert!(!parse_bool(v).unwrap());
        }
        assert!(parse_bool("yes").is_err());
        assert!(parse_bool("").is_err());
    }

    #[test]
    fn test_parse_list_trims() {
        assert_eq!(parse_list("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_list("solo"), vec!["solo"]);
    }

    #[test]
    fn test_parse_int_list() {
        assert_eq!(parse_int_list("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert!(parse_int_list("1,x").is_err());
    }
}
