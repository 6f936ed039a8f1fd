//! Typed access to environment variables.
//!
//! A thin reader over process environment variables with per-type accessors
//! and explicit defaults. An unset variable yields the default; a set but
//! malformed variable is an error, so typos in deployments fail loudly
//! instead of silently running with fallback values.

use crate::parse::{self, ParseError};

/// Reads typed configuration values from the process environment.
///
/// # Examples
///
/// ```
/// use gantry_rs_core::env::Env;
///
/// std::env::set_var("GANTRY_DOC_PORT", "9090");
/// let env = Env::new();
/// assert_eq!(env.get_int("GANTRY_DOC_PORT", 8080).unwrap(), 9090);
/// assert_eq!(env.get_int("GANTRY_DOC_MISSING", 8080).unwrap(), 8080);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Env;

impl Env {
    pub const fn new() -> Self {
        Self
    }

    fn get(self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }

    /// Returns the variable's value, or `default` when unset or empty.
    pub fn get_string(self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Returns the variable parsed as an integer, or `default` when unset.
    pub fn get_int(self, key: &str, default: i64) -> Result<i64, ParseError> {
        match self.get(key) {
            Some(raw) => Ok(raw.trim().parse()?),
            None => Ok(default),
        }
    }

    /// Returns the variable parsed as a bool, or `default` when unset.
    pub fn get_bool(self, key: &str, default: bool) -> Result<bool, ParseError> {
        match self.get(key) {
            Some(raw) => parse::parse_bool(&raw),
            None => Ok(default),
        }
    }

    /// Returns the variable split as a comma-separated list, or `default`
    /// when unset.
    pub fn get_string_list(self, key: &str, default: &[&str]) -> Vec<String> {
        match self.get(key) {
            Some(raw) => parse::parse_list(&raw),
            None => default.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}
