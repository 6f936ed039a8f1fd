//! Explicit configuration for the toolkit.
//!
//! All configuration lives in the [`Settings`] struct and is injected into
//! constructors; there are no process-wide mutable defaults. Settings come
//! from [`Settings::default`], from the environment via
//! [`Settings::from_env`], or from a TOML document via
//! [`Settings::from_toml_str`] — the three can be layered by starting from
//! one and overriding fields.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::env::Env;
use crate::parse::ParseError;

/// Application identity served by the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub app_name: String,
    pub app_version: String,
    pub description: String,
}

impl Default for Meta {
    fn default() -> Self {
        Self {
            app_name: "Core".to_string(),
            app_version: "v0.1.0".to_string(),
            description: "Core API".to_string(),
        }
    }
}

/// Cross-origin resource sharing configuration.
///
/// `allow_origins: None` means wildcard: the request's `Origin` header is
/// reflected back. An explicit list is validated per request and a
/// mismatched origin receives the canonical forbidden response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_origins: Option<Vec<String>>,
    pub allow_methods: String,
    pub allow_headers: String,
    pub allow_credentials: bool,
    pub expose_headers: String,
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_origins: None,
            allow_methods: "GET,POST,PUT,DELETE,PATCH,OPTIONS".to_string(),
            allow_headers: "*".to_string(),
            allow_credentials: true,
            expose_headers: "authorization,content-type".to_string(),
            max_age_secs: 0,
        }
    }
}

/// Token-bucket throttling configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    pub enabled: bool,
    /// Bucket refill rate, in permitted events per second.
    pub max_per_sec: u32,
    /// Bucket capacity: the largest burst admitted at once.
    pub burst: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_per_sec: 1000,
            burst: 20,
        }
    }
}

/// The complete toolkit configuration.
///
/// # Examples
///
/// ```
/// use gantry_rs_core::Settings;
///
/// let settings = Settings {
///     port: 3000,
///     base_path: "/v1".to_string(),
///     ..Settings::default()
/// };
/// assert!(!settings.debug);
/// assert_eq!(settings.addr(), "0.0.0.0:3000");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Toggles stack traces in error bodies and pretty log output.
    pub debug: bool,
    pub host: String,
    pub port: u16,
    /// Path prefix mounted in front of every registered route.
    pub base_path: String,
    pub log_level: String,
    /// `"console"` forces pretty output even when `debug` is off.
    pub log_format: String,
    pub meta: Meta,
    /// Per-request deadline in milliseconds; `None` disables the timeout.
    pub request_timeout_ms: Option<u64>,
    pub cors: CorsConfig,
    pub throttle: ThrottleConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            host: "0.0.0.0".to_string(),
            port: 8080,
            base_path: "/".to_string(),
            log_level: "info".to_string(),
            log_format: String::new(),
            meta: Meta::default(),
            request_timeout_ms: None,
            cors: CorsConfig::default(),
            throttle: ThrottleConfig::default(),
        }
    }
}

impl Settings {
    /// Builds settings from the process environment on top of the defaults.
    ///
    /// Reads `DEBUG`, `HOST`, `PORT`, `BASE_PATH`, `LOG_LEVEL`,
    /// `LOG_FORMAT`, and `REQUEST_TIMEOUT_MS`. A set but malformed value is
    /// an error.
    pub fn from_env() -> Result<Self, ParseError> {
        let env = Env::new();
        let defaults = Self::default();

        let timeout = env.get_int("REQUEST_TIMEOUT_MS", 0)?;
        let port = env.get_int("PORT", i64::from(defaults.port))?;

        Ok(Self {
            debug: env.get_bool("DEBUG", defaults.debug)?,
            host: env.get_string("HOST", &defaults.host),
            port: u16::try_from(port)
                .map_err(|_| ParseError::OutOfRange { name: "PORT", value: port })?,
            base_path: env.get_string("BASE_PATH", &defaults.base_path),
            log_level: env.get_string("LOG_LEVEL", &defaults.log_level),
            log_format: env.get_string("LOG_FORMAT", &defaults.log_format),
            request_timeout_ms: if timeout > 0 {
                Some(timeout.unsigned_abs())
            } else {
                None
            },
            ..defaults
        })
    }

    /// Parses settings from a TOML document. Missing fields fall back to
    /// their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// The socket address to bind, from `host` and `port`.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The per-request deadline as a [`Duration`], if configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}
