//! Structured application errors.
//!
//! [`AppError`] is the error value that flows through a request: a short
//! application code (resolved to an HTTP response by the response mapper),
//! a human message, an optional underlying cause, arbitrary JSON metadata,
//! and a call-stack snapshot captured at creation time. [`ErrorOutcome`] is
//! the closed set of things a failed handler can hand to the send path.

use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

/// The code assigned to errors that were not given an explicit one.
pub const DEFAULT_ERROR_CODE: &str = "_";

/// A structured application error.
///
/// Carries an application code, a message, an optional source cause,
/// optional JSON metadata, and a backtrace snapshot. Once an `AppError` is
/// attached to a request context's error list it is never mutated again.
///
/// # Examples
///
/// ```
/// use gantry_rs_core::AppError;
///
/// let err = AppError::new("404", "user not found")
///     .with_meta(serde_json::json!({ "user_id": 42 }));
/// assert_eq!(err.code(), "404");
/// assert_eq!(err.to_string(), "user not found");
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct AppError {
    code: String,
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
    meta: Option<Value>,
    backtrace: StackSnapshot,
}

/// Owned call-stack snapshot.
///
/// Kept as a newtype so the error derive treats the field as opaque data
/// rather than wiring up nightly-only backtrace provision.
#[derive(Debug)]
struct StackSnapshot(Backtrace);

impl AppError {
    /// Creates an error with an explicit application code.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            source: None,
            meta: None,
            backtrace: StackSnapshot(Backtrace::capture()),
        }
    }

    /// Creates an error from a bare message, using [`DEFAULT_ERROR_CODE`].
    pub fn from_message(message: impl Into<String>) -> Self {
        Self::new(DEFAULT_ERROR_CODE, message)
    }

    /// Wraps an underlying error, keeping it as the source cause.
    pub fn from_error(err: impl StdError + Send + Sync + 'static) -> Self {
        let mut e = Self::from_message(err.to_string());
        e.source = Some(Box::new(err));
        e
    }

    /// Creates an error from a recovered panic payload message and the
    /// backtrace captured at recovery time.
    pub fn from_panic(message: impl Into<String>, backtrace: Backtrace) -> Self {
        Self {
            code: DEFAULT_ERROR_CODE.to_string(),
            message: message.into(),
            source: None,
            meta: None,
            backtrace: StackSnapshot(backtrace),
        }
    }

    /// Replaces the application code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Attaches JSON metadata.
    #[must_use]
    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// The application code, resolved by the response mapper.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The attached metadata, if any.
    pub const fn meta(&self) -> Option<&Value> {
        self.meta.as_ref()
    }

    /// The backtrace captured when the error was created.
    pub const fn backtrace(&self) -> &Backtrace {
        &self.backtrace.0
    }

    /// A JSON-safe representation of this error.
    ///
    /// Object metadata is flattened into the result; scalar metadata lands
    /// under a `meta` key. The rendered backtrace is included under
    /// `_stack` only when `debug` is true — client-facing serializations
    /// must never leak stacks in production.
    pub fn to_json(&self, debug: bool) -> Value {
        let mut out = Map::new();

        match &self.meta {
            Some(Value::Object(fields)) => {
                for (key, value) in fields {
                    out.insert(key.clone(), value.clone());
                }
            }
            Some(other) => {
                out.insert("meta".to_string(), other.clone());
            }
            None => {}
        }

        out.entry("message".to_string())
            .or_insert_with(|| Value::String(self.message.clone()));
        out.insert("code".to_string(), Value::String(self.code.clone()));

        if debug {
            let rendered = self.backtrace.0.to_string();
            let lines: Vec<Value> = rendered
                .lines()
                .map(|l| Value::String(l.trim().to_string()))
                .collect();
            out.insert("_stack".to_string(), Value::Array(lines));
        }

        Value::Object(out)
    }
}

/// What a failed handler can hand to the send path.
///
/// A closed tagged variant instead of dynamic dispatch on `dyn Any`: every
/// producer goes through one of the explicit constructors and the send path
/// resolves the outcome with an exhaustive match.
#[derive(Debug)]
pub enum ErrorOutcome {
    /// An already-structured application error.
    Structured(AppError),
    /// A bare message with no structure behind it.
    Message(String),
}

impl ErrorOutcome {
    /// Wraps a structured error as-is.
    pub const fn from_structured(err: AppError) -> Self {
        Self::Structured(err)
    }

    /// Wraps a bare message.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Wraps a generic error, preserving it as the structured cause.
    pub fn from_error(err: impl StdError + Send + Sync + 'static) -> Self {
        Self::Structured(AppError::from_error(err))
    }

    /// Resolves the outcome into a structured error.
    pub fn into_app_error(self) -> AppError {
        match self {
            Self::Structured(err) => err,
            Self::Message(message) => AppError::from_message(message),
        }
    }
}

impl From<AppError> for ErrorOutcome {
    fn from(err: AppError) -> Self {
        Self::Structured(err)
    }
}

impl From<String> for ErrorOutcome {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for ErrorOutcome {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl fmt::Display for ErrorOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured(err) => write!(f, "{err}"),
            Self::Message(message) => write!(f, "{message}"),
        }
    }
}
