//! The response mapper: application codes to canonical responses.
//!
//! The mapper is built once at setup, shared behind an `Arc`, and read
//! concurrently for the life of the process. Its contract is that the
//! pipeline can never fail to produce a response: the success and
//! internal-error accessors always resolve to *something*, falling back to
//! built-in `200`/`500` responses when nothing better is registered.

use std::collections::HashMap;

use http::StatusCode;
use serde_json::json;

use crate::codes;
use crate::response::Response;

/// Lookup options for [`ResponseMapper::get`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GetOptions {
    /// Fall back to the success response instead of the internal error when
    /// the code is unmapped.
    pub success: bool,
}

/// Constructor configuration for [`ResponseMapper`].
#[derive(Debug, Clone)]
pub struct ResponseMapperConfig {
    pub success_code: String,
    pub internal_error_code: String,
}

impl Default for ResponseMapperConfig {
    fn default() -> Self {
        Self {
            success_code: codes::SUCCESS.to_string(),
            internal_error_code: codes::INTERNAL_ERROR.to_string(),
        }
    }
}

/// Registry resolving application codes to canonical [`Response`] values.
///
/// # Examples
///
/// ```
/// use gantry_rs_http::{codes, Response, ResponseMapper};
/// use http::StatusCode;
///
/// let mut mapper = ResponseMapper::standard();
/// mapper.load([(
///     "user-not-found".to_string(),
///     Response::new(StatusCode::NOT_FOUND),
/// )]);
///
/// assert_eq!(
///     mapper.get("user-not-found", Default::default()).effective_status(),
///     StatusCode::NOT_FOUND,
/// );
/// // unmapped codes can never leave the pipeline without a response
/// assert_eq!(
///     mapper.get("999", Default::default()).effective_status(),
///     StatusCode::INTERNAL_SERVER_ERROR,
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ResponseMapper {
    responses: HashMap<String, Response>,
    success_code: String,
    internal_error_code: String,
    default_success: Response,
    default_internal_error: Response,
}

impl ResponseMapper {
    /// Creates an empty mapper with the given privileged codes.
    pub fn new(config: ResponseMapperConfig) -> Self {
        Self {
            responses: HashMap::new(),
            success_code: config.success_code,
            internal_error_code: config.internal_error_code,
            default_success: Response::new(StatusCode::OK),
            default_internal_error: Response::new(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Creates a mapper pre-loaded with the standard code set
    /// ([`codes`]): every standard code maps to its HTTP status with a
    /// minimal `{code, message}` body.
    pub fn standard() -> Self {
        let mut mapper = Self::new(ResponseMapperConfig::default());
        mapper.load(standard_responses());
        mapper
    }

    /// Bulk-registers code-to-response entries; the last write per code
    /// wins.
    pub fn load(&mut self, entries: impl IntoIterator<Item = (String, Response)>) {
        for (code, response) in entries {
            self.responses.insert(code, response);
        }
    }

    /// Resolves a code to its canonical response.
    ///
    /// On a miss, logs a debug diagnostic and falls back to
    /// [`ResponseMapper::get_success`] when `opts.success`, otherwise to
    /// [`ResponseMapper::get_internal_error`].
    pub fn get(&self, code: &str, opts: GetOptions) -> Response {
        self.responses.get(code).map_or_else(
            || {
                tracing::debug!(target: "gantry::mapper", code, "response code not mapped");
                if opts.success {
                    self.get_success()
                } else {
                    self.get_internal_error()
                }
            },
            Clone::clone,
        )
    }

    /// The canonical success response. Never absent: falls back to a bare
    /// `200` when the configured success code is empty or unmapped.
    pub fn get_success(&self) -> Response {
        self.get_privileged(&self.success_code, &self.default_success)
    }

    /// The canonical internal-error response. Never absent: falls back to a
    /// bare `500` when the configured code is empty or unmapped.
    pub fn get_internal_error(&self) -> Response {
        self.get_privileged(&self.internal_error_code, &self.default_internal_error)
    }

    /// The status the internal-error response resolves to, used by the send
    /// path to decide when to attach diagnostics and page the logger.
    pub fn internal_error_status(&self) -> StatusCode {
        self.get_internal_error().effective_status()
    }

    fn get_privileged(&self, code: &str, fallback: &Response) -> Response {
        if code.is_empty() {
            tracing::debug!(target: "gantry::mapper", "privileged code not configured");
            return fallback.clone();
        }

        self.responses.get(code).map_or_else(
            || {
                tracing::debug!(target: "gantry::mapper", code, "response code not mapped");
                fallback.clone()
            },
            Clone::clone,
        )
    }
}

fn standard_responses() -> Vec<(String, Response)> {
    let entry = |code: &str, status: StatusCode, message: &str| {
        (
            code.to_string(),
            Response::new(status).with_body(json!({
                "status": { "code": code, "message": message },
            })),
        )
    };

    vec![
        entry(codes::SUCCESS, StatusCode::OK, "success"),
        entry(codes::NO_CONTENT, StatusCode::NO_CONTENT, "success"),
        entry(codes::BAD_REQUEST, StatusCode::BAD_REQUEST, "bad request"),
        entry(codes::UNAUTHORIZED, StatusCode::UNAUTHORIZED, "unauthorized"),
        entry(codes::FORBIDDEN, StatusCode::FORBIDDEN, "forbidden"),
        entry(codes::NOT_FOUND, StatusCode::NOT_FOUND, "not found"),
        entry(
            codes::METHOD_NOT_ALLOWED,
            StatusCode::METHOD_NOT_ALLOWED,
            "method not allowed",
        ),
        entry(
            codes::REQUEST_TIMEOUT,
            StatusCode::REQUEST_TIMEOUT,
            "request timed out",
        ),
        entry(
            codes::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
            "too many requests",
        ),
        entry(
            codes::INTERNAL_ERROR,
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error",
        ),
        entry(codes::BAD_GATEWAY, StatusCode::BAD_GATEWAY, "bad gateway"),
    ]
}
