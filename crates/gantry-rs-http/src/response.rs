//! Composable HTTP response values.
//!
//! A [`Response`] is a partially-specified answer: status, headers, and a
//! JSON body may each be set or left unset, and two responses compose into
//! one under an explicit replace/keep-existing policy. The pipeline merges
//! handler responses onto mapper defaults this way, so a handler only ever
//! states what it wants to override.

use axum::response::IntoResponse;
use http::header::{HeaderName, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, StatusCode};
use serde_json::Value;

use crate::body;

/// A partially-specified HTTP response.
///
/// An unset status composes to the other side's status and finally defaults
/// to 200. Composition never mutates the argument; it folds the argument's
/// fields into `self` under the given policy.
///
/// # Examples
///
/// ```
/// use gantry_rs_http::Response;
/// use http::StatusCode;
/// use serde_json::json;
///
/// let mut res = Response::default().with_body(json!({ "a": 1 }));
/// let defaults = Response::new(StatusCode::OK).with_body(json!({ "a": 2, "b": 3 }));
///
/// res.compose(&defaults, false);
/// assert_eq!(res.effective_status(), StatusCode::OK);
/// assert_eq!(res.body(), &json!({ "a": 1, "b": 3 }));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Response {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Value,
}

impl Response {
    /// Creates a response with an explicit status and no body.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status: Some(status),
            headers: HeaderMap::new(),
            body: Value::Null,
        }
    }

    /// A `200 OK` response with no body.
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// A `204 No Content` response.
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    /// Sets the status.
    #[must_use]
    pub const fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Adds a header. Invalid names or values are dropped with a debug log
    /// rather than failing the response.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    /// Adds a header in place; see [`Response::with_header`].
    pub fn set_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => {
                tracing::debug!(target: "gantry::response", name, value, "invalid header dropped");
            }
        }
    }

    /// The explicit status, if one was set.
    pub const fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The status this response resolves to: the explicit status or 200.
    pub fn effective_status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub const fn body(&self) -> &Value {
        &self.body
    }

    /// Composes `other` into `self` under the replace/keep-existing policy.
    ///
    /// With `replace_exist = false`, fields already set on `self` win and
    /// `other` only fills gaps; with `replace_exist = true`, fields set on
    /// `other` win. Bodies merge recursively (see [`body::merge`]), headers
    /// merge per key.
    pub fn compose(&mut self, other: &Self, replace_exist: bool) {
        if let Some(status) = other.status {
            if self.status.is_none() || replace_exist {
                self.status = Some(status);
            }
        }

        for (name, value) in &other.headers {
            if replace_exist || !self.headers.contains_key(name) {
                self.headers.insert(name.clone(), value.clone());
            }
        }

        body::merge(&mut self.body, &other.body, replace_exist);
    }

    /// Folds a body fragment into this response; fragment fields win,
    /// existing fields fill gaps.
    pub fn compose_body(&mut self, fragment: &Value) {
        body::merge(&mut self.body, fragment, true);
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let status = self.effective_status();
        let mut headers = self.headers;
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        let bytes = if self.body.is_null() {
            Vec::new()
        } else {
            serde_json::to_vec(&self.body).unwrap_or_else(|e| {
                tracing::debug!(target: "gantry::response", error = %e, "body serialization failed");
                Vec::new()
            })
        };

        (status, headers, bytes).into_response()
    }
}
