//! The inbound request.
//!
//! [`Request`] is a transport-agnostic view over what the engine received:
//! method, URI, headers, matched path parameters, and the collected body.
//! Typed query accessors mirror the toolkit's query parser: an absent key
//! is `None`, a present but malformed value is a bad-request error.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use serde::de::DeserializeOwned;

use gantry_rs_core::AppError;

use crate::codes;

/// One inbound HTTP request as seen by handlers.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: HashMap<String, String>,
    body: Bytes,
}

impl Request {
    /// Builds a request from engine request parts and the collected body.
    pub fn from_parts(
        parts: http::request::Parts,
        params: HashMap<String, String>,
        body: Bytes,
    ) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            params,
            body,
        }
    }

    /// A builder for constructing requests by hand, mostly in tests.
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    pub const fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn query_string(&self) -> &str {
        self.uri.query().unwrap_or("")
    }

    /// A header value as a string, when present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A matched path parameter (`:id` in the route spec).
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Deserializes the body as JSON into `T`; failures are bad-request
    /// errors carrying the deserializer message.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| AppError::from_error(e).with_code(codes::BAD_REQUEST))
    }

    /// The first value for a query key, if present.
    pub fn query(&self, key: &str) -> Option<String> {
        url::form_urlencoded::parse(self.query_string().as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Like [`Request::query`], but an absent key is a bad-request error.
    pub fn query_required(&self, key: &str) -> Result<String, AppError> {
        self.query(key).ok_or_else(|| {
            AppError::new(codes::BAD_REQUEST, format!("qs: {key} is required"))
        })
    }

    /// A query value parsed as an integer; absent is `None`, malformed is a
    /// bad-request error.
    pub fn query_int(&self, key: &str) -> Result<Option<i64>, AppError> {
        self.query(key)
            .map(|raw| {
                raw.parse::<i64>().map_err(|_| {
                    AppError::new(codes::BAD_REQUEST, format!("qs: {key} is not an integer"))
                })
            })
            .transpose()
    }

    /// A query value parsed as a bool; absent is `None`, malformed is a
    /// bad-request error.
    pub fn query_bool(&self, key: &str) -> Result<Option<bool>, AppError> {
        self.query(key)
            .map(|raw| {
                gantry_rs_core::parse::parse_bool(&raw).map_err(|_| {
                    AppError::new(codes::BAD_REQUEST, format!("qs: {key} is not a bool"))
                })
            })
            .transpose()
    }

    /// The client address as reported by the reverse proxy
    /// (`X-Forwarded-For` first hop, then `X-Real-IP`), or `"unknown"`.
    pub fn client_ip(&self) -> String {
        if let Some(forwarded) = self.header("x-forwarded-for") {
            if let Some(first) = forwarded.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
        self.header("x-real-ip")
            .map_or_else(|| "unknown".to_string(), ToString::to_string)
    }
}

/// Builder for [`Request`] values.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    params: HashMap<String, String>,
    body: Bytes,
}

impl RequestBuilder {
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the request target, including an optional query string.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.uri = path.parse().ok();
        self
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    #[must_use]
    pub fn param(mut self, name: &str, value: &str) -> Self {
        self.params.insert(name.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Request {
        Request {
            method: self.method.unwrap_or(Method::GET),
            uri: self.uri.unwrap_or_else(|| Uri::from_static("/")),
            headers: self.headers,
            params: self.params,
            body: self.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_builder_defaults() {
        let req = Request::builder().build();
        assert_eq!(req.method(), &Method::GET);
        assert_eq!(req.path(), "/");
        assert!(req.body().is_empty());
    }

    #[test]
    fn test_query_accessors() {
        let req = Request::builder()
            .path("/search?q=gantry&page=2&all=true")
            .build();

        assert_eq!(req.query("q").as_deref(), Some("gantry"));
        assert_eq!(req.query_int("page").unwrap(), Some(2));
        assert_eq!(req.query_bool("all").unwrap(), Some(true));
        assert_eq!(req.query_int("missing").unwrap(), None);
        assert!(req.query_int("q").is_err());
        assert!(req.query_required("missing").is_err());
    }

    #[test]
    fn test_param_lookup() {
        let req = Request::builder().param("id", "42").build();
        assert_eq!(req.param("id"), Some("42"));
        assert_eq!(req.param("other"), None);
    }

    #[test]
    fn test_json_body() {
        #[derive(Debug, Deserialize)]
        struct Payload {
            name: String,
        }

        let req = Request::builder().body(r#"{"name":"ada"}"#).build();
        let payload: Payload = req.json().unwrap();
        assert_eq!(payload.name, "ada");

        let bad = Request::builder().body("not json").build();
        let err = bad.json::<Payload>().unwrap_err();
        assert_eq!(err.code(), codes::BAD_REQUEST);
    }

    #[test]
    fn test_client_ip_prefers_forwarded_for() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.9, 10.0.0.1")
            .header("x-real-ip", "10.0.0.2")
            .build();
        assert_eq!(req.client_ip(), "203.0.113.9");

        let req = Request::builder().header("x-real-ip", "10.0.0.2").build();
        assert_eq!(req.client_ip(), "10.0.0.2");

        let req = Request::builder().build();
        assert_eq!(req.client_ip(), "unknown");
    }
}
