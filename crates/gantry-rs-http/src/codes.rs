//! Standard application codes used by the response mapper.
//!
//! Codes are strings on purpose: applications register their own vocabulary
//! ("E-1042", "user-not-found") next to these, and the mapper treats them
//! all uniformly. The standard set mirrors the HTTP statuses the built-in
//! responses cover.

pub const SUCCESS: &str = "200";
pub const NO_CONTENT: &str = "204";
pub const BAD_REQUEST: &str = "400";
pub const UNAUTHORIZED: &str = "401";
pub const FORBIDDEN: &str = "403";
pub const NOT_FOUND: &str = "404";
pub const METHOD_NOT_ALLOWED: &str = "405";
pub const REQUEST_TIMEOUT: &str = "408";
pub const TOO_MANY_REQUESTS: &str = "429";
pub const INTERNAL_ERROR: &str = "500";
pub const BAD_GATEWAY: &str = "502";
