//! Errors raised while assembling or serving an application. These are all
//! boot-time faults; request-time failures travel as
//! [`AppError`](gantry_rs_core::AppError) values instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootError {
    #[error("handler spec cannot be empty")]
    EmptySpec,

    #[error("unknown handler spec `{0}`, expected `METHOD /path`")]
    UnknownSpec(String),

    #[error("method `{0}` cannot be routed")]
    UnsupportedMethod(String),

    #[error("route `{path}` compacts to {count} handlers, above the limit of {limit}")]
    TooManyHandlers {
        path: String,
        count: usize,
        limit: usize,
    },

    #[error("failed to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Serve(#[source] std::io::Error),
}
