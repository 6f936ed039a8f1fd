//! # gantry-rs
//!
//! An HTTP server toolkit built around named handler chains.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient
//! access. Depend on `gantry-rs` to get the whole toolkit, or on the
//! individual crates for finer-grained control.
//!
//! ## Quick start
//!
//! ```no_run
//! use gantry_rs::core::Settings;
//! use gantry_rs::http::{Response, ResponseMapper};
//! use gantry_rs::pipeline::{App, Handler, HandlerFuture, RequestContext};
//! use serde_json::json;
//!
//! fn hello(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
//!     Box::pin(async move { Ok(Some(Response::ok().with_body(json!({ "data": "hello" })))) })
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gantry_rs::pipeline::BootError> {
//!     let settings = Settings::from_env().unwrap_or_default();
//!     gantry_rs::core::logging::setup_logging(&settings);
//!     let mut app = App::new(settings, ResponseMapper::standard())?;
//!     app.controller().handle("GET /hello", Handler::new(hello))?;
//!     app.run().await
//! }
//! ```

/// Core types: settings, the structured error, the panic guard, logging.
pub use gantry_rs_core as core;

/// HTTP values: composable responses, the response mapper, requests.
pub use gantry_rs_http as http;

/// The pipeline: handler chains, the router tree, the app server.
pub use gantry_rs_pipeline as pipeline;

pub use gantry_rs_core::{AppError, ErrorOutcome, Settings};
pub use gantry_rs_http::{Response, ResponseMapper};
pub use gantry_rs_pipeline::{App, Handler, HandlerChain, Middleware, RequestContext};

// Third-party re-exports for user convenience
pub use async_trait::async_trait;
pub use axum;
pub use serde_json;
pub use tokio;
pub use tracing;
