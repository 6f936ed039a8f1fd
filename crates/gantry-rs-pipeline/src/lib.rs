//! The gantry request pipeline.
//!
//! This crate provides the moving parts of a gantry application:
//!
//! * [`Handler`] and [`HandlerChain`] — named async steps and the ordered
//!   chains routes execute.
//! * [`RequestContext`] — per-request state with a chain cursor, the
//!   write-once terminal response, and error accumulation.
//! * [`Router`] — the route tree, with branch-local middleware and
//!   postware deduplicated by handler name at boot.
//! * [`Controller`] — `"METHOD /path"` spec-string registration.
//! * [`App`] — settings-driven assembly, compilation onto [`axum`], and
//!   serving.
//! * [`middleware`] — the built-in CORS, throttle, timeout, access-log and
//!   status handlers.

pub mod middleware;

mod app;
mod context;
mod controller;
mod dispatch;
mod error;
mod handler;
mod router;

pub use app::App;
pub use context::RequestContext;
pub use controller::{Controller, Scope};
pub use error::BootError;
pub use handler::{Handler, HandlerChain, HandlerFuture, HandlerResult, Middleware};
pub use router::{Router, MAX_CHAIN_HANDLERS};
