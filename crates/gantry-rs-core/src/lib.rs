//! Core types for the gantry toolkit.
//!
//! This crate holds everything the HTTP pipeline depends on but that is not
//! itself HTTP: the structured application error ([`AppError`]), the panic
//! guard that converts unwinds into errors ([`guard`]), the explicit
//! [`Settings`] configuration struct, environment/string parsing helpers,
//! and [`tracing`]-based logging setup.

pub mod env;
pub mod error;
pub mod guard;
pub mod logging;
pub mod parse;
pub mod settings;

pub use error::{AppError, ErrorOutcome, DEFAULT_ERROR_CODE};
pub use guard::{catch_panic, try_catch_finally, CaughtPanic};
pub use settings::{CorsConfig, Meta, Settings, ThrottleConfig};
