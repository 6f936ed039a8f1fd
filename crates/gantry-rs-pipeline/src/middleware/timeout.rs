//! Request deadlines.
//!
//! The remaining chain runs inside [`tokio::time::timeout`]; when the
//! deadline fires the downstream future is dropped, which cancels any work
//! still pending, and the request resolves to a `408` outcome.

use std::time::Duration;

use async_trait::async_trait;

use gantry_rs_core::AppError;
use gantry_rs_http::codes;

use crate::context::RequestContext;
use crate::handler::{HandlerResult, Middleware};

#[derive(Debug)]
pub struct Timeout {
    duration: Duration,
}

impl Timeout {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

#[async_trait]
impl Middleware for Timeout {
    fn name(&self) -> &str {
        "gantry::middleware::timeout"
    }

    async fn handle(&self, ctx: &mut RequestContext) -> HandlerResult {
        let outcome = tokio::time::timeout(self.duration, ctx.next()).await;
        match outcome {
            Ok(result) => result,
            Err(_elapsed) => {
                tracing::warn!(
                    target: "gantry::timeout",
                    path = ctx.request().path(),
                    timeout = ?self.duration,
                    "request exceeded its deadline"
                );
                Err(AppError::new(codes::REQUEST_TIMEOUT, "request timed out"))
            }
        }
    }
}
