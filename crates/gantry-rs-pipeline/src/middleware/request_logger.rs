//! Access logging for every request that reaches a route.

use std::time::Instant;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::handler::{HandlerResult, Middleware};

#[derive(Debug, Default)]
pub struct RequestLogger;

impl RequestLogger {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Middleware for RequestLogger {
    fn name(&self) -> &str {
        "gantry::middleware::request_logger"
    }

    async fn handle(&self, ctx: &mut RequestContext) -> HandlerResult {
        let started = Instant::now();
        let client_ip = ctx.request().client_ip();
        let method = ctx.request().method().to_string();
        let path = ctx.request().path().to_owned();

        let result = ctx.next().await;

        let status = ctx
            .response_status()
            .map_or(0, |status| u32::from(status.as_u16()));
        tracing::info!(
            target: "gantry::access",
            %client_ip,
            %method,
            %path,
            status,
            latency = ?started.elapsed(),
            "request completed"
        );
        result
    }
}
