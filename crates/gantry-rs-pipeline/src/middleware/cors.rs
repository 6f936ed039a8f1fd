//! Cross-origin resource sharing.
//!
//! Requests without an `Origin` header pass straight through. Origin
//! checks run against the configured allow-list; an empty list means every
//! origin is accepted and reflected back. Preflight `OPTIONS` requests are
//! answered directly with `204 No Content`.

use async_trait::async_trait;
use http::{HeaderName, HeaderValue, Method};

use gantry_rs_core::{AppError, CorsConfig};
use gantry_rs_http::{codes, Response};

use crate::context::RequestContext;
use crate::handler::{HandlerResult, Middleware};

#[derive(Debug)]
pub struct Cors {
    config: CorsConfig,
}

impl Cors {
    pub fn new(config: CorsConfig) -> Self {
        Self { config }
    }

    fn origin_allowed(&self, origin: &str) -> bool {
        match &self.config.allow_origins {
            None => true,
            Some(origins) => origins.iter().any(|allowed| allowed == origin || allowed == "*"),
        }
    }

    fn stage_common(&self, ctx: &mut RequestContext, origin: &str) {
        stage(ctx, "access-control-allow-origin", origin);
        if self.config.allow_credentials {
            stage(ctx, "access-control-allow-credentials", "true");
        }
        if !self.config.expose_headers.is_empty() {
            stage(
                ctx,
                "access-control-expose-headers",
                &self.config.expose_headers,
            );
        }
        stage(ctx, "vary", "Origin");
    }

    fn stage_preflight(&self, ctx: &mut RequestContext) {
        stage(
            ctx,
            "access-control-allow-methods",
            &self.config.allow_methods,
        );
        stage(
            ctx,
            "access-control-allow-headers",
            &self.config.allow_headers,
        );
        if self.config.max_age_secs > 0 {
            stage(
                ctx,
                "access-control-max-age",
                &self.config.max_age_secs.to_string(),
            );
        }
    }
}

fn stage(ctx: &mut RequestContext, name: &'static str, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => ctx.stage_header(HeaderName::from_static(name), value),
        Err(_) => {
            tracing::debug!(target: "gantry::cors", header = name, "dropping invalid header value");
        }
    }
}

#[async_trait]
impl Middleware for Cors {
    fn name(&self) -> &str {
        "gantry::middleware::cors"
    }

    async fn handle(&self, ctx: &mut RequestContext) -> HandlerResult {
        if !self.config.enabled {
            return ctx.next().await;
        }
        let Some(origin) = ctx.request().header("origin").map(str::to_owned) else {
            return ctx.next().await;
        };
        if !self.origin_allowed(&origin) {
            return Err(AppError::new(
                codes::FORBIDDEN,
                format!("origin {origin} is not allowed"),
            ));
        }
        self.stage_common(ctx, &origin);
        if ctx.request().method() == Method::OPTIONS {
            self.stage_preflight(ctx);
            return Ok(Some(Response::no_content()));
        }
        ctx.next().await
    }
}
