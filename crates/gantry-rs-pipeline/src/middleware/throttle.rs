//! Token-bucket request throttling.

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use async_trait::async_trait;

use gantry_rs_core::{AppError, ThrottleConfig};
use gantry_rs_http::codes;

use crate::context::RequestContext;
use crate::handler::{HandlerResult, Middleware};

/// One bucket shared by every request passing through the middleware:
/// tokens refill at `max_per_sec` and accumulate up to `burst`.
#[derive(Debug)]
pub struct Throttle {
    config: ThrottleConfig,
    bucket: Mutex<Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    refilled_at: Instant,
}

impl Throttle {
    pub fn new(config: ThrottleConfig) -> Self {
        let bucket = Bucket {
            tokens: f64::from(config.burst),
            refilled_at: Instant::now(),
        };
        Self {
            config,
            bucket: Mutex::new(bucket),
        }
    }

    fn try_acquire(&self) -> bool {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let elapsed = now.duration_since(bucket.refilled_at).as_secs_f64();
        let rate = f64::from(self.config.max_per_sec);
        bucket.tokens = (bucket.tokens + elapsed * rate).min(f64::from(self.config.burst));
        bucket.refilled_at = now;
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

#[async_trait]
impl Middleware for Throttle {
    fn name(&self) -> &str {
        "gantry::middleware::throttle"
    }

    async fn handle(&self, ctx: &mut RequestContext) -> HandlerResult {
        if !self.config.enabled || self.try_acquire() {
            return ctx.next().await;
        }
        tracing::debug!(
            target: "gantry::throttle",
            path = ctx.request().path(),
            "request rejected by throttle"
        );
        Err(AppError::new(codes::TOO_MANY_REQUESTS, "too many requests"))
    }
}
