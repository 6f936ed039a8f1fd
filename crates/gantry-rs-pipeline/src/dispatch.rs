//! Boot-time compaction of the route tree onto axum, and the per-request
//! dispatch loop.
//!
//! At boot the tree is walked once. Each node's middleware is appended to
//! the inherited prefix, skipping names already seen on the path from the
//! root; every route then freezes `prefix + route chain` and `postware`
//! into immutable slices. At request time the frozen chains are executed
//! under a panic guard, postware runs as the finally step, and the terminal
//! response (or the mapper's success default, if the chain fell through)
//! goes back to the engine.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::{FromRequestParts, RawPathParams};
use tracing::Instrument;

use gantry_rs_core::{catch_panic, logging::request_span, AppError, ErrorOutcome};
use gantry_rs_http::{codes, Request};

use crate::context::{PipelineState, RequestContext};
use crate::error::BootError;
use crate::handler::{Handler, HandlerChain, HandlerFuture};
use crate::router::{convert_path, join_paths, Router, MAX_CHAIN_HANDLERS};

/// Walks a route tree node, compacting every route it can reach into axum
/// routes. `prefix`/`post_prefix` and the two name sets carry the
/// middleware inherited from ancestors; each branch clones them, so
/// siblings stay independent.
pub(crate) fn register_node(
    mut engine: axum::Router,
    node: &Router,
    state: &Arc<PipelineState>,
    prefix: &HandlerChain,
    post_prefix: &HandlerChain,
    seen: &HashSet<String>,
    post_seen: &HashSet<String>,
) -> Result<axum::Router, BootError> {
    let mut prefix = prefix.clone();
    let mut seen = seen.clone();
    for handler in node.middlewares() {
        if seen.insert(handler.name().to_owned()) {
            prefix.push(handler.clone());
        } else {
            tracing::debug!(
                target: "gantry::boot",
                name = handler.name(),
                path = node.abs_path(),
                "skipping middleware already attached upstream"
            );
        }
    }
    let mut post_prefix = post_prefix.clone();
    let mut post_seen = post_seen.clone();
    for handler in node.postwares() {
        if post_seen.insert(handler.name().to_owned()) {
            post_prefix.push(handler.clone());
        }
    }

    let mut by_path: BTreeMap<String, axum::routing::MethodRouter> = BTreeMap::new();
    for route in node.routes() {
        let full_path = join_paths(node.abs_path(), &route.path);
        let total = prefix.len() + route.chain.len() + post_prefix.len();
        if total > MAX_CHAIN_HANDLERS {
            return Err(BootError::TooManyHandlers {
                path: full_path,
                count: total,
                limit: MAX_CHAIN_HANDLERS,
            });
        }
        let mut chain = prefix.clone();
        chain.extend(&route.chain);
        let engine_path = convert_path(&full_path);
        let filter = axum::routing::MethodFilter::try_from(route.method.clone())
            .map_err(|_| BootError::UnsupportedMethod(route.method.to_string()))?;
        tracing::debug!(
            target: "gantry::boot",
            method = %route.method,
            path = %engine_path,
            handlers = total,
            "registering route"
        );
        let unit = make_handler(chain.compact(), post_prefix.compact(), Arc::clone(state));
        let method_router = by_path.remove(&engine_path).unwrap_or_default();
        by_path.insert(engine_path, method_router.on(filter, unit));
    }
    for (engine_path, method_router) in by_path {
        // requests for a known path but an unrouted method still pass
        // through the branch middleware, so CORS preflights are answered
        // before the method-not-allowed outcome
        let fallback = terminal_chain(&prefix, "gantry::handler::method_not_allowed", method_not_allowed);
        let unit = make_handler(fallback.compact(), post_prefix.compact(), Arc::clone(state));
        engine = engine.route(&engine_path, method_router.fallback(unit));
    }

    for branch in node.branches() {
        engine = register_node(
            engine,
            branch,
            state,
            &prefix,
            &post_prefix,
            &seen,
            &post_seen,
        )?;
    }
    Ok(engine)
}

type DispatchFuture = Pin<Box<dyn Future<Output = axum::response::Response> + Send>>;

/// Builds the axum handler for one compacted route.
fn make_handler(
    chain: Arc<[Handler]>,
    post_chain: Arc<[Handler]>,
    state: Arc<PipelineState>,
) -> impl Fn(axum::extract::Request) -> DispatchFuture + Clone + Send + Sync + 'static {
    move |request| {
        let chain = Arc::clone(&chain);
        let post_chain = Arc::clone(&post_chain);
        let state = Arc::clone(&state);
        Box::pin(dispatch(request, chain, post_chain, state))
    }
}

async fn dispatch(
    request: axum::extract::Request,
    chain: Arc<[Handler]>,
    post_chain: Arc<[Handler]>,
    state: Arc<PipelineState>,
) -> axum::response::Response {
    let (mut parts, body) = request.into_parts();
    let params = match RawPathParams::from_request_parts(&mut parts, &()).await {
        Ok(raw) => raw
            .iter()
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect(),
        Err(_) => std::collections::HashMap::new(),
    };
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!(target: "gantry::dispatch", error = %error, "failed to read request body");
            bytes::Bytes::new()
        }
    };
    let request = Request::from_parts(parts, params, body);
    let span = request_span(request.method().as_str(), request.path());

    async move {
        let mut ctx = RequestContext::new(request, chain, Arc::clone(&state));
        if let Err(panic) = catch_panic(run_chain(&mut ctx)).await {
            tracing::warn!(
                target: "gantry::dispatch",
                panic = %panic.message(),
                "handler panicked; don't panic, return an error instead"
            );
            ctx.send_error(recovered_outcome(panic));
        }
        if !post_chain.is_empty() {
            ctx.install_post_chain(post_chain);
            if let Err(panic) = catch_panic(run_chain(&mut ctx)).await {
                tracing::warn!(
                    target: "gantry::dispatch",
                    panic = %panic.message(),
                    "postware panicked"
                );
            }
        }
        let response = ctx
            .take_terminal()
            .unwrap_or_else(|| state.mapper.get_success());
        axum::response::IntoResponse::into_response(response)
    }
    .instrument(span)
    .await
}

async fn run_chain(ctx: &mut RequestContext) {
    while !ctx.finished() {
        let _ = ctx.next().await;
    }
}

/// Turns a caught panic payload back into an error outcome. Panics carrying
/// a structured error keep it; anything else becomes an internal error with
/// the captured backtrace attached.
fn recovered_outcome(panic: gantry_rs_core::CaughtPanic) -> ErrorOutcome {
    let (payload, backtrace) = panic.into_parts();
    match payload.downcast::<AppError>() {
        Ok(error) => ErrorOutcome::from_structured(*error),
        Err(payload) => ErrorOutcome::from_structured(AppError::from_panic(
            gantry_rs_core::guard::panic_message(payload.as_ref()),
            backtrace,
        )),
    }
}

fn not_found(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move { Err(AppError::new(codes::NOT_FOUND, "no route matched")) })
}

fn method_not_allowed(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        Err(AppError::new(
            codes::METHOD_NOT_ALLOWED,
            "method not allowed for this route",
        ))
    })
}

/// A chain of inherited middleware capped with a fixed terminal handler.
fn terminal_chain(
    prefix: &HandlerChain,
    name: &str,
    terminal: for<'a> fn(&'a mut RequestContext) -> HandlerFuture<'a>,
) -> HandlerChain {
    let mut chain = prefix.clone();
    chain.push(Handler::named(name, terminal));
    chain
}

/// The engine-level fallback for paths no route matched: the root node's
/// middleware runs, then the request resolves to the mapper's not-found
/// response.
pub(crate) fn not_found_unit(
    root_middleware: &HandlerChain,
    state: &Arc<PipelineState>,
) -> impl Fn(axum::extract::Request) -> DispatchFuture + Clone + Send + Sync + 'static {
    let chain = terminal_chain(root_middleware, "gantry::handler::not_found", not_found);
    make_handler(chain.compact(), HandlerChain::new().compact(), Arc::clone(state))
}
