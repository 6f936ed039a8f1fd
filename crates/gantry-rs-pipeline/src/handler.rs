//! Handler units and handler chains.
//!
//! A [`Handler`] is the atom of the pipeline: a named async function that
//! receives a mutable [`RequestContext`] and resolves to a
//! [`HandlerResult`]. Chains of handlers are assembled per route at boot
//! time and executed in order by the dispatcher.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use gantry_rs_core::AppError;
use gantry_rs_http::Response;

use crate::context::RequestContext;

/// What a single handler step resolves to.
///
/// * `Ok(None)` — pass through; the chain continues with the next handler.
/// * `Ok(Some(response))` — terminal success; the response is composed with
///   the mapper's success defaults and written, and the chain aborts.
/// * `Err(error)` — terminal failure; the error is resolved through the
///   response mapper and written, and the chain aborts.
pub type HandlerResult = Result<Option<Response>, AppError>;

/// The boxed future a handler returns. Its lifetime is tied to the
/// `&mut RequestContext` borrow, so handler closures must own (not borrow)
/// any state they capture.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = HandlerResult> + Send + 'a>>;

/// Object-safe call surface behind [`Handler`]. Implemented for plain
/// handler functions and for [`Middleware`] adapters.
trait ErasedHandler: Send + Sync {
    fn call<'a>(&self, ctx: &'a mut RequestContext) -> HandlerFuture<'a>;
}

struct FnHandler<F>(F);

impl<F> ErasedHandler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut RequestContext) -> HandlerFuture<'a> + Send + Sync,
{
    fn call<'a>(&self, ctx: &'a mut RequestContext) -> HandlerFuture<'a> {
        (self.0)(ctx)
    }
}

struct MiddlewareHandler<M>(Arc<M>);

impl<M: Middleware + 'static> ErasedHandler for MiddlewareHandler<M> {
    fn call<'a>(&self, ctx: &'a mut RequestContext) -> HandlerFuture<'a> {
        let middleware = Arc::clone(&self.0);
        Box::pin(async move { middleware.handle(ctx).await })
    }
}

/// A named pipeline step.
///
/// The name identifies the handler during boot: when a branch attaches a
/// middleware whose name is already present on the path from the root, the
/// duplicate is skipped instead of running twice. Handlers built with
/// [`Handler::new`] are named after their function type, which is stable
/// for `fn` items; closures should prefer [`Handler::named`].
///
/// # Examples
///
/// ```
/// use gantry_rs_pipeline::{Handler, HandlerFuture, RequestContext};
/// use gantry_rs_http::Response;
/// use serde_json::json;
///
/// fn hello(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
///     Box::pin(async move { Ok(Some(Response::ok().with_body(json!({"data": "hi"})))) })
/// }
///
/// let handler = Handler::new(hello);
/// assert!(handler.name().ends_with("hello"));
/// ```
#[derive(Clone)]
pub struct Handler {
    name: Arc<str>,
    func: Arc<dyn ErasedHandler>,
}

impl Handler {
    /// Wraps a handler function, naming it after its type.
    pub fn new<F>(func: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        Self::named(std::any::type_name::<F>(), func)
    }

    /// Wraps a handler function under an explicit name.
    pub fn named<F>(name: &str, func: F) -> Self
    where
        F: for<'a> Fn(&'a mut RequestContext) -> HandlerFuture<'a> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            func: Arc::new(FnHandler(func)),
        }
    }

    /// Adapts a [`Middleware`] implementation into a handler, keeping the
    /// middleware's own name for dedup purposes.
    pub fn from_middleware<M>(middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        Self {
            name: Arc::from(middleware.name()),
            func: Arc::new(MiddlewareHandler(Arc::new(middleware))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn call<'a>(&self, ctx: &'a mut RequestContext) -> HandlerFuture<'a> {
        self.func.call(ctx)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("name", &self.name).finish()
    }
}

/// A reusable middleware step with an explicit stable name.
///
/// Middleware typically wraps the rest of the chain by awaiting
/// [`RequestContext::next`] and inspecting the context afterwards. A
/// middleware that never calls `next` short-circuits the chain for every
/// request it sees.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Stable identifier used for branch-level deduplication.
    fn name(&self) -> &str;

    async fn handle(&self, ctx: &mut RequestContext) -> HandlerResult;
}

/// An ordered list of handlers, built up during routing and compacted into
/// an immutable slice at boot.
#[derive(Clone, Debug, Default)]
pub struct HandlerChain {
    handlers: Vec<Handler>,
}

impl HandlerChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handler: Handler) {
        self.handlers.push(handler);
    }

    pub fn extend(&mut self, other: &Self) {
        self.handlers.extend(other.handlers.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Handler> {
        self.handlers.iter()
    }

    /// Freezes the chain into the shared slice the dispatcher executes.
    pub(crate) fn compact(&self) -> Arc<[Handler]> {
        Arc::from(self.handlers.as_slice())
    }
}

impl From<Handler> for HandlerChain {
    fn from(handler: Handler) -> Self {
        Self {
            handlers: vec![handler],
        }
    }
}

impl From<Vec<Handler>> for HandlerChain {
    fn from(handlers: Vec<Handler>) -> Self {
        Self { handlers }
    }
}

impl FromIterator<Handler> for HandlerChain {
    fn from_iter<I: IntoIterator<Item = Handler>>(iter: I) -> Self {
        Self {
            handlers: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a HandlerChain {
    type Item = &'a Handler;
    type IntoIter = std::slice::Iter<'a, Handler>;

    fn into_iter(self) -> Self::IntoIter {
        self.handlers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passthrough(ctx: &mut RequestContext) -> HandlerFuture<'_> {
        ctx.next()
    }

    #[test]
    fn fn_item_handlers_get_stable_names() {
        let a = Handler::new(passthrough);
        let b = Handler::new(passthrough);
        assert_eq!(a.name(), b.name());
        assert!(a.name().ends_with("passthrough"));
    }

    #[test]
    fn named_handler_keeps_its_name() {
        let handler = Handler::named("auth", passthrough);
        assert_eq!(handler.name(), "auth");
    }

    #[test]
    fn chain_collects_and_extends() {
        let mut chain = HandlerChain::from(vec![Handler::named("a", passthrough)]);
        let tail = HandlerChain::from(Handler::named("b", passthrough));
        chain.extend(&tail);
        let names: Vec<&str> = chain.iter().map(Handler::name).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
