//! The controller: spec-string registration over a router subtree.
//!
//! A controller owns the root of a route tree together with the response
//! mapper and debug flag requests under it resolve against. Registration
//! uses compact spec strings of the form `"METHOD /path"`; the
//! pseudo-methods `USE` and `POSTUSE` attach middleware and postware to the
//! current node instead of creating a route.

use std::sync::Arc;

use http::Method;

use gantry_rs_http::ResponseMapper;

use crate::error::BootError;
use crate::handler::HandlerChain;
use crate::router::Router;

/// The parsed form of a `"METHOD /path"` spec string.
#[derive(Debug, PartialEq, Eq)]
enum SpecTarget {
    Route(Method, String),
    Middleware,
    Postware,
}

fn parse_spec(spec: &str) -> Result<SpecTarget, BootError> {
    if spec.trim().is_empty() {
        return Err(BootError::EmptySpec);
    }
    let mut parts = spec.split(' ');
    let method = match parts.next().unwrap_or_default() {
        "" => "GET",
        m => m,
    };
    let path = match parts.next().unwrap_or_default() {
        "" => "/",
        p => p,
    };
    let target = match method {
        "GET" => SpecTarget::Route(Method::GET, path.to_owned()),
        "POST" => SpecTarget::Route(Method::POST, path.to_owned()),
        "PUT" => SpecTarget::Route(Method::PUT, path.to_owned()),
        "DELETE" => SpecTarget::Route(Method::DELETE, path.to_owned()),
        "PATCH" => SpecTarget::Route(Method::PATCH, path.to_owned()),
        "OPTIONS" => SpecTarget::Route(Method::OPTIONS, path.to_owned()),
        "HEAD" => SpecTarget::Route(Method::HEAD, path.to_owned()),
        "USE" => SpecTarget::Middleware,
        "POSTUSE" => SpecTarget::Postware,
        _ => return Err(BootError::UnknownSpec(spec.to_owned())),
    };
    Ok(target)
}

fn register(router: &mut Router, spec: &str, chain: HandlerChain) -> Result<(), BootError> {
    match parse_spec(spec)? {
        SpecTarget::Route(method, path) => router.handle_method(method, &path, chain),
        SpecTarget::Middleware => router.use_handlers(chain),
        SpecTarget::Postware => router.post_use(chain),
    }
    Ok(())
}

/// Registration surface over the root of an application's route tree.
///
/// # Examples
///
/// ```no_run
/// # use gantry_rs_pipeline::{Controller, Handler, HandlerFuture, RequestContext};
/// # use gantry_rs_http::Response;
/// # fn status(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
/// #     Box::pin(async move { Ok(Some(Response::ok())) })
/// # }
/// # fn demo(controller: &mut Controller) -> Result<(), gantry_rs_pipeline::BootError> {
/// let mut api = controller.branch("/api");
/// api.handle("GET /status", Handler::new(status))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Controller {
    router: Router,
    mapper: Arc<ResponseMapper>,
    debug: bool,
}

impl Controller {
    pub(crate) fn new(base_path: &str, mapper: Arc<ResponseMapper>, debug: bool) -> Self {
        Self {
            router: Router::new(base_path),
            mapper,
            debug,
        }
    }

    /// Registers handlers under a spec string on the tree root.
    pub fn handle(&mut self, spec: &str, chain: impl Into<HandlerChain>) -> Result<(), BootError> {
        register(&mut self.router, spec, chain.into())
    }

    /// Opens a child branch and returns a scope for registering on it.
    pub fn branch(&mut self, path: &str) -> Scope<'_> {
        Scope {
            router: self.router.branch(path),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub(crate) fn mapper(&self) -> &Arc<ResponseMapper> {
        &self.mapper
    }

    pub(crate) fn debug(&self) -> bool {
        self.debug
    }
}

/// A borrowed view of one router node, handed out by [`Controller::branch`].
#[derive(Debug)]
pub struct Scope<'a> {
    router: &'a mut Router,
}

impl Scope<'_> {
    pub fn handle(&mut self, spec: &str, chain: impl Into<HandlerChain>) -> Result<(), BootError> {
        register(self.router, spec, chain.into())
    }

    pub fn branch(&mut self, path: &str) -> Scope<'_> {
        Scope {
            router: self.router.branch(path),
        }
    }

    pub fn abs_path(&self) -> &str {
        self.router.abs_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::handler::{Handler, HandlerFuture};

    fn noop(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
        Box::pin(async move { Ok(None) })
    }

    fn controller() -> Controller {
        Controller::new("/", Arc::new(ResponseMapper::standard()), false)
    }

    #[test]
    fn spec_parses_method_and_path() {
        assert_eq!(
            parse_spec("GET /users/:id").ok(),
            Some(SpecTarget::Route(Method::GET, "/users/:id".to_owned()))
        );
        assert_eq!(parse_spec("USE").ok(), Some(SpecTarget::Middleware));
        assert_eq!(parse_spec("POSTUSE").ok(), Some(SpecTarget::Postware));
    }

    #[test]
    fn spec_defaults_method_and_path() {
        // a leading space means "no method", which defaults to GET
        assert_eq!(
            parse_spec(" /health").ok(),
            Some(SpecTarget::Route(Method::GET, "/health".to_owned()))
        );
        assert_eq!(
            parse_spec("POST").ok(),
            Some(SpecTarget::Route(Method::POST, "/".to_owned()))
        );
    }

    #[test]
    fn spec_rejects_empty_and_unknown() {
        assert!(matches!(parse_spec("   "), Err(BootError::EmptySpec)));
        assert!(matches!(
            parse_spec("FETCH /x"),
            Err(BootError::UnknownSpec(_))
        ));
    }

    #[test]
    fn branches_register_routes_and_middleware() {
        let mut c = controller();
        let mut api = c.branch("/api");
        api.handle("USE", Handler::named("guard", noop)).unwrap();
        let mut v1 = api.branch("/v1");
        v1.handle("GET /status", Handler::new(noop)).unwrap();
        assert_eq!(v1.abs_path(), "/api/v1");
        let root = c.router();
        assert_eq!(root.branches().len(), 1);
        assert_eq!(root.branches()[0].middlewares().len(), 1);
        assert_eq!(root.branches()[0].branches()[0].routes().len(), 1);
    }
}
