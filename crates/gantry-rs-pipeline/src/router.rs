//! The route tree built before boot.
//!
//! Routers form a tree: each node carries a base path relative to its
//! parent, routes registered directly on it, branch-local middleware and
//! postware, and child branches. Nothing here touches the engine; the tree
//! is compiled onto axum in one walk at boot time.

use http::Method;

use crate::handler::HandlerChain;

/// Hard ceiling on the length of a compacted chain (branch middleware plus
/// route handlers plus postware): half of `i8::MAX`, the abort-index
/// ceiling common to engines that track the cursor in a signed byte.
pub const MAX_CHAIN_HANDLERS: usize = 63;

#[derive(Debug)]
pub(crate) struct Route {
    pub method: Method,
    pub path: String,
    pub chain: HandlerChain,
}

/// One node of the route tree.
#[derive(Debug)]
pub struct Router {
    base_path: String,
    abs_path: String,
    routes: Vec<Route>,
    middlewares: HandlerChain,
    postwares: HandlerChain,
    branches: Vec<Router>,
}

impl Router {
    pub fn new(base_path: &str) -> Self {
        Self {
            base_path: base_path.to_owned(),
            abs_path: base_path.to_owned(),
            routes: Vec::new(),
            middlewares: HandlerChain::new(),
            postwares: HandlerChain::new(),
            branches: Vec::new(),
        }
    }

    /// Creates a child node under `path` and returns it for registration.
    /// The child inherits this node's middleware at boot; siblings do not
    /// see each other's.
    pub fn branch(&mut self, path: &str) -> &mut Self {
        let abs_path = join_paths(&self.abs_path, path);
        tracing::debug!(target: "gantry::router", path = %abs_path, "registering branch");
        let mut child = Self::new(path);
        child.abs_path = abs_path;
        self.branches.push(child);
        let last = self.branches.len() - 1;
        &mut self.branches[last]
    }

    /// Registers a route for an arbitrary method on this node.
    pub fn handle_method(&mut self, method: Method, path: &str, chain: impl Into<HandlerChain>) {
        self.routes.push(Route {
            method,
            path: path.to_owned(),
            chain: chain.into(),
        });
    }

    pub fn get(&mut self, path: &str, chain: impl Into<HandlerChain>) {
        self.handle_method(Method::GET, path, chain);
    }

    pub fn post(&mut self, path: &str, chain: impl Into<HandlerChain>) {
        self.handle_method(Method::POST, path, chain);
    }

    pub fn put(&mut self, path: &str, chain: impl Into<HandlerChain>) {
        self.handle_method(Method::PUT, path, chain);
    }

    pub fn delete(&mut self, path: &str, chain: impl Into<HandlerChain>) {
        self.handle_method(Method::DELETE, path, chain);
    }

    pub fn patch(&mut self, path: &str, chain: impl Into<HandlerChain>) {
        self.handle_method(Method::PATCH, path, chain);
    }

    pub fn options(&mut self, path: &str, chain: impl Into<HandlerChain>) {
        self.handle_method(Method::OPTIONS, path, chain);
    }

    pub fn head(&mut self, path: &str, chain: impl Into<HandlerChain>) {
        self.handle_method(Method::HEAD, path, chain);
    }

    /// Attaches middleware that runs before every route on this node and its
    /// descendants. Duplicate names along a root-to-route path are applied
    /// once, at the shallowest node that registered them.
    pub fn use_handlers(&mut self, chain: impl Into<HandlerChain>) {
        self.middlewares.extend(&chain.into());
    }

    /// Attaches postware that runs after the route chain has finished,
    /// whether it terminated normally, with an error, or by panic. Postware
    /// observes the finished request; the response is already fixed.
    pub fn post_use(&mut self, chain: impl Into<HandlerChain>) {
        self.postwares.extend(&chain.into());
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Absolute path of this node from the tree root.
    pub fn abs_path(&self) -> &str {
        &self.abs_path
    }

    pub(crate) fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub(crate) fn middlewares(&self) -> &HandlerChain {
        &self.middlewares
    }

    pub(crate) fn postwares(&self) -> &HandlerChain {
        &self.postwares
    }

    pub(crate) fn branches(&self) -> &[Router] {
        &self.branches
    }
}

/// Joins two path segments without doubling or dropping slashes. The result
/// keeps a single leading slash and no trailing slash, except for the bare
/// root.
pub(crate) fn join_paths(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_matches('/');
    let joined = if path.is_empty() {
        base.to_owned()
    } else {
        format!("{base}/{path}")
    };
    if joined.is_empty() {
        "/".to_owned()
    } else if joined.starts_with('/') {
        joined
    } else {
        format!("/{joined}")
    }
}

/// Rewrites `:param` and `*splat` segments into the engine's brace syntax.
pub(crate) fn convert_path(path: &str) -> String {
    let segments: Vec<String> = path
        .split('/')
        .map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                format!("{{{name}}}")
            } else if let Some(name) = segment.strip_prefix('*') {
                format!("{{*{name}}}")
            } else {
                segment.to_owned()
            }
        })
        .collect();
    segments.join("/")
}
