//! Application assembly and serving.
//!
//! [`App`] ties the pieces together: settings, a response mapper, and a
//! controller over the route tree. Construction mounts the common
//! middleware the settings ask for; [`App::run`] compiles the tree onto
//! axum and serves it.

use std::sync::Arc;
use std::time::Instant;

use tokio::net::TcpListener;

use gantry_rs_core::Settings;
use gantry_rs_http::ResponseMapper;

use crate::context::PipelineState;
use crate::controller::Controller;
use crate::dispatch::{not_found_unit, register_node};
use crate::error::BootError;
use crate::handler::{Handler, HandlerChain};
use crate::middleware::{api_status, Cors, RequestLogger, Throttle, Timeout};

/// A configured application, ready for route registration and serving.
///
/// # Examples
///
/// ```no_run
/// use gantry_rs_core::Settings;
/// use gantry_rs_http::ResponseMapper;
/// use gantry_rs_pipeline::App;
///
/// # async fn demo() -> Result<(), gantry_rs_pipeline::BootError> {
/// let mut app = App::new(Settings::default(), ResponseMapper::standard())?;
/// // app.controller().handle(...)?
/// app.run().await
/// # }
/// ```
#[derive(Debug)]
pub struct App {
    settings: Settings,
    controller: Controller,
    started_at: Instant,
}

impl App {
    /// Creates an application and mounts the middleware the settings enable:
    /// access logging always, then CORS, throttling and the request
    /// deadline when configured, plus the status route at the tree root.
    pub fn new(settings: Settings, mapper: ResponseMapper) -> Result<Self, BootError> {
        let started_at = Instant::now();
        let mapper = Arc::new(mapper);
        let mut controller = Controller::new(&settings.base_path, mapper, settings.debug);

        controller.handle("USE", Handler::from_middleware(RequestLogger::new()))?;
        if settings.cors.enabled {
            controller.handle("USE", Handler::from_middleware(Cors::new(settings.cors.clone())))?;
        }
        if settings.throttle.enabled {
            controller.handle(
                "USE",
                Handler::from_middleware(Throttle::new(settings.throttle.clone())),
            )?;
        }
        if let Some(timeout) = settings.request_timeout() {
            controller.handle("USE", Handler::from_middleware(Timeout::new(timeout)))?;
        }
        controller.handle("GET /", api_status(settings.meta.clone(), started_at))?;

        Ok(Self {
            settings,
            controller,
            started_at,
        })
    }

    /// The registration surface for routes, branches and middleware.
    pub fn controller(&mut self) -> &mut Controller {
        &mut self.controller
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Compiles the route tree into an axum router. Unmatched paths resolve
    /// through the mapper's not-found response.
    pub fn build(self) -> Result<axum::Router, BootError> {
        let state = Arc::new(PipelineState {
            mapper: Arc::clone(self.controller.mapper()),
            debug: self.controller.debug(),
        });
        let engine = register_node(
            axum::Router::new(),
            self.controller.router(),
            &state,
            &HandlerChain::new(),
            &HandlerChain::new(),
            &std::collections::HashSet::new(),
            &std::collections::HashSet::new(),
        )?;
        let fallback = not_found_unit(self.controller.router().middlewares(), &state);
        Ok(engine.fallback(fallback))
    }

    /// Binds the configured address and serves until the server stops.
    pub async fn run(self) -> Result<(), BootError> {
        let addr = self.settings.addr();
        let listener = TcpListener::bind(&addr).await.map_err(|source| BootError::Bind {
            addr: addr.clone(),
            source,
        })?;
        self.run_listener(listener).await
    }

    /// Serves on an already-bound listener. Useful when the caller wants an
    /// ephemeral port.
    pub async fn run_listener(self, listener: TcpListener) -> Result<(), BootError> {
        let base_path = self.settings.base_path.clone();
        let started_at = self.started_at;
        let addr = listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_default();
        let engine = self.build()?;
        tracing::info!(
            target: "gantry::app",
            %addr,
            %base_path,
            time_to_boot = ?started_at.elapsed(),
            "server running"
        );
        axum::serve(listener, engine).await.map_err(BootError::Serve)
    }
}
