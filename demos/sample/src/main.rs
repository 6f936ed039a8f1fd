//! A small gantry application: two nested branches, a success route, an
//! error route, and the built-in status endpoint at the root.

use serde_json::json;

use gantry_rs::core::logging::setup_logging;
use gantry_rs::core::{CorsConfig, Meta, Settings, ThrottleConfig};
use gantry_rs::pipeline::{App, BootError, Handler, HandlerFuture, RequestContext};
use gantry_rs::{AppError, Response, ResponseMapper};

fn first_inner(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        Ok(Some(
            Response::ok().with_body(json!({ "data": "G1 First" })),
        ))
    })
}

fn second_inner(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        Ok(Some(
            Response::ok().with_body(json!({ "data": "G1 Second" })),
        ))
    })
}

fn deep_inner(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        Ok(Some(Response::ok().with_body(json!({
            "data": ["1", "2", "3"],
            "meta": { "branch": "deep" },
        }))))
    })
}

fn always_fails(_ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move { Err(AppError::from_message("this is an error")) })
}

fn build_app() -> Result<App, BootError> {
    let settings = Settings {
        base_path: "/v1".to_string(),
        meta: Meta {
            app_name: "sample".to_string(),
            app_version: "v0.1.0".to_string(),
            description: "Sample gantry application".to_string(),
        },
        throttle: ThrottleConfig {
            enabled: true,
            max_per_sec: 2,
            burst: 1,
        },
        cors: CorsConfig::default(),
        ..Settings::from_env().unwrap_or_default()
    };
    setup_logging(&settings);

    let mut app = App::new(settings, ResponseMapper::standard())?;
    {
        let mut sample = app.controller().branch("/sample");
        sample.handle("GET /first-inner", Handler::new(first_inner))?;
        sample.handle("GET /second-inner", Handler::new(second_inner))?;
        sample.handle("GET /error", Handler::new(always_fails))?;

        let mut deep = sample.branch("/deep");
        deep.handle("GET /first-inner", Handler::new(deep_inner))?;
    }
    Ok(app)
}

#[tokio::main]
async fn main() {
    match build_app() {
        Ok(app) => {
            if let Err(error) = app.run().await {
                tracing::error!(error = %error, "server stopped");
                std::process::exit(1);
            }
        }
        Err(error) => {
            tracing::error!(error = %error, "failed to assemble application");
            std::process::exit(1);
        }
    }
}
