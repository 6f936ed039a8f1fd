//! The built-in status endpoint mounted at the application root.

use std::time::Instant;

use serde_json::{json, Value};

use gantry_rs_core::Meta;
use gantry_rs_http::{body, Response};

use crate::handler::Handler;

/// Builds the handler behind `GET /`: service metadata plus uptime.
pub fn api_status(meta: Meta, started_at: Instant) -> Handler {
    Handler::named("gantry::handler::api_status", move |_ctx| {
        let meta = meta.clone();
        Box::pin(async move {
            let mut data = json!({ "uptime": format!("{:?}", started_at.elapsed()) });
            let described = serde_json::to_value(&meta).unwrap_or(Value::Null);
            body::merge(&mut data, &described, true);
            Ok(Some(Response::ok().with_body(json!({ "data": data }))))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{PipelineState, RequestContext};
    use crate::handler::HandlerChain;
    use gantry_rs_http::{Request, ResponseMapper};
    use std::sync::Arc;

    #[tokio::test]
    async fn status_body_carries_meta_and_uptime() {
        let handler = api_status(Meta::default(), Instant::now());
        let chain = HandlerChain::from(handler).compact();
        let state = Arc::new(PipelineState {
            mapper: Arc::new(ResponseMapper::standard()),
            debug: false,
        });
        let mut ctx = RequestContext::new(Request::builder().build(), chain, state);
        let _ = ctx.next().await;
        let response = ctx.take_terminal().expect("terminal response");
        let data = &response.body()["data"];
        assert_eq!(data["app_name"], Meta::default().app_name);
        assert!(data["uptime"].is_string());
    }
}
