//! HTTP transport: JSON-RPC over `POST /mcp`.

use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Json, Router,
        extract::State,
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::{get, post},
    },
    serde_json::{Value, json},
    tower_http::trace::TraceLayer,
    tracing::info,
};

#[cfg(feature = "prometheus")]
use {axum::http::header, bolmcp_metrics::MetricsHandle};

use crate::{error::Result, server::McpServer};

const TRANSPORT: &str = "http";

#[derive(Clone)]
pub struct HttpState {
    server: Arc<McpServer>,
    #[cfg(feature = "prometheus")]
    metrics: Option<MetricsHandle>,
}

impl HttpState {
    pub fn new(server: Arc<McpServer>) -> Self {
        Self {
            server,
            #[cfg(feature = "prometheus")]
            metrics: None,
        }
    }

    #[cfg(feature = "prometheus")]
    #[must_use]
    pub fn with_metrics(mut self, handle: MetricsHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Build the router (shared between `serve_http` and tests).
pub fn build_router(state: HttpState) -> Router {
    let router = Router::new()
        .route("/mcp", post(mcp_handler))
        .route("/health", get(health_handler));

    #[cfg(feature = "prometheus")]
    let router = router.route("/metrics", get(prometheus_metrics_handler));

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve_http(state: HttpState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "serving MCP over HTTP at /mcp");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

async fn mcp_handler(State(state): State<HttpState>, body: String) -> Response {
    match state.server.handle_raw(&body, TRANSPORT).await {
        Some(response) => Json(response).into_response(),
        // Notifications are acknowledged without a body.
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn health_handler(State(state): State<HttpState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "tools": state.server.router().len(),
    }))
}

#[cfg(feature = "prometheus")]
async fn prometheus_metrics_handler(State(state): State<HttpState>) -> Response {
    match state.metrics.as_ref().filter(|h| h.is_enabled()) {
        Some(handle) => (
            [(
                header::CONTENT_TYPE,
                "text/plain; version=0.0.4; charset=utf-8",
            )],
            handle.render(),
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "Metrics not enabled").into_response(),
    }
}
