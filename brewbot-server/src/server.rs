//! brewbot-server/src/server.rs
//!
//! HTTP surface for the external trigger: POST /trigger runs one reconcile
//! pass, GET /healthz answers liveness probes.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use axum_server::{Handle, Server};
use tokio::sync::oneshot;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use brewbot_common::models::trigger::TriggerEvent;
use brewbot_core::services::TriggerHandler;
use brewbot_core::Error;

#[derive(Clone)]
struct TriggerServerState {
    handler: Arc<TriggerHandler>,
}

/// Binds the trigger server and serves it on a background task. The returned
/// sender shuts it down gracefully.
pub async fn start_trigger_server(
    addr: SocketAddr,
    handler: Arc<TriggerHandler>,
) -> Result<oneshot::Sender<()>, Error> {
    let state = TriggerServerState { handler };

    let app = Router::new()
        .route("/trigger", post(handle_trigger))
        .route("/healthz", get(handle_healthz))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let (shutdown_send, shutdown_recv) = oneshot::channel::<()>();
    info!("Trigger server listening on http://{}", addr);

    let handle = Handle::new();
    let handle_clone = handle.clone();

    tokio::spawn(async move {
        let _ = shutdown_recv.await;
        handle_clone.graceful_shutdown(None);
    });

    let server = Server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service());

    tokio::spawn(async move {
        if let Err(e) = server.await {
            error!("Trigger server error: {}", e);
        }
        info!("Trigger server shut down.");
    });

    Ok(shutdown_send)
}

async fn handle_trigger(
    State(state): State<TriggerServerState>,
    Json(event): Json<TriggerEvent>,
) -> impl IntoResponse {
    let response = state.handler.handle(event).await;
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response.body))
}

async fn handle_healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}
