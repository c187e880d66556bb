//! Inbound HTTP surface.
//!
//! ```text
//! GET /dispatch?id=<int>&region=<code>&target=<int>&concurrency=<int>
//! GET /health
//! ```

use std::future::Future;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use volley_core::{BatchCoordinator, BatchParams, DispatchError};

use crate::error::HttpError;

#[derive(Clone)]
struct AppState {
    coordinator: Arc<BatchCoordinator>,
}

/// Build the router. Each `/dispatch` call runs exactly one batch.
pub fn router(coordinator: Arc<BatchCoordinator>) -> Router {
    Router::new()
        .route("/dispatch", get(dispatch))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { coordinator })
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve(
    addr: &str,
    coordinator: Arc<BatchCoordinator>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), HttpError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| HttpError::Bind {
            addr: addr.to_string(),
            source,
        })?;
    let local = listener.local_addr().map_err(HttpError::Serve)?;
    tracing::info!(addr = %local, "listening");

    axum::serve(listener, router(coordinator))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(HttpError::Serve)
}

async fn dispatch(State(state): State<AppState>, Query(params): Query<BatchParams>) -> Response {
    match state.coordinator.dispatch(&params).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn error_response(err: DispatchError) -> Response {
    match err {
        DispatchError::InvalidInput { message, detail } => {
            tracing::debug!(error = %message, "rejected request");
            let body = match detail {
                Some(detail) => json!({ "error": message, "detail": detail }),
                None => json!({ "error": message }),
            };
            (StatusCode::BAD_REQUEST, Json(body)).into_response()
        }
        DispatchError::NoCredentials { .. } => {
            tracing::error!(error = %err, "batch not started");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": err.to_string() })),
            )
                .into_response()
        }
        DispatchError::Undecoded {
            success,
            attempts,
            elapsed_seconds,
        } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "could not decode response",
                "success": success,
                "total_attempts": attempts,
                "elapsed_seconds": elapsed_seconds,
            })),
        )
            .into_response(),
    }
}
