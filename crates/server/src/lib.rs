use std::time::Duration;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use irremote_core::Dispatcher;
use tracing::{error, info, warn};

pub mod api;
pub mod config;
pub mod dry_run;
pub mod metrics;
pub mod state;

pub use config::{BackendKind, ServerConfig};
pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/version", get(version))
        .route("/metrics", get(metrics_handler))
        .route("/api", any(api::api_command))
        .fallback(api::not_found)
        .with_state(state)
}

async fn healthz() -> &'static str { "ok" }

async fn readyz(State(state): State<AppState>) -> StatusCode {
    let ready = state.backend().is_ready();
    state.metrics.backend_ready.set(i64::from(ready));
    if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE }
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    state.metrics.backend_ready.set(i64::from(state.backend().is_ready()));
    match state.metrics.encode() {
        Ok((content_type, body)) => ([(CONTENT_TYPE, content_type)], body).into_response(),
        Err(err) => {
            error!(?err, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Selects the boot-time output pin once the backend is reachable.
///
/// Gives up after `attempts` tries, or as soon as a request has chosen a pin.
pub async fn apply_default_pin(dispatcher: Dispatcher, pin: u8, attempts: u32, interval: Duration) {
    for attempt in 1..=attempts {
        if dispatcher.has_dispatched() {
            info!(pin, "default output pin skipped; a request already chose one");
            return;
        }
        if dispatcher.backend().is_ready() {
            match dispatcher.configure_default_pin(pin).await {
                Ok(true) => {
                    info!(pin, "default output pin configured");
                    return;
                }
                Ok(false) => {
                    info!(pin, "default output pin skipped; a request already chose one");
                    return;
                }
                Err(err) => warn!(error = %err, attempt, "failed to configure default output pin"),
            }
        }
        tokio::time::sleep(interval).await;
    }
    warn!(pin, "default output pin not applied; backend never became ready");
}
