use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use http_body_util::LengthLimitError;
use irremote_core::{check_request, validate_body, Reply};
use tracing::{debug, error, warn};

use crate::state::AppState;

// POST /api. Every other method on this path is answered here too.
pub async fn api_command(State(state): State<AppState>, method: Method, headers: HeaderMap, body: Body) -> Response {
    for (name, value) in headers.iter() {
        debug!(header = %name, value = ?value, "api request header");
    }

    let reply = handle(&state, &method, &headers, body).await;
    state.metrics.record_status(reply.status.as_u16());
    reply_response(reply)
}

async fn handle(state: &AppState, method: &Method, headers: &HeaderMap, body: Body) -> Reply {
    // Method and content type decide the status whatever the body holds,
    // so the body is only read once they pass.
    if let Err(err) = check_request(method, headers) {
        warn!(%method, error = %err, "rejected api request");
        return Reply::rejected(&err);
    }

    let bytes = match to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            let err = err.into_inner();
            if err.downcast_ref::<LengthLimitError>().is_some() {
                warn!(limit = state.max_body_bytes, "api request body too large");
                return Reply::too_large();
            }
            warn!(error = %err, "failed to read api request body");
            return Reply::rejected(&irremote_core::ValidationError::MalformedJson);
        }
    };

    let cmd = match validate_body(&bytes) {
        Ok(cmd) => cmd,
        Err(err) => {
            warn!(error = %err, "rejected api request");
            return Reply::rejected(&err);
        }
    };

    match state.dispatcher.dispatch(&cmd).await {
        Ok(ack) => {
            state.metrics.transmissions.with_label_values(&[ack.kind]).inc();
            Reply::sent()
        }
        Err(err) => {
            error!(error = %err, pin = cmd.pin(), kind = cmd.kind(), "backend failed to transmit");
            state.metrics.backend_errors.inc();
            Reply::failed(&err)
        }
    }
}

pub fn reply_response(reply: Reply) -> Response {
    (reply.status, Json(reply.body)).into_response()
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, irremote_core::response::MSG_NOT_FOUND)
}
