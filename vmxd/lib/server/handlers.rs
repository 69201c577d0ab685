//! HTTP request handlers for the REST API.
//!
//! Each handler pulls the VM name out of the query string, runs one lifecycle operation
//! on the [`VmManager`](crate::management::VmManager) and renders the outcome. Successes
//! are plain text, except for the listing, which is a JSON object of name to path.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::{
    data::{ErrorResponse, NameQuery},
    state::ServerState,
};
use crate::{management::Ack, VmxdError, VmxdResult};

//-------------------------------------------------------------------------------------------------
// Functions: Handlers
//-------------------------------------------------------------------------------------------------

/// Handler for the GET /vms endpoint
pub async fn list_handler(State(state): State<ServerState>) -> Response {
    match state.manager().list().await {
        Ok(registry) => (StatusCode::OK, Json(registry)).into_response(),
        Err(e) => error_response(&state, e),
    }
}

/// Handler for the POST /create endpoint
///
/// Copies the template descriptor to `<name>.vmx`
pub async fn create_handler(
    State(state): State<ServerState>,
    Query(query): Query<NameQuery>,
) -> Response {
    tracing::debug!("received create request: {:?}", query);
    ack_response(&state, state.manager().create(query.name()).await)
}

/// Handler for the DELETE /delete endpoint
pub async fn delete_handler(
    State(state): State<ServerState>,
    Query(query): Query<NameQuery>,
) -> Response {
    tracing::debug!("received delete request: {:?}", query);
    ack_response(&state, state.manager().delete(query.name()).await)
}

/// Handler for the /start endpoint
pub async fn start_handler(
    State(state): State<ServerState>,
    Query(query): Query<NameQuery>,
) -> Response {
    tracing::debug!("received start request: {:?}", query);
    ack_response(&state, state.manager().start(query.name()).await)
}

/// Handler for the /stop endpoint
pub async fn stop_handler(
    State(state): State<ServerState>,
    Query(query): Query<NameQuery>,
) -> Response {
    tracing::debug!("received stop request: {:?}", query);
    ack_response(&state, state.manager().stop(query.name()).await)
}

/// Handler for the GET /health endpoint
pub async fn health_handler() -> &'static str {
    "OK"
}

//-------------------------------------------------------------------------------------------------
// Functions: Helpers
//-------------------------------------------------------------------------------------------------

fn ack_response(state: &ServerState, result: VmxdResult<Ack>) -> Response {
    match result {
        Ok(ack) => (StatusCode::OK, ack.to_string()).into_response(),
        Err(e) => error_response(state, e),
    }
}

fn error_response(state: &ServerState, error: VmxdError) -> Response {
    let response =
        ErrorResponse::from_error(&error).with_details(&error, state.expose_error_details());

    if response.status.is_server_error() {
        tracing::error!("{error}");
    } else {
        tracing::debug!("{error}");
    }

    response.into_response()
}
