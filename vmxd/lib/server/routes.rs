//! Route definitions for the HTTP server.
//!
//! This module sets up the routing for the REST API endpoints.

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use super::{handlers, state::ServerState};
use crate::{VmxdError, VmxdResult};

//-------------------------------------------------------------------------------------------------
// Functions
//-------------------------------------------------------------------------------------------------

/// Creates a new router with all API endpoints configured
///
/// `/start` and `/stop` answer GET as well as POST, since existing web clients issue
/// GET requests for them.
///
/// ## Arguments
/// * `state` - The shared server state
///
/// # Returns
/// A configured Router instance, or an error if an allowed origin is not a valid header value
pub fn create_router(state: ServerState) -> VmxdResult<Router> {
    let cors = cors_layer(state.manager().config().get_allowed_origins())?;

    Ok(Router::new()
        .route("/vms", get(handlers::list_handler))
        .route("/create", post(handlers::create_handler))
        .route("/delete", delete(handlers::delete_handler))
        .route(
            "/start",
            post(handlers::start_handler).get(handlers::start_handler),
        )
        .route(
            "/stop",
            post(handlers::stop_handler).get(handlers::stop_handler),
        )
        .route("/health", get(handlers::health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

/// Builds the CORS policy for the configured browser origins
///
/// A `*` entry allows any origin, in which case credentials are not allowed.
fn cors_layer(origins: &[String]) -> VmxdResult<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if origins.iter().any(|origin| origin == "*") {
        return Ok(layer.allow_origin(Any));
    }

    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| {
                VmxdError::InvalidConfig(vec![format!("invalid allowed origin '{origin}': {e}")])
            })
        })
        .collect::<VmxdResult<Vec<_>>>()?;

    Ok(layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true))
}
