use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::VmxdError;

//--------------------------------------------------------------------------------------------------
// Types: Requests
//--------------------------------------------------------------------------------------------------

/// Query string carrying the target VM name, as in `/start?name=web`
///
/// If `name` is repeated, the first value wins. Other parameters are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(from = "Vec<(String, String)>")]
pub struct NameQuery {
    /// Name of the VM to operate on
    pub name: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Types: Error Response
//--------------------------------------------------------------------------------------------------

/// Plain-text error response
#[derive(Debug)]
pub struct ErrorResponse {
    /// HTTP status code
    pub status: StatusCode,

    /// Error message
    pub message: String,

    /// Optional additional details about the error
    pub details: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl NameQuery {
    /// The requested name, or the empty string if the parameter was omitted
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

impl ErrorResponse {
    /// Create a new error response from a lifecycle error, without details
    pub fn from_error(error: &VmxdError) -> Self {
        Self {
            status: status_code(error),
            message: error.summary(),
            details: None,
        }
    }

    /// Attach the error's underlying cause if `expose` is set
    pub fn with_details(mut self, error: &VmxdError, expose: bool) -> Self {
        if expose {
            self.details = error.details();
        }
        self
    }

    /// The response body
    pub fn body(&self) -> String {
        match &self.details {
            Some(details) => format!("{}: {}", self.message, details),
            None => self.message.clone(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Maps a lifecycle error onto an HTTP status
pub fn status_code(error: &VmxdError) -> StatusCode {
    match error {
        VmxdError::MissingParameter | VmxdError::InvalidName { .. } => StatusCode::BAD_REQUEST,
        VmxdError::NotFound(_) => StatusCode::NOT_FOUND,
        VmxdError::AlreadyExists { .. } => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl From<Vec<(String, String)>> for NameQuery {
    fn from(pairs: Vec<(String, String)>) -> Self {
        let name = pairs
            .into_iter()
            .find(|(key, _)| key == "name")
            .map(|(_, value)| value);

        Self { name }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status, self.body()).into_response()
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
