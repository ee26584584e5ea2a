use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Failed to launch `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command `{command}` failed (exit code {code:?}): {output}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected HTTP status: {0}")]
    Status(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Response is missing field `{0}`")]
    MissingField(&'static str),

    #[error("selector is empty")]
    SelectorEmpty,

    #[error("Unknown selector: {0}")]
    UnknownSelector(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("element not found")]
    ElementNotFound,

    #[error("device not found")]
    DeviceNotFound,

    #[error("device offline")]
    DeviceOffline,

    #[error("more than one device/emulator")]
    MultipleDevices,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DriverError {
    /// Raw combined output of a failed command, kept for diagnostics
    pub fn output(&self) -> Option<&str> {
        match self {
            DriverError::CommandFailed { output, .. } => Some(output),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    detail: String,
}

impl IntoResponse for DriverError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            DriverError::SelectorEmpty
            | DriverError::UnknownSelector(_)
            | DriverError::InvalidQuery(_)
            | DriverError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            DriverError::ElementNotFound | DriverError::DeviceNotFound => {
                (StatusCode::NOT_FOUND, "Not Found")
            }
            DriverError::DeviceOffline | DriverError::MultipleDevices => {
                (StatusCode::CONFLICT, "Device Unavailable")
            }
            DriverError::Http(_) | DriverError::Status(_) | DriverError::MissingField(_) => {
                (StatusCode::BAD_GATEWAY, "Automation Service Error")
            }
            DriverError::Spawn { .. } | DriverError::CommandFailed { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Command Error")
            }
            DriverError::Json(_) | DriverError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error")
            }
        };

        let body = Json(ErrorResponse {
            error: error_message.to_string(),
            detail: self.to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;
