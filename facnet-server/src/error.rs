use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use facnet_core::Error;
use serde::Serialize;

/// Failures before the server starts listening
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Cannot read config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),
    #[error("Cannot load facilities: {0}")]
    Facilities(#[from] Error),
    #[error("Cannot listen on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// Error half of every handler's result
#[derive(Debug)]
pub enum ApiError {
    Analysis(Error),
    Internal(String),
    Timeout,
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self::Analysis(error)
    }
}

pub(crate) fn status_of(error: &Error) -> StatusCode {
    match error {
        Error::FacilityNotFound(_) => StatusCode::NOT_FOUND,
        Error::NoPathFound { .. } | Error::EmptyGraph => StatusCode::UNPROCESSABLE_ENTITY,
        Error::NetworkFetch { .. } => StatusCode::BAD_GATEWAY,
        Error::InvalidData(_) | Error::CsvError(_) | Error::InvalidNodeIndex => StatusCode::BAD_REQUEST,
        Error::SolverUnavailable(_) => StatusCode::NOT_IMPLEMENTED,
        Error::IoError(_) | Error::GeoJsonError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            Self::Analysis(error) => (status_of(&error), error.kind().to_string(), error.to_string()),
            Self::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, "internal".to_string(), message),
            Self::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                "timeout".to_string(),
                "Request took too long".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(%status, "{message}");
        } else {
            tracing::debug!(%status, "{message}");
        }

        (status, Json(ErrorBody { error, message })).into_response()
    }
}
