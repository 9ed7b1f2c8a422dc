use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use tracker_api::{ErrorKind, TrackerError};

/// Boundary error: maps tracker error kinds onto HTTP status codes.
#[derive(Debug)]
pub struct ApiError(pub TrackerError);

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(TrackerError::invalid_input(msg))
    }

    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Unavailable | ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TrackerError> for ApiError {
    fn from(e: TrackerError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), format!("error: {}", self.0)).into_response()
    }
}
