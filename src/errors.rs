use crate::{
    models::link::UploadLink,
    services::share_service::{BatchFailure, GatewayError},
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

/// A lightweight wrapper for general errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    /// Links issued before a batch upload failed, echoed back to the client.
    pub uploaded: Option<Vec<UploadLink>>,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            uploaded: None,
        }
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.message,
            "status": self.status.as_u16()
        });
        if let Some(uploaded) = self.uploaded {
            body["uploaded"] = json!(uploaded);
        }

        (self.status, Json(body)).into_response()
    }
}

/// 401 for token mismatch, 404 for a missing object, 400 for malformed
/// requests, 500 for everything else.
pub fn status_for(err: &GatewayError) -> StatusCode {
    match err {
        GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
        GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
        GatewayError::Configuration(_) | GatewayError::Backend(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::new(status_for(&err), err.to_string())
    }
}

impl From<BatchFailure> for AppError {
    fn from(failure: BatchFailure) -> Self {
        let mut err = AppError::from(failure.error);
        err.uploaded = Some(failure.completed);
        err
    }
}
