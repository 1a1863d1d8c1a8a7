// Error responses for the HTTP layer.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

use crate::api::models::ApiResponse;
use crate::error::IngestError;

const INTERNAL_MESSAGE: &str = "internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Shown to the caller as-is.
    #[error("{0}")]
    BadRequest(String),
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        if err.is_input_error() {
            ApiError::BadRequest(format!("invalid CSV upload: {err}"))
        } else {
            ApiError::Internal(err.into())
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::BadRequest(message) => {
                HttpResponse::BadRequest().json(ApiResponse::<()>::error(message.clone()))
            }
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                HttpResponse::InternalServerError().json(ApiResponse::<()>::error(INTERNAL_MESSAGE))
            }
        }
    }
}
