use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use gitdocx_shared::GitDocxError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] GitDocxError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Core(GitDocxError::NotFound(_)) | ApiError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Core(GitDocxError::Validation { .. })
            | ApiError::Core(GitDocxError::InvalidAddress { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Core(_) | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string()
        }))
    }
}
