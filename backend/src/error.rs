use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use common::responses::ErrorBody;
use log::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Creation with a business key that is already taken.
    #[error("{0}")]
    DuplicateKey(String),
    /// Missing record or sub-record.
    #[error("{0}")]
    NotFound(String),
    /// A write or payload that breaks the record schema.
    #[error("{0}")]
    ValidationFailed(String),
    /// Store or filesystem failure. The detail is logged, never returned.
    #[error("INTERNAL: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, ApiError>;

impl From<rusqlite::Error> for ApiError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(value: std::io::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::DuplicateKey(_) | ApiError::ValidationFailed(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::DuplicateKey(message) | ApiError::NotFound(message) => ErrorBody {
                message: message.clone(),
                error: None,
            },
            ApiError::ValidationFailed(detail) => ErrorBody {
                message: "Validation failed".to_string(),
                error: Some(detail.clone()),
            },
            ApiError::Internal(detail) => {
                error!("internal error: {}", detail);
                ErrorBody {
                    message: "Internal server error".to_string(),
                    error: None,
                }
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
