use crate::models::ErrorResponse;
use crate::services::StoreError;
use actix_web::{error, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use thiserror::Error;
use uuid::Uuid;

/// Failures of the rating cycle, all recoverable at the HTTP boundary
#[derive(Debug, Error)]
pub enum RatingError {
    #[error("Film not found: {0}")]
    NotFound(Uuid),

    #[error("Invalid vote: {0}")]
    InvalidVote(String),

    #[error("Vote kept conflicting with concurrent votes after {attempts} attempts")]
    Conflict { attempts: u32 },

    #[error("Film already exists: {0}")]
    AlreadyExists(String),

    #[error("Storage error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for RatingError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Duplicate(title) => RatingError::AlreadyExists(title),
            other => RatingError::Store(other),
        }
    }
}

impl RatingError {
    /// Machine-readable code used in the `error` field of responses
    pub fn code(&self) -> &'static str {
        match self {
            RatingError::NotFound(_) => "not_found",
            RatingError::InvalidVote(_) => "invalid_vote",
            RatingError::Conflict { .. } => "conflict",
            RatingError::AlreadyExists(_) => "already_exists",
            RatingError::Store(_) => "storage_error",
        }
    }
}

impl ResponseError for RatingError {
    fn status_code(&self) -> StatusCode {
        match self {
            RatingError::NotFound(_) => StatusCode::NOT_FOUND,
            RatingError::InvalidVote(_) => StatusCode::BAD_REQUEST,
            RatingError::Conflict { .. } | RatingError::AlreadyExists(_) => StatusCode::CONFLICT,
            RatingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Storage details stay in the logs
        let message = match self {
            RatingError::Store(e) => {
                tracing::error!("Storage failure: {}", e);
                "An unexpected error occurred when processing your request.".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status).json(ErrorResponse::new(self.code(), message, status.as_u16()))
    }
}

/// Error for malformed payloads, query strings and path parameters
#[derive(Debug)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(ErrorResponse::new(&self.error, &self.message, status.as_u16()))
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle path parameter errors (e.g. a film id that is not a UUID)
pub fn handle_path_error(err: error::PathError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Path error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path parameter: {}", err),
        status_code: 400,
    }
    .into()
}
