//! Maps domain failures to HTTP responses with a JSON error body.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use mc_core::dto::{ErrorBody, ErrorDetail};
use mc_core::AppError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    App(#[from] AppError),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "badRequest",
            ApiError::App(AppError::NotFound(..)) => "notFound",
            ApiError::App(AppError::ValidationError(_)) => "validationError",
            ApiError::App(AppError::Conflict(_)) => "conflict",
            ApiError::App(AppError::Transport(_)) => "transportError",
            ApiError::App(AppError::Parse(_)) => "parseError",
            ApiError::App(AppError::Internal(_)) => "internalError",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::App(AppError::NotFound(..)) => StatusCode::NOT_FOUND,
            ApiError::App(AppError::ValidationError(_)) => StatusCode::BAD_REQUEST,
            ApiError::App(AppError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::App(AppError::Transport(_)) | ApiError::App(AppError::Parse(_)) => StatusCode::BAD_GATEWAY,
            ApiError::App(AppError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("request failed: {self}");
            match self {
                ApiError::App(AppError::Internal(_)) => "An internal error occurred".to_string(),
                other => other.to_string(),
            }
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(ErrorBody {
            error: ErrorDetail {
                kind: self.kind().to_string(),
                message,
                status_code: status.as_u16(),
            },
        })
    }
}

/// Convenience type alias for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;
