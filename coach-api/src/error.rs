use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use coach_core::{EngineError, StatusClass};

use crate::response::Envelope;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Too many requests, please try again later")]
    RateLimited,
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::Engine(err) => match err.status_class() {
                StatusClass::BadRequest => StatusCode::BAD_REQUEST,
                StatusClass::Forbidden => StatusCode::FORBIDDEN,
                StatusClass::NotFound => StatusCode::NOT_FOUND,
                StatusClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            AppError::Anyhow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal Server Error: {}", self);
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(Envelope::<()>::failure(message))).into_response()
    }
}
