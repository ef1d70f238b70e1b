use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    schema::{BODY_FIELD, ValidationErrors, Violation},
    store::StoreError,
};

pub type AppResult<T> = Result<T, AppError>;

pub const NOT_FOUND_MESSAGE: &str = "Movie not found";
pub const ORIGIN_REJECTED_MESSAGE: &str = "Not allowed by CORS";

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    NotFound(#[from] StoreError),
    #[error("origin '{0}' is not allowed")]
    OriginRejected(String),
}

#[derive(Debug, Serialize)]
struct ValidationBody {
    error: Vec<Violation>,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    message: &'static str,
}

impl AppError {
    pub fn origin_rejected(origin: impl Into<String>) -> Self {
        Self::OriginRejected(origin.into())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(ValidationErrors::single(BODY_FIELD, rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ValidationBody {
                    error: errors.into_violations(),
                }),
            )
                .into_response(),
            Self::NotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(MessageBody {
                    message: NOT_FOUND_MESSAGE,
                }),
            )
                .into_response(),
            Self::OriginRejected(_) => (
                StatusCode::FORBIDDEN,
                Json(MessageBody {
                    message: ORIGIN_REJECTED_MESSAGE,
                }),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_statuses() {
        let validation = AppError::from(ValidationErrors::single("title", "is required"));
        assert_eq!(
            validation.into_response().status(),
            StatusCode::BAD_REQUEST
        );

        let missing = AppError::from(StoreError::NotFound {
            id: "nope".to_string(),
        });
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let origin = AppError::origin_rejected("http://evil.example");
        assert_eq!(origin.into_response().status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn display_keeps_detail() {
        let missing = AppError::from(StoreError::NotFound {
            id: "nope".to_string(),
        });
        assert_eq!(missing.to_string(), "movie 'nope' not found");
    }
}
