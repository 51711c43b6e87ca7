use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gallery_core::{AccessDenied, StoreError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("forbidden")]
    Forbidden,

    #[error("Invalid access code!")]
    InvalidAccessCode,

    /// Storage failures always answer 404 with the upstream text.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AccessDenied> for ApiError {
    fn from(_: AccessDenied) -> Self {
        Self::Forbidden
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
            Self::InvalidAccessCode => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": Self::InvalidAccessCode.to_string() })),
            )
                .into_response(),
            Self::Store(err) => (StatusCode::NOT_FOUND, err.to_string()).into_response(),
        }
    }
}
