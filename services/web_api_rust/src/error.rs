//! API error taxonomy and HTTP status mapping.
//!
//! Validation problems are the client's fault (400), a duplicate submission
//! gets its own distinguishable response (409 with `alreadySubmitted`), and
//! store failures are logged with context but reach the client as a generic
//! 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quiniela_rust_core::store::StoreError;
use quiniela_rust_core::submission::SubmitError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Ya has enviado tu apuesta para esta jornada.")]
    AlreadySubmitted,

    #[error("{0}")]
    NotFound(String),

    #[error("Server error")]
    Store(#[source] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => ApiError::AlreadySubmitted,
            StoreError::Other(e) => ApiError::Store(e),
        }
    }
}

impl From<SubmitError> for ApiError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::AlreadySubmitted => ApiError::AlreadySubmitted,
            SubmitError::Store(store) => ApiError::from(store),
            validation => ApiError::Validation(validation.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ApiError::Validation(_) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }

            ApiError::AlreadySubmitted => (
                StatusCode::CONFLICT,
                Json(json!({
                    "error": message,
                    "alreadySubmitted": true,
                })),
            )
                .into_response(),

            ApiError::NotFound(_) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": message }))).into_response()
            }

            ApiError::Store(e) => {
                error!("Store failure: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Server error" })),
                )
                    .into_response()
            }
        }
    }
}
