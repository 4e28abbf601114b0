//! Login endpoint.

use crate::auth::verify_login;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub usuario: Option<String>,
    #[serde(default, rename = "contrasena")]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usuario: Option<String>,
}

pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload.map_err(|_| ApiError::Validation("Missing credentials".to_string()))?;

    let (Some(usuario), Some(password)) = (body.usuario, body.password) else {
        return Err(ApiError::Validation("Missing credentials".to_string()));
    };

    match verify_login(&state.users, &usuario, &password) {
        Some(username) => Ok((
            StatusCode::OK,
            Json(LoginResponse {
                success: true,
                usuario: Some(username),
            }),
        )),
        None => Ok((
            StatusCode::UNAUTHORIZED,
            Json(LoginResponse {
                success: false,
                usuario: None,
            }),
        )),
    }
}
