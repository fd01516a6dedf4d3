use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::services::auth_service;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/session", get(session))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    username: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    info!("POST /auth/login - Login attempt for {}", body.username);
    let token =
        auth_service::verify_login(&state.auth, &body.username, &body.password).map_err(|e| {
            if matches!(e, AppError::Unauthorized) {
                warn!("Rejected login for {}", body.username);
            }
            e
        })?;
    Ok(Json(LoginResponse {
        token,
        username: body.username,
    }))
}

#[derive(Serialize)]
struct SessionInfo {
    username: String,
    expires_at: i64,
}

pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SessionInfo>, AppError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;
    let claims = auth_service::check_session(&state.auth, token)?;
    Ok(Json(SessionInfo {
        username: claims.sub,
        expires_at: claims.exp,
    }))
}
