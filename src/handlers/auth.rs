use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{AppState, db, domain::UserResponse, error::ApiError, security};

use super::users::insert_new_user;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let user = insert_new_user(&state.pool, &body.email, &body.name, &body.password).await?;
    let token = security::issue_token(user.id, &state.secret_key, state.token_expire_days)?;

    tracing::info!("Registered user id={}", &user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            token,
            user: user.into(),
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    // A missing user and a bad password produce the same error so the
    // endpoint cannot be used to enumerate registered emails.
    let user = match db::get_user_by_email(&state.pool, body.email.trim()).await? {
        Some(user) if security::verify_password(&body.password, &user.password_hash) => user,
        _ => return Err(ApiError::Unauthorized),
    };

    let token = security::issue_token(user.id, &state.secret_key, state.token_expire_days)?;

    tracing::info!("User id={} logged in", &user.id);

    Ok(Json(LoginResponse { token }))
}
