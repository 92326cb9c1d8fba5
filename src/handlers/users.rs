use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    AppState, db,
    domain::{User, UserResponse},
    error::ApiError,
    security,
};

use super::{validated_email, validated_name, validated_password};

const EMAIL_CONFLICT: &str = "Email already registered";

#[derive(Debug, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
}

fn apply_update(user: &mut User, body: UserUpdate) -> Result<(), ApiError> {
    if let Some(email) = body.email {
        user.email = validated_email(&email)?;
    }
    if let Some(name) = body.name {
        user.name = validated_name(&name)?;
    }
    Ok(())
}

/// Shared by user creation and self-service registration. The unique
/// constraint on email is the conflict check; the violation is caught after
/// the write rather than pre-checked.
pub(crate) async fn insert_new_user(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    password: &str,
) -> Result<User, ApiError> {
    let password = validated_password(password)?;
    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4(),
        email: validated_email(email)?,
        name: validated_name(name)?,
        password_hash: security::hash_password(password)?,
        created_at: now,
        updated_at: now,
    };

    db::insert_user(pool, &user)
        .await
        .map_err(|err| ApiError::conflict_on_unique(err, EMAIL_CONFLICT))?;

    tracing::info!("Created user id={}", &user.id);

    Ok(user)
}

pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = db::list_users(&state.pool)
        .await
        .inspect_err(|err| tracing::error!("Error listing users: {:#?}", err))?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = insert_new_user(&state.pool, &body.email, &body.name, &body.password).await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = db::get_user(&state.pool, user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    Ok(Json(user.into()))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut user = db::get_user(&state.pool, user_id)
        .await?
        .ok_or(ApiError::NotFound("User"))?;

    apply_update(&mut user, body)?;
    user.updated_at = Utc::now();

    db::update_user(&state.pool, &user)
        .await
        .map_err(|err| ApiError::conflict_on_unique(err, EMAIL_CONFLICT))?;

    Ok(Json(user.into()))
}

// Users are hard-deleted; they have no dependent history to preserve.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let affected = db::delete_user(&state.pool, user_id).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("User"));
    }

    tracing::info!("Deleted user id={}", &user_id);

    Ok(StatusCode::NO_CONTENT)
}
