use axum::Json;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::ApiError;

pub mod accounts;
pub mod auth;
pub mod categories;
pub mod settings;
pub mod transactions;
pub mod users;

pub async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Deserializes a present field into `Some(...)`, so `Option<Option<T>>`
/// distinguishes "field absent" (None) from "field set to null" (Some(None))
/// in PATCH bodies. Must be paired with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

pub(crate) fn validated_name(name: &str) -> Result<String, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("name", "name must not be empty"));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validated_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim();
    let well_formed = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
    });
    if !well_formed {
        return Err(ApiError::validation("email", "email is not a valid address"));
    }
    Ok(email.to_string())
}

pub(crate) fn validated_password(password: &str) -> Result<&str, ApiError> {
    if password.len() < 8 {
        return Err(ApiError::validation(
            "password",
            "password must be at least 8 characters",
        ));
    }
    Ok(password)
}
