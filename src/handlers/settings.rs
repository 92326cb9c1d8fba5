use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    AppState, db,
    domain::{AiProvider, Settings},
    error::ApiError,
};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsUpdate {
    pub currency: Option<String>,
    pub ai_provider: Option<AiProvider>,
    pub ai_model: Option<String>,
}

fn apply_update(settings: &mut Settings, body: SettingsUpdate) {
    if let Some(currency) = body.currency {
        settings.currency = currency;
    }
    if let Some(ai_provider) = body.ai_provider {
        settings.ai_provider = ai_provider;
    }
    if let Some(ai_model) = body.ai_model {
        settings.ai_model = ai_model;
    }
}

pub async fn get_settings(State(state): State<Arc<AppState>>) -> Result<Json<Settings>, ApiError> {
    let settings = db::get_or_create_settings(&state.pool, &Settings::default_record())
        .await
        .inspect_err(|err| tracing::error!("Error reading settings: {:#?}", err))?;

    Ok(Json(settings))
}

pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SettingsUpdate>,
) -> Result<Json<Settings>, ApiError> {
    // get-or-create first so an update on a fresh store still has a row.
    let mut settings = db::get_or_create_settings(&state.pool, &Settings::default_record()).await?;

    apply_update(&mut settings, body);
    settings.updated_at = Utc::now();

    db::update_settings(&state.pool, &settings).await?;

    Ok(Json(settings))
}
