use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState, db,
    domain::{Category, TransactionType},
    error::ApiError,
};

use super::{double_option, validated_name};

const NAME_TYPE_CONFLICT: &str = "A category with this name and type already exists";

#[derive(Debug, Deserialize)]
pub struct CategoryCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    #[serde(default, deserialize_with = "double_option")]
    pub color: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub icon: Option<Option<String>>,
    pub sort_order: Option<f64>,
}

fn apply_update(category: &mut Category, body: CategoryUpdate) -> Result<(), ApiError> {
    if let Some(name) = body.name {
        category.name = validated_name(&name)?;
    }
    if let Some(kind) = body.kind {
        category.kind = kind;
    }
    if let Some(color) = body.color {
        category.color = color;
    }
    if let Some(icon) = body.icon {
        category.icon = icon;
    }
    if let Some(sort_order) = body.sort_order {
        category.sort_order = sort_order;
    }
    Ok(())
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    let categories = db::list_categories(&state.pool)
        .await
        .inspect_err(|err| tracing::error!("Error listing categories: {:#?}", err))?;

    Ok(Json(categories))
}

#[axum::debug_handler]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CategoryCreate>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let now = Utc::now();
    let category = Category {
        id: Uuid::new_v4(),
        name: validated_name(&body.name)?,
        kind: body.kind,
        color: body.color,
        icon: body.icon,
        sort_order: body.sort_order,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };

    // The partial unique index on active (name, type) is the source of truth;
    // a pre-check would leave a race window.
    db::insert_category(&state.pool, &category)
        .await
        .map_err(|err| ApiError::conflict_on_unique(err, NAME_TYPE_CONFLICT))?;

    tracing::info!(
        "Created category id={} name={}",
        &category.id,
        &category.name
    );

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<Uuid>,
) -> Result<Json<Category>, ApiError> {
    let category = db::get_category(&state.pool, category_id)
        .await?
        .ok_or(ApiError::NotFound("Category"))?;

    Ok(Json(category))
}

pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<Uuid>,
    Json(body): Json<CategoryUpdate>,
) -> Result<Json<Category>, ApiError> {
    let mut category = db::get_category(&state.pool, category_id)
        .await?
        .ok_or(ApiError::NotFound("Category"))?;

    apply_update(&mut category, body)?;
    category.updated_at = Utc::now();

    db::update_category(&state.pool, &category)
        .await
        .map_err(|err| ApiError::conflict_on_unique(err, NAME_TYPE_CONFLICT))?;

    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let affected = db::soft_delete_category(&state.pool, category_id, Utc::now()).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Category"));
    }

    tracing::info!("Soft-deleted category id={}", &category_id);

    Ok(StatusCode::NO_CONTENT)
}
