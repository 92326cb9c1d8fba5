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
    domain::{Account, AccountType, DEFAULT_CURRENCY},
    error::ApiError,
};

use super::{double_option, validated_name};

#[derive(Debug, Deserialize)]
pub struct AccountCreate {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AccountType,
    #[serde(default)]
    pub balance: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: f64,
}

fn default_currency() -> String {
    String::from(DEFAULT_CURRENCY)
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountUpdate {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<AccountType>,
    pub balance: Option<f64>,
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub sort_order: Option<f64>,
}

// Each optional field is applied individually so absent fields stay untouched.
fn apply_update(account: &mut Account, body: AccountUpdate) -> Result<(), ApiError> {
    if let Some(name) = body.name {
        account.name = validated_name(&name)?;
    }
    if let Some(kind) = body.kind {
        account.kind = kind;
    }
    if let Some(balance) = body.balance {
        account.balance = balance;
    }
    if let Some(currency) = body.currency {
        account.currency = currency.to_uppercase();
    }
    if let Some(description) = body.description {
        account.description = description;
    }
    if let Some(sort_order) = body.sort_order {
        account.sort_order = sort_order;
    }
    Ok(())
}

pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Account>>, ApiError> {
    let accounts = db::list_accounts(&state.pool)
        .await
        .inspect_err(|err| tracing::error!("Error listing accounts: {:#?}", err))?;

    Ok(Json(accounts))
}

#[axum::debug_handler]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AccountCreate>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let now = Utc::now();
    let account = Account {
        id: Uuid::new_v4(),
        name: validated_name(&body.name)?,
        kind: body.kind,
        balance: body.balance,
        currency: body.currency.to_uppercase(),
        description: body.description,
        sort_order: body.sort_order,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };

    db::insert_account(&state.pool, &account).await?;

    tracing::info!("Created account id={} name={}", &account.id, &account.name);

    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
) -> Result<Json<Account>, ApiError> {
    let account = db::get_account(&state.pool, account_id)
        .await?
        .ok_or(ApiError::NotFound("Account"))?;

    Ok(Json(account))
}

pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
    Json(body): Json<AccountUpdate>,
) -> Result<Json<Account>, ApiError> {
    let mut account = db::get_account(&state.pool, account_id)
        .await?
        .ok_or(ApiError::NotFound("Account"))?;

    apply_update(&mut account, body)?;
    account.updated_at = Utc::now();

    db::update_account(&state.pool, &account).await?;

    Ok(Json(account))
}

pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let affected = db::soft_delete_account(&state.pool, account_id, Utc::now()).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Account"));
    }

    tracing::info!("Soft-deleted account id={}", &account_id);

    Ok(StatusCode::NO_CONTENT)
}
