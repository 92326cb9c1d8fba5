use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    AppState, db,
    domain::{Transaction, TransactionRecord, TransactionType},
    error::ApiError,
};

use super::double_option;

#[derive(Debug, Deserialize)]
pub struct TransactionCreate {
    pub account_id: Uuid,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub is_reconciled: bool,
    #[serde(default)]
    pub sort_order: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransactionUpdate {
    pub account_id: Option<Uuid>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<Uuid>>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub date: Option<DateTime<Utc>>,
    pub is_reconciled: Option<bool>,
    pub sort_order: Option<f64>,
}

fn validated_amount(amount: f64) -> Result<f64, ApiError> {
    // `!(amount > 0.0)` also rejects NaN.
    if !(amount > 0.0) {
        return Err(ApiError::validation(
            "amount",
            "amount must be greater than zero",
        ));
    }
    Ok(amount)
}

fn apply_update(transaction: &mut Transaction, body: TransactionUpdate) -> Result<(), ApiError> {
    if let Some(account_id) = body.account_id {
        transaction.account_id = account_id;
    }
    if let Some(category_id) = body.category_id {
        transaction.category_id = category_id;
    }
    if let Some(kind) = body.kind {
        transaction.kind = kind;
    }
    if let Some(amount) = body.amount {
        transaction.amount = validated_amount(amount)?;
    }
    if let Some(description) = body.description {
        transaction.description = description;
    }
    if let Some(date) = body.date {
        transaction.date = date;
    }
    if let Some(is_reconciled) = body.is_reconciled {
        transaction.is_reconciled = is_reconciled;
    }
    if let Some(sort_order) = body.sort_order {
        transaction.sort_order = sort_order;
    }
    Ok(())
}

// SQLite does not report which foreign key failed, so the message names both
// reference fields.
fn invalid_reference(err: sqlx::Error) -> ApiError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => ApiError::validation(
            "account_id",
            "account_id or category_id does not reference an existing row",
        ),
        _ => ApiError::Database(err),
    }
}

pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TransactionRecord>>, ApiError> {
    let transactions = db::list_transactions(&state.pool)
        .await
        .inspect_err(|err| tracing::error!("Error listing transactions: {:#?}", err))?;

    Ok(Json(transactions))
}

#[axum::debug_handler]
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TransactionCreate>,
) -> Result<(StatusCode, Json<TransactionRecord>), ApiError> {
    let now = Utc::now();
    let transaction = Transaction {
        id: Uuid::new_v4(),
        account_id: body.account_id,
        category_id: body.category_id,
        kind: body.kind,
        amount: validated_amount(body.amount)?,
        description: body.description,
        date: body.date,
        is_reconciled: body.is_reconciled,
        sort_order: body.sort_order,
        deleted_at: None,
        created_at: now,
        updated_at: now,
    };

    db::insert_transaction(&state.pool, &transaction)
        .await
        .map_err(invalid_reference)?;

    tracing::info!(
        "Created transaction id={} account_id={}",
        &transaction.id,
        &transaction.account_id
    );

    // Re-fetch through the join path so the response carries the account and
    // category snapshots rather than the bare insert result.
    let record = db::get_transaction(&state.pool, transaction.id)
        .await?
        .ok_or(ApiError::NotFound("Transaction"))?;

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionRecord>, ApiError> {
    let record = db::get_transaction(&state.pool, transaction_id)
        .await?
        .ok_or(ApiError::NotFound("Transaction"))?;

    Ok(Json(record))
}

pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<Uuid>,
    Json(body): Json<TransactionUpdate>,
) -> Result<Json<TransactionRecord>, ApiError> {
    let mut transaction = db::get_transaction_row(&state.pool, transaction_id)
        .await?
        .ok_or(ApiError::NotFound("Transaction"))?;

    apply_update(&mut transaction, body)?;
    transaction.updated_at = Utc::now();

    db::update_transaction(&state.pool, &transaction)
        .await
        .map_err(invalid_reference)?;

    let record = db::get_transaction(&state.pool, transaction_id)
        .await?
        .ok_or(ApiError::NotFound("Transaction"))?;

    Ok(Json(record))
}

pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    Path(transaction_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let affected = db::soft_delete_transaction(&state.pool, transaction_id, Utc::now()).await?;
    if affected == 0 {
        return Err(ApiError::NotFound("Transaction"));
    }

    tracing::info!("Soft-deleted transaction id={}", &transaction_id);

    Ok(StatusCode::NO_CONTENT)
}
