use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use finance_tracker::{
    AppState, db,
    domain::{Account, AccountType, Category, TransactionType},
    error::ApiError,
    handlers::{
        accounts::{self, AccountCreate, AccountUpdate},
        categories::{self, CategoryCreate},
        transactions::{
            TransactionCreate, TransactionUpdate, create_transaction, delete_transaction,
            get_transaction, list_transactions, update_transaction,
        },
    },
};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

async fn setup() -> Arc<AppState> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::init_schema(&pool).await.unwrap();
    Arc::new(AppState {
        pool,
        secret_key: String::from("test-secret"),
        token_expire_days: 30,
    })
}

async fn seed_account(state: &Arc<AppState>, name: &str) -> Account {
    let (_, Json(account)) = accounts::create_account(
        State(state.clone()),
        Json(AccountCreate {
            name: String::from(name),
            kind: AccountType::Checking,
            balance: 0.0,
            currency: String::from("USD"),
            description: None,
            sort_order: 0.0,
        }),
    )
    .await
    .unwrap();
    account
}

async fn seed_category(state: &Arc<AppState>, name: &str) -> Category {
    let (_, Json(category)) = categories::create_category(
        State(state.clone()),
        Json(CategoryCreate {
            name: String::from(name),
            kind: TransactionType::Expense,
            color: None,
            icon: None,
            sort_order: 0.0,
        }),
    )
    .await
    .unwrap();
    category
}

fn expense(account_id: Uuid, category_id: Option<Uuid>, amount: f64, date: &str) -> TransactionCreate {
    TransactionCreate {
        account_id,
        category_id,
        kind: TransactionType::Expense,
        amount,
        description: None,
        date: date.parse::<DateTime<Utc>>().unwrap(),
        is_reconciled: false,
        sort_order: 0.0,
    }
}

#[tokio::test]
async fn create_rejects_non_positive_amounts() {
    let state = setup().await;
    let account = seed_account(&state, "Main").await;

    for amount in [0.0, -12.5] {
        let result = create_transaction(
            State(state.clone()),
            Json(expense(account.id, None, amount, "2025-01-01T00:00:00Z")),
        )
        .await;
        assert!(matches!(
            result,
            Err(ApiError::Validation { field: "amount", .. })
        ));
    }
}

#[tokio::test]
async fn create_embeds_account_and_category_snapshots() {
    let state = setup().await;
    let account = seed_account(&state, "Main").await;
    let category = seed_category(&state, "Groceries").await;

    let (status, Json(record)) = create_transaction(
        State(state.clone()),
        Json(expense(
            account.id,
            Some(category.id),
            42.0,
            "2025-01-01T00:00:00Z",
        )),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(record.account.id, account.id);
    assert_eq!(record.account.name, "Main");
    assert_eq!(record.category.as_ref().unwrap().name, "Groceries");
}

#[tokio::test]
async fn reads_reflect_the_current_account_state() {
    let state = setup().await;
    let account = seed_account(&state, "Old Name").await;

    let (_, Json(record)) = create_transaction(
        State(state.clone()),
        Json(expense(account.id, None, 10.0, "2025-01-01T00:00:00Z")),
    )
    .await
    .unwrap();

    accounts::update_account(
        State(state.clone()),
        Path(account.id),
        Json(AccountUpdate {
            name: Some(String::from("New Name")),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    let Json(fetched) = get_transaction(State(state.clone()), Path(record.id))
        .await
        .unwrap();
    assert_eq!(fetched.account.name, "New Name");
}

#[tokio::test]
async fn soft_deleted_account_still_resolves_for_history() {
    let state = setup().await;
    let account = seed_account(&state, "Main").await;

    let (_, Json(record)) = create_transaction(
        State(state.clone()),
        Json(expense(account.id, None, 10.0, "2025-01-01T00:00:00Z")),
    )
    .await
    .unwrap();

    accounts::delete_account(State(state.clone()), Path(account.id))
        .await
        .unwrap();

    let Json(fetched) = get_transaction(State(state.clone()), Path(record.id))
        .await
        .unwrap();
    assert_eq!(fetched.account.id, account.id);
    assert_eq!(fetched.account.name, "Main");
}

#[tokio::test]
async fn list_orders_by_date_descending() {
    let state = setup().await;
    let account = seed_account(&state, "Main").await;

    for date in [
        "2025-01-02T00:00:00Z",
        "2025-03-01T00:00:00Z",
        "2025-02-15T00:00:00Z",
    ] {
        create_transaction(State(state.clone()), Json(expense(account.id, None, 1.0, date)))
            .await
            .unwrap();
    }

    let Json(records) = list_transactions(State(state.clone())).await.unwrap();
    let dates: Vec<DateTime<Utc>> = records.iter().map(|record| record.date).collect();
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted);
    assert_eq!(records.len(), 3);
}

#[tokio::test]
async fn patch_can_clear_the_category() {
    let state = setup().await;
    let account = seed_account(&state, "Main").await;
    let category = seed_category(&state, "Groceries").await;

    let (_, Json(record)) = create_transaction(
        State(state.clone()),
        Json(expense(
            account.id,
            Some(category.id),
            10.0,
            "2025-01-01T00:00:00Z",
        )),
    )
    .await
    .unwrap();

    let Json(updated) = update_transaction(
        State(state.clone()),
        Path(record.id),
        Json(TransactionUpdate {
            category_id: Some(None),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    assert_eq!(updated.category_id, None);
    assert!(updated.category.is_none());
    assert_eq!(updated.amount, 10.0);
}

#[tokio::test]
async fn create_against_unknown_account_fails_validation() {
    let state = setup().await;

    let result = create_transaction(
        State(state.clone()),
        Json(expense(Uuid::new_v4(), None, 10.0, "2025-01-01T00:00:00Z")),
    )
    .await;

    assert!(matches!(result, Err(ApiError::Validation { .. })));
}

#[tokio::test]
async fn soft_delete_hides_from_list_and_get() {
    let state = setup().await;
    let account = seed_account(&state, "Main").await;

    let (_, Json(record)) = create_transaction(
        State(state.clone()),
        Json(expense(account.id, None, 10.0, "2025-01-01T00:00:00Z")),
    )
    .await
    .unwrap();

    let status = delete_transaction(State(state.clone()), Path(record.id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let Json(records) = list_transactions(State(state.clone())).await.unwrap();
    assert!(records.is_empty());

    let result = get_transaction(State(state.clone()), Path(record.id)).await;
    assert!(matches!(result, Err(ApiError::NotFound("Transaction"))));
}

#[tokio::test]
async fn update_payloads_reject_unknown_fields() {
    let result =
        serde_json::from_value::<TransactionUpdate>(serde_json::json!({ "payee": "nobody" }));
    assert!(result.is_err());
}
