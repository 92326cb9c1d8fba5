use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use finance_tracker::{
    AppState, db,
    domain::TransactionType,
    error::ApiError,
    handlers::categories::{
        CategoryCreate, CategoryUpdate, create_category, delete_category, get_category,
        list_categories, update_category,
    },
};
use sqlx::sqlite::SqlitePoolOptions;

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

fn groceries(kind: TransactionType) -> CategoryCreate {
    CategoryCreate {
        name: String::from("Groceries"),
        kind,
        color: Some(String::from("#00FF00")),
        icon: None,
        sort_order: 0.0,
    }
}

#[tokio::test]
async fn duplicate_active_name_and_type_conflicts() {
    let state = setup().await;

    let (status, _) = create_category(State(state.clone()), Json(groceries(TransactionType::Expense)))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let result =
        create_category(State(state.clone()), Json(groceries(TransactionType::Expense))).await;
    assert!(matches!(result, Err(ApiError::Conflict(_))));
}

#[tokio::test]
async fn same_name_with_different_type_is_allowed() {
    let state = setup().await;

    create_category(State(state.clone()), Json(groceries(TransactionType::Expense)))
        .await
        .unwrap();
    let (status, _) = create_category(State(state.clone()), Json(groceries(TransactionType::Income)))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn recreating_after_soft_delete_succeeds() {
    let state = setup().await;

    let (_, Json(category)) =
        create_category(State(state.clone()), Json(groceries(TransactionType::Expense)))
            .await
            .unwrap();

    delete_category(State(state.clone()), Path(category.id))
        .await
        .unwrap();

    let (status, Json(recreated)) =
        create_category(State(state.clone()), Json(groceries(TransactionType::Expense)))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(recreated.id, category.id);
}

#[tokio::test]
async fn rename_onto_existing_pair_conflicts() {
    let state = setup().await;

    create_category(State(state.clone()), Json(groceries(TransactionType::Expense)))
        .await
        .unwrap();
    let (_, Json(other)) = create_category(
        State(state.clone()),
        Json(CategoryCreate {
            name: String::from("Dining"),
            kind: TransactionType::Expense,
            color: None,
            icon: None,
            sort_order: 1.0,
        }),
    )
    .await
    .unwrap();

    let result = update_category(
        State(state.clone()),
        Path(other.id),
        Json(CategoryUpdate {
            name: Some(String::from("Groceries")),
            ..Default::default()
        }),
    )
    .await;

    assert!(matches!(result, Err(ApiError::Conflict(_))));
}

#[tokio::test]
async fn patch_can_clear_color_and_set_icon() {
    let state = setup().await;

    let (_, Json(category)) =
        create_category(State(state.clone()), Json(groceries(TransactionType::Expense)))
            .await
            .unwrap();

    let Json(updated) = update_category(
        State(state.clone()),
        Path(category.id),
        Json(CategoryUpdate {
            color: Some(None),
            icon: Some(Some(String::from("cart"))),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    assert_eq!(updated.color, None);
    assert_eq!(updated.icon.as_deref(), Some("cart"));
    assert_eq!(updated.name, "Groceries");
}

#[tokio::test]
async fn list_excludes_soft_deleted_categories() {
    let state = setup().await;

    let (_, Json(category)) =
        create_category(State(state.clone()), Json(groceries(TransactionType::Expense)))
            .await
            .unwrap();
    create_category(State(state.clone()), Json(groceries(TransactionType::Income)))
        .await
        .unwrap();

    delete_category(State(state.clone()), Path(category.id))
        .await
        .unwrap();

    let Json(categories) = list_categories(State(state.clone())).await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].kind, TransactionType::Income);

    let result = get_category(State(state.clone()), Path(category.id)).await;
    assert!(matches!(result, Err(ApiError::NotFound("Category"))));
}
