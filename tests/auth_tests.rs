use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use finance_tracker::{
    AppState, db,
    error::ApiError,
    handlers::auth::{LoginRequest, RegisterRequest, login, register},
    security,
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

fn alice() -> RegisterRequest {
    RegisterRequest {
        email: String::from("alice@example.com"),
        name: String::from("Alice"),
        password: String::from("correct horse battery staple"),
    }
}

#[tokio::test]
async fn register_issues_a_token_bound_to_the_user() {
    let state = setup().await;

    let (status, Json(response)) = register(State(state.clone()), Json(alice()))
        .await
        .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response.user.email, "alice@example.com");

    let claims = security::decode_token(&response.token, "test-secret").unwrap();
    assert_eq!(claims.sub, response.user.id.to_string());
    assert!(claims.exp > claims.iat);
}

#[tokio::test]
async fn registering_the_same_email_twice_conflicts() {
    let state = setup().await;

    register(State(state.clone()), Json(alice())).await.unwrap();
    let result = register(State(state.clone()), Json(alice())).await;

    assert!(matches!(result, Err(ApiError::Conflict(_))));
}

#[tokio::test]
async fn register_rejects_short_passwords() {
    let state = setup().await;

    let result = register(
        State(state.clone()),
        Json(RegisterRequest {
            password: String::from("short"),
            ..alice()
        }),
    )
    .await;

    assert!(matches!(
        result,
        Err(ApiError::Validation { field: "password", .. })
    ));
}

#[tokio::test]
async fn login_succeeds_with_correct_credentials() {
    let state = setup().await;

    let (_, Json(registered)) = register(State(state.clone()), Json(alice()))
        .await
        .unwrap();

    let Json(response) = login(
        State(state.clone()),
        Json(LoginRequest {
            email: String::from("alice@example.com"),
            password: String::from("correct horse battery staple"),
        }),
    )
    .await
    .unwrap();

    let claims = security::decode_token(&response.token, "test-secret").unwrap();
    assert_eq!(claims.sub, registered.user.id.to_string());
}

#[tokio::test]
async fn wrong_password_and_unknown_email_yield_the_same_error() {
    let state = setup().await;

    register(State(state.clone()), Json(alice())).await.unwrap();

    let wrong_password = login(
        State(state.clone()),
        Json(LoginRequest {
            email: String::from("alice@example.com"),
            password: String::from("not the password"),
        }),
    )
    .await;
    let unknown_email = login(
        State(state.clone()),
        Json(LoginRequest {
            email: String::from("nobody@example.com"),
            password: String::from("correct horse battery staple"),
        }),
    )
    .await;

    assert!(matches!(wrong_password, Err(ApiError::Unauthorized)));
    assert!(matches!(unknown_email, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() {
    let state = setup().await;

    let (_, Json(response)) = register(State(state.clone()), Json(alice()))
        .await
        .unwrap();

    let result = security::decode_token(&response.token, "a-different-secret");
    assert!(matches!(result, Err(ApiError::Unauthorized)));
}
