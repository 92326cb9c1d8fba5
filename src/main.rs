use std::sync::Arc;

use finance_tracker::{AppState, args::parse_args, db, logging::setup_logging, router};

#[tokio::main]
async fn main() {
    let args = parse_args();

    setup_logging(&args.base_log_dir);

    let pool = db::create_pool(&args.database_url)
        .await
        .expect("Failed to create SQLite pool");

    db::init_schema(&pool)
        .await
        .expect("Failed to initialise database schema");

    let app_state = Arc::new(AppState {
        pool,
        secret_key: args.secret_key,
        token_expire_days: args.token_expire_days,
    });

    let app = router(app_state);

    let bind_address = format! {"0.0.0.0:{}", args.port};
    tracing::info!("Server listening on {}...", bind_address);

    let listener = tokio::net::TcpListener::bind(bind_address).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
