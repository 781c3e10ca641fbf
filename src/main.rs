use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockroom_backend::config::Config;
use stockroom_backend::services::oauth_state;
use stockroom_backend::services::square::SquareService;
use stockroom_backend::{AppState, handlers, jobs};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stockroom_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().expect("failed to load configuration");

    tracing::info!("Connecting to database...");
    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running migrations...");
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let square = SquareService::new(
        config.square_client_id.clone(),
        config.square_client_secret.clone(),
        config.square_base_url.clone(),
    );

    // Daily background jobs
    jobs::token_refresh_job::start_token_refresh_job(db.clone(), square.clone()).await;
    jobs::items_sync_job::start_items_sync_job(db.clone(), square.clone()).await;

    let port = config.port;
    let state = AppState {
        db,
        square,
        config: Arc::new(config),
        oauth_states: oauth_state::new_state_store(),
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health))
        .route("/oauth/square/authorize", get(handlers::oauth::authorize))
        .route("/oauth/square/callback", get(handlers::oauth::callback))
        .route("/api/user", get(handlers::user::get_user))
        .route("/api/user/email", put(handlers::user::set_email))
        .route("/api/merchant", get(handlers::merchant::get_merchant))
        .route(
            "/api/merchant/onboarding-complete",
            post(handlers::merchant::complete_onboarding),
        )
        .route("/api/items", get(handlers::item::list_items))
        .route("/api/items/sync", post(handlers::item::sync_items))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("failed to bind listener");

    tracing::info!("Server listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}

async fn health() -> &'static str {
    "ok"
}
