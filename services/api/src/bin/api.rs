//! services/api/src/bin/api.rs

use api_lib::{
    adapters::DbAdapter,
    config::{Config, ConfigError},
    error::ApiError,
    sweeper::sweep_expired_sessions,
    web::{app_router, rest::ApiDoc, state::AppState},
};
use axum::http::{header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE}, HeaderValue, Method};
use axum::Router;
use lesson_tracker_core::memory::{
    InMemoryCredentialStore, InMemoryItemRepository, InMemorySessionStore,
};
use lesson_tracker_core::ports::{CredentialStore, ItemRepository, SessionStore};
use lesson_tracker_core::ServiceError;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Select the Storage Backend ---
    let (credentials, sessions, items): (
        Arc<dyn CredentialStore>,
        Arc<dyn SessionStore>,
        Arc<dyn ItemRepository>,
    ) = match &config.database_url {
        Some(database_url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?;
            let db_adapter = Arc::new(DbAdapter::new(db_pool));
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            (
                db_adapter.clone() as Arc<dyn CredentialStore>,
                db_adapter.clone() as Arc<dyn SessionStore>,
                db_adapter as Arc<dyn ItemRepository>,
            )
        }
        None => {
            warn!("DATABASE_URL is not set; using in-memory storage. Data is lost on restart.");
            (
                Arc::new(InMemoryCredentialStore::new()) as Arc<dyn CredentialStore>,
                Arc::new(InMemorySessionStore::new()) as Arc<dyn SessionStore>,
                Arc::new(InMemoryItemRepository::new()) as Arc<dyn ItemRepository>,
            )
        }
    };

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(
        config.clone(),
        credentials,
        sessions.clone(),
        items,
    ));

    if let Some(bootstrap) = &config.bootstrap_user {
        match app_state
            .auth
            .provision(&bootstrap.username, &bootstrap.password)
            .await
        {
            Ok(user) => info!(user_id = %user.user_id, "Bootstrap user created."),
            Err(ServiceError::Conflict(_)) => info!("Bootstrap user already exists."),
            Err(e) => return Err(e.into()),
        }
    }

    // --- 4. Start the Session Sweeper ---
    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(sweep_expired_sessions(
        sessions,
        config.session_sweep_interval,
        shutdown.clone(),
    ));

    // --- 5. Create the Web Router ---
    let allowed_origin = config.allowed_origin.parse::<HeaderValue>().map_err(|e| {
        ConfigError::InvalidValue("ALLOWED_ORIGIN".to_string(), e.to_string())
    })?;
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(app_router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped. Shutting down the session sweeper...");
    shutdown.cancel();
    sweeper
        .await
        .map_err(|e| ApiError::Internal(format!("session sweeper panicked: {}", e)))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {:?}", e);
        std::future::pending::<()>().await;
    }
}
