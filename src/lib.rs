// Library exports for the linkshelf backend
// The binary and the integration tests both build the router from here

pub mod app;
pub mod app_config;
pub mod db;
pub mod handlers;
pub mod middleware;
pub mod migrations;
pub mod models;
pub mod schema;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use app::AppState;
pub use app_config::{AppConfig, ConfigError};
pub use db::DieselPool;
pub use middleware::AuthenticatedUser;
pub use services::{JwtConfig, JwtError, JwtService, MetadataFetcher};
pub use utils::{ApiError, ApiResult};

use axum::{middleware::from_fn_with_state, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the pool and services from a loaded config
pub async fn initialize_app_state(
    config: AppConfig,
) -> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    info!(
        "Initializing database pool for {}",
        db::mask_connection_string(&config.database.url)
    );
    let diesel_pool =
        db::create_diesel_pool(db::DieselDatabaseConfig::from(&config.database)).await?;

    let state = AppState::new(config, diesel_pool)?;
    if !state.jwt_service.has_secret() {
        tracing::warn!("JWT_SECRET is not set; authenticated requests will fail until it is");
    }

    Ok(state)
}

/// Full HTTP router with tracing and CORS layers
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/users", handlers::users_routes(state.clone()))
        .nest("/api/folders", handlers::folders_routes(state.clone()))
        .nest("/api/links", handlers::links_routes(state.clone()))
        .nest("/api/health", handlers::health_routes())
        .layer(from_fn_with_state(
            state.clone(),
            middleware::dynamic_cors_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
