// Diesel Database Pool Configuration
// Diesel-async + bb8 connection pooling, sized from AppConfig

use crate::app_config::DatabaseConfig;
use bb8::Pool;
use diesel_async::pooled_connection::{AsyncDieselConnectionManager, PoolError};
use diesel_async::AsyncPgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations};
use std::time::Duration;

// Embed migrations at compile time
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations/diesel");

pub type DieselPool = Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Error type returned when a pooled connection cannot be checked out
pub type PoolRunError = bb8::RunError<PoolError>;

/// Pool tuning derived from the database section of AppConfig
#[derive(Debug, Clone)]
pub struct DieselDatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_lifetime: Duration,
    pub test_on_checkout: bool,
}

impl From<&DatabaseConfig> for DieselDatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connection_timeout: Duration::from_secs(config.connect_timeout),
            idle_timeout: Duration::from_secs(config.idle_timeout),
            max_lifetime: Duration::from_secs(config.max_lifetime),
            test_on_checkout: true,
        }
    }
}

impl DieselDatabaseConfig {
    fn builder(&self) -> bb8::Builder<AsyncDieselConnectionManager<AsyncPgConnection>> {
        Pool::builder()
            .max_size(self.max_connections)
            .min_idle(Some(self.min_connections))
            .connection_timeout(self.connection_timeout)
            .idle_timeout(Some(self.idle_timeout))
            .max_lifetime(Some(self.max_lifetime))
            .test_on_check_out(self.test_on_checkout)
    }
}

/// Create Diesel connection pool and verify one connection can be opened
pub async fn create_diesel_pool(config: DieselDatabaseConfig) -> Result<DieselPool, PoolRunError> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.clone());

    let pool = config
        .builder()
        .build(manager)
        .await
        .map_err(bb8::RunError::User)?;

    // Test the connection
    let conn = pool.get().await?;
    drop(conn);

    tracing::info!(
        "Diesel pool initialized with {} max connections ({})",
        config.max_connections,
        mask_connection_string(&config.url)
    );

    Ok(pool)
}

/// Build a pool that opens connections on first checkout only.
/// Used where the router must exist before the database is reachable.
pub fn create_lazy_diesel_pool(config: DieselDatabaseConfig) -> DieselPool {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.url.clone());
    config.builder().min_idle(None).build_unchecked(manager)
}

/// Health check for database pool
pub async fn check_diesel_health(pool: &DieselPool) -> Result<(), PoolRunError> {
    let conn = pool.get().await?;

    // Simple health check - just getting a connection is enough
    drop(conn);

    Ok(())
}

/// Mask database connection string for logging
pub fn mask_connection_string(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let scheme = parsed.scheme();
        let host = parsed.host_str().unwrap_or("***");
        let path = parsed.path();

        // Always normalize to postgresql:// prefix
        let normalized_scheme = if scheme == "postgres" {
            "postgresql"
        } else {
            scheme
        };

        if parsed.username().is_empty() && parsed.password().is_none() {
            format!("{}://{}{}", normalized_scheme, host, path)
        } else {
            format!("{}://***:***@{}{}", normalized_scheme, host, path)
        }
    } else {
        "postgresql://***:***@***".to_string()
    }
}
