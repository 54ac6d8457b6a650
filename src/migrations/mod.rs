// Migration orchestrator for the Linkshelf backend
// Diesel (PostgreSQL) migrations are embedded in the binary and applied at startup

pub mod diesel;

use crate::app_config::AppConfig;
use std::error::Error;
use tracing::{error, info, warn};

/// Run embedded migrations against the configured database
pub async fn run_all_migrations(config: &AppConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!(
        "[MIGRATIONS] Starting migration process for environment: {}",
        config.environment
    );

    match diesel::run_migrations(&config.database.url).await {
        Ok(0) => info!("[MIGRATIONS] Diesel migrations up to date"),
        Ok(applied_count) => info!("[MIGRATIONS] Applied {} Diesel migrations", applied_count),
        Err(e) => {
            error!("[MIGRATIONS] Diesel migration failed: {}", e);
            return Err(format!("Diesel migration failed: {}", e).into());
        },
    }

    Ok(())
}

/// Check if migrations should run based on configuration
pub fn should_run_migrations(config: &AppConfig) -> bool {
    !config.disable_embedded_migrations
}

/// Log whether the schema is behind when embedded migrations are switched off
pub async fn report_migration_status(config: &AppConfig) {
    match diesel::check_migration_status(&config.database.url).await {
        Ok(status) if status.is_up_to_date() => {
            info!("[MIGRATIONS] {} migrations applied, none pending", status.applied_count)
        },
        Ok(status) => warn!(
            "[MIGRATIONS] {} pending migrations not applied: {:?}",
            status.pending_count, status.pending_migrations
        ),
        Err(e) => warn!("[MIGRATIONS] Could not read migration status: {}", e),
    }
}
