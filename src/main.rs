use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use linkshelf_backend::{build_router, initialize_app_state, migrations, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before anything reads them
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.rust_log))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting linkshelf backend ({}) on {}",
        config.environment,
        config.bind_address()
    );

    if migrations::should_run_migrations(&config) {
        info!("Running embedded migrations...");
        migrations::run_all_migrations(&config)
            .await
            .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    } else {
        migrations::report_migration_status(&config).await;
    }

    let bind_address = config.bind_address();
    let state = initialize_app_state(config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize application state: {}", e))?;

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Listening on {}", bind_address);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
