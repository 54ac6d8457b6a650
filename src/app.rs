// Application state shared across handlers
use std::sync::Arc;

use crate::{
    app_config::AppConfig,
    db::DieselPool,
    services::{JwtConfig, JwtService, MetadataError, MetadataFetcher},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub diesel_pool: DieselPool,
    pub jwt_service: Arc<JwtService>,
    pub metadata_fetcher: Arc<MetadataFetcher>,
}

impl AppState {
    /// Wire the services from config around an existing pool
    pub fn new(config: AppConfig, diesel_pool: DieselPool) -> Result<Self, MetadataError> {
        let jwt_service = JwtService::new(JwtConfig::from_app_config(&config));
        let metadata_fetcher = MetadataFetcher::new(&config.metadata)?;

        Ok(Self {
            config: Arc::new(config),
            diesel_pool,
            jwt_service: Arc::new(jwt_service),
            metadata_fetcher: Arc::new(metadata_fetcher),
        })
    }
}
