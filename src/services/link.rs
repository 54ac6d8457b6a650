// Link business logic: create with scraped preview metadata, owner-scoped reads

use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    app::AppState,
    db::DieselPool,
    models::{
        folder::Folder,
        link::{CreateLinkRequest, Link, ListLinksQuery, NewLink, DEFAULT_PING_INTERVAL_MS},
    },
    services::{folder::can_add_links, MetadataFetcher},
    utils::{
        api_error::{ApiError, ApiResult},
        audit_logger::{AuditAction, AuditLogger},
        normalize_tags,
    },
};

pub struct LinkService {
    diesel_pool: DieselPool,
    metadata_fetcher: Arc<MetadataFetcher>,
}

impl LinkService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
            metadata_fetcher: state.metadata_fetcher.clone(),
        }
    }

    /// Save a link into a folder. The page is fetched inline to fill in
    /// title, preview image and domain before the row is written.
    #[instrument(skip(self, request))]
    pub async fn create_link(
        &self,
        user_id: i32,
        folder_id: i32,
        mut request: CreateLinkRequest,
    ) -> ApiResult<Link> {
        request.sanitize();
        request.validate()?;

        let folder = {
            let mut conn = self.diesel_pool.get().await?;
            let folder = Folder::find_by_id(&mut conn, folder_id)
                .await?
                .ok_or_else(|| ApiError::NotFound("Folder not found".to_string()))?;

            if !can_add_links(&mut conn, &folder, user_id).await? {
                warn!("User {} may not add links to folder {}", user_id, folder_id);
                return Err(ApiError::Forbidden(
                    "You do not have permission to add links to this folder".to_string(),
                ));
            }
            folder
        };

        // Reject malformed or private targets before any network traffic
        self.metadata_fetcher.parse_url(&request.url)?;

        // No pooled connection is held while the remote page loads
        let metadata = self.metadata_fetcher.fetch(&request.url).await?;

        let new_link = NewLink {
            folder_id: folder.id,
            url: request.url,
            title: metadata.title,
            image_url: metadata.image_url,
            domain: metadata.domain,
            summary: request.summary,
            tags: normalize_tags(request.tags),
            is_online: false,
            ping_interval_ms: DEFAULT_PING_INTERVAL_MS,
        };

        let mut conn = self.diesel_pool.get().await?;
        let link = Link::create(&mut conn, new_link).await?;

        info!("Created link {} in folder {} for user {}", link.id, folder.id, user_id);
        AuditLogger::log(
            AuditAction::LinkCreated,
            user_id,
            Some(link.id),
            Some(link.domain.clone()),
        );

        Ok(link)
    }

    #[instrument(skip(self))]
    pub async fn list_links(&self, user_id: i32, query: ListLinksQuery) -> ApiResult<Vec<Link>> {
        let mut conn = self.diesel_pool.get().await?;
        Ok(Link::list_for_owner(&mut conn, user_id, query.folder_id).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_link(&self, user_id: i32, link_id: i32) -> ApiResult<Link> {
        let mut conn = self.diesel_pool.get().await?;
        Link::find_for_owner(&mut conn, user_id, link_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Link not found".to_string()))
    }
}
