// Link Database Models
// A link always lives in exactly one folder; its owner is the folder's owner.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::schema::{folders, links};

/// Polling interval recorded on new links; nothing schedules against it yet
pub const DEFAULT_PING_INTERVAL_MS: i32 = 3000;

/// Link model representing a database record
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Serialize)]
#[diesel(table_name = links)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: i32,
    pub folder_id: i32,
    pub url: String,
    pub title: String,
    pub image_url: String,
    pub domain: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub last_status: Option<String>,
    pub last_status_code: Option<i32>,
    pub is_online: bool,
    pub ping_interval_ms: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New link for insertion
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = links)]
pub struct NewLink {
    pub folder_id: i32,
    pub url: String,
    pub title: String,
    pub image_url: String,
    pub domain: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub is_online: bool,
    pub ping_interval_ms: i32,
}

impl Link {
    pub async fn create(conn: &mut AsyncPgConnection, new_link: NewLink) -> QueryResult<Self> {
        diesel::insert_into(links::table)
            .values(&new_link)
            .returning(Link::as_returning())
            .get_result(conn)
            .await
    }

    /// Links in folders owned by `owner_id`, newest first
    pub async fn list_for_owner(
        conn: &mut AsyncPgConnection,
        owner_id: i32,
        folder_id: Option<i32>,
    ) -> QueryResult<Vec<Self>> {
        let mut query = links::table
            .inner_join(folders::table)
            .filter(folders::user_id.eq(owner_id))
            .select(Link::as_select())
            .order((links::created_at.desc(), links::id.desc()))
            .into_boxed();

        if let Some(folder_id) = folder_id {
            query = query.filter(links::folder_id.eq(folder_id));
        }

        query.load(conn).await
    }

    pub async fn find_for_owner(
        conn: &mut AsyncPgConnection,
        owner_id: i32,
        link_id: i32,
    ) -> QueryResult<Option<Self>> {
        links::table
            .inner_join(folders::table)
            .filter(links::id.eq(link_id))
            .filter(folders::user_id.eq(owner_id))
            .select(Link::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn for_folder(
        conn: &mut AsyncPgConnection,
        folder_id: i32,
    ) -> QueryResult<Vec<Self>> {
        links::table
            .filter(links::folder_id.eq(folder_id))
            .select(Link::as_select())
            .order((links::created_at.desc(), links::id.desc()))
            .load(conn)
            .await
    }
}

// =============================================================================
// REQUEST DTOs
// =============================================================================

/// Request to save a link into a folder
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLinkRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 8192,
        message = "A URL of at most 8192 characters is required"
    ))]
    pub url: String,

    pub summary: Option<String>,

    pub tags: Option<Vec<String>>,
}

impl CreateLinkRequest {
    /// Trim and sanitize input fields
    pub fn sanitize(&mut self) {
        self.url = self.url.trim().to_string();
        self.summary = crate::utils::trim_optional_field(self.summary.as_ref());
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListLinksQuery {
    pub folder_id: Option<i32>,
}
