// Folder models: folders plus the follower, collaborator, discussion and invite rows

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::link::Link;
use crate::models::user::{User, UserSummary};
use crate::schema::{
    folder_collaborators, folder_discussions, folder_followers, folder_invites, folders,
};
use crate::utils::validation::{double_option, trim_optional_field};

/// Folder database record
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(table_name = folders)]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: i32,
    pub user_id: i32,
    pub folder_name: String,
    pub folder_description: Option<String>,
    pub folder_cover_image: Option<String>,
    pub folder_profile_image: Option<String>,
    pub folder_tags: Vec<String>,
    pub is_publishable: bool,
    pub folder_share_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = folders)]
pub struct NewFolder {
    pub user_id: i32,
    pub folder_name: String,
    pub folder_description: Option<String>,
    pub folder_cover_image: Option<String>,
    pub folder_profile_image: Option<String>,
    pub folder_tags: Vec<String>,
    pub is_publishable: bool,
    pub folder_share_url: Option<String>,
}

#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = folders)]
pub struct FolderChangeset {
    pub folder_name: Option<String>,
    pub folder_description: Option<Option<String>>,
    pub folder_cover_image: Option<Option<String>>,
    pub folder_profile_image: Option<Option<String>>,
    pub folder_tags: Option<Vec<String>>,
    pub is_publishable: Option<bool>,
    pub folder_share_url: Option<Option<String>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = folder_followers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FolderFollower {
    pub folder_id: i32,
    pub user_id: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(table_name = folder_discussions)]
#[diesel(belongs_to(Folder))]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct FolderDiscussion {
    pub id: i32,
    pub folder_id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = folder_invites)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FolderInvite {
    pub id: i32,
    pub folder_id: i32,
    pub inviter_id: i32,
    pub invited_email: String,
    pub status: String,
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = folder_collaborators)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FolderCollaborator {
    pub id: i32,
    pub folder_id: i32,
    pub user_id: i32,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Collaborator permission level stored in `folder_collaborators.role`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CollaboratorRole {
    Viewer,
    Editor,
    Admin,
}

impl CollaboratorRole {
    /// Unknown values degrade to the least privileged role
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "admin" => CollaboratorRole::Admin,
            "editor" => CollaboratorRole::Editor,
            _ => CollaboratorRole::Viewer,
        }
    }

    pub fn can_add_links(&self) -> bool {
        matches!(self, CollaboratorRole::Editor | CollaboratorRole::Admin)
    }
}

impl Folder {
    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        folder_id: i32,
    ) -> QueryResult<Option<Self>> {
        folders::table
            .find(folder_id)
            .select(Folder::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn name_taken(
        conn: &mut AsyncPgConnection,
        owner_id: i32,
        name: &str,
        excluding: Option<i32>,
    ) -> QueryResult<bool> {
        let mut query = folders::table
            .filter(folders::user_id.eq(owner_id))
            .filter(folders::folder_name.eq(name))
            .select(folders::id)
            .into_boxed();
        if let Some(folder_id) = excluding {
            query = query.filter(folders::id.ne(folder_id));
        }
        let existing: Option<i32> = query.first(conn).await.optional()?;
        Ok(existing.is_some())
    }

    pub async fn create(conn: &mut AsyncPgConnection, new_folder: NewFolder) -> QueryResult<Self> {
        diesel::insert_into(folders::table)
            .values(&new_folder)
            .returning(Folder::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        folder_id: i32,
        mut changes: FolderChangeset,
    ) -> QueryResult<Self> {
        changes.updated_at = Some(Utc::now());
        diesel::update(folders::table.find(folder_id))
            .set(&changes)
            .returning(Folder::as_returning())
            .get_result(conn)
            .await
    }

    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.user_id == user_id
    }
}

impl FolderCollaborator {
    pub fn role(&self) -> CollaboratorRole {
        CollaboratorRole::parse(&self.role)
    }

    pub async fn find(
        conn: &mut AsyncPgConnection,
        folder_id: i32,
        user_id: i32,
    ) -> QueryResult<Option<Self>> {
        folder_collaborators::table
            .filter(folder_collaborators::folder_id.eq(folder_id))
            .filter(folder_collaborators::user_id.eq(user_id))
            .select(FolderCollaborator::as_select())
            .first(conn)
            .await
            .optional()
    }
}

impl FolderFollower {
    pub async fn exists(
        conn: &mut AsyncPgConnection,
        folder_id: i32,
        user_id: i32,
    ) -> QueryResult<bool> {
        let row: Option<FolderFollower> = folder_followers::table
            .find((folder_id, user_id))
            .select(FolderFollower::as_select())
            .first(conn)
            .await
            .optional()?;
        Ok(row.is_some())
    }
}

// =============================================================================
// REQUEST DTOs
// =============================================================================

/// `isPublishable` is kept as raw JSON so that only the literal `true` publishes.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Folder name is required"))]
    pub folder_name: String,
    pub folder_description: Option<String>,
    pub folder_cover_image: Option<String>,
    pub folder_profile_image: Option<String>,
    pub folder_tags: Option<Vec<String>>,
    pub is_publishable: Option<serde_json::Value>,
    pub folder_share_url: Option<String>,
}

impl CreateFolderRequest {
    pub fn sanitize(&mut self) {
        self.folder_name = self.folder_name.trim().to_string();
        self.folder_description = trim_optional_field(self.folder_description.as_ref());
        self.folder_cover_image = trim_optional_field(self.folder_cover_image.as_ref());
        self.folder_profile_image = trim_optional_field(self.folder_profile_image.as_ref());
        self.folder_share_url = trim_optional_field(self.folder_share_url.as_ref());
    }

    pub fn into_new_folder(self, owner_id: i32) -> NewFolder {
        NewFolder {
            user_id: owner_id,
            is_publishable: publishable_flag(self.is_publishable.as_ref()),
            folder_tags: crate::utils::normalize_tags(self.folder_tags),
            folder_name: self.folder_name,
            folder_description: self.folder_description,
            folder_cover_image: self.folder_cover_image,
            folder_profile_image: self.folder_profile_image,
            folder_share_url: self.folder_share_url,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFolderRequest {
    #[validate(length(min = 1, max = 255, message = "Folder name cannot be empty"))]
    pub folder_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub folder_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub folder_cover_image: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub folder_profile_image: Option<Option<String>>,
    pub folder_tags: Option<Vec<String>>,
    pub is_publishable: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "double_option")]
    pub folder_share_url: Option<Option<String>>,
}

impl UpdateFolderRequest {
    pub fn sanitize(&mut self) {
        let trim = |field: Option<Option<String>>| {
            field.map(|value| trim_optional_field(value.as_ref()))
        };
        self.folder_name = self.folder_name.as_ref().map(|name| name.trim().to_string());
        self.folder_description = trim(self.folder_description.take());
        self.folder_cover_image = trim(self.folder_cover_image.take());
        self.folder_profile_image = trim(self.folder_profile_image.take());
        self.folder_share_url = trim(self.folder_share_url.take());
    }

    pub fn into_changeset(self) -> FolderChangeset {
        FolderChangeset {
            folder_name: self.folder_name,
            folder_description: self.folder_description,
            folder_cover_image: self.folder_cover_image,
            folder_profile_image: self.folder_profile_image,
            folder_tags: self.folder_tags.map(|tags| crate::utils::normalize_tags(Some(tags))),
            is_publishable: self
                .is_publishable
                .as_ref()
                .map(|value| publishable_flag(Some(value))),
            folder_share_url: self.folder_share_url,
            updated_at: None,
        }
    }
}

/// Only JSON `true` counts as published
pub fn publishable_flag(value: Option<&serde_json::Value>) -> bool {
    matches!(value, Some(serde_json::Value::Bool(true)))
}

/// Query string for folder listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFoldersQuery {
    pub is_publishable: Option<String>,
    pub folder_name: Option<String>,
    pub tag: Option<String>,
}

impl ListFoldersQuery {
    /// `"true"` selects published folders, any other present value unpublished ones
    pub fn publishable_filter(&self) -> Option<bool> {
        self.is_publishable.as_deref().map(|value| value == "true")
    }
}

// =============================================================================
// RESPONSE DTOs
// =============================================================================

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct FolderCounts {
    pub links: i64,
    pub discussions: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderListItem {
    #[serde(flatten)]
    pub folder: Folder,
    pub user: UserSummary,
    pub followers: Vec<UserSummary>,
    pub counts: FolderCounts,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorView {
    pub id: i32,
    pub role: CollaboratorRole,
    pub created_at: DateTime<Utc>,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionView {
    #[serde(flatten)]
    pub discussion: FolderDiscussion,
    pub message_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteView {
    pub id: i32,
    pub invited_email: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub inviter: UserSummary,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDetail {
    #[serde(flatten)]
    pub folder: Folder,
    pub user: UserSummary,
    pub followers: Vec<UserSummary>,
    pub collaborators: Vec<CollaboratorView>,
    pub discussions: Vec<DiscussionView>,
    pub invites: Vec<InviteView>,
    pub links: Vec<Link>,
}
