// Folder business logic: CRUD, access rules and the folder cascade delete

use diesel::prelude::*;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use std::collections::HashMap;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    app::AppState,
    db::DieselPool,
    models::{
        folder::{
            CollaboratorView, CreateFolderRequest, DiscussionView, Folder, FolderCollaborator,
            FolderCounts, FolderDetail, FolderDiscussion, FolderFollower, FolderInvite,
            FolderListItem, InviteView, ListFoldersQuery, UpdateFolderRequest,
        },
        link::Link,
        user::UserSummary,
    },
    schema::{
        discussion_messages, folder_collaborators, folder_discussions, folder_followers,
        folder_invites, folders, links, users,
    },
    utils::{
        api_error::{ApiError, ApiResult},
        audit_logger::{AuditAction, AuditLogger},
    },
};

pub struct FolderService {
    diesel_pool: DieselPool,
}

impl FolderService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
        }
    }

    #[instrument(skip(self, request))]
    pub async fn create_folder(
        &self,
        owner_id: i32,
        mut request: CreateFolderRequest,
    ) -> ApiResult<Folder> {
        request.sanitize();
        request.validate()?;

        let mut conn = self.diesel_pool.get().await?;

        if Folder::name_taken(&mut conn, owner_id, &request.folder_name, None).await? {
            return Err(duplicate_name());
        }

        let folder = Folder::create(&mut conn, request.into_new_folder(owner_id)).await?;

        info!("Created folder {} for user {}", folder.id, owner_id);
        AuditLogger::log(
            AuditAction::FolderCreated,
            owner_id,
            Some(folder.id),
            Some(folder.folder_name.clone()),
        );

        Ok(folder)
    }

    /// The caller's folders with owner, followers and counts
    #[instrument(skip(self))]
    pub async fn list_folders(
        &self,
        owner_id: i32,
        query: ListFoldersQuery,
    ) -> ApiResult<Vec<FolderListItem>> {
        let mut conn = self.diesel_pool.get().await?;

        let mut statement = folders::table
            .filter(folders::user_id.eq(owner_id))
            .select(Folder::as_select())
            .order((folders::created_at.desc(), folders::id.desc()))
            .into_boxed();

        if let Some(publishable) = query.publishable_filter() {
            statement = statement.filter(folders::is_publishable.eq(publishable));
        }
        if let Some(name) = query.folder_name.as_deref().map(str::trim) {
            if !name.is_empty() {
                statement = statement.filter(folders::folder_name.ilike(like_pattern(name)));
            }
        }
        if let Some(tag) = query.tag.as_deref().map(str::trim) {
            if !tag.is_empty() {
                statement = statement.filter(folders::folder_tags.contains(vec![tag.to_string()]));
            }
        }

        let found: Vec<Folder> = statement.load(&mut conn).await?;
        Ok(build_list_items(&mut conn, found).await?)
    }

    /// Full folder view. Readable by the owner, collaborators, followers,
    /// or anyone once published.
    #[instrument(skip(self))]
    pub async fn get_folder(&self, viewer_id: i32, folder_id: i32) -> ApiResult<FolderDetail> {
        let mut conn = self.diesel_pool.get().await?;

        let folder = Folder::find_by_id(&mut conn, folder_id)
            .await?
            .ok_or_else(folder_not_found)?;

        let is_owner = folder.is_owned_by(viewer_id);
        if !is_owner
            && !folder.is_publishable
            && FolderCollaborator::find(&mut conn, folder_id, viewer_id).await?.is_none()
            && !FolderFollower::exists(&mut conn, folder_id, viewer_id).await?
        {
            warn!("User {} denied read access to folder {}", viewer_id, folder_id);
            return Err(ApiError::Forbidden(
                "You do not have access to this folder".to_string(),
            ));
        }

        let owner: UserSummary = users::table
            .find(folder.user_id)
            .select(UserSummary::as_select())
            .first(&mut conn)
            .await?;

        let followers = load_followers(&mut conn, &[folder_id])
            .await?
            .remove(&folder_id)
            .unwrap_or_default();

        let collaborators = folder_collaborators::table
            .inner_join(users::table)
            .filter(folder_collaborators::folder_id.eq(folder_id))
            .order(folder_collaborators::id.asc())
            .select((FolderCollaborator::as_select(), UserSummary::as_select()))
            .load::<(FolderCollaborator, UserSummary)>(&mut conn)
            .await?
            .into_iter()
            .map(|(collaborator, user)| CollaboratorView {
                id: collaborator.id,
                role: collaborator.role(),
                created_at: collaborator.created_at,
                user,
            })
            .collect();

        let discussions: Vec<FolderDiscussion> = folder_discussions::table
            .filter(folder_discussions::folder_id.eq(folder_id))
            .order(folder_discussions::id.asc())
            .select(FolderDiscussion::as_select())
            .load(&mut conn)
            .await?;
        let discussion_ids: Vec<i32> = discussions.iter().map(|d| d.id).collect();
        let message_counts: HashMap<i32, i64> = discussion_messages::table
            .filter(discussion_messages::discussion_id.eq_any(&discussion_ids))
            .group_by(discussion_messages::discussion_id)
            .select((
                discussion_messages::discussion_id,
                diesel::dsl::count(discussion_messages::id),
            ))
            .load::<(i32, i64)>(&mut conn)
            .await?
            .into_iter()
            .collect();
        let discussions = discussions
            .into_iter()
            .map(|discussion| DiscussionView {
                message_count: message_counts.get(&discussion.id).copied().unwrap_or(0),
                discussion,
            })
            .collect();

        let invites = folder_invites::table
            .inner_join(users::table)
            .filter(folder_invites::folder_id.eq(folder_id))
            .order(folder_invites::id.asc())
            .select((FolderInvite::as_select(), UserSummary::as_select()))
            .load::<(FolderInvite, UserSummary)>(&mut conn)
            .await?
            .into_iter()
            .map(|(invite, inviter)| InviteView {
                id: invite.id,
                invited_email: invite.invited_email,
                status: invite.status,
                token: is_owner.then_some(invite.token),
                created_at: invite.created_at,
                expires_at: invite.expires_at,
                inviter,
            })
            .collect();

        let links = Link::for_folder(&mut conn, folder_id).await?;

        Ok(FolderDetail {
            folder,
            user: owner,
            followers,
            collaborators,
            discussions,
            invites,
            links,
        })
    }

    #[instrument(skip(self, request))]
    pub async fn update_folder(
        &self,
        user_id: i32,
        folder_id: i32,
        mut request: UpdateFolderRequest,
    ) -> ApiResult<Folder> {
        request.sanitize();
        request.validate()?;

        let mut conn = self.diesel_pool.get().await?;
        let folder = self.owned_folder(&mut conn, user_id, folder_id).await?;

        if let Some(name) = request.folder_name.as_deref() {
            if name != folder.folder_name
                && Folder::name_taken(&mut conn, user_id, name, Some(folder_id)).await?
            {
                return Err(duplicate_name());
            }
        }

        let updated = Folder::update(&mut conn, folder_id, request.into_changeset()).await?;

        AuditLogger::log(AuditAction::FolderUpdated, user_id, Some(folder_id), None);
        Ok(updated)
    }

    /// Remove a folder and everything that hangs off it in one transaction
    #[instrument(skip(self))]
    pub async fn delete_folder(&self, user_id: i32, folder_id: i32) -> ApiResult<()> {
        let mut conn = self.diesel_pool.get().await?;
        let folder = self.owned_folder(&mut conn, user_id, folder_id).await?;

        conn.transaction::<_, ApiError, _>(|conn| {
            Box::pin(async move {
                let discussion_ids: Vec<i32> = folder_discussions::table
                    .filter(folder_discussions::folder_id.eq(folder_id))
                    .select(folder_discussions::id)
                    .load(conn)
                    .await?;

                diesel::delete(
                    discussion_messages::table
                        .filter(discussion_messages::discussion_id.eq_any(&discussion_ids)),
                )
                .execute(conn)
                .await?;
                diesel::delete(
                    folder_discussions::table.filter(folder_discussions::folder_id.eq(folder_id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(
                    folder_collaborators::table
                        .filter(folder_collaborators::folder_id.eq(folder_id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(
                    folder_invites::table.filter(folder_invites::folder_id.eq(folder_id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(
                    folder_followers::table.filter(folder_followers::folder_id.eq(folder_id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(links::table.filter(links::folder_id.eq(folder_id)))
                    .execute(conn)
                    .await?;
                diesel::delete(folders::table.find(folder_id))
                    .execute(conn)
                    .await?;

                Ok(())
            })
        })
        .await?;

        info!("Deleted folder {} ({}) for user {}", folder_id, folder.folder_name, user_id);
        AuditLogger::log(
            AuditAction::FolderDeleted,
            user_id,
            Some(folder_id),
            Some(folder.folder_name),
        );
        Ok(())
    }

    /// Load a folder and require that `user_id` owns it
    async fn owned_folder(
        &self,
        conn: &mut AsyncPgConnection,
        user_id: i32,
        folder_id: i32,
    ) -> ApiResult<Folder> {
        let folder = Folder::find_by_id(conn, folder_id)
            .await?
            .ok_or_else(folder_not_found)?;

        if !folder.is_owned_by(user_id) {
            warn!(
                "User {} attempted to modify folder {} owned by {}",
                user_id, folder_id, folder.user_id
            );
            return Err(ApiError::Forbidden(
                "Only the folder owner can modify this folder".to_string(),
            ));
        }

        Ok(folder)
    }
}

/// Owner or an editor/admin collaborator may add links
pub async fn can_add_links(
    conn: &mut AsyncPgConnection,
    folder: &Folder,
    user_id: i32,
) -> QueryResult<bool> {
    if folder.is_owned_by(user_id) {
        return Ok(true);
    }
    Ok(FolderCollaborator::find(conn, folder.id, user_id)
        .await?
        .is_some_and(|collaborator| collaborator.role().can_add_links()))
}

/// Decorate folders with owner summary, followers and link/discussion counts
pub async fn build_list_items(
    conn: &mut AsyncPgConnection,
    found: Vec<Folder>,
) -> QueryResult<Vec<FolderListItem>> {
    if found.is_empty() {
        return Ok(Vec::new());
    }

    let folder_ids: Vec<i32> = found.iter().map(|f| f.id).collect();
    let mut owner_ids: Vec<i32> = found.iter().map(|f| f.user_id).collect();
    owner_ids.sort_unstable();
    owner_ids.dedup();

    let owners: HashMap<i32, UserSummary> = users::table
        .filter(users::id.eq_any(&owner_ids))
        .select(UserSummary::as_select())
        .load::<UserSummary>(conn)
        .await?
        .into_iter()
        .map(|owner| (owner.id, owner))
        .collect();

    let mut followers = load_followers(conn, &folder_ids).await?;

    let link_counts: HashMap<i32, i64> = links::table
        .filter(links::folder_id.eq_any(&folder_ids))
        .group_by(links::folder_id)
        .select((links::folder_id, diesel::dsl::count(links::id)))
        .load::<(i32, i64)>(conn)
        .await?
        .into_iter()
        .collect();

    let discussion_counts: HashMap<i32, i64> = folder_discussions::table
        .filter(folder_discussions::folder_id.eq_any(&folder_ids))
        .group_by(folder_discussions::folder_id)
        .select((
            folder_discussions::folder_id,
            diesel::dsl::count(folder_discussions::id),
        ))
        .load::<(i32, i64)>(conn)
        .await?
        .into_iter()
        .collect();

    let mut items = Vec::with_capacity(found.len());
    for folder in found {
        // Folder rows reference users through a foreign key
        let Some(user) = owners.get(&folder.user_id).cloned() else {
            continue;
        };
        items.push(FolderListItem {
            user,
            followers: followers.remove(&folder.id).unwrap_or_default(),
            counts: FolderCounts {
                links: link_counts.get(&folder.id).copied().unwrap_or(0),
                discussions: discussion_counts.get(&folder.id).copied().unwrap_or(0),
            },
            folder,
        });
    }
    Ok(items)
}

async fn load_followers(
    conn: &mut AsyncPgConnection,
    folder_ids: &[i32],
) -> QueryResult<HashMap<i32, Vec<UserSummary>>> {
    let rows = folder_followers::table
        .inner_join(users::table)
        .filter(folder_followers::folder_id.eq_any(folder_ids))
        .order(users::id.asc())
        .select((folder_followers::folder_id, UserSummary::as_select()))
        .load::<(i32, UserSummary)>(conn)
        .await?;

    let mut grouped: HashMap<i32, Vec<UserSummary>> = HashMap::new();
    for (folder_id, user) in rows {
        grouped.entry(folder_id).or_default().push(user);
    }
    Ok(grouped)
}

/// Case-insensitive substring pattern with LIKE wildcards escaped
pub fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn folder_not_found() -> ApiError {
    ApiError::NotFound("Folder not found".to_string())
}

fn duplicate_name() -> ApiError {
    ApiError::Conflict("You already have a folder with this name".to_string())
}
