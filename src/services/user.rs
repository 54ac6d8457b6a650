// User business logic: registration, login, profile reads/updates and account removal

use diesel::prelude::*;
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::{
    app::AppState,
    db::DieselPool,
    middleware::auth::AuthenticatedUser,
    models::{
        folder::{Folder, FolderListItem},
        user::{
            CreateUserRequest, LoginRequest, NewUser, SocialLink, UpdateUserRequest, User,
            UserProfile,
        },
    },
    schema::{
        discussion_messages, folder_collaborators, folder_discussions, folder_followers,
        folder_invites, folders, links, social_links, users,
    },
    services::{folder::build_list_items, JwtService},
    utils::{
        api_error::{ApiError, ApiResult},
        audit_logger::{AuditAction, AuditLogger},
        password::{hash_password_async, verify_password_async},
    },
};

/// The caller's own account: profile, folders with counts and social links
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub folders: Vec<FolderListItem>,
    pub social_links: Vec<SocialLink>,
}

/// What other signed-in users can see. Only published folders are listed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i32,
    pub name: String,
    pub bio: Option<String>,
    pub profile_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub folders: Vec<FolderListItem>,
    pub social_links: Vec<SocialLink>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedUser {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub social_links: Vec<SocialLink>,
}

pub struct UserService {
    diesel_pool: DieselPool,
    jwt_service: Arc<JwtService>,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self {
            diesel_pool: state.diesel_pool.clone(),
            jwt_service: state.jwt_service.clone(),
            bcrypt_cost: state.config.bcrypt_cost,
        }
    }

    #[instrument(skip(self, request))]
    pub async fn register(&self, mut request: CreateUserRequest) -> ApiResult<UserProfile> {
        request.sanitize();
        request.validate()?;

        let mut conn = self.diesel_pool.get().await?;

        if User::find_by_email(&mut conn, &request.email).await?.is_some() {
            return Err(ApiError::Conflict(
                "A user with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password_async(request.password, self.bcrypt_cost).await?;

        let new_user = NewUser {
            email: request.email,
            password_hash,
            name: request.name,
            bio: request.bio,
            profile_url: request.profile_url,
        };
        let social = request.social_links.unwrap_or_default();

        // Unique index on email turns a concurrent duplicate into Conflict
        let user = conn
            .transaction::<_, ApiError, _>(|conn| {
                Box::pin(async move {
                    let user = User::create(conn, new_user).await?;
                    SocialLink::insert_map(conn, user.id, &social).await?;
                    Ok(user)
                })
            })
            .await?;

        info!("Registered user {}", user.id);
        AuditLogger::log(AuditAction::UserCreated, user.id, Some(user.id), None);

        Ok(user.into())
    }

    /// Check credentials and issue a session token
    #[instrument(skip(self, request))]
    pub async fn login(
        &self,
        mut request: LoginRequest,
        user_agent: Option<&str>,
    ) -> ApiResult<(String, UserProfile)> {
        request.sanitize();
        request.validate()?;

        let mut conn = self.diesel_pool.get().await?;

        let Some(user) = User::find_by_email(&mut conn, &request.email).await? else {
            warn!(
                user_agent = user_agent.unwrap_or("unknown"),
                "Login failed: no account for email"
            );
            return Err(ApiError::NotFound(
                "No user found with this email".to_string(),
            ));
        };
        drop(conn);

        if !verify_password_async(request.password, user.password_hash.clone()).await? {
            warn!(
                user_id = user.id,
                user_agent = user_agent.unwrap_or("unknown"),
                "Login failed: wrong password"
            );
            return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
        }

        let token = self.jwt_service.issue_session_token(user.id, &user.email)?;

        AuditLogger::log(AuditAction::UserLoggedIn, user.id, Some(user.id), None);
        Ok((token, user.into()))
    }

    /// The caller's account. A token whose email no longer matches the stored
    /// user is treated as pointing at a user that no longer exists.
    #[instrument(skip(self, auth_user), fields(user_id = auth_user.user_id))]
    pub async fn current_account(&self, auth_user: &AuthenticatedUser) -> ApiResult<UserAccount> {
        let mut conn = self.diesel_pool.get().await?;

        let user = User::find_by_id(&mut conn, auth_user.user_id)
            .await
            .optional()?
            .filter(|user| user.email == auth_user.email)
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let owned: Vec<Folder> = folders::table
            .filter(folders::user_id.eq(user.id))
            .order((folders::created_at.desc(), folders::id.desc()))
            .select(Folder::as_select())
            .load(&mut conn)
            .await?;
        let folders = build_list_items(&mut conn, owned).await?;
        let social_links = SocialLink::for_user(&mut conn, user.id).await?;

        Ok(UserAccount {
            profile: user.into(),
            folders,
            social_links,
        })
    }

    #[instrument(skip(self))]
    pub async fn public_profile(&self, user_id: i32) -> ApiResult<PublicUser> {
        let mut conn = self.diesel_pool.get().await?;

        let user = User::find_by_id(&mut conn, user_id)
            .await
            .optional()?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let published: Vec<Folder> = folders::table
            .filter(folders::user_id.eq(user.id))
            .filter(folders::is_publishable.eq(true))
            .order((folders::created_at.desc(), folders::id.desc()))
            .select(Folder::as_select())
            .load(&mut conn)
            .await?;
        let folders = build_list_items(&mut conn, published).await?;
        let social_links = SocialLink::for_user(&mut conn, user.id).await?;

        Ok(PublicUser {
            id: user.id,
            name: user.name,
            bio: user.bio,
            profile_url: user.profile_url,
            created_at: user.created_at,
            folders,
            social_links,
        })
    }

    /// Partial profile update. A present `socialLinks` map replaces the whole set
    /// in the same transaction as the row update.
    #[instrument(skip(self, request))]
    pub async fn update_profile(
        &self,
        user_id: i32,
        mut request: UpdateUserRequest,
    ) -> ApiResult<UpdatedUser> {
        request.sanitize();
        request.validate()?;

        let mut conn = self.diesel_pool.get().await?;

        let changes = request.to_changeset();
        let replacement = request.social_links;

        let (user, social_links) = conn
            .transaction::<_, ApiError, _>(|conn| {
                Box::pin(async move {
                    let user = User::update(conn, user_id, changes)
                        .await
                        .optional()?
                        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

                    if let Some(map) = replacement {
                        SocialLink::delete_for_user(conn, user_id).await?;
                        SocialLink::insert_map(conn, user_id, &map).await?;
                    }

                    let social_links = SocialLink::for_user(conn, user_id).await?;
                    Ok((user, social_links))
                })
            })
            .await?;

        AuditLogger::log(AuditAction::UserUpdated, user_id, Some(user_id), None);

        Ok(UpdatedUser {
            profile: user.into(),
            social_links,
        })
    }

    /// Remove the account and everything it owns, children first, in one transaction
    #[instrument(skip(self))]
    pub async fn delete_account(&self, user_id: i32) -> ApiResult<()> {
        let mut conn = self.diesel_pool.get().await?;

        conn.transaction::<_, ApiError, _>(|conn| {
            Box::pin(async move {
                let exists: Option<i32> = users::table
                    .find(user_id)
                    .select(users::id)
                    .first(conn)
                    .await
                    .optional()?;
                if exists.is_none() {
                    return Err(ApiError::NotFound("User not found".to_string()));
                }

                let folder_ids: Vec<i32> = folders::table
                    .filter(folders::user_id.eq(user_id))
                    .select(folders::id)
                    .load(conn)
                    .await?;
                let discussion_ids: Vec<i32> = folder_discussions::table
                    .filter(folder_discussions::folder_id.eq_any(&folder_ids))
                    .select(folder_discussions::id)
                    .load(conn)
                    .await?;

                diesel::delete(
                    folder_collaborators::table.filter(
                        folder_collaborators::user_id
                            .eq(user_id)
                            .or(folder_collaborators::folder_id.eq_any(&folder_ids)),
                    ),
                )
                .execute(conn)
                .await?;

                diesel::delete(
                    folder_invites::table.filter(
                        folder_invites::inviter_id
                            .eq(user_id)
                            .or(folder_invites::folder_id.eq_any(&folder_ids)),
                    ),
                )
                .execute(conn)
                .await?;

                diesel::delete(
                    discussion_messages::table.filter(
                        discussion_messages::user_id
                            .eq(user_id)
                            .or(discussion_messages::discussion_id.eq_any(&discussion_ids)),
                    ),
                )
                .execute(conn)
                .await?;

                diesel::delete(
                    folder_discussions::table
                        .filter(folder_discussions::folder_id.eq_any(&folder_ids)),
                )
                .execute(conn)
                .await?;

                diesel::delete(
                    folder_followers::table.filter(
                        folder_followers::user_id
                            .eq(user_id)
                            .or(folder_followers::folder_id.eq_any(&folder_ids)),
                    ),
                )
                .execute(conn)
                .await?;

                diesel::delete(links::table.filter(links::folder_id.eq_any(&folder_ids)))
                    .execute(conn)
                    .await?;

                diesel::delete(social_links::table.filter(social_links::user_id.eq(user_id)))
                    .execute(conn)
                    .await?;

                diesel::delete(folders::table.filter(folders::user_id.eq(user_id)))
                    .execute(conn)
                    .await?;

                diesel::delete(users::table.find(user_id))
                    .execute(conn)
                    .await?;

                Ok(())
            })
        })
        .await?;

        info!("Deleted user {} and all owned data", user_id);
        AuditLogger::log(AuditAction::UserDeleted, user_id, Some(user_id), None);
        Ok(())
    }
}
