// User and social link models

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

use crate::schema::{social_links, users};
use crate::utils::validation::double_option;

/// User database record. The password hash never leaves the service layer.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub bio: Option<String>,
    pub profile_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user for insertion
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub bio: Option<String>,
    pub profile_url: Option<String>,
}

/// Partial user update. `updated_at` is always set so the changeset is never empty.
#[derive(Debug, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub bio: Option<Option<String>>,
    pub profile_url: Option<Option<String>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations, Serialize)]
#[diesel(table_name = social_links)]
#[diesel(belongs_to(User))]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct SocialLink {
    pub id: i32,
    pub user_id: i32,
    pub platform: String,
    pub url: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = social_links)]
pub struct NewSocialLink {
    pub user_id: i32,
    pub platform: String,
    pub url: String,
}

/// Public shape of a user, including email. Returned to the user themselves.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub bio: Option<String>,
    pub profile_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            bio: user.bio,
            profile_url: user.profile_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Compact user reference embedded in folder payloads
#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub profile_url: Option<String>,
}

impl User {
    pub async fn find_by_id(conn: &mut AsyncPgConnection, user_id: i32) -> QueryResult<Self> {
        users::table
            .find(user_id)
            .select(User::as_select())
            .first(conn)
            .await
    }

    /// Emails are stored lowercased, so lookups compare exactly
    pub async fn find_by_email(
        conn: &mut AsyncPgConnection,
        email: &str,
    ) -> QueryResult<Option<Self>> {
        users::table
            .filter(users::email.eq(email))
            .select(User::as_select())
            .first(conn)
            .await
            .optional()
    }

    pub async fn create(conn: &mut AsyncPgConnection, new_user: NewUser) -> QueryResult<Self> {
        diesel::insert_into(users::table)
            .values(&new_user)
            .returning(User::as_returning())
            .get_result(conn)
            .await
    }

    pub async fn update(
        conn: &mut AsyncPgConnection,
        user_id: i32,
        mut update: UserUpdate,
    ) -> QueryResult<Self> {
        update.updated_at = Some(Utc::now());
        diesel::update(users::table.find(user_id))
            .set(&update)
            .returning(User::as_returning())
            .get_result(conn)
            .await
    }
}

impl SocialLink {
    pub async fn for_user(conn: &mut AsyncPgConnection, user_id: i32) -> QueryResult<Vec<Self>> {
        social_links::table
            .filter(social_links::user_id.eq(user_id))
            .order(social_links::id.asc())
            .select(SocialLink::as_select())
            .load(conn)
            .await
    }

    /// Insert one row per platform. The caller owns the transaction.
    pub async fn insert_map(
        conn: &mut AsyncPgConnection,
        user_id: i32,
        links: &BTreeMap<String, String>,
    ) -> QueryResult<Vec<Self>> {
        let rows: Vec<NewSocialLink> = links
            .iter()
            .map(|(platform, url)| NewSocialLink {
                user_id,
                platform: platform.trim().to_string(),
                url: url.trim().to_string(),
            })
            .filter(|row| !row.platform.is_empty())
            .collect();

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        diesel::insert_into(social_links::table)
            .values(&rows)
            .returning(SocialLink::as_returning())
            .get_results(conn)
            .await
    }

    pub async fn delete_for_user(conn: &mut AsyncPgConnection, user_id: i32) -> QueryResult<usize> {
        diesel::delete(social_links::table.filter(social_links::user_id.eq(user_id)))
            .execute(conn)
            .await
    }
}

// =============================================================================
// REQUEST DTOs
// =============================================================================

/// Width of the `social_links.platform` column
pub const MAX_PLATFORM_LEN: usize = 100;

/// Platform keys are stored trimmed and must fit their column
fn validate_social_links(links: &BTreeMap<String, String>) -> Result<(), ValidationError> {
    if links
        .keys()
        .any(|platform| platform.trim().chars().count() > MAX_PLATFORM_LEN)
    {
        let mut error = ValidationError::new("social_link_platform");
        error.message = Some(Cow::from(format!(
            "Social link platform names must be at most {} characters",
            MAX_PLATFORM_LEN
        )));
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    #[validate(url(message = "Profile URL must be a valid URL"))]
    pub profile_url: Option<String>,

    pub bio: Option<String>,

    #[validate(custom = "validate_social_links")]
    pub social_links: Option<BTreeMap<String, String>>,
}

impl CreateUserRequest {
    /// Trim text fields and canonicalise the email
    pub fn sanitize(&mut self) {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.profile_url = crate::utils::trim_optional_field(self.profile_url.as_ref());
        self.bio = crate::utils::trim_optional_field(self.bio.as_ref());
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl LoginRequest {
    pub fn sanitize(&mut self) {
        self.email = self.email.trim().to_lowercase();
    }
}

/// PATCH body for the caller's own profile. `null` clears `bio` and `profileUrl`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name cannot be empty"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "double_option")]
    pub bio: Option<Option<String>>,

    #[serde(default, deserialize_with = "double_option")]
    pub profile_url: Option<Option<String>>,

    #[validate(custom = "validate_social_links")]
    pub social_links: Option<BTreeMap<String, String>>,
}

impl UpdateUserRequest {
    pub fn sanitize(&mut self) {
        self.name = self.name.as_ref().map(|name| name.trim().to_string());
        self.bio = self
            .bio
            .take()
            .map(|bio| crate::utils::trim_optional_field(bio.as_ref()));
        self.profile_url = self
            .profile_url
            .take()
            .map(|url| crate::utils::trim_optional_field(url.as_ref()));
    }

    pub fn to_changeset(&self) -> UserUpdate {
        UserUpdate {
            name: self.name.clone(),
            bio: self.bio.clone(),
            profile_url: self.profile_url.clone(),
            updated_at: None,
        }
    }
}
