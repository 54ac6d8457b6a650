// API error taxonomy shared by every handler

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;
use thiserror::Error;

use crate::db::PoolRunError;
use crate::services::jwt::JwtError;
use crate::services::metadata::MetadataError;
use crate::utils::password::PasswordError;

// =============================================================================
// ERROR TYPES
// =============================================================================

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Could not reach {url}: {reason}")]
    LinkUnreachable { url: String, reason: String },

    #[error("Server misconfiguration: {0}")]
    InternalConfig(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// ERROR CONVERSIONS
// =============================================================================

impl From<DieselError> for ApiError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => ApiError::NotFound("Resource not found".to_string()),
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                let message = match info.constraint_name() {
                    Some("users_email_key") => "A user with this email already exists",
                    Some("folders_user_id_folder_name_key") => {
                        "You already have a folder with this name"
                    },
                    _ => "Resource already exists",
                };
                ApiError::Conflict(message.to_string())
            },
            _ => ApiError::Database(err.to_string()),
        }
    }
}

impl From<PoolRunError> for ApiError {
    fn from(err: PoolRunError) -> Self {
        ApiError::Database(format!("Failed to get database connection: {}", err))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = err
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match e.message.as_ref() {
                    Some(message) => message.to_string(),
                    None => format!("{}: {}", field, e.code),
                })
            })
            .collect();
        messages.sort();

        ApiError::BadRequest(messages.join(", "))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid JSON body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::MissingSecret => {
                ApiError::InternalConfig("JWT signing secret is not configured".to_string())
            },
            JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
            JwtError::TokenCreation(msg) => ApiError::Internal(msg),
            _ => ApiError::Unauthorized("Invalid or malformed token".to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<MetadataError> for ApiError {
    fn from(err: MetadataError) -> Self {
        match err {
            MetadataError::InvalidUrl(msg) => ApiError::BadRequest(msg),
            MetadataError::Unreachable { url, reason } => ApiError::LinkUnreachable { url, reason },
            MetadataError::Client(msg) => ApiError::Internal(msg),
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ApiError {
    /// Get HTTP status code for error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::LinkUnreachable { .. } => StatusCode::BAD_GATEWAY,
            ApiError::InternalConfig(_) | ApiError::Database(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Build the client-facing body. Database and internal details stay in the logs.
    pub fn to_response(&self) -> ApiErrorResponse {
        let (message, url) = match self {
            ApiError::Database(_) | ApiError::Internal(_) => {
                ("Internal server error".to_string(), None)
            },
            ApiError::InternalConfig(_) => ("Server configuration error".to_string(), None),
            ApiError::LinkUnreachable { url, .. } => (
                "Unable to fetch the provided URL".to_string(),
                Some(url.clone()),
            ),
            other => (other.to_string(), None),
        };

        ApiErrorResponse {
            success: false,
            message,
            url,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{}", self);
        } else if status == StatusCode::BAD_GATEWAY {
            tracing::warn!("{}", self);
        }

        (status, Json(self.to_response())).into_response()
    }
}

// =============================================================================
// TESTS
// =============================================================================
