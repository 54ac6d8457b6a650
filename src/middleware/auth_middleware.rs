// Authentication middleware for protected routes
// Validates session tokens and injects AuthenticatedUser into request extensions

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{
    app::AppState, middleware::auth::AuthenticatedUser, services::JwtError,
    utils::api_error::ApiError,
};

/// Middleware function that validates bearer tokens and adds AuthenticatedUser to extensions
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    // Configuration faults outrank client faults
    if !app_state.jwt_service.has_secret() {
        return ApiError::from(JwtError::MissingSecret).into_response();
    }

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) if !token.trim().is_empty() => token.trim(),
        _ => {
            return ApiError::Unauthorized("Missing or invalid authorization header".to_string())
                .into_response();
        },
    };

    let claims = match app_state.jwt_service.validate_session_token(token) {
        Ok(claims) => claims,
        Err(e @ JwtError::MissingSecret) => return ApiError::from(e).into_response(),
        Err(e) => {
            warn!("Session token validation failed: {}", e);
            return ApiError::Unauthorized("Invalid or expired token".to_string()).into_response();
        },
    };

    match AuthenticatedUser::from_claims(claims) {
        Some(auth_user) => {
            request.extensions_mut().insert(auth_user);
            next.run(request).await
        },
        None => {
            warn!("Session token carried a non-integer subject");
            ApiError::Unauthorized("Invalid or expired token".to_string()).into_response()
        },
    }
}

/// Extractor for AuthenticatedUser from request extensions
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}
