// HTTP handlers and the route builders that mount them

pub mod folders;
pub mod health;
pub mod links;
pub mod users;

use crate::{app::AppState, middleware::auth_middleware, utils::api_error::ApiError};
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

/// Parse a numeric path segment, mapping anything else to `BadRequest(message)`
pub fn parse_id(raw: &str, message: &str) -> Result<i32, ApiError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ApiError::BadRequest(message.to_string()))
}

// User routes. Registration and login are mounted after the auth layer so they stay public.
pub fn users_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/me",
            get(users::get_current_user)
                .patch(users::update_current_user)
                .delete(users::delete_current_user),
        )
        .route("/user/{user_id}", get(users::get_user))
        .route_layer(from_fn_with_state(state, auth_middleware))
        .route("/", post(users::create_user))
        .route("/login", post(users::login))
}

// Folder routes
pub fn folders_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(folders::list_folders).post(folders::create_folder))
        .route(
            "/folder/{folder_id}",
            get(folders::get_folder)
                .patch(folders::update_folder)
                .delete(folders::delete_folder),
        )
        .route_layer(from_fn_with_state(state, auth_middleware))
}

// Link routes
pub fn links_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(links::list_links))
        .route("/{id}", get(links::get_link).post(links::create_link))
        .route_layer(from_fn_with_state(state, auth_middleware))
}

// Health routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::health))
        .route("/ready", get(health::readiness))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42", "Invalid folder id").unwrap(), 42);
        assert_eq!(parse_id(" 7 ", "Invalid folder id").unwrap(), 7);

        let err = parse_id("abc", "Invalid folder id").unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg == "Invalid folder id"));
        assert!(parse_id("1.5", "Invalid link id").is_err());
    }
}
