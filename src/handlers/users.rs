// User endpoints: registration, login and the caller's own account

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use axum_extra::{headers::UserAgent, TypedHeader};
use serde_json::json;

use crate::{
    app::AppState,
    handlers::parse_id,
    middleware::auth::AuthenticatedUser,
    models::user::{CreateUserRequest, LoginRequest, UpdateUserRequest},
    services::UserService,
    utils::api_error::ApiResult,
};

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let profile = UserService::new(&state).register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User created successfully",
            "data": profile
        })),
    ))
}

/// POST /api/users/login
pub async fn login(
    State(state): State<AppState>,
    user_agent: Option<TypedHeader<UserAgent>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let user_agent = user_agent.map(|TypedHeader(agent)| agent.to_string());

    let (token, profile) = UserService::new(&state)
        .login(request, user_agent.as_deref())
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "data": profile
    })))
}

/// GET /api/users/me
pub async fn get_current_user(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    let account = UserService::new(&state).current_account(&auth_user).await?;

    Ok(Json(json!({
        "success": true,
        "data": account
    })))
}

/// PATCH /api/users/me
pub async fn update_current_user(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let updated = UserService::new(&state)
        .update_profile(auth_user.user_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "User updated successfully",
        "data": updated
    })))
}

/// DELETE /api/users/me
pub async fn delete_current_user(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
) -> ApiResult<impl IntoResponse> {
    UserService::new(&state)
        .delete_account(auth_user.user_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "User and all related data deleted successfully"
    })))
}

/// GET /api/users/user/{user_id}
pub async fn get_user(
    State(state): State<AppState>,
    _auth_user: AuthenticatedUser,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let user_id = parse_id(&raw_id, "Invalid user id")?;
    let user = UserService::new(&state).public_profile(user_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": user
    })))
}
