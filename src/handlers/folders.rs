// Folder endpoints, all scoped to the authenticated caller

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::{
    app::AppState,
    handlers::parse_id,
    middleware::auth::AuthenticatedUser,
    models::folder::{CreateFolderRequest, ListFoldersQuery, UpdateFolderRequest},
    services::FolderService,
    utils::api_error::ApiResult,
};

const INVALID_FOLDER_ID: &str = "Invalid folder id";

/// POST /api/folders
pub async fn create_folder(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    payload: Result<Json<CreateFolderRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;
    let folder = FolderService::new(&state)
        .create_folder(auth_user.user_id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Folder created successfully",
            "data": folder
        })),
    ))
}

/// GET /api/folders
pub async fn list_folders(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    query: Result<Query<ListFoldersQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let folders = FolderService::new(&state)
        .list_folders(auth_user.user_id, query)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": folders
    })))
}

/// GET /api/folders/folder/{folder_id}
pub async fn get_folder(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let folder_id = parse_id(&raw_id, INVALID_FOLDER_ID)?;
    let folder = FolderService::new(&state)
        .get_folder(auth_user.user_id, folder_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": folder
    })))
}

/// PATCH /api/folders/folder/{folder_id}
pub async fn update_folder(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateFolderRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let folder_id = parse_id(&raw_id, INVALID_FOLDER_ID)?;
    let Json(request) = payload?;
    let folder = FolderService::new(&state)
        .update_folder(auth_user.user_id, folder_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Folder updated successfully",
        "data": folder
    })))
}

/// DELETE /api/folders/folder/{folder_id}
pub async fn delete_folder(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let folder_id = parse_id(&raw_id, INVALID_FOLDER_ID)?;
    FolderService::new(&state)
        .delete_folder(auth_user.user_id, folder_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Folder and all related data deleted successfully"
    })))
}
