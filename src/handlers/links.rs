// Link endpoints. `POST /{id}` takes a folder id, `GET /{id}` a link id.

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
    models::link::{CreateLinkRequest, ListLinksQuery},
    services::LinkService,
    utils::api_error::ApiResult,
};

/// POST /api/links/{folder_id}
pub async fn create_link(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(raw_id): Path<String>,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let folder_id = parse_id(&raw_id, "Invalid folder id")?;
    let Json(request) = payload?;

    let link = LinkService::new(&state)
        .create_link(auth_user.user_id, folder_id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Link created successfully",
            "data": link
        })),
    ))
}

/// GET /api/links
pub async fn list_links(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    query: Result<Query<ListLinksQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query?;
    let links = LinkService::new(&state)
        .list_links(auth_user.user_id, query)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": links
    })))
}

/// GET /api/links/{link_id}
pub async fn get_link(
    State(state): State<AppState>,
    auth_user: AuthenticatedUser,
    Path(raw_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let link_id = parse_id(&raw_id, "Invalid link id")?;
    let link = LinkService::new(&state)
        .get_link(auth_user.user_id, link_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": link
    })))
}
