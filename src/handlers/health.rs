use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tracing::error;

use crate::{app::AppState, db::check_diesel_health};

/// GET /api/health. Liveness only, never touches the database.
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "API is working successfully"
    }))
}

/// GET /api/health/ready
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match check_diesel_health(&state.diesel_pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "API is ready",
                "database": "healthy"
            })),
        ),
        Err(e) => {
            error!("Readiness check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "message": "Database is unavailable",
                    "database": "unhealthy"
                })),
            )
        },
    }
}
