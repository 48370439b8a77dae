// handlers/public/mod.rs - endpoints that need no authentication

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - Service name, version and endpoint map
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Climate Economy Assistant API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "health": "/health (public)",
                "conversations": "/api/v1/conversations[/:id[/messages|/feedback]] (authenticated)",
                "profile": "/api/v1/profile, /api/v1/profile/switch (authenticated)",
                "chat": "/api/v1/chat, /api/v1/career-search (authenticated, proxied)",
                "jobs": "/api/v1/jobs (authenticated)",
                "resources": "/api/v1/resources[/:id/download] (authenticated)",
                "admin": "/api/admin/{access,analytics,audit-logs,settings,maintenance,partners} (admin)",
            }
        }
    }))
}

/// GET /health - Liveness plus database reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database": "unavailable"
                    }
                })),
            )
        }
    }
}
