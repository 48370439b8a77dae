use axum::{extract::State, http::HeaderMap, Extension};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{client_ip, ApiJson};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, UserContext};
use crate::services::{audit, AuditEntry};
use crate::types::ProfileType;

#[derive(Debug, Deserialize)]
pub struct SwitchProfileRequest {
    pub profile_type: String,
}

/// GET /api/v1/profile - The caller's identity, active profile and permissions
pub async fn profile_get(Extension(user): Extension<UserContext>) -> ApiResult<UserContext> {
    Ok(ApiResponse::success(user))
}

/// POST /api/v1/profile/switch - Act under another profile the caller owns
pub async fn profile_switch(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<SwitchProfileRequest>,
) -> ApiResult<Value> {
    let target: ProfileType = body
        .profile_type
        .parse()
        .map_err(|e: String| ApiError::field_error("profile_type", e))?;

    let owns_profile = user.user_type == target.as_str() || state.store.has_profile_of_type(user.id, target).await?;
    if !owns_profile {
        tracing::warn!("User {} tried to switch to unowned {} profile", user.id, target);
        return Err(ApiError::forbidden(format!("You do not have a {} profile", target)));
    }

    let previous = user.active_profile;
    state.store.set_active_profile(user.id, target).await?;
    let switched_at = Utc::now();

    audit::record(
        state.store.as_ref(),
        AuditEntry::new(user.id, "profile_switch", "profiles", user.id)
            .old_values(&json!({ "active_profile": previous }))
            .new_values(&json!({ "active_profile": target }))
            .ip(client_ip(&headers)),
    )
    .await;

    Ok(ApiResponse::success(json!({
        "previous_profile": previous,
        "current_profile": target,
        "permissions": target.permissions(),
        "switched_at": switched_at,
    })))
}
