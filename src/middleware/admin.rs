use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde::Serialize;
use uuid::Uuid;

use super::auth::AuthUser;
use crate::app::AppState;
use crate::error::ApiError;

/// Admin capabilities from `admin_profiles`
#[derive(Clone, Debug, Serialize)]
pub struct AdminContext {
    pub user_id: Uuid,
    pub admin_level: String,
    pub can_manage_users: bool,
    pub can_manage_partners: bool,
    pub can_manage_content: bool,
    pub can_view_analytics: bool,
    pub can_manage_system: bool,
    pub permissions: Vec<&'static str>,
}

/// Rejects callers without an admin profile with 403
pub async fn require_admin_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = request
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.id)
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before admin check"))?;

    let admin = state.store.get_admin_profile(user_id).await?.ok_or_else(|| {
        tracing::warn!("Admin access denied for user {}", user_id);
        ApiError::forbidden("Admin access required")
    })?;

    let context = AdminContext {
        user_id,
        permissions: admin.permissions(),
        admin_level: admin.admin_level,
        can_manage_users: admin.can_manage_users,
        can_manage_partners: admin.can_manage_partners,
        can_manage_content: admin.can_manage_content,
        can_view_analytics: admin.can_view_analytics,
        can_manage_system: admin.can_manage_system,
    };
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}
