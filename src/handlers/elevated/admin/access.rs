use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{AdminContext, ApiResponse, ApiResult};

/// GET /api/admin/access - Confirms the caller may use the admin dashboard
pub async fn access_get(Extension(admin): Extension<AdminContext>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "access_granted": true,
        "user_id": admin.user_id,
        "admin_level": admin.admin_level,
        "permissions": admin.permissions,
        "can_manage_users": admin.can_manage_users,
        "can_manage_partners": admin.can_manage_partners,
        "can_manage_content": admin.can_manage_content,
        "can_view_analytics": admin.can_view_analytics,
        "can_manage_system": admin.can_manage_system,
    })))
}
