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
use crate::types::ProfileType;

/// Caller identity plus the profile they are currently acting under
#[derive(Clone, Debug, Serialize)]
pub struct UserContext {
    pub id: Uuid,
    pub email: Option<String>,
    pub user_type: String,
    pub active_profile: ProfileType,
    pub permissions: Vec<&'static str>,
}

/// Loads the caller's `profiles` row. Requires `jwt_auth_middleware` to have run.
pub async fn load_profile_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before profile lookup"))?;

    let profile = state.store.get_profile(auth_user.id).await?.ok_or_else(|| {
        tracing::warn!("No profile row for authenticated user {}", auth_user.id);
        ApiError::forbidden("Profile not found")
    })?;

    let active_profile = profile.current_profile();
    let context = UserContext {
        id: profile.id,
        email: profile.email.or(auth_user.email),
        user_type: profile.user_type,
        active_profile,
        permissions: active_profile.permissions(),
    };

    tracing::debug!("User {} acting as {}", context.id, context.active_profile);
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}
