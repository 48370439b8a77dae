use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig};
use crate::database::Store;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{
    jwt_auth_middleware, load_profile_middleware, rate_limit_middleware, require_admin_middleware, RateLimiter,
};
use crate::services::{BackendClient, ProxyError};

/// Shared handles every handler and middleware sees
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
    pub backend: BackendClient,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: Arc<AppConfig>) -> Result<Self, ProxyError> {
        let backend = BackendClient::new(&config.backend)?;
        let limiter = Arc::new(RateLimiter::from_config(&config.api));
        Ok(Self {
            store,
            config,
            backend,
            limiter,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security);

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(v1_routes(state.clone()))
        .merge(admin_routes(state.clone()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `/api/v1/*`: rate limit, then JWT, then profile
fn v1_routes(state: AppState) -> Router<AppState> {
    use protected::{chat, conversations, feedback, jobs, messages, profile, resources};

    Router::new()
        .route(
            "/api/v1/conversations",
            get(conversations::conversations_list).post(conversations::conversation_create),
        )
        .route(
            "/api/v1/conversations/:id",
            get(conversations::conversation_get)
                .patch(conversations::conversation_update)
                .delete(conversations::conversation_delete),
        )
        .route(
            "/api/v1/conversations/:id/messages",
            get(messages::messages_list).post(messages::message_create),
        )
        .route(
            "/api/v1/conversations/:id/feedback",
            get(feedback::feedback_list).post(feedback::feedback_create),
        )
        .route("/api/v1/profile", get(profile::profile_get))
        .route("/api/v1/profile/switch", post(profile::profile_switch))
        .route("/api/v1/chat", post(chat::chat))
        .route("/api/v1/career-search", post(chat::career_search))
        .route("/api/v1/jobs", get(jobs::jobs_list).post(jobs::job_create))
        .route("/api/v1/resources", get(resources::resources_list))
        .route("/api/v1/resources/:id/download", get(resources::resource_download))
        .route_layer(from_fn_with_state(state.clone(), load_profile_middleware))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
        .route_layer(from_fn_with_state(state, rate_limit_middleware))
}

/// `/api/admin/*`: rate limit, then JWT, then profile, then admin check
fn admin_routes(state: AppState) -> Router<AppState> {
    use elevated::admin;

    Router::new()
        .route("/api/admin/access", get(admin::access::access_get))
        .route("/api/admin/analytics", get(admin::analytics::analytics_get))
        .route("/api/admin/audit-logs", get(admin::audit_logs::audit_logs_list))
        .route("/api/admin/audit-logs/export", get(admin::audit_logs::audit_logs_export))
        .route(
            "/api/admin/settings",
            get(admin::settings::settings_get).put(admin::settings::settings_update),
        )
        .route(
            "/api/admin/maintenance",
            get(admin::maintenance::maintenance_get).post(admin::maintenance::maintenance_post),
        )
        .route("/api/admin/partners", get(admin::partners::partners_list))
        .route(
            "/api/admin/partners/:id/verification",
            patch(admin::partners::partner_verification_update),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin_middleware))
        .route_layer(from_fn_with_state(state.clone(), load_profile_middleware))
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
        .route_layer(from_fn_with_state(state, rate_limit_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if security.cors_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}
