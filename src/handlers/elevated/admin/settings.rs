use axum::{extract::State, http::HeaderMap, Extension};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;

use crate::api::{client_ip, ApiJson};
use crate::app::AppState;
use crate::database::models::PlatformSettings;
use crate::error::ApiError;
use crate::handlers::char_len_between;
use crate::middleware::{AdminContext, ApiResponse, ApiResult};
use crate::services::{audit, AuditEntry};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

/// Partial settings update; absent fields keep their current value
#[derive(Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    pub site_name: Option<String>,
    pub support_email: Option<String>,
    pub max_upload_size_mb: Option<i32>,
    pub session_timeout_minutes: Option<i32>,
    pub max_conversations_per_user: Option<i32>,
    pub hitl_match_threshold: Option<f64>,
}

impl SettingsUpdate {
    fn is_empty(&self) -> bool {
        self.site_name.is_none()
            && self.support_email.is_none()
            && self.max_upload_size_mb.is_none()
            && self.session_timeout_minutes.is_none()
            && self.max_conversations_per_user.is_none()
            && self.hitl_match_threshold.is_none()
    }

    /// Field name to problem, for every field that is out of range
    pub fn validate(&self) -> HashMap<String, String> {
        let mut errors = HashMap::new();
        let mut reject = |field: &str, problem: &str| {
            errors.insert(field.to_string(), problem.to_string());
        };

        if let Some(name) = &self.site_name {
            if !char_len_between(name, 1, 100) {
                reject("site_name", "Site name must be between 1 and 100 characters");
            }
        }
        if let Some(email) = &self.support_email {
            if !EMAIL_RE.is_match(email.trim()) {
                reject("support_email", "Invalid email format");
            }
        }
        if let Some(size) = self.max_upload_size_mb {
            if !(1..=100).contains(&size) {
                reject("max_upload_size_mb", "Max upload size must be between 1 and 100 MB");
            }
        }
        if let Some(timeout) = self.session_timeout_minutes {
            if !(5..=1440).contains(&timeout) {
                reject("session_timeout_minutes", "Session timeout must be between 5 and 1440 minutes");
            }
        }
        if let Some(max) = self.max_conversations_per_user {
            if !(1..=10_000).contains(&max) {
                reject("max_conversations_per_user", "Max conversations must be between 1 and 10000");
            }
        }
        if let Some(threshold) = self.hitl_match_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                reject("hitl_match_threshold", "HITL threshold must be between 0 and 1");
            }
        }
        errors
    }

    fn apply_to(self, settings: &mut PlatformSettings) {
        if let Some(name) = self.site_name {
            settings.site_name = name.trim().to_string();
        }
        if let Some(email) = self.support_email {
            settings.support_email = email.trim().to_string();
        }
        if let Some(size) = self.max_upload_size_mb {
            settings.max_upload_size_mb = size;
        }
        if let Some(timeout) = self.session_timeout_minutes {
            settings.session_timeout_minutes = timeout;
        }
        if let Some(max) = self.max_conversations_per_user {
            settings.max_conversations_per_user = max;
        }
        if let Some(threshold) = self.hitl_match_threshold {
            settings.hitl_match_threshold = threshold;
        }
    }
}

/// Stored settings, or the defaults when the row has never been written
pub(crate) async fn current_settings(state: &AppState) -> Result<PlatformSettings, ApiError> {
    Ok(state.store.get_settings().await?.unwrap_or_else(|| PlatformSettings {
        hitl_match_threshold: state.config.features.hitl_match_threshold,
        ..PlatformSettings::default()
    }))
}

/// GET /api/admin/settings
pub async fn settings_get(State(state): State<AppState>) -> ApiResult<PlatformSettings> {
    Ok(ApiResponse::success(current_settings(&state).await?))
}

/// PUT /api/admin/settings - Validate, upsert the settings row and audit the change
pub async fn settings_update(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    headers: HeaderMap,
    ApiJson(update): ApiJson<SettingsUpdate>,
) -> ApiResult<PlatformSettings> {
    if !admin.can_manage_system {
        return Err(ApiError::forbidden("System management permission required"));
    }
    if update.is_empty() {
        return Err(ApiError::bad_request("No settings provided"));
    }
    let field_errors = update.validate();
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error("Invalid settings", Some(field_errors)));
    }

    let previous = current_settings(&state).await?;
    let mut next = previous.clone();
    update.apply_to(&mut next);
    next.updated_by = Some(admin.user_id);
    next.updated_at = Utc::now();

    let saved = state.store.upsert_settings(&next).await?;
    tracing::info!("Platform settings updated by admin {}", admin.user_id);

    audit::record(
        state.store.as_ref(),
        AuditEntry::new(admin.user_id, "settings_update", "platform_settings", PlatformSettings::SINGLETON_ID)
            .old_values(&previous)
            .new_values(&saved)
            .ip(client_ip(&headers)),
    )
    .await;

    Ok(ApiResponse::success(saved))
}
