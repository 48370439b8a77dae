use axum::{extract::State, http::HeaderMap, Extension};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use super::settings::current_settings;
use crate::api::{client_ip, ApiJson};
use crate::app::AppState;
use crate::database::models::PlatformSettings;
use crate::error::ApiError;
use crate::middleware::{AdminContext, ApiResponse, ApiResult};
use crate::services::{audit, AuditEntry};

const DEFAULT_MESSAGE: &str = "The platform is undergoing scheduled maintenance. Please check back soon.";

#[derive(Debug, Deserialize)]
pub struct MaintenanceRequest {
    pub action: String,
    pub message: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MaintenanceAction {
    Enable,
    Disable,
    Schedule,
}

impl MaintenanceAction {
    fn parse(action: &str) -> Result<Self, ApiError> {
        match action {
            "enable" => Ok(MaintenanceAction::Enable),
            "disable" => Ok(MaintenanceAction::Disable),
            "schedule" => Ok(MaintenanceAction::Schedule),
            other => Err(ApiError::field_error(
                "action",
                format!("Action must be one of enable, disable, schedule (got '{}')", other),
            )),
        }
    }
}

fn status_json(settings: &PlatformSettings) -> Value {
    json!({
        "maintenance_mode": settings.maintenance_mode,
        "maintenance_message": settings.maintenance_message,
        "maintenance_started_at": settings.maintenance_started_at,
        "maintenance_ended_at": settings.maintenance_ended_at,
        "updated_at": settings.updated_at,
        "updated_by": settings.updated_by,
    })
}

/// A window must be in the future and end after it starts
fn validate_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), ApiError> {
    let start = start.ok_or_else(|| ApiError::field_error("scheduled_start", "Start time is required"))?;
    let end = end.ok_or_else(|| ApiError::field_error("scheduled_end", "End time is required"))?;
    if start >= end {
        return Err(ApiError::field_error("scheduled_end", "End time must be after start time"));
    }
    if start <= now {
        return Err(ApiError::field_error("scheduled_start", "Start time must be in the future"));
    }
    Ok((start, end))
}

/// GET /api/admin/maintenance
pub async fn maintenance_get(State(state): State<AppState>) -> ApiResult<Value> {
    let settings = current_settings(&state).await?;
    Ok(ApiResponse::success(status_json(&settings)))
}

/// POST /api/admin/maintenance - enable, disable, or schedule a maintenance window.
/// Scheduling only records the window in the audit log.
pub async fn maintenance_post(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<MaintenanceRequest>,
) -> ApiResult<Value> {
    if !admin.can_manage_system {
        return Err(ApiError::forbidden("System management permission required"));
    }
    let action = MaintenanceAction::parse(&body.action)?;
    let now = Utc::now();
    let ip = client_ip(&headers);
    let message = body.message.map(|m| m.trim().to_string()).filter(|m| !m.is_empty());

    if action == MaintenanceAction::Schedule {
        let (start, end) = validate_window(body.scheduled_start, body.scheduled_end, now)?;
        let window = json!({
            "scheduled_start": start,
            "scheduled_end": end,
            "message": message.as_deref().unwrap_or(DEFAULT_MESSAGE),
        });
        audit::record(
            state.store.as_ref(),
            AuditEntry::new(admin.user_id, "maintenance_scheduled", "platform_settings", PlatformSettings::SINGLETON_ID)
                .new_values(&window)
                .ip(ip),
        )
        .await;
        tracing::info!("Admin {} scheduled maintenance {} to {}", admin.user_id, start, end);

        let mut response = window;
        response["action"] = json!("schedule");
        return Ok(ApiResponse::success(response));
    }

    let previous = current_settings(&state).await?;
    let mut next = previous.clone();
    let audit_action = match action {
        MaintenanceAction::Enable => {
            next.maintenance_mode = true;
            next.maintenance_message = Some(message.unwrap_or_else(|| DEFAULT_MESSAGE.to_string()));
            next.maintenance_started_at = Some(now);
            next.maintenance_ended_at = None;
            "maintenance_enabled"
        }
        _ => {
            next.maintenance_mode = false;
            next.maintenance_ended_at = Some(now);
            "maintenance_disabled"
        }
    };
    next.updated_by = Some(admin.user_id);
    next.updated_at = now;

    let saved = state.store.upsert_settings(&next).await?;
    tracing::info!("Admin {} set maintenance_mode={}", admin.user_id, saved.maintenance_mode);

    audit::record(
        state.store.as_ref(),
        AuditEntry::new(admin.user_id, audit_action, "platform_settings", PlatformSettings::SINGLETON_ID)
            .old_values(&status_json(&previous))
            .new_values(&status_json(&saved))
            .ip(ip),
    )
    .await;

    let mut response = status_json(&saved);
    response["action"] = json!(body.action);
    Ok(ApiResponse::success(response))
}
