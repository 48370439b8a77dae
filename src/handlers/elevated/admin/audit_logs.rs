use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::{client_ip, ApiQuery};
use crate::app::AppState;
use crate::database::models::AuditLogQuery;
use crate::error::ApiError;
use crate::middleware::{AdminContext, ApiResponse, ApiResult};
use crate::services::export::{audit_log_row, to_csv, AUDIT_CSV_HEADERS};
use crate::services::{audit, AuditEntry};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct AuditLogsQuery {
    pub table_name: Option<String>,
    pub action: Option<String>,
    pub user_id: Option<Uuid>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl AuditLogsQuery {
    fn into_query(self, limit: i64, offset: i64) -> Result<AuditLogQuery, ApiError> {
        if let (Some(since), Some(until)) = (self.since, self.until) {
            if since > until {
                return Err(ApiError::field_error("since", "'since' must not be after 'until'"));
            }
        }
        Ok(AuditLogQuery {
            table_name: self.table_name.filter(|s| !s.is_empty()),
            action: self.action.filter(|s| !s.is_empty()),
            user_id: self.user_id,
            since: self.since,
            until: self.until,
            limit,
            offset,
        })
    }
}

/// GET /api/admin/audit-logs - Filtered audit trail, newest first
pub async fn audit_logs_list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AuditLogsQuery>,
) -> ApiResult<Value> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::field_error(
            "limit",
            format!("Limit must be between 1 and {}", MAX_LIMIT),
        ));
    }
    let offset = query.offset.unwrap_or(0);
    if offset < 0 {
        return Err(ApiError::field_error("offset", "Offset must be non-negative"));
    }
    let query = query.into_query(limit, offset)?;

    let (logs, total) = tokio::try_join!(state.store.list_audit_logs(&query), state.store.count_audit_logs(&query))?;

    Ok(ApiResponse::success(json!({
        "logs": logs,
        "total": total,
        "limit": limit,
        "offset": offset,
    })))
}

/// GET /api/admin/audit-logs/export - Same filters, as a CSV attachment
pub async fn audit_logs_export(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<AuditLogsQuery>,
) -> Result<Response, ApiError> {
    let export_limit = state.config.features.audit_export_limit;
    let query = query.into_query(export_limit, 0)?;

    let logs = state.store.list_audit_logs(&query).await?;
    let rows: Vec<Vec<String>> = logs.iter().map(audit_log_row).collect();
    let csv = to_csv(&AUDIT_CSV_HEADERS, &rows);

    tracing::info!("Admin {} exported {} audit log rows", admin.user_id, rows.len());
    audit::record(
        state.store.as_ref(),
        AuditEntry::new(admin.user_id, "audit_logs_export", "audit_logs", "export")
            .new_values(&json!({
                "rows": rows.len(),
                "table_name": query.table_name,
                "action": query.action,
            }))
            .ip(client_ip(&headers)),
    )
    .await;

    let filename = format!("attachment; filename=\"audit-logs-{}.csv\"", Utc::now().format("%Y-%m-%d"));
    let disposition = HeaderValue::from_str(&filename)
        .map_err(|_| ApiError::internal_server_error("Failed to build export headers"))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}
