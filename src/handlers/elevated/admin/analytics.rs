use axum::{extract::State, Extension};
use chrono::Utc;
use serde::Deserialize;

use crate::api::ApiQuery;
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{AdminContext, ApiResponse, ApiResult};
use crate::services::analytics::{self, AnalyticsRange, AnalyticsReport};

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub range: Option<String>,
}

/// GET /api/admin/analytics?range=7d|30d|90d - Platform totals and daily growth
pub async fn analytics_get(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    ApiQuery(query): ApiQuery<AnalyticsQuery>,
) -> ApiResult<AnalyticsReport> {
    if !admin.can_view_analytics {
        return Err(ApiError::forbidden("Analytics permission required"));
    }
    let range = match query.range.as_deref() {
        Some(r) => r.parse::<AnalyticsRange>().map_err(|e| ApiError::field_error("range", e))?,
        None => AnalyticsRange::default(),
    };

    let report = analytics::build_report(state.store.as_ref(), range, Utc::now()).await;
    Ok(ApiResponse::success(report))
}
