use axum::extract::State;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::{ApiPath, ApiQuery};
use crate::app::AppState;
use crate::database::models::ResourceQuery;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListResourcesQuery {
    pub category: Option<String>,
    pub resource_type: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/v1/resources - Published knowledge resources
pub async fn resources_list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListResourcesQuery>,
) -> ApiResult<Value> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::field_error(
            "limit",
            format!("Limit must be between 1 and {}", MAX_LIMIT),
        ));
    }

    let resources = state
        .store
        .list_resources(&ResourceQuery {
            category: query.category,
            resource_type: query.resource_type,
            limit,
        })
        .await?;

    Ok(ApiResponse::success(json!({
        "resources": resources,
        "count": resources.len(),
    })))
}

/// GET /api/v1/resources/:id/download - Count a download and hand back the file URL
pub async fn resource_download(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Value> {
    let resource = state
        .store
        .get_resource(id)
        .await?
        .filter(|r| r.is_published)
        .ok_or_else(|| ApiError::not_found("Resource not found"))?;
    if resource.file_url.is_none() {
        return Err(ApiError::not_found("Resource has no downloadable file"));
    }

    let updated = state
        .store
        .record_download(resource.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Resource not found"))?;

    Ok(ApiResponse::success(json!({
        "id": updated.id,
        "title": updated.title,
        "file_url": updated.file_url,
        "download_count": updated.download_count,
    })))
}
