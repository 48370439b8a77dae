use axum::{extract::State, http::HeaderMap, Extension};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::{client_ip, ApiJson, ApiQuery};
use crate::app::AppState;
use crate::database::models::{JobListing, JobQuery, NewJobListing};
use crate::error::ApiError;
use crate::handlers::char_len_between;
use crate::middleware::{ApiResponse, ApiResult, UserContext};
use crate::services::{audit, AuditEntry};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub location: Option<String>,
    pub climate_sector: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub climate_sector: Option<String>,
    pub employment_type: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
}

impl CreateJobRequest {
    fn validate(&self) -> Result<(), ApiError> {
        if !char_len_between(&self.title, 3, 200) {
            return Err(ApiError::field_error("title", "Title must be between 3 and 200 characters"));
        }
        if self.description.trim().chars().count() < 20 {
            return Err(ApiError::field_error("description", "Description must be at least 20 characters"));
        }
        if let (Some(min), Some(max)) = (self.salary_min, self.salary_max) {
            if min > max {
                return Err(ApiError::field_error("salary_min", "Minimum salary cannot exceed maximum salary"));
            }
        }
        if self.salary_min.map_or(false, |s| s < 0) || self.salary_max.map_or(false, |s| s < 0) {
            return Err(ApiError::field_error("salary_min", "Salaries must be non-negative"));
        }
        Ok(())
    }
}

/// GET /api/v1/jobs - Active job listings
pub async fn jobs_list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListJobsQuery>,
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

    let jobs = state
        .store
        .list_jobs(&JobQuery {
            location: query.location.filter(|l| !l.trim().is_empty()),
            climate_sector: query.climate_sector.filter(|s| !s.trim().is_empty()),
            limit,
            offset,
        })
        .await?;

    Ok(ApiResponse::success(json!({
        "jobs": jobs,
        "count": jobs.len(),
        "limit": limit,
        "offset": offset,
    })))
}

/// POST /api/v1/jobs - Verified partners post a listing
pub async fn job_create(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<CreateJobRequest>,
) -> ApiResult<JobListing> {
    if !user.permissions.contains(&"post_jobs") {
        return Err(ApiError::forbidden("Switch to your partner profile to post jobs"));
    }

    let partner = state
        .store
        .get_partner(user.id)
        .await?
        .ok_or_else(|| ApiError::forbidden("Partner profile required"))?;
    if !partner.is_verified() || !partner.can_post_jobs {
        return Err(ApiError::forbidden("Partner must be verified to post jobs"));
    }

    body.validate()?;

    let job = state
        .store
        .create_job(NewJobListing {
            partner_id: partner.id,
            title: body.title.trim().to_string(),
            description: body.description.trim().to_string(),
            location: body.location,
            climate_sector: body.climate_sector,
            employment_type: body.employment_type,
            salary_min: body.salary_min,
            salary_max: body.salary_max,
        })
        .await?;

    audit::record(
        state.store.as_ref(),
        AuditEntry::new(user.id, "job_create", "job_listings", job.id)
            .new_values(&job)
            .ip(client_ip(&headers)),
    )
    .await;

    Ok(ApiResponse::created(job))
}
