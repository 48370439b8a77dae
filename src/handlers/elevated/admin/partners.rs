use axum::{extract::State, http::HeaderMap, Extension};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::{client_ip, ApiJson, ApiPath, ApiQuery};
use crate::app::AppState;
use crate::database::models::PartnerProfile;
use crate::error::ApiError;
use crate::middleware::{AdminContext, ApiResponse, ApiResult};
use crate::services::{audit, AuditEntry};
use crate::types::VerificationStatus;

#[derive(Debug, Deserialize)]
pub struct ListPartnersQuery {
    pub verification_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerificationRequest {
    pub status: String,
    pub notes: Option<String>,
}

fn verification_snapshot(partner: &PartnerProfile) -> Value {
    json!({
        "verification_status": partner.verification_status,
        "verification_notes": partner.verification_notes,
        "verified_at": partner.verified_at,
        "can_post_jobs": partner.can_post_jobs,
    })
}

/// GET /api/admin/partners - Partner organizations, optionally by verification status
pub async fn partners_list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListPartnersQuery>,
) -> ApiResult<Value> {
    let status = query
        .verification_status
        .as_deref()
        .map(|s| s.parse::<VerificationStatus>())
        .transpose()
        .map_err(|e| ApiError::field_error("verification_status", e))?;

    let partners = state.store.list_partners(status.map(|s| s.as_str())).await?;
    Ok(ApiResponse::success(json!({
        "partners": partners,
        "count": partners.len(),
    })))
}

/// PATCH /api/admin/partners/:id/verification - Approve, reject or reset a partner
pub async fn partner_verification_update(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
    headers: HeaderMap,
    ApiJson(body): ApiJson<VerificationRequest>,
) -> ApiResult<PartnerProfile> {
    if !admin.can_manage_partners {
        return Err(ApiError::forbidden("Partner management permission required"));
    }
    let status: VerificationStatus = body
        .status
        .parse()
        .map_err(|e: String| ApiError::field_error("status", e))?;

    let previous = state
        .store
        .get_partner(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Partner not found"))?;

    let notes = body.notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
    let updated = state
        .store
        .set_partner_verification(id, status, notes)
        .await?
        .ok_or_else(|| ApiError::not_found("Partner not found"))?;

    tracing::info!(
        "Admin {} set partner {} verification to {}",
        admin.user_id,
        id,
        status.as_str()
    );
    audit::record(
        state.store.as_ref(),
        AuditEntry::new(admin.user_id, "partner_verification", "partner_profiles", id)
            .old_values(&verification_snapshot(&previous))
            .new_values(&verification_snapshot(&updated))
            .ip(client_ip(&headers)),
    )
    .await;

    Ok(ApiResponse::success(updated))
}
