use axum::{extract::State, Extension};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::owned_conversation;
use crate::api::{ApiJson, ApiPath};
use crate::app::AppState;
use crate::database::models::MessageFeedback;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, UserContext};
use crate::services::generate_id;
use crate::types::FeedbackType;

#[derive(Debug, Deserialize)]
pub struct CreateFeedbackRequest {
    pub message_id: String,
    pub feedback_type: String,
    pub rating: Option<i32>,
    pub correction: Option<String>,
    pub comment: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// POST /api/v1/conversations/:id/feedback - Rate or correct an assistant message
pub async fn feedback_create(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<CreateFeedbackRequest>,
) -> ApiResult<MessageFeedback> {
    if body.message_id.trim().is_empty() {
        return Err(ApiError::field_error("message_id", "Message id is required"));
    }
    let feedback_type: FeedbackType = body
        .feedback_type
        .parse()
        .map_err(|e: String| ApiError::field_error("feedback_type", e))?;
    if let Some(rating) = body.rating {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::field_error("rating", "Rating must be between 1 and 5"));
        }
    }
    let correction = non_blank(body.correction);
    if feedback_type == FeedbackType::Correction && correction.is_none() {
        return Err(ApiError::field_error("correction", "Correction text is required for corrections"));
    }

    let conversation = owned_conversation(&state, id, user.id).await?;
    let message = state
        .store
        .get_message(conversation.id, body.message_id.trim())
        .await?
        .ok_or_else(|| ApiError::not_found("Message not found in this conversation"))?;

    let feedback = state
        .store
        .insert_feedback(MessageFeedback {
            id: generate_id("fb"),
            conversation_id: conversation.id,
            message_id: message.id,
            user_id: user.id,
            feedback_type: feedback_type.as_str().to_string(),
            rating: body.rating,
            correction,
            comment: non_blank(body.comment),
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!(
        "Recorded {} feedback {} on message {}",
        feedback.feedback_type,
        feedback.id,
        feedback.message_id
    );

    Ok(ApiResponse::created(feedback))
}

/// GET /api/v1/conversations/:id/feedback
pub async fn feedback_list(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Value> {
    let conversation = owned_conversation(&state, id, user.id).await?;
    let feedback = state.store.list_feedback(conversation.id).await?;
    Ok(ApiResponse::success(json!({
        "conversation_id": conversation.id,
        "feedback": feedback,
        "count": feedback.len(),
    })))
}
