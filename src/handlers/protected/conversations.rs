use axum::{extract::State, Extension};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{owned_conversation, validate_message_content};
use crate::api::{ApiJson, ApiPath, ApiQuery};
use crate::app::AppState;
use crate::database::models::{ConversationUpdate, NewMessage};
use crate::error::ApiError;
use crate::handlers::char_len_between;
use crate::middleware::{ApiResponse, ApiResult, UserContext};
use crate::services::generate_id;
use crate::types::{ConversationStatus, MessageRole};

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;
const MAX_TITLE_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct ListConversationsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub title: Option<String>,
    pub initial_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateConversationRequest {
    pub title: Option<String>,
    pub status: Option<String>,
}

fn validate_title(title: &str) -> Result<String, ApiError> {
    if !char_len_between(title, 1, MAX_TITLE_CHARS) {
        return Err(ApiError::field_error(
            "title",
            format!("Title must be between 1 and {} characters", MAX_TITLE_CHARS),
        ));
    }
    Ok(title.trim().to_string())
}

fn validate_status(status: &str) -> Result<ConversationStatus, ApiError> {
    status.parse().map_err(|e: String| ApiError::field_error("status", e))
}

/// GET /api/v1/conversations - The caller's conversations, most recent activity first
pub async fn conversations_list(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    ApiQuery(query): ApiQuery<ListConversationsQuery>,
) -> ApiResult<Value> {
    let status = query.status.as_deref().map(validate_status).transpose()?;

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

    let conversations = state
        .store
        .list_conversations(user.id, status.map(|s| s.as_str()), limit, offset)
        .await?;

    Ok(ApiResponse::success(json!({
        "conversations": conversations,
        "count": conversations.len(),
        "limit": limit,
        "offset": offset,
    })))
}

/// POST /api/v1/conversations - Start a conversation, optionally with a first user message
pub async fn conversation_create(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    ApiJson(body): ApiJson<CreateConversationRequest>,
) -> ApiResult<Value> {
    let title = body.title.as_deref().map(validate_title).transpose()?;
    if let Some(message) = &body.initial_message {
        validate_message_content("initial_message", message)?;
    }

    let mut conversation = state.store.create_conversation(user.id, title).await?;
    tracing::info!("Created conversation {} for user {}", conversation.id, user.id);

    let mut initial_message = None;
    if let Some(content) = body.initial_message {
        let appended = state
            .store
            .append_message(NewMessage {
                id: generate_id("msg"),
                conversation_id: conversation.id,
                role: MessageRole::User.as_str().to_string(),
                content,
                metadata: json!({}),
            })
            .await?;
        conversation.message_count = appended.message_count;
        conversation.last_activity = appended.message.created_at;
        initial_message = Some(appended.message);
    }

    Ok(ApiResponse::created(json!({
        "conversation": conversation,
        "initial_message": initial_message,
    })))
}

/// GET /api/v1/conversations/:id
pub async fn conversation_get(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Value> {
    let conversation = owned_conversation(&state, id, user.id).await?;
    Ok(ApiResponse::success(json!({ "conversation": conversation })))
}

/// PATCH /api/v1/conversations/:id - Rename or change status
pub async fn conversation_update(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<UpdateConversationRequest>,
) -> ApiResult<Value> {
    if body.title.is_none() && body.status.is_none() {
        return Err(ApiError::bad_request("No fields to update"));
    }

    let update = ConversationUpdate {
        title: body.title.as_deref().map(validate_title).transpose()?,
        status: body
            .status
            .as_deref()
            .map(validate_status)
            .transpose()?
            .map(|s| s.as_str().to_string()),
    };

    let conversation = state
        .store
        .update_conversation(id, user.id, update)
        .await?
        .ok_or_else(|| ApiError::not_found("Conversation not found"))?;

    Ok(ApiResponse::success(json!({ "conversation": conversation })))
}

/// DELETE /api/v1/conversations/:id
pub async fn conversation_delete(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<()> {
    if !state.store.delete_conversation(id, user.id).await? {
        return Err(ApiError::not_found("Conversation not found"));
    }
    tracing::info!("Deleted conversation {} for user {}", id, user.id);
    Ok(ApiResponse::<()>::no_content())
}
