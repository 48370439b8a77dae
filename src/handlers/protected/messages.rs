use axum::{extract::State, Extension};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{owned_conversation, validate_message_content};
use crate::api::{ApiJson, ApiPath, ApiQuery};
use crate::app::AppState;
use crate::database::models::{AppendedMessage, NewMessage};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, UserContext};
use crate::services::generate_id;
use crate::types::MessageRole;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMessageRequest {
    pub content: String,
    pub role: Option<String>,
    pub metadata: Option<Value>,
}

/// GET /api/v1/conversations/:id/messages - Messages in creation order
pub async fn messages_list(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<ListMessagesQuery>,
) -> ApiResult<Value> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::field_error(
            "limit",
            format!("Limit must be between 1 and {}", MAX_LIMIT),
        ));
    }

    let conversation = owned_conversation(&state, id, user.id).await?;
    let messages = state.store.list_messages(conversation.id, limit).await?;

    Ok(ApiResponse::success(json!({
        "conversation_id": conversation.id,
        "messages": messages,
        "count": messages.len(),
    })))
}

/// POST /api/v1/conversations/:id/messages - Append a message and bump the counter
pub async fn message_create(
    State(state): State<AppState>,
    Extension(user): Extension<UserContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(body): ApiJson<CreateMessageRequest>,
) -> ApiResult<AppendedMessage> {
    validate_message_content("content", &body.content)?;
    let role = match body.role.as_deref() {
        Some(role) => role.parse().map_err(|e: String| ApiError::field_error("role", e))?,
        None => MessageRole::User,
    };
    let metadata = match body.metadata {
        None | Some(Value::Null) => json!({}),
        Some(Value::Object(map)) => Value::Object(map),
        Some(_) => return Err(ApiError::field_error("metadata", "Metadata must be an object")),
    };

    let conversation = owned_conversation(&state, id, user.id).await?;

    let appended = state
        .store
        .append_message(NewMessage {
            id: generate_id("msg"),
            conversation_id: conversation.id,
            role: role.as_str().to_string(),
            content: body.content,
            metadata,
        })
        .await?;

    tracing::debug!(
        "Appended message {} to conversation {} (count {})",
        appended.message.id,
        conversation.id,
        appended.message_count
    );

    Ok(ApiResponse::created(appended))
}
