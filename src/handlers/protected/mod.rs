// handlers/protected/mod.rs - /api/v1/* handlers (JWT + profile required)

pub mod chat;
pub mod conversations;
pub mod feedback;
pub mod jobs;
pub mod messages;
pub mod profile;
pub mod resources;


use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::Conversation;
use crate::error::ApiError;

pub const MAX_MESSAGE_CHARS: usize = 10_000;

/// Conversation owned by `user_id`; anyone else's is reported as missing
pub(crate) async fn owned_conversation(state: &AppState, id: Uuid, user_id: Uuid) -> Result<Conversation, ApiError> {
    state
        .store
        .get_conversation(id, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Conversation not found"))
}

pub(crate) fn validate_message_content(field: &str, content: &str) -> Result<(), ApiError> {
    if content.trim().is_empty() {
        return Err(ApiError::field_error(field, "Message content is required"));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::field_error(
            field,
            format!("Message content must be at most {} characters", MAX_MESSAGE_CHARS),
        ));
    }
    Ok(())
}
