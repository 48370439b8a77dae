use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: Option<String>,
    pub status: String,
    pub message_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConversationMessage {
    pub id: String,
    pub conversation_id: Uuid,
    pub role: String,
    pub content: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: String,
    pub conversation_id: Uuid,
    pub role: String,
    pub content: String,
    pub metadata: Value,
}

/// Message row plus the conversation counter after the insert
#[derive(Debug, Clone, Serialize)]
pub struct AppendedMessage {
    pub message: ConversationMessage,
    pub message_count: i32,
}

#[derive(Debug, Clone, Default)]
pub struct ConversationUpdate {
    pub title: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MessageFeedback {
    pub id: String,
    pub conversation_id: Uuid,
    pub message_id: String,
    pub user_id: Uuid,
    pub feedback_type: String,
    pub rating: Option<i32>,
    pub correction: Option<String>,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
