use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct KnowledgeResource {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub resource_type: Option<String>,
    pub file_url: Option<String>,
    pub is_published: bool,
    pub download_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ResourceQuery {
    pub category: Option<String>,
    pub resource_type: Option<String>,
    pub limit: i64,
}
