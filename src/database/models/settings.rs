use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// The single `platform_settings` row (id = 1)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PlatformSettings {
    pub id: i32,
    pub site_name: String,
    pub support_email: String,
    pub max_upload_size_mb: i32,
    pub session_timeout_minutes: i32,
    pub max_conversations_per_user: i32,
    pub hitl_match_threshold: f64,
    pub maintenance_mode: bool,
    pub maintenance_message: Option<String>,
    pub maintenance_started_at: Option<DateTime<Utc>>,
    pub maintenance_ended_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

impl PlatformSettings {
    pub const SINGLETON_ID: i32 = 1;
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            id: Self::SINGLETON_ID,
            site_name: "Climate Economy Assistant".to_string(),
            support_email: "support@climateeconomy.org".to_string(),
            max_upload_size_mb: 10,
            session_timeout_minutes: 60,
            max_conversations_per_user: 100,
            hitl_match_threshold: 0.8,
            maintenance_mode: false,
            maintenance_message: None,
            maintenance_started_at: None,
            maintenance_ended_at: None,
            updated_at: DateTime::<Utc>::default(),
            updated_by: None,
        }
    }
}
