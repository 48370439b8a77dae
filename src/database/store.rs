use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    AdminProfile, AppendedMessage, AuditLog, AuditLogQuery, Conversation, ConversationMessage,
    ConversationUpdate, JobListing, JobQuery, KnowledgeResource, MessageFeedback, NewAuditLog,
    NewJobListing, NewMessage, PartnerProfile, PlatformSettings, Profile, ResourceQuery,
};
use crate::types::{ProfileType, VerificationStatus};

/// Tables the admin analytics report aggregates over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricTable {
    Users,
    Partners,
    Jobs,
    Conversations,
    Messages,
}

impl MetricTable {
    pub const ALL: [MetricTable; 5] = [
        MetricTable::Users,
        MetricTable::Partners,
        MetricTable::Jobs,
        MetricTable::Conversations,
        MetricTable::Messages,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            MetricTable::Users => "profiles",
            MetricTable::Partners => "partner_profiles",
            MetricTable::Jobs => "job_listings",
            MetricTable::Conversations => "conversations",
            MetricTable::Messages => "conversation_messages",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            MetricTable::Users => "users",
            MetricTable::Partners => "partners",
            MetricTable::Jobs => "jobs",
            MetricTable::Conversations => "conversations",
            MetricTable::Messages => "messages",
        }
    }
}

/// Data access used by every handler. `PgStore` is the production implementation.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;

    // Profiles
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, DatabaseError>;
    async fn has_profile_of_type(&self, user_id: Uuid, profile: ProfileType) -> Result<bool, DatabaseError>;
    async fn set_active_profile(&self, user_id: Uuid, profile: ProfileType) -> Result<Profile, DatabaseError>;
    async fn get_admin_profile(&self, user_id: Uuid) -> Result<Option<AdminProfile>, DatabaseError>;

    // Conversations
    async fn list_conversations(
        &self,
        user_id: Uuid,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Conversation>, DatabaseError>;
    async fn get_conversation(&self, id: Uuid, user_id: Uuid) -> Result<Option<Conversation>, DatabaseError>;
    async fn create_conversation(&self, user_id: Uuid, title: Option<String>) -> Result<Conversation, DatabaseError>;
    async fn update_conversation(
        &self,
        id: Uuid,
        user_id: Uuid,
        update: ConversationUpdate,
    ) -> Result<Option<Conversation>, DatabaseError>;
    async fn delete_conversation(&self, id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError>;

    // Messages
    async fn list_messages(&self, conversation_id: Uuid, limit: i64) -> Result<Vec<ConversationMessage>, DatabaseError>;
    async fn get_message(
        &self,
        conversation_id: Uuid,
        message_id: &str,
    ) -> Result<Option<ConversationMessage>, DatabaseError>;
    /// Insert the message and bump the conversation counter in one atomic step
    async fn append_message(&self, message: NewMessage) -> Result<AppendedMessage, DatabaseError>;

    // Feedback
    async fn insert_feedback(&self, feedback: MessageFeedback) -> Result<MessageFeedback, DatabaseError>;
    async fn list_feedback(&self, conversation_id: Uuid) -> Result<Vec<MessageFeedback>, DatabaseError>;

    // Jobs
    async fn list_jobs(&self, query: &JobQuery) -> Result<Vec<JobListing>, DatabaseError>;
    async fn create_job(&self, job: NewJobListing) -> Result<JobListing, DatabaseError>;

    // Partners
    async fn get_partner(&self, id: Uuid) -> Result<Option<PartnerProfile>, DatabaseError>;
    async fn list_partners(&self, verification_status: Option<&str>) -> Result<Vec<PartnerProfile>, DatabaseError>;
    async fn set_partner_verification(
        &self,
        id: Uuid,
        status: VerificationStatus,
        notes: Option<String>,
    ) -> Result<Option<PartnerProfile>, DatabaseError>;

    // Knowledge resources
    async fn list_resources(&self, query: &ResourceQuery) -> Result<Vec<KnowledgeResource>, DatabaseError>;
    async fn get_resource(&self, id: Uuid) -> Result<Option<KnowledgeResource>, DatabaseError>;
    /// Atomically increments `download_count` and returns the updated row
    async fn record_download(&self, id: Uuid) -> Result<Option<KnowledgeResource>, DatabaseError>;

    // Platform settings
    async fn get_settings(&self) -> Result<Option<PlatformSettings>, DatabaseError>;
    async fn upsert_settings(&self, settings: &PlatformSettings) -> Result<PlatformSettings, DatabaseError>;

    // Audit log
    async fn insert_audit_log(&self, entry: NewAuditLog) -> Result<AuditLog, DatabaseError>;
    async fn list_audit_logs(&self, query: &AuditLogQuery) -> Result<Vec<AuditLog>, DatabaseError>;
    async fn count_audit_logs(&self, query: &AuditLogQuery) -> Result<i64, DatabaseError>;

    // Analytics
    async fn count_rows(&self, table: MetricTable) -> Result<i64, DatabaseError>;
    /// Row counts grouped by UTC calendar day of `created_at`, for rows at or after `since`
    async fn daily_counts(
        &self,
        table: MetricTable,
        since: DateTime<Utc>,
    ) -> Result<Vec<(NaiveDate, i64)>, DatabaseError>;
}
