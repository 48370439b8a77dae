// In-memory store and request helpers for router-level tests

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tower::ServiceExt;
use uuid::Uuid;

use crate::app::{router, AppState};
use crate::auth::{issue_token, Claims};
use crate::config::AppConfig;
use crate::database::models::{
    AdminProfile, AppendedMessage, AuditLog, AuditLogQuery, Conversation, ConversationMessage,
    ConversationUpdate, JobListing, JobQuery, KnowledgeResource, MessageFeedback, NewAuditLog,
    NewJobListing, NewMessage, PartnerProfile, PlatformSettings, Profile, ResourceQuery,
};
use crate::database::{DatabaseError, MetricTable, Store};
use crate::types::{ProfileType, VerificationStatus};

pub const TEST_SECRET: &str = "test-jwt-secret-for-router-tests";

#[derive(Default)]
struct Tables {
    profiles: Vec<Profile>,
    job_seekers: HashSet<Uuid>,
    admins: Vec<AdminProfile>,
    partners: Vec<PartnerProfile>,
    conversations: Vec<Conversation>,
    messages: Vec<ConversationMessage>,
    feedback: Vec<MessageFeedback>,
    jobs: Vec<JobListing>,
    resources: Vec<KnowledgeResource>,
    settings: Option<PlatformSettings>,
    audit_logs: Vec<AuditLog>,
}

/// `Store` over plain vectors. Metric tables can be told to fail.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing_metrics: Mutex<HashSet<MetricTable>>,
    offline: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    fn check_online(&self) -> Result<(), DatabaseError> {
        if *self.offline.lock().unwrap() {
            return Err(DatabaseError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }

    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock().unwrap() = offline;
    }

    pub fn fail_metric(&self, table: MetricTable) {
        self.failing_metrics.lock().unwrap().insert(table);
    }

    pub fn add_profile(&self, user_type: ProfileType) -> Profile {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let profile = Profile {
            id,
            email: Some(format!("{}@example.org", &id.simple().to_string()[..8])),
            full_name: Some("Test User".to_string()),
            user_type: user_type.as_str().to_string(),
            active_profile: Some(user_type.as_str().to_string()),
            created_at: now,
            updated_at: now,
        };
        self.tables().profiles.push(profile.clone());
        profile
    }

    pub fn add_job_seeker_profile(&self, user_id: Uuid) {
        self.tables().job_seekers.insert(user_id);
    }

    pub fn add_admin(&self, user_id: Uuid, can_manage_partners: bool) -> AdminProfile {
        let admin = AdminProfile {
            id: Uuid::new_v4(),
            user_id,
            full_name: Some("Admin".to_string()),
            admin_level: "super".to_string(),
            can_manage_users: true,
            can_manage_partners,
            can_manage_content: true,
            can_view_analytics: true,
            can_manage_system: true,
            created_at: Utc::now(),
        };
        self.tables().admins.push(admin.clone());
        admin
    }

    /// Admin who may only manage content
    pub fn add_content_admin(&self, user_id: Uuid) -> AdminProfile {
        let admin = AdminProfile {
            admin_level: "standard".to_string(),
            can_manage_users: false,
            can_manage_partners: false,
            can_view_analytics: false,
            can_manage_system: false,
            ..self.add_admin(user_id, false)
        };
        let mut tables = self.tables();
        tables.admins.retain(|a| a.user_id != user_id);
        tables.admins.push(admin.clone());
        admin
    }

    pub fn add_partner(&self, id: Uuid, status: VerificationStatus) -> PartnerProfile {
        let verified = status == VerificationStatus::Verified;
        let partner = PartnerProfile {
            id,
            organization_name: "Green Grid Co".to_string(),
            organization_type: Some("employer".to_string()),
            website: None,
            verification_status: status.as_str().to_string(),
            verification_notes: None,
            verified_at: verified.then(Utc::now),
            can_post_jobs: verified,
            created_at: Utc::now(),
        };
        self.tables().partners.push(partner.clone());
        partner
    }

    pub fn add_resource(&self, title: &str, file_url: Option<&str>, is_published: bool) -> KnowledgeResource {
        let resource = KnowledgeResource {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            category: Some("training".to_string()),
            resource_type: Some("pdf".to_string()),
            file_url: file_url.map(str::to_string),
            is_published,
            download_count: 0,
            created_at: Utc::now(),
        };
        self.tables().resources.push(resource.clone());
        resource
    }

    /// Backdate a profile so analytics sees it on an earlier day
    pub fn set_profile_created_at(&self, id: Uuid, created_at: DateTime<Utc>) {
        if let Some(p) = self.tables().profiles.iter_mut().find(|p| p.id == id) {
            p.created_at = created_at;
        }
    }

    pub fn conversation(&self, id: Uuid) -> Option<Conversation> {
        self.tables().conversations.iter().find(|c| c.id == id).cloned()
    }

    pub fn messages_in(&self, conversation_id: Uuid) -> Vec<ConversationMessage> {
        self.tables()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect()
    }

    pub fn audit_actions(&self) -> Vec<String> {
        self.tables().audit_logs.iter().map(|l| l.action.clone()).collect()
    }

    fn created_dates(&self, table: MetricTable) -> Vec<DateTime<Utc>> {
        let t = self.tables();
        match table {
            MetricTable::Users => t.profiles.iter().map(|r| r.created_at).collect(),
            MetricTable::Partners => t.partners.iter().map(|r| r.created_at).collect(),
            MetricTable::Jobs => t.jobs.iter().map(|r| r.created_at).collect(),
            MetricTable::Conversations => t.conversations.iter().map(|r| r.created_at).collect(),
            MetricTable::Messages => t.messages.iter().map(|r| r.created_at).collect(),
        }
    }

    fn check_metric(&self, table: MetricTable) -> Result<(), DatabaseError> {
        if self.failing_metrics.lock().unwrap().contains(&table) {
            return Err(DatabaseError::Unavailable(format!("{} unavailable", table.table_name())));
        }
        Ok(())
    }

    fn audit_matches(log: &AuditLog, q: &AuditLogQuery) -> bool {
        q.table_name.as_ref().map_or(true, |t| &log.table_name == t)
            && q.action.as_ref().map_or(true, |a| &log.action == a)
            && q.user_id.map_or(true, |u| log.user_id == Some(u))
            && q.since.map_or(true, |s| log.created_at >= s)
            && q.until.map_or(true, |u| log.created_at <= u)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        self.check_online()
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        self.check_online()?;
        Ok(self.tables().profiles.iter().find(|p| p.id == user_id).cloned())
    }

    async fn has_profile_of_type(&self, user_id: Uuid, profile: ProfileType) -> Result<bool, DatabaseError> {
        let t = self.tables();
        Ok(match profile {
            ProfileType::JobSeeker => t.job_seekers.contains(&user_id),
            ProfileType::Partner => t.partners.iter().any(|p| p.id == user_id),
            ProfileType::Admin => t.admins.iter().any(|a| a.user_id == user_id),
        })
    }

    async fn set_active_profile(&self, user_id: Uuid, profile: ProfileType) -> Result<Profile, DatabaseError> {
        let mut t = self.tables();
        let row = t
            .profiles
            .iter_mut()
            .find(|p| p.id == user_id)
            .ok_or_else(|| DatabaseError::NotFound("Profile not found".to_string()))?;
        row.active_profile = Some(profile.as_str().to_string());
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn get_admin_profile(&self, user_id: Uuid) -> Result<Option<AdminProfile>, DatabaseError> {
        Ok(self.tables().admins.iter().find(|a| a.user_id == user_id).cloned())
    }

    async fn list_conversations(
        &self,
        user_id: Uuid,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Conversation>, DatabaseError> {
        let mut rows: Vec<Conversation> = self
            .tables()
            .conversations
            .iter()
            .filter(|c| c.user_id == user_id && status.map_or(true, |s| c.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(rows.into_iter().skip(offset as usize).take(limit as usize).collect())
    }

    async fn get_conversation(&self, id: Uuid, user_id: Uuid) -> Result<Option<Conversation>, DatabaseError> {
        Ok(self
            .tables()
            .conversations
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .cloned())
    }

    async fn create_conversation(&self, user_id: Uuid, title: Option<String>) -> Result<Conversation, DatabaseError> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            user_id,
            title,
            status: "active".to_string(),
            message_count: 0,
            created_at: now,
            updated_at: now,
            last_activity: now,
        };
        self.tables().conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn update_conversation(
        &self,
        id: Uuid,
        user_id: Uuid,
        update: ConversationUpdate,
    ) -> Result<Option<Conversation>, DatabaseError> {
        let mut t = self.tables();
        let Some(row) = t.conversations.iter_mut().find(|c| c.id == id && c.user_id == user_id) else {
            return Ok(None);
        };
        if let Some(title) = update.title {
            row.title = Some(title);
        }
        if let Some(status) = update.status {
            row.status = status;
        }
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete_conversation(&self, id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
        let mut t = self.tables();
        let before = t.conversations.len();
        t.conversations.retain(|c| !(c.id == id && c.user_id == user_id));
        let deleted = t.conversations.len() < before;
        if deleted {
            t.messages.retain(|m| m.conversation_id != id);
        }
        Ok(deleted)
    }

    async fn list_messages(&self, conversation_id: Uuid, limit: i64) -> Result<Vec<ConversationMessage>, DatabaseError> {
        Ok(self
            .messages_in(conversation_id)
            .into_iter()
            .take(limit as usize)
            .collect())
    }

    async fn get_message(
        &self,
        conversation_id: Uuid,
        message_id: &str,
    ) -> Result<Option<ConversationMessage>, DatabaseError> {
        Ok(self
            .tables()
            .messages
            .iter()
            .find(|m| m.conversation_id == conversation_id && m.id == message_id)
            .cloned())
    }

    async fn append_message(&self, message: NewMessage) -> Result<AppendedMessage, DatabaseError> {
        let mut t = self.tables();
        let now = Utc::now();
        let conversation = t
            .conversations
            .iter_mut()
            .find(|c| c.id == message.conversation_id)
            .ok_or_else(|| DatabaseError::NotFound("Conversation not found".to_string()))?;
        conversation.message_count += 1;
        conversation.last_activity = now;
        let message_count = conversation.message_count;

        let row = ConversationMessage {
            id: message.id,
            conversation_id: message.conversation_id,
            role: message.role,
            content: message.content,
            metadata: message.metadata,
            created_at: now,
        };
        t.messages.push(row.clone());
        Ok(AppendedMessage {
            message: row,
            message_count,
        })
    }

    async fn insert_feedback(&self, feedback: MessageFeedback) -> Result<MessageFeedback, DatabaseError> {
        self.tables().feedback.push(feedback.clone());
        Ok(feedback)
    }

    async fn list_feedback(&self, conversation_id: Uuid) -> Result<Vec<MessageFeedback>, DatabaseError> {
        Ok(self
            .tables()
            .feedback
            .iter()
            .filter(|f| f.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn list_jobs(&self, q: &JobQuery) -> Result<Vec<JobListing>, DatabaseError> {
        Ok(self
            .tables()
            .jobs
            .iter()
            .filter(|j| j.is_active)
            .filter(|j| q.climate_sector.is_none() || j.climate_sector == q.climate_sector)
            .skip(q.offset as usize)
            .take(q.limit as usize)
            .cloned()
            .collect())
    }

    async fn create_job(&self, job: NewJobListing) -> Result<JobListing, DatabaseError> {
        let row = JobListing {
            id: Uuid::new_v4(),
            partner_id: job.partner_id,
            title: job.title,
            description: job.description,
            location: job.location,
            climate_sector: job.climate_sector,
            employment_type: job.employment_type,
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            is_active: true,
            created_at: Utc::now(),
        };
        self.tables().jobs.push(row.clone());
        Ok(row)
    }

    async fn get_partner(&self, id: Uuid) -> Result<Option<PartnerProfile>, DatabaseError> {
        Ok(self.tables().partners.iter().find(|p| p.id == id).cloned())
    }

    async fn list_partners(&self, verification_status: Option<&str>) -> Result<Vec<PartnerProfile>, DatabaseError> {
        Ok(self
            .tables()
            .partners
            .iter()
            .filter(|p| verification_status.map_or(true, |s| p.verification_status == s))
            .cloned()
            .collect())
    }

    async fn set_partner_verification(
        &self,
        id: Uuid,
        status: VerificationStatus,
        notes: Option<String>,
    ) -> Result<Option<PartnerProfile>, DatabaseError> {
        let mut t = self.tables();
        let Some(row) = t.partners.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        let verified = status == VerificationStatus::Verified;
        row.verification_status = status.as_str().to_string();
        if notes.is_some() {
            row.verification_notes = notes;
        }
        row.verified_at = verified.then(Utc::now);
        row.can_post_jobs = verified;
        Ok(Some(row.clone()))
    }

    async fn list_resources(&self, q: &ResourceQuery) -> Result<Vec<KnowledgeResource>, DatabaseError> {
        Ok(self
            .tables()
            .resources
            .iter()
            .filter(|r| r.is_published)
            .filter(|r| q.category.is_none() || r.category == q.category)
            .filter(|r| q.resource_type.is_none() || r.resource_type == q.resource_type)
            .take(q.limit as usize)
            .cloned()
            .collect())
    }

    async fn get_resource(&self, id: Uuid) -> Result<Option<KnowledgeResource>, DatabaseError> {
        Ok(self.tables().resources.iter().find(|r| r.id == id).cloned())
    }

    async fn record_download(&self, id: Uuid) -> Result<Option<KnowledgeResource>, DatabaseError> {
        let mut t = self.tables();
        Ok(t.resources.iter_mut().find(|r| r.id == id).map(|r| {
            r.download_count += 1;
            r.clone()
        }))
    }

    async fn get_settings(&self) -> Result<Option<PlatformSettings>, DatabaseError> {
        Ok(self.tables().settings.clone())
    }

    async fn upsert_settings(&self, settings: &PlatformSettings) -> Result<PlatformSettings, DatabaseError> {
        let mut saved = settings.clone();
        saved.id = PlatformSettings::SINGLETON_ID;
        saved.updated_at = Utc::now();
        self.tables().settings = Some(saved.clone());
        Ok(saved)
    }

    async fn insert_audit_log(&self, entry: NewAuditLog) -> Result<AuditLog, DatabaseError> {
        let row = AuditLog {
            id: Uuid::new_v4(),
            user_id: entry.user_id,
            action: entry.action,
            table_name: entry.table_name,
            record_id: entry.record_id,
            old_values: entry.old_values,
            new_values: entry.new_values,
            ip_address: entry.ip_address,
            created_at: Utc::now(),
        };
        self.tables().audit_logs.push(row.clone());
        Ok(row)
    }

    async fn list_audit_logs(&self, q: &AuditLogQuery) -> Result<Vec<AuditLog>, DatabaseError> {
        let mut rows: Vec<AuditLog> = self
            .tables()
            .audit_logs
            .iter()
            .filter(|l| Self::audit_matches(l, q))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows.into_iter().skip(q.offset as usize).take(q.limit as usize).collect())
    }

    async fn count_audit_logs(&self, q: &AuditLogQuery) -> Result<i64, DatabaseError> {
        Ok(self.tables().audit_logs.iter().filter(|l| Self::audit_matches(l, q)).count() as i64)
    }

    async fn count_rows(&self, table: MetricTable) -> Result<i64, DatabaseError> {
        self.check_metric(table)?;
        Ok(self.created_dates(table).len() as i64)
    }

    async fn daily_counts(
        &self,
        table: MetricTable,
        since: DateTime<Utc>,
    ) -> Result<Vec<(NaiveDate, i64)>, DatabaseError> {
        self.check_metric(table)?;
        let mut per_day: HashMap<NaiveDate, i64> = HashMap::new();
        for created in self.created_dates(table).into_iter().filter(|c| *c >= since) {
            *per_day.entry(created.date_naive()).or_default() += 1;
        }
        let mut rows: Vec<(NaiveDate, i64)> = per_day.into_iter().collect();
        rows.sort();
        Ok(rows)
    }
}

/// Development config with a known JWT secret and an unreachable backend
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = TEST_SECRET.to_string();
    config.backend.url = "http://127.0.0.1:9".to_string();
    config.backend.request_timeout_secs = 5;
    config
}

pub fn test_router(store: Arc<MemoryStore>, config: AppConfig) -> Router {
    let state = AppState::new(store, Arc::new(config)).unwrap();
    router(state)
}

pub fn token_for(user_id: Uuid) -> String {
    let claims = Claims::new(user_id, None, "authenticated", Duration::hours(1));
    issue_token(&claims, TEST_SECRET).unwrap()
}

/// Send one request through the router and decode the JSON body (Null when empty)
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = send_raw(app, method, uri, token, body).await;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}
