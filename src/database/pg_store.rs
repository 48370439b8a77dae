use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{
    AdminProfile, AppendedMessage, AuditLog, AuditLogQuery, Conversation, ConversationMessage,
    ConversationUpdate, JobListing, JobQuery, KnowledgeResource, MessageFeedback, NewAuditLog,
    NewJobListing, NewMessage, PartnerProfile, PlatformSettings, Profile, ResourceQuery,
};
use super::query;
use super::store::{MetricTable, Store};
use crate::filter::Filter;
use crate::types::{ProfileType, VerificationStatus};

/// Postgres-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn audit_filter(q: &AuditLogQuery) -> Filter {
        Filter::new("audit_logs")
            .eq_opt("table_name", q.table_name.as_ref())
            .eq_opt("action", q.action.as_ref())
            .eq_opt("user_id", q.user_id)
            .gte_opt("created_at", q.since)
            .lte_opt("created_at", q.until)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, DatabaseError> {
        query::select_optional(&self.pool, &Filter::new("profiles").eq("id", user_id)).await
    }

    async fn has_profile_of_type(&self, user_id: Uuid, profile: ProfileType) -> Result<bool, DatabaseError> {
        let filter = match profile {
            ProfileType::JobSeeker => Filter::new("job_seeker_profiles").eq("user_id", user_id),
            ProfileType::Partner => Filter::new("partner_profiles").eq("id", user_id),
            ProfileType::Admin => Filter::new("admin_profiles").eq("user_id", user_id),
        };
        Ok(query::count(&self.pool, &filter).await? > 0)
    }

    async fn set_active_profile(&self, user_id: Uuid, profile: ProfileType) -> Result<Profile, DatabaseError> {
        sqlx::query_as::<_, Profile>(
            "UPDATE profiles SET active_profile = $2, updated_at = now() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(profile.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Profile not found".to_string()))
    }

    async fn get_admin_profile(&self, user_id: Uuid) -> Result<Option<AdminProfile>, DatabaseError> {
        query::select_optional(&self.pool, &Filter::new("admin_profiles").eq("user_id", user_id)).await
    }

    async fn list_conversations(
        &self,
        user_id: Uuid,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Conversation>, DatabaseError> {
        let filter = Filter::new("conversations")
            .eq("user_id", user_id)
            .eq_opt("status", status)
            .order("last_activity desc")
            .limit(limit, Some(offset));
        query::select_all(&self.pool, &filter).await
    }

    async fn get_conversation(&self, id: Uuid, user_id: Uuid) -> Result<Option<Conversation>, DatabaseError> {
        let filter = Filter::new("conversations").eq("id", id).eq("user_id", user_id);
        query::select_optional(&self.pool, &filter).await
    }

    async fn create_conversation(&self, user_id: Uuid, title: Option<String>) -> Result<Conversation, DatabaseError> {
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (id, user_id, title, status, message_count, created_at, updated_at, last_activity)
            VALUES ($1, $2, $3, 'active', 0, now(), now(), now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await?;
        Ok(conversation)
    }

    async fn update_conversation(
        &self,
        id: Uuid,
        user_id: Uuid,
        update: ConversationUpdate,
    ) -> Result<Option<Conversation>, DatabaseError> {
        let conversation = sqlx::query_as::<_, Conversation>(
            r#"
            UPDATE conversations
            SET title = COALESCE($3, title),
                status = COALESCE($4, status),
                updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(update.title)
        .bind(update.status)
        .fetch_optional(&self.pool)
        .await?;
        Ok(conversation)
    }

    async fn delete_conversation(&self, id: Uuid, user_id: Uuid) -> Result<bool, DatabaseError> {
        let filter = Filter::new("conversations").eq("id", id).eq("user_id", user_id);
        Ok(query::delete(&self.pool, &filter).await? > 0)
    }

    async fn list_messages(&self, conversation_id: Uuid, limit: i64) -> Result<Vec<ConversationMessage>, DatabaseError> {
        let filter = Filter::new("conversation_messages")
            .eq("conversation_id", conversation_id)
            .order("created_at asc")
            .limit(limit, None);
        query::select_all(&self.pool, &filter).await
    }

    async fn get_message(
        &self,
        conversation_id: Uuid,
        message_id: &str,
    ) -> Result<Option<ConversationMessage>, DatabaseError> {
        let filter = Filter::new("conversation_messages")
            .eq("conversation_id", conversation_id)
            .eq("id", message_id);
        query::select_optional(&self.pool, &filter).await
    }

    async fn append_message(&self, message: NewMessage) -> Result<AppendedMessage, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, ConversationMessage>(
            r#"
            INSERT INTO conversation_messages (id, conversation_id, role, content, metadata, created_at)
            VALUES ($1, $2, $3, $4, $5, now())
            RETURNING *
            "#,
        )
        .bind(&message.id)
        .bind(message.conversation_id)
        .bind(&message.role)
        .bind(&message.content)
        .bind(&message.metadata)
        .fetch_one(&mut *tx)
        .await?;

        // Increment in SQL so concurrent appends cannot lose updates
        let message_count: i32 = sqlx::query_scalar(
            r#"
            UPDATE conversations
            SET message_count = message_count + 1, last_activity = now(), updated_at = now()
            WHERE id = $1
            RETURNING message_count
            "#,
        )
        .bind(message.conversation_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Conversation not found".to_string()))?;

        tx.commit().await?;

        Ok(AppendedMessage {
            message: inserted,
            message_count,
        })
    }

    async fn insert_feedback(&self, feedback: MessageFeedback) -> Result<MessageFeedback, DatabaseError> {
        let row = sqlx::query_as::<_, MessageFeedback>(
            r#"
            INSERT INTO message_feedback
                (id, conversation_id, message_id, user_id, feedback_type, rating, correction, comment, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(&feedback.id)
        .bind(feedback.conversation_id)
        .bind(&feedback.message_id)
        .bind(feedback.user_id)
        .bind(&feedback.feedback_type)
        .bind(feedback.rating)
        .bind(&feedback.correction)
        .bind(&feedback.comment)
        .bind(feedback.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_feedback(&self, conversation_id: Uuid) -> Result<Vec<MessageFeedback>, DatabaseError> {
        let filter = Filter::new("message_feedback")
            .eq("conversation_id", conversation_id)
            .order("created_at asc");
        query::select_all(&self.pool, &filter).await
    }

    async fn list_jobs(&self, q: &JobQuery) -> Result<Vec<JobListing>, DatabaseError> {
        let filter = Filter::new("job_listings")
            .eq("is_active", true)
            .eq_opt("climate_sector", q.climate_sector.as_ref())
            .ilike_opt("location", q.location.as_ref().map(|l| format!("%{}%", l)))
            .order("created_at desc")
            .limit(q.limit, Some(q.offset));
        query::select_all(&self.pool, &filter).await
    }

    async fn create_job(&self, job: NewJobListing) -> Result<JobListing, DatabaseError> {
        let row = sqlx::query_as::<_, JobListing>(
            r#"
            INSERT INTO job_listings
                (id, partner_id, title, description, location, climate_sector, employment_type,
                 salary_min, salary_max, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, true, now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(job.partner_id)
        .bind(&job.title)
        .bind(&job.description)
        .bind(&job.location)
        .bind(&job.climate_sector)
        .bind(&job.employment_type)
        .bind(job.salary_min)
        .bind(job.salary_max)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_partner(&self, id: Uuid) -> Result<Option<PartnerProfile>, DatabaseError> {
        query::select_optional(&self.pool, &Filter::new("partner_profiles").eq("id", id)).await
    }

    async fn list_partners(&self, verification_status: Option<&str>) -> Result<Vec<PartnerProfile>, DatabaseError> {
        let filter = Filter::new("partner_profiles")
            .eq_opt("verification_status", verification_status)
            .order("created_at desc");
        query::select_all(&self.pool, &filter).await
    }

    async fn set_partner_verification(
        &self,
        id: Uuid,
        status: VerificationStatus,
        notes: Option<String>,
    ) -> Result<Option<PartnerProfile>, DatabaseError> {
        let verified = status == VerificationStatus::Verified;
        let row = sqlx::query_as::<_, PartnerProfile>(
            r#"
            UPDATE partner_profiles
            SET verification_status = $2,
                verification_notes = COALESCE($3, verification_notes),
                verified_at = CASE WHEN $4 THEN now() ELSE NULL END,
                can_post_jobs = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(notes)
        .bind(verified)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_resources(&self, q: &ResourceQuery) -> Result<Vec<KnowledgeResource>, DatabaseError> {
        let filter = Filter::new("knowledge_resources")
            .eq("is_published", true)
            .eq_opt("category", q.category.as_ref())
            .eq_opt("resource_type", q.resource_type.as_ref())
            .order("created_at desc")
            .limit(q.limit, None);
        query::select_all(&self.pool, &filter).await
    }

    async fn get_resource(&self, id: Uuid) -> Result<Option<KnowledgeResource>, DatabaseError> {
        query::select_optional(&self.pool, &Filter::new("knowledge_resources").eq("id", id)).await
    }

    async fn record_download(&self, id: Uuid) -> Result<Option<KnowledgeResource>, DatabaseError> {
        let row = sqlx::query_as::<_, KnowledgeResource>(
            "UPDATE knowledge_resources SET download_count = download_count + 1 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_settings(&self) -> Result<Option<PlatformSettings>, DatabaseError> {
        let filter = Filter::new("platform_settings").eq("id", PlatformSettings::SINGLETON_ID);
        query::select_optional(&self.pool, &filter).await
    }

    async fn upsert_settings(&self, s: &PlatformSettings) -> Result<PlatformSettings, DatabaseError> {
        let row = sqlx::query_as::<_, PlatformSettings>(
            r#"
            INSERT INTO platform_settings
                (id, site_name, support_email, max_upload_size_mb, session_timeout_minutes,
                 max_conversations_per_user, hitl_match_threshold, maintenance_mode, maintenance_message,
                 maintenance_started_at, maintenance_ended_at, updated_at, updated_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, now(), $12)
            ON CONFLICT (id) DO UPDATE SET
                site_name = EXCLUDED.site_name,
                support_email = EXCLUDED.support_email,
                max_upload_size_mb = EXCLUDED.max_upload_size_mb,
                session_timeout_minutes = EXCLUDED.session_timeout_minutes,
                max_conversations_per_user = EXCLUDED.max_conversations_per_user,
                hitl_match_threshold = EXCLUDED.hitl_match_threshold,
                maintenance_mode = EXCLUDED.maintenance_mode,
                maintenance_message = EXCLUDED.maintenance_message,
                maintenance_started_at = EXCLUDED.maintenance_started_at,
                maintenance_ended_at = EXCLUDED.maintenance_ended_at,
                updated_at = EXCLUDED.updated_at,
                updated_by = EXCLUDED.updated_by
            RETURNING *
            "#,
        )
        .bind(PlatformSettings::SINGLETON_ID)
        .bind(&s.site_name)
        .bind(&s.support_email)
        .bind(s.max_upload_size_mb)
        .bind(s.session_timeout_minutes)
        .bind(s.max_conversations_per_user)
        .bind(s.hitl_match_threshold)
        .bind(s.maintenance_mode)
        .bind(&s.maintenance_message)
        .bind(s.maintenance_started_at)
        .bind(s.maintenance_ended_at)
        .bind(s.updated_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_audit_log(&self, entry: NewAuditLog) -> Result<AuditLog, DatabaseError> {
        let row = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs
                (id, user_id, action, table_name, record_id, old_values, new_values, ip_address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(&entry.action)
        .bind(&entry.table_name)
        .bind(&entry.record_id)
        .bind(&entry.old_values)
        .bind(&entry.new_values)
        .bind(&entry.ip_address)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_audit_logs(&self, q: &AuditLogQuery) -> Result<Vec<AuditLog>, DatabaseError> {
        let filter = Self::audit_filter(q)
            .order("created_at desc")
            .limit(q.limit, Some(q.offset));
        query::select_all(&self.pool, &filter).await
    }

    async fn count_audit_logs(&self, q: &AuditLogQuery) -> Result<i64, DatabaseError> {
        query::count(&self.pool, &Self::audit_filter(q)).await
    }

    async fn count_rows(&self, table: MetricTable) -> Result<i64, DatabaseError> {
        query::count(&self.pool, &Filter::new(table.table_name())).await
    }

    async fn daily_counts(
        &self,
        table: MetricTable,
        since: DateTime<Utc>,
    ) -> Result<Vec<(NaiveDate, i64)>, DatabaseError> {
        // table_name() is a closed set of literals, never user input
        let sql = format!(
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS count
            FROM "{}"
            WHERE created_at >= $1
            GROUP BY day
            ORDER BY day
            "#,
            table.table_name()
        );
        let rows = sqlx::query_as::<_, (NaiveDate, i64)>(&sql)
            .bind(since)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
