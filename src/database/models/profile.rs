use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::types::ProfileType;

/// Row in `profiles`, keyed by the auth user id
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub user_type: String,
    pub active_profile: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// The profile the user currently acts under. Falls back to the account type,
    /// then to job seeker for rows with unknown values.
    pub fn current_profile(&self) -> ProfileType {
        self.active_profile
            .as_deref()
            .and_then(|p| p.parse().ok())
            .or_else(|| self.user_type.parse().ok())
            .unwrap_or(ProfileType::JobSeeker)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AdminProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub admin_level: String,
    pub can_manage_users: bool,
    pub can_manage_partners: bool,
    pub can_manage_content: bool,
    pub can_view_analytics: bool,
    pub can_manage_system: bool,
    pub created_at: DateTime<Utc>,
}

impl AdminProfile {
    pub fn permissions(&self) -> Vec<&'static str> {
        [
            (self.can_manage_users, "manage_users"),
            (self.can_manage_partners, "manage_partners"),
            (self.can_manage_content, "manage_content"),
            (self.can_view_analytics, "view_analytics"),
            (self.can_manage_system, "manage_system"),
        ]
        .into_iter()
        .filter_map(|(granted, name)| granted.then_some(name))
        .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PartnerProfile {
    pub id: Uuid,
    pub organization_name: String,
    pub organization_type: Option<String>,
    pub website: Option<String>,
    pub verification_status: String,
    pub verification_notes: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub can_post_jobs: bool,
    pub created_at: DateTime<Utc>,
}

impl PartnerProfile {
    pub fn is_verified(&self) -> bool {
        self.verification_status == "verified"
    }
}
