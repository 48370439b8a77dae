/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account profile kinds a user can hold and switch between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    JobSeeker,
    Partner,
    Admin,
}

impl ProfileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileType::JobSeeker => "job_seeker",
            ProfileType::Partner => "partner",
            ProfileType::Admin => "admin",
        }
    }

    /// Capabilities granted while acting under this profile
    pub fn permissions(&self) -> Vec<&'static str> {
        let mut permissions = vec!["read_jobs", "chat", "read_resources", "manage_own_profile"];
        match self {
            ProfileType::JobSeeker => permissions.push("apply_jobs"),
            ProfileType::Partner => permissions.extend(["post_jobs", "view_candidates"]),
            ProfileType::Admin => permissions.extend([
                "post_jobs",
                "view_candidates",
                "manage_users",
                "manage_partners",
                "view_analytics",
                "manage_settings",
                "view_audit_logs",
            ]),
        }
        permissions
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "job_seeker" => Ok(ProfileType::JobSeeker),
            "partner" => Ok(ProfileType::Partner),
            "admin" => Ok(ProfileType::Admin),
            other => Err(format!("Unknown profile type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationStatus {
    Active,
    Archived,
    Completed,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::Archived => "archived",
            ConversationStatus::Completed => "completed",
        }
    }
}

impl FromStr for ConversationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ConversationStatus::Active),
            "archived" => Ok(ConversationStatus::Archived),
            "completed" => Ok(ConversationStatus::Completed),
            other => Err(format!("Status must be one of active, archived, completed (got '{}')", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            "system" => Ok(MessageRole::System),
            other => Err(format!("Role must be one of user, assistant, system (got '{}')", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackType {
    Helpful,
    NotHelpful,
    Correction,
    Flag,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::Helpful => "helpful",
            FeedbackType::NotHelpful => "not_helpful",
            FeedbackType::Correction => "correction",
            FeedbackType::Flag => "flag",
        }
    }
}

impl FromStr for FeedbackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "helpful" => Ok(FeedbackType::Helpful),
            "not_helpful" => Ok(FeedbackType::NotHelpful),
            "correction" => Ok(FeedbackType::Correction),
            "flag" => Ok(FeedbackType::Flag),
            other => Err(format!(
                "Feedback type must be one of helpful, not_helpful, correction, flag (got '{}')",
                other
            )),
        }
    }
}

/// Partner organization verification state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(VerificationStatus::Pending),
            "verified" => Ok(VerificationStatus::Verified),
            "rejected" => Ok(VerificationStatus::Rejected),
            other => Err(format!(
                "Verification status must be one of pending, verified, rejected (got '{}')",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_permissions_include_partner_permissions() {
        let admin = ProfileType::Admin.permissions();
        for p in ProfileType::Partner.permissions() {
            assert!(admin.contains(&p), "admin missing {}", p);
        }
        assert!(admin.contains(&"view_audit_logs"));
        assert!(!ProfileType::JobSeeker.permissions().contains(&"post_jobs"));
    }

    #[test]
    fn profile_type_round_trips_through_str() {
        for p in [ProfileType::JobSeeker, ProfileType::Partner, ProfileType::Admin] {
            assert_eq!(p.as_str().parse::<ProfileType>().unwrap(), p);
        }
        assert!("superuser".parse::<ProfileType>().is_err());
    }
}
