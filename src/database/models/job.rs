use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobListing {
    pub id: Uuid,
    pub partner_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub climate_sector: Option<String>,
    pub employment_type: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewJobListing {
    pub partner_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub climate_sector: Option<String>,
    pub employment_type: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct JobQuery {
    pub location: Option<String>,
    pub climate_sector: Option<String>,
    pub limit: i64,
    pub offset: i64,
}
