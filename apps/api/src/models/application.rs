use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Analyzing,
    Analyzed,
    Shortlisted,
    Rejected,
    Contacted,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub job_offer_id: Uuid,
    pub candidate_id: Option<Uuid>,
    pub guest_name: Option<String>,
    pub guest_email: Option<String>,
    pub cover_letter: Option<String>,
    pub cv_s3_key: Option<String>,
    /// Text extracted from the uploaded CV PDF, kept for AI analysis.
    pub cv_text: Option<String>,
    pub status: ApplicationStatus,
    pub ai_score: Option<f64>,
    pub ai_summary: Option<String>,
    pub ai_strengths: Option<Vec<String>>,
    pub ai_concerns: Option<Vec<String>>,
    pub analyzed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
