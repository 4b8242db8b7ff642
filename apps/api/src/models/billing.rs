use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user's subscription row. Limits are denormalized from the plan catalog
/// at assignment time; entitlement checks compare against the stored values,
/// never the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: String,
    pub max_jobs: i32,
    pub max_applications_per_job: i32,
    pub max_ai_analyses: i32,
    pub ai_used: i32,
    pub ai_reset_at: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub promo_code_id: Option<Uuid>,
    pub discount_percent: Option<i32>,
    pub discount_cents: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "promo_kind", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PromoKind {
    Percent,
    Fixed,
    FreeMonths,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PromoCode {
    pub id: Uuid,
    pub code: String,
    pub kind: PromoKind,
    /// Percent off, cents off, or number of free months, depending on `kind`.
    pub value: i32,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
