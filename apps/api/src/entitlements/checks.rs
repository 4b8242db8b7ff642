//! Entitlement checks.
//!
//! Each check fetches the caller's subscription row, applies the lazy
//! monthly reset where relevant, and compares usage against the limits
//! stored on the row. The stored AI counter is consumed with a guarded
//! atomic update so concurrent requests cannot push it past the limit.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::billing::Subscription;

/// Outcome of an entitlement check, surfaced verbatim to API callers.
#[derive(Debug, Clone, Serialize)]
pub struct EntitlementDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl EntitlementDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }

    /// Converts a denial into the API error surfaced to the caller.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.allowed {
            Ok(())
        } else {
            Err(AppError::PlanLimit(
                self.reason.unwrap_or_else(|| "Plan limit reached".to_string()),
            ))
        }
    }
}

/// Pure comparison at the heart of every check: usage vs stored limit.
pub fn evaluate_quota(used: i64, limit: i64, what: &str) -> EntitlementDecision {
    if used < limit {
        EntitlementDecision::allow()
    } else {
        EntitlementDecision::deny(format!(
            "You have reached your plan's limit of {limit} {what}. Upgrade to continue."
        ))
    }
}

/// True when `now` falls in a different calendar month (or year) than the
/// last reset, meaning the period counter must be zeroed before evaluation.
pub fn is_new_period(last_reset: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    last_reset.year() != now.year() || last_reset.month() != now.month()
}

/// Fetches a user's subscription, or 404 for accounts without one.
pub async fn get_subscription(pool: &PgPool, user_id: Uuid) -> Result<Subscription, AppError> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("No subscription for this account".to_string()))
}

/// Job quota: count of the company's DRAFT/PUBLISHED offers vs `max_jobs`.
pub async fn check_job_quota(
    pool: &PgPool,
    company_id: Uuid,
) -> Result<EntitlementDecision, AppError> {
    let sub = get_subscription(pool, company_id).await?;
    let used: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM job_offers WHERE company_id = $1 AND status IN ('draft', 'published')",
    )
    .bind(company_id)
    .fetch_one(pool)
    .await?;

    Ok(evaluate_quota(used, sub.max_jobs as i64, "job offers"))
}

/// Application quota: count of a job's applications vs the owning company's
/// `max_applications_per_job`.
pub async fn check_application_quota(
    pool: &PgPool,
    job_offer_id: Uuid,
    company_id: Uuid,
) -> Result<EntitlementDecision, AppError> {
    let sub = get_subscription(pool, company_id).await?;
    let used: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE job_offer_id = $1")
        .bind(job_offer_id)
        .fetch_one(pool)
        .await?;

    Ok(evaluate_quota(
        used,
        sub.max_applications_per_job as i64,
        "applications for this offer",
    ))
}

/// Consumes one AI-analysis unit for the period.
///
/// Applies the lazy monthly reset first, then increments with a guarded
/// atomic update: the WHERE clause re-checks the limit, so two concurrent
/// consumers at `used == limit - 1` cannot both pass.
pub async fn consume_ai_analysis(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<EntitlementDecision, AppError> {
    let sub = get_subscription(pool, user_id).await?;

    let now = Utc::now();
    if is_new_period(sub.ai_reset_at, now) {
        // Compare-and-set on ai_reset_at: only one concurrent resetter wins,
        // so the counter is zeroed exactly once per period.
        let reset = sqlx::query(
            "UPDATE subscriptions SET ai_used = 0, ai_reset_at = $2, updated_at = now() \
             WHERE user_id = $1 AND ai_reset_at = $3",
        )
        .bind(user_id)
        .bind(now)
        .bind(sub.ai_reset_at)
        .execute(pool)
        .await?;
        if reset.rows_affected() == 1 {
            info!("Reset AI usage counter for user {user_id}");
        }
    }

    let granted = sqlx::query(
        "UPDATE subscriptions SET ai_used = ai_used + 1, updated_at = now() \
         WHERE user_id = $1 AND ai_used < max_ai_analyses",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    if granted.rows_affected() == 1 {
        Ok(EntitlementDecision::allow())
    } else {
        Ok(evaluate_quota(
            sub.max_ai_analyses as i64,
            sub.max_ai_analyses as i64,
            "AI analyses this month",
        ))
    }
}

/// Returns a previously consumed AI unit (used when the external LLM call
/// fails after the quota was granted).
pub async fn release_ai_analysis(pool: &PgPool, user_id: Uuid) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE subscriptions SET ai_used = GREATEST(ai_used - 1, 0), updated_at = now() \
         WHERE user_id = $1",
    )
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn under_limit_is_allowed() {
        let decision = evaluate_quota(4, 5, "job offers");
        assert!(decision.allowed);
        assert!(decision.reason.is_none());
    }

    #[test]
    fn at_limit_is_denied_with_reason() {
        // A COMPANY_FREE subscription with max_jobs = 5 and 5 live jobs
        // must reject the 6th creation attempt.
        let decision = evaluate_quota(5, 5, "job offers");
        assert!(!decision.allowed);
        let reason = decision.reason.unwrap();
        assert!(reason.contains("limit of 5 job offers"), "reason: {reason}");
    }

    #[test]
    fn over_limit_is_denied() {
        assert!(!evaluate_quota(6, 5, "job offers").allowed);
    }

    #[test]
    fn zero_limit_denies_everything() {
        assert!(!evaluate_quota(0, 0, "AI analyses this month").allowed);
    }

    #[test]
    fn denial_maps_to_plan_limit_error() {
        let err = evaluate_quota(5, 5, "job offers").into_result().unwrap_err();
        assert!(matches!(err, AppError::PlanLimit(_)));
    }

    #[test]
    fn same_month_is_not_a_new_period() {
        let reset = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 28, 23, 59, 0).unwrap();
        assert!(!is_new_period(reset, now));
    }

    #[test]
    fn next_month_is_a_new_period() {
        let reset = Utc.with_ymd_and_hms(2025, 3, 28, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();
        assert!(is_new_period(reset, now));
    }

    #[test]
    fn year_rollover_is_a_new_period() {
        let reset = Utc.with_ymd_and_hms(2024, 12, 31, 23, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 1, 0, 0).unwrap();
        assert!(is_new_period(reset, now));
    }

    #[test]
    fn same_month_next_year_is_a_new_period() {
        let reset = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap();
        assert!(is_new_period(reset, now));
    }
}
