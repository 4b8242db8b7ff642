//! Promo code validation and redemption.
//!
//! Redemption increments `current_uses` with a guarded atomic update that
//! re-checks active/expiry/use-count in the WHERE clause, so concurrent
//! redemptions can never push `current_uses` past `max_uses`.

use chrono::{DateTime, Months, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::billing::{PromoCode, PromoKind, Subscription};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromoRejection {
    #[error("This promo code is no longer active")]
    Inactive,

    #[error("This promo code has expired")]
    Expired,

    #[error("This promo code has reached its redemption limit")]
    Exhausted,
}

/// Checks a promo code's redeemability at `now`. Pure; the database-level
/// guard re-checks the same conditions at increment time.
pub fn validate_promo(promo: &PromoCode, now: DateTime<Utc>) -> Result<(), PromoRejection> {
    if !promo.active {
        return Err(PromoRejection::Inactive);
    }
    if let Some(expires_at) = promo.expires_at {
        if now >= expires_at {
            return Err(PromoRejection::Expired);
        }
    }
    if let Some(max_uses) = promo.max_uses {
        if promo.current_uses >= max_uses {
            return Err(PromoRejection::Exhausted);
        }
    }
    Ok(())
}

/// The subscription-side effect of a redeemed code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromoEffect {
    DiscountPercent(i32),
    DiscountCents(i32),
    FreeMonths(u32),
}

pub fn effect_of(promo: &PromoCode) -> PromoEffect {
    match promo.kind {
        PromoKind::Percent => PromoEffect::DiscountPercent(promo.value.clamp(0, 100)),
        PromoKind::Fixed => PromoEffect::DiscountCents(promo.value.max(0)),
        PromoKind::FreeMonths => PromoEffect::FreeMonths(promo.value.max(0) as u32),
    }
}

/// Redeems a code onto a user's subscription.
pub async fn redeem_promo(
    pool: &PgPool,
    user_id: Uuid,
    code: &str,
) -> Result<Subscription, AppError> {
    let promo = sqlx::query_as::<_, PromoCode>("SELECT * FROM promo_codes WHERE code = $1")
        .bind(code.trim())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Unknown promo code".to_string()))?;

    validate_promo(&promo, Utc::now()).map_err(|e| AppError::Conflict(e.to_string()))?;

    let sub = sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("No subscription for this account".to_string()))?;

    if sub.promo_code_id.is_some() {
        return Err(AppError::Conflict(
            "A promo code is already applied to this subscription".to_string(),
        ));
    }

    // Guarded increment: the WHERE clause re-checks everything validated
    // above, so a concurrent redemption cannot exceed max_uses.
    let claimed = sqlx::query(
        r#"
        UPDATE promo_codes
        SET current_uses = current_uses + 1
        WHERE id = $1
          AND active
          AND (expires_at IS NULL OR expires_at > now())
          AND (max_uses IS NULL OR current_uses < max_uses)
        "#,
    )
    .bind(promo.id)
    .execute(pool)
    .await?;
    if claimed.rows_affected() != 1 {
        return Err(AppError::Conflict(
            "This promo code is no longer available".to_string(),
        ));
    }

    let sub = match effect_of(&promo) {
        PromoEffect::DiscountPercent(percent) => {
            sqlx::query_as::<_, Subscription>(
                "UPDATE subscriptions SET promo_code_id = $2, discount_percent = $3, \
                 updated_at = now() WHERE user_id = $1 RETURNING *",
            )
            .bind(user_id)
            .bind(promo.id)
            .bind(percent)
            .fetch_one(pool)
            .await?
        }
        PromoEffect::DiscountCents(cents) => {
            sqlx::query_as::<_, Subscription>(
                "UPDATE subscriptions SET promo_code_id = $2, discount_cents = $3, \
                 updated_at = now() WHERE user_id = $1 RETURNING *",
            )
            .bind(user_id)
            .bind(promo.id)
            .bind(cents)
            .fetch_one(pool)
            .await?
        }
        PromoEffect::FreeMonths(months) => {
            let extended = sub
                .period_end
                .checked_add_months(Months::new(months))
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("period end overflow")))?;
            sqlx::query_as::<_, Subscription>(
                "UPDATE subscriptions SET promo_code_id = $2, period_end = $3, \
                 updated_at = now() WHERE user_id = $1 RETURNING *",
            )
            .bind(user_id)
            .bind(promo.id)
            .bind(extended)
            .fetch_one(pool)
            .await?
        }
    };

    info!("User {user_id} redeemed promo code '{}'", promo.code);
    Ok(sub)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn promo(kind: PromoKind, value: i32) -> PromoCode {
        PromoCode {
            id: Uuid::new_v4(),
            code: "WELCOME10".to_string(),
            kind,
            value,
            max_uses: Some(100),
            current_uses: 0,
            active: true,
            expires_at: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn valid_code_passes() {
        let p = promo(PromoKind::Percent, 10);
        assert!(validate_promo(&p, Utc::now()).is_ok());
    }

    #[test]
    fn inactive_code_is_rejected() {
        let mut p = promo(PromoKind::Percent, 10);
        p.active = false;
        assert_eq!(validate_promo(&p, Utc::now()), Err(PromoRejection::Inactive));
    }

    #[test]
    fn expired_code_is_rejected() {
        let mut p = promo(PromoKind::Percent, 10);
        p.expires_at = Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap());
        let after = Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap();
        assert_eq!(validate_promo(&p, after), Err(PromoRejection::Expired));
    }

    #[test]
    fn expiry_boundary_is_rejected() {
        let mut p = promo(PromoKind::Percent, 10);
        let deadline = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        p.expires_at = Some(deadline);
        assert_eq!(validate_promo(&p, deadline), Err(PromoRejection::Expired));
    }

    #[test]
    fn exhausted_code_is_rejected() {
        let mut p = promo(PromoKind::Fixed, 500);
        p.max_uses = Some(3);
        p.current_uses = 3;
        assert_eq!(validate_promo(&p, Utc::now()), Err(PromoRejection::Exhausted));
    }

    #[test]
    fn unlimited_uses_never_exhaust() {
        let mut p = promo(PromoKind::Fixed, 500);
        p.max_uses = None;
        p.current_uses = 1_000_000;
        assert!(validate_promo(&p, Utc::now()).is_ok());
    }

    #[test]
    fn percent_effect_is_clamped() {
        let p = promo(PromoKind::Percent, 150);
        assert_eq!(effect_of(&p), PromoEffect::DiscountPercent(100));
    }

    #[test]
    fn fixed_effect_floors_at_zero() {
        let p = promo(PromoKind::Fixed, -50);
        assert_eq!(effect_of(&p), PromoEffect::DiscountCents(0));
    }

    #[test]
    fn free_months_effect() {
        let p = promo(PromoKind::FreeMonths, 2);
        assert_eq!(effect_of(&p), PromoEffect::FreeMonths(2));
    }
}
