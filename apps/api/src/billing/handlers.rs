//! Axum route handlers for the billing surface: plan catalog, subscription
//! view, promo redemption, and checkout.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::auth::extract::AuthUser;
use crate::billing::checkout::{build_checkout_url, discounted_price_cents};
use crate::billing::promo::redeem_promo;
use crate::entitlements::checks::get_subscription;
use crate::entitlements::plans::{plan_by_id, Plan, PLAN_CATALOG};
use crate::errors::AppError;
use crate::models::billing::Subscription;
use crate::state::AppState;

/// GET /api/v1/billing/plans
pub async fn handle_list_plans() -> Json<&'static [Plan]> {
    Json(PLAN_CATALOG)
}

#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    pub subscription: Subscription,
    pub jobs_used: i64,
    pub ai_used: i32,
}

/// GET /api/v1/billing/subscription
///
/// The caller's subscription plus current usage against its stored limits.
pub async fn handle_get_subscription(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<SubscriptionView>, AppError> {
    auth.require_company()?;
    let user_id = auth.0.user_id()?;
    let subscription = get_subscription(&state.db, user_id).await?;

    let jobs_used: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM job_offers WHERE company_id = $1 AND status IN ('draft', 'published')",
    )
    .bind(user_id)
    .fetch_one(&state.db)
    .await?;

    let ai_used = subscription.ai_used;
    Ok(Json(SubscriptionView {
        subscription,
        jobs_used,
        ai_used,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub code: String,
}

/// POST /api/v1/billing/promo
pub async fn handle_redeem_promo(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RedeemRequest>,
) -> Result<Json<Subscription>, AppError> {
    auth.require_company()?;
    if req.code.trim().is_empty() {
        return Err(AppError::Validation("code cannot be empty".to_string()));
    }
    let subscription = redeem_promo(&state.db, auth.0.user_id()?, &req.code).await?;
    Ok(Json(subscription))
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub plan: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub amount_cents: i32,
}

/// POST /api/v1/billing/checkout
///
/// Constructs the payment-processor redirect for a plan upgrade, with the
/// caller's promo discounts applied.
pub async fn handle_checkout(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    auth.require_company()?;
    let user_id = auth.0.user_id()?;

    let plan = plan_by_id(&req.plan)
        .ok_or_else(|| AppError::Validation(format!("Unknown plan '{}'", req.plan)))?;
    if plan.price_cents == 0 {
        return Err(AppError::Validation(
            "The free plan does not require checkout".to_string(),
        ));
    }

    let subscription = get_subscription(&state.db, user_id).await?;
    let amount_cents = discounted_price_cents(
        plan.price_cents,
        subscription.discount_percent,
        subscription.discount_cents,
    );

    let checkout_url =
        build_checkout_url(&state.config.checkout_base_url, plan.id, user_id, amount_cents);

    Ok(Json(CheckoutResponse {
        checkout_url,
        amount_cents,
    }))
}
