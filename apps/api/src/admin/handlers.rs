//! Axum route handlers for the admin surface: users, plan changes, promo
//! codes, campaigns, and support tickets.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::admin::campaigns::{send_campaign, SendReport};
use crate::auth::extract::AdminUser;
use crate::auth::password::hash_password;
use crate::entitlements::plans::plan_by_id;
use crate::errors::AppError;
use crate::mailer::OutboundEmail;
use crate::models::billing::{PromoCode, PromoKind, Subscription};
use crate::models::campaign::{CampaignAudience, EmailCampaign};
use crate::models::support::{SupportTicket, TicketMessage, TicketStatus};
use crate::models::user::{User, UserRole, UserType};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Users
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/admin/users
pub async fn handle_list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<User>>, AppError> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;
    Ok(Json(users))
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    pub role: UserRole,
    pub user_type: UserType,
    pub display_name: String,
}

/// POST /api/v1/admin/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }

    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password)?;
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (email, password_hash, role, user_type, display_name)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(req.role)
    .bind(req.user_type)
    .bind(req.display_name.trim())
    .fetch_one(&state.db)
    .await?;

    if user.user_type == UserType::Company {
        crate::auth::handlers::create_free_subscription(&state.db, user.id).await?;
    }

    info!("Admin created user {}", user.id);
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub display_name: Option<String>,
    pub role: Option<UserRole>,
}

/// PATCH /api/v1/admin/users/:id
pub async fn handle_update_user(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            display_name = COALESCE($2, display_name),
            role = COALESCE($3, role)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(req.display_name.as_deref().map(str::trim))
    .bind(req.role)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;

    Ok(Json(user))
}

/// DELETE /api/v1/admin/users/:id
pub async fn handle_delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if admin.0.user_id()? == id {
        return Err(AppError::Conflict(
            "Admins cannot delete their own account".to_string(),
        ));
    }

    let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;
    if deleted.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("User {id} not found")));
    }

    info!("Admin deleted user {id}");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct PlanChangeRequest {
    pub plan: String,
}

/// PATCH /api/v1/admin/users/:id/plan
///
/// Assigns a plan, denormalizing the catalog limits onto the subscription
/// row (creating it if the account has none yet).
pub async fn handle_change_plan(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<PlanChangeRequest>,
) -> Result<Json<Subscription>, AppError> {
    let plan = plan_by_id(&req.plan)
        .ok_or_else(|| AppError::Validation(format!("Unknown plan '{}'", req.plan)))?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
    if user.user_type != UserType::Company {
        return Err(AppError::Validation(
            "Only company accounts hold subscriptions".to_string(),
        ));
    }

    let period_end = Utc::now()
        .checked_add_months(Months::new(1))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("period end overflow")))?;

    let subscription = sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO subscriptions
            (user_id, plan, max_jobs, max_applications_per_job, max_ai_analyses, period_end)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (user_id) DO UPDATE SET
            plan = EXCLUDED.plan,
            max_jobs = EXCLUDED.max_jobs,
            max_applications_per_job = EXCLUDED.max_applications_per_job,
            max_ai_analyses = EXCLUDED.max_ai_analyses,
            updated_at = now()
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(plan.id)
    .bind(plan.max_jobs)
    .bind(plan.max_applications_per_job)
    .bind(plan.max_ai_analyses)
    .bind(period_end)
    .fetch_one(&state.db)
    .await?;

    info!("Admin moved user {} to plan {}", user.id, plan.id);
    Ok(Json(subscription))
}

// ────────────────────────────────────────────────────────────────────────────
// Promo codes
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/admin/promo-codes
pub async fn handle_list_promos(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<PromoCode>>, AppError> {
    let promos =
        sqlx::query_as::<_, PromoCode>("SELECT * FROM promo_codes ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;
    Ok(Json(promos))
}

#[derive(Debug, Deserialize)]
pub struct CreatePromoRequest {
    pub code: String,
    pub kind: PromoKind,
    pub value: i32,
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// POST /api/v1/admin/promo-codes
pub async fn handle_create_promo(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CreatePromoRequest>,
) -> Result<(StatusCode, Json<PromoCode>), AppError> {
    let code = req.code.trim().to_uppercase();
    if code.is_empty() {
        return Err(AppError::Validation("code cannot be empty".to_string()));
    }
    if req.value < 0 {
        return Err(AppError::Validation("value cannot be negative".to_string()));
    }
    if req.kind == PromoKind::Percent && req.value > 100 {
        return Err(AppError::Validation(
            "A percentage discount cannot exceed 100".to_string(),
        ));
    }

    let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM promo_codes WHERE code = $1")
        .bind(&code)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(format!("Promo code '{code}' already exists")));
    }

    let promo = sqlx::query_as::<_, PromoCode>(
        r#"
        INSERT INTO promo_codes (code, kind, value, max_uses, expires_at)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(&code)
    .bind(req.kind)
    .bind(req.value)
    .bind(req.max_uses)
    .bind(req.expires_at)
    .fetch_one(&state.db)
    .await?;

    info!("Admin created promo code '{}'", promo.code);
    Ok((StatusCode::CREATED, Json(promo)))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePromoRequest {
    pub active: bool,
}

/// PATCH /api/v1/admin/promo-codes/:id
pub async fn handle_update_promo(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePromoRequest>,
) -> Result<Json<PromoCode>, AppError> {
    let promo = sqlx::query_as::<_, PromoCode>(
        "UPDATE promo_codes SET active = $2 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(req.active)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Promo code {id} not found")))?;

    Ok(Json(promo))
}

// ────────────────────────────────────────────────────────────────────────────
// Campaigns
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/admin/campaigns
pub async fn handle_list_campaigns(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<EmailCampaign>>, AppError> {
    let campaigns = sqlx::query_as::<_, EmailCampaign>(
        "SELECT * FROM email_campaigns ORDER BY created_at DESC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(campaigns))
}

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub subject: String,
    pub body: String,
    pub audience: CampaignAudience,
}

/// POST /api/v1/admin/campaigns
pub async fn handle_create_campaign(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<EmailCampaign>), AppError> {
    if req.subject.trim().is_empty() {
        return Err(AppError::Validation("subject cannot be empty".to_string()));
    }
    if req.body.trim().is_empty() {
        return Err(AppError::Validation("body cannot be empty".to_string()));
    }

    let campaign = sqlx::query_as::<_, EmailCampaign>(
        r#"
        INSERT INTO email_campaigns (subject, body, audience)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(req.subject.trim())
    .bind(&req.body)
    .bind(req.audience)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(campaign)))
}

#[derive(Debug, Serialize)]
pub struct SendCampaignResponse {
    pub campaign: EmailCampaign,
    pub report: SendReport,
}

/// POST /api/v1/admin/campaigns/:id/send
pub async fn handle_send_campaign(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SendCampaignResponse>, AppError> {
    let (campaign, report) = send_campaign(&state, id).await?;
    Ok(Json(SendCampaignResponse { campaign, report }))
}

// ────────────────────────────────────────────────────────────────────────────
// Support tickets
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/admin/tickets
pub async fn handle_list_tickets(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<SupportTicket>>, AppError> {
    let tickets = sqlx::query_as::<_, SupportTicket>(
        "SELECT * FROM support_tickets ORDER BY (status = 'open') DESC, updated_at DESC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(tickets))
}

#[derive(Debug, Deserialize)]
pub struct TicketReplyRequest {
    pub body: String,
}

/// POST /api/v1/admin/tickets/:id/reply
///
/// Stores the reply, marks the ticket ANSWERED, and emails the requester
/// best-effort.
pub async fn handle_reply_ticket(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(req): Json<TicketReplyRequest>,
) -> Result<Json<TicketMessage>, AppError> {
    if req.body.trim().is_empty() {
        return Err(AppError::Validation("body cannot be empty".to_string()));
    }

    let ticket = sqlx::query_as::<_, SupportTicket>("SELECT * FROM support_tickets WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ticket {id} not found")))?;

    if ticket.status == TicketStatus::Closed {
        return Err(AppError::Conflict("This ticket is closed".to_string()));
    }

    let message = sqlx::query_as::<_, TicketMessage>(
        r#"
        INSERT INTO ticket_messages (ticket_id, author_id, body)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(ticket.id)
    .bind(admin.0.user_id()?)
    .bind(req.body.trim())
    .fetch_one(&state.db)
    .await?;

    sqlx::query("UPDATE support_tickets SET status = 'answered', updated_at = now() WHERE id = $1")
        .bind(ticket.id)
        .execute(&state.db)
        .await?;

    let requester_email: Option<String> =
        sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
            .bind(ticket.user_id)
            .fetch_optional(&state.db)
            .await?;
    if let Some(to) = requester_email {
        let email = OutboundEmail {
            to,
            subject: format!("Re: {}", ticket.subject),
            body: req.body.trim().to_string(),
        };
        if let Err(e) = state.mailer.send(&email).await {
            warn!("Ticket reply email for {} failed: {e}", ticket.id);
        }
    }

    Ok(Json(message))
}

/// PATCH /api/v1/admin/tickets/:id/close
pub async fn handle_close_ticket(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<SupportTicket>, AppError> {
    let ticket = sqlx::query_as::<_, SupportTicket>(
        "UPDATE support_tickets SET status = 'closed', updated_at = now() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Ticket {id} not found")))?;

    Ok(Json(ticket))
}
