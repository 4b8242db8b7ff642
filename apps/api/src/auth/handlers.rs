//! Axum route handlers for registration, login, and the current-user lookup.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{Months, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::extract::AuthUser;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::token::issue_token;
use crate::entitlements::plans::{plan_by_id, COMPANY_FREE};
use crate::errors::AppError;
use crate::models::user::{User, UserType};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub user_type: UserType,
    pub display_name: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/v1/auth/register
///
/// Creates the account and, for company accounts, a COMPANY_FREE
/// subscription seeded from the plan catalog.
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = req.email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    if req.display_name.trim().is_empty() {
        return Err(AppError::Validation("display_name cannot be empty".to_string()));
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
        VALUES ($1, $2, 'user', $3, $4)
        RETURNING *
        "#,
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(req.user_type)
    .bind(req.display_name.trim())
    .fetch_one(&state.db)
    .await?;

    if user.user_type == UserType::Company {
        create_free_subscription(&state.db, user.id).await?;
    }

    info!("Registered {:?} account {}", user.user_type, user.id);

    let token = issue_token(user.id, user.role, user.user_type, &state.config.jwt_secret)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = req.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized);
    }

    let token = issue_token(user.id, user.role, user.user_type, &state.config.jwt_secret)?;
    Ok(Json(AuthResponse { token, user }))
}

/// GET /api/v1/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<User>, AppError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(auth.0.user_id()?)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(user))
}

/// Seeds a COMPANY_FREE subscription from the catalog. Limits are copied
/// onto the row; later checks never consult the catalog.
pub async fn create_free_subscription(pool: &sqlx::PgPool, user_id: Uuid) -> Result<(), AppError> {
    let plan = plan_by_id(COMPANY_FREE)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("COMPANY_FREE missing from catalog")))?;
    let period_end = Utc::now()
        .checked_add_months(Months::new(1))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("period end overflow")))?;

    sqlx::query(
        r#"
        INSERT INTO subscriptions
            (user_id, plan, max_jobs, max_applications_per_job, max_ai_analyses, period_end)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(user_id)
    .bind(plan.id)
    .bind(plan.max_jobs)
    .bind(plan.max_applications_per_job)
    .bind(plan.max_ai_analyses)
    .bind(period_end)
    .execute(pool)
    .await?;

    Ok(())
}
