//! Axum route handlers for job offers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::extract::AuthUser;
use crate::entitlements::checks::check_job_quota;
use crate::errors::AppError;
use crate::jobs::lifecycle::{can_transition, is_deletable};
use crate::models::job::{JobOffer, JobStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub contract_type: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub contract_type: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
}

/// POST /api/v1/jobs
///
/// Creates a DRAFT offer. Gated by the company's job quota — DRAFT and
/// PUBLISHED offers both count toward `max_jobs`.
pub async fn handle_create_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobOffer>), AppError> {
    auth.require_company()?;
    let company_id = auth.0.user_id()?;

    if req.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    if req.description.trim().is_empty() {
        return Err(AppError::Validation("description cannot be empty".to_string()));
    }
    if let (Some(min), Some(max)) = (req.salary_min, req.salary_max) {
        if min > max {
            return Err(AppError::Validation(
                "salary_min cannot exceed salary_max".to_string(),
            ));
        }
    }

    check_job_quota(&state.db, company_id).await?.into_result()?;

    let job = sqlx::query_as::<_, JobOffer>(
        r#"
        INSERT INTO job_offers
            (company_id, title, description, location, contract_type, salary_min, salary_max)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(company_id)
    .bind(req.title.trim())
    .bind(req.description.trim())
    .bind(&req.location)
    .bind(&req.contract_type)
    .bind(req.salary_min)
    .bind(req.salary_max)
    .fetch_one(&state.db)
    .await?;

    info!("Company {company_id} created job offer {}", job.id);
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs
///
/// Public listing: PUBLISHED offers only, newest first.
pub async fn handle_list_jobs(
    State(state): State<AppState>,
) -> Result<Json<Vec<JobOffer>>, AppError> {
    let jobs = sqlx::query_as::<_, JobOffer>(
        "SELECT * FROM job_offers WHERE status = 'published' ORDER BY published_at DESC",
    )
    .fetch_all(&state.db)
    .await?;
    Ok(Json(jobs))
}

/// GET /api/v1/jobs/mine
///
/// The authenticated company's offers in any state.
pub async fn handle_list_own_jobs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<JobOffer>>, AppError> {
    auth.require_company()?;
    let jobs = sqlx::query_as::<_, JobOffer>(
        "SELECT * FROM job_offers WHERE company_id = $1 ORDER BY created_at DESC",
    )
    .bind(auth.0.user_id()?)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(jobs))
}

/// GET /api/v1/jobs/:id
///
/// Public for PUBLISHED offers. Non-published offers are visible only to
/// their owner, which uses the authenticated variant below.
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobOffer>, AppError> {
    let job = fetch_job(&state.db, id).await?;
    if job.status != JobStatus::Published {
        return Err(AppError::NotFound(format!("Job offer {id} not found")));
    }
    Ok(Json(job))
}

/// GET /api/v1/jobs/mine/:id
pub async fn handle_get_own_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<JobOffer>, AppError> {
    let job = fetch_owned_job(&state.db, id, &auth).await?;
    Ok(Json(job))
}

/// PATCH /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<Json<JobOffer>, AppError> {
    let job = fetch_owned_job(&state.db, id, &auth).await?;

    let job = sqlx::query_as::<_, JobOffer>(
        r#"
        UPDATE job_offers SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            location = COALESCE($4, location),
            contract_type = COALESCE($5, contract_type),
            salary_min = COALESCE($6, salary_min),
            salary_max = COALESCE($7, salary_max),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(job.id)
    .bind(req.title.as_deref().map(str::trim))
    .bind(req.description.as_deref().map(str::trim))
    .bind(&req.location)
    .bind(&req.contract_type)
    .bind(req.salary_min)
    .bind(req.salary_max)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(job))
}

/// POST /api/v1/jobs/:id/publish
pub async fn handle_publish_job(
    state: State<AppState>,
    auth: AuthUser,
    path: Path<Uuid>,
) -> Result<Json<JobOffer>, AppError> {
    transition_job(state, auth, path, JobStatus::Published).await
}

/// POST /api/v1/jobs/:id/close
pub async fn handle_close_job(
    state: State<AppState>,
    auth: AuthUser,
    path: Path<Uuid>,
) -> Result<Json<JobOffer>, AppError> {
    transition_job(state, auth, path, JobStatus::Closed).await
}

/// POST /api/v1/jobs/:id/archive
pub async fn handle_archive_job(
    state: State<AppState>,
    auth: AuthUser,
    path: Path<Uuid>,
) -> Result<Json<JobOffer>, AppError> {
    transition_job(state, auth, path, JobStatus::Archived).await
}

/// DELETE /api/v1/jobs/:id
///
/// Drafts only, and only while no application exists for the offer.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let job = fetch_owned_job(&state.db, id, &auth).await?;

    if !is_deletable(job.status) {
        return Err(AppError::Conflict(
            "Only draft offers can be deleted; close or archive published offers".to_string(),
        ));
    }

    let applications: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE job_offer_id = $1")
            .bind(job.id)
            .fetch_one(&state.db)
            .await?;
    if applications > 0 {
        return Err(AppError::Conflict(
            "This offer already has applications and cannot be deleted".to_string(),
        ));
    }

    sqlx::query("DELETE FROM job_offers WHERE id = $1")
        .bind(job.id)
        .execute(&state.db)
        .await?;

    info!("Deleted draft job offer {}", job.id);
    Ok(StatusCode::NO_CONTENT)
}

async fn transition_job(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    to: JobStatus,
) -> Result<Json<JobOffer>, AppError> {
    let job = fetch_owned_job(&state.db, id, &auth).await?;

    if !can_transition(job.status, to) {
        return Err(AppError::Conflict(format!(
            "Cannot move a {:?} offer to {:?}",
            job.status, to
        )));
    }

    let job = sqlx::query_as::<_, JobOffer>(
        r#"
        UPDATE job_offers
        SET status = $2,
            published_at = CASE WHEN $2 = 'published'::job_status THEN now() ELSE published_at END,
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(job.id)
    .bind(to)
    .fetch_one(&state.db)
    .await?;

    info!("Job offer {} is now {:?}", job.id, job.status);
    Ok(Json(job))
}

async fn fetch_job(pool: &sqlx::PgPool, id: Uuid) -> Result<JobOffer, AppError> {
    sqlx::query_as::<_, JobOffer>("SELECT * FROM job_offers WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job offer {id} not found")))
}

/// Fetches a job and enforces that the caller is its owning company.
async fn fetch_owned_job(
    pool: &sqlx::PgPool,
    id: Uuid,
    auth: &AuthUser,
) -> Result<JobOffer, AppError> {
    auth.require_company()?;
    let job = fetch_job(pool, id).await?;
    if job.company_id != auth.0.user_id()? {
        return Err(AppError::Forbidden);
    }
    Ok(job)
}
