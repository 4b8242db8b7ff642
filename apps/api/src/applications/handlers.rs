//! Axum route handlers for applications: the public apply flow, recruiter
//! listing and review, and the AI analysis trigger.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::applications::analysis::score_application;
use crate::applications::cv_store::{extract_pdf_text, upload_cv};
use crate::applications::review::can_review_transition;
use crate::auth::extract::AuthUser;
use crate::entitlements::checks::{
    check_application_quota, consume_ai_analysis, release_ai_analysis,
};
use crate::errors::AppError;
use crate::mailer::OutboundEmail;
use crate::models::application::{Application, ApplicationStatus};
use crate::models::job::{JobOffer, JobStatus};
use crate::models::user::UserType;
use crate::state::AppState;

/// POST /api/v1/jobs/:id/applications (multipart)
///
/// Accepts `applicant_name`, `applicant_email`, `cover_letter` text fields
/// and an optional `cv` PDF. An authenticated candidate applies under their
/// account; everyone else applies as a guest with contact fields.
pub async fn handle_apply(
    State(state): State<AppState>,
    auth: Option<AuthUser>,
    Path(job_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let job = sqlx::query_as::<_, JobOffer>("SELECT * FROM job_offers WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job offer {job_id} not found")))?;

    if job.status != JobStatus::Published {
        return Err(AppError::Conflict(
            "This offer is not accepting applications".to_string(),
        ));
    }

    check_application_quota(&state.db, job.id, job.company_id)
        .await?
        .into_result()?;

    let mut applicant_name: Option<String> = None;
    let mut applicant_email: Option<String> = None;
    let mut cover_letter: Option<String> = None;
    let mut cv_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        match field.name().unwrap_or("") {
            "applicant_name" => applicant_name = Some(read_text(field).await?),
            "applicant_email" => applicant_email = Some(read_text(field).await?),
            "cover_letter" => cover_letter = Some(read_text(field).await?),
            "cv" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read CV upload: {e}")))?;
                cv_bytes = Some(bytes.to_vec());
            }
            other => {
                warn!("Ignoring unknown multipart field '{other}'");
            }
        }
    }

    // Resolve the applicant: candidate account, or guest contact fields.
    let candidate_id = match &auth {
        Some(user) if user.0.user_type == UserType::Candidate => Some(user.0.user_id()?),
        _ => None,
    };
    if candidate_id.is_none() {
        let name_ok = applicant_name.as_deref().is_some_and(|n| !n.trim().is_empty());
        let email_ok = applicant_email.as_deref().is_some_and(|e| e.contains('@'));
        if !name_ok || !email_ok {
            return Err(AppError::Validation(
                "Guest applications require applicant_name and a valid applicant_email".to_string(),
            ));
        }
    }

    let cv_text = cv_bytes.as_deref().map(extract_pdf_text).transpose()?;

    let application = sqlx::query_as::<_, Application>(
        r#"
        INSERT INTO applications
            (job_offer_id, candidate_id, guest_name, guest_email, cover_letter, cv_text)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(job.id)
    .bind(candidate_id)
    .bind(applicant_name.as_deref().map(str::trim))
    .bind(applicant_email.as_deref().map(str::trim))
    .bind(&cover_letter)
    .bind(&cv_text)
    .fetch_one(&state.db)
    .await?;

    // Store the raw PDF after the insert so the object key carries the
    // application id.
    let application = match cv_bytes {
        Some(bytes) => {
            let key = upload_cv(&state.s3, &state.config.s3_bucket, application.id, bytes).await?;
            sqlx::query_as::<_, Application>(
                "UPDATE applications SET cv_s3_key = $2 WHERE id = $1 RETURNING *",
            )
            .bind(application.id)
            .bind(&key)
            .fetch_one(&state.db)
            .await?
        }
        None => application,
    };

    info!("Application {} received for job offer {}", application.id, job.id);

    send_acknowledgement(&state, &application, &job).await;

    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/v1/jobs/:id/applications
///
/// The owning company's view of everything received for an offer.
pub async fn handle_list_applications(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<Application>>, AppError> {
    let job = fetch_owned_job(&state, &auth, job_id).await?;

    let applications = sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE job_offer_id = $1 ORDER BY created_at DESC",
    )
    .bind(job.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(applications))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    let (application, _job) = fetch_owned_application(&state, &auth, id).await?;
    Ok(Json(application))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ApplicationStatus,
}

/// PATCH /api/v1/applications/:id/status
///
/// Manual review moves only; system states are rejected by the guard.
pub async fn handle_update_status(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<Application>, AppError> {
    let (application, _job) = fetch_owned_application(&state, &auth, id).await?;

    if !can_review_transition(application.status, req.status) {
        return Err(AppError::Conflict(format!(
            "Cannot move a {:?} application to {:?}",
            application.status, req.status
        )));
    }

    let application = sqlx::query_as::<_, Application>(
        "UPDATE applications SET status = $2 WHERE id = $1 RETURNING *",
    )
    .bind(application.id)
    .bind(req.status)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(application))
}

/// POST /api/v1/applications/:id/analyze
///
/// Consumes one AI-quota unit, scores the application via the LLM, and
/// stores the result. On LLM failure the status reverts to PENDING and the
/// quota unit is released.
pub async fn handle_analyze(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    let (application, job) = fetch_owned_application(&state, &auth, id).await?;
    let company_id = auth.0.user_id()?;

    consume_ai_analysis(&state.db, company_id)
        .await?
        .into_result()?;

    // Claim PENDING → ANALYZING; a second concurrent analyze loses the claim.
    let claimed = sqlx::query(
        "UPDATE applications SET status = 'analyzing' WHERE id = $1 AND status = 'pending'",
    )
    .bind(application.id)
    .execute(&state.db)
    .await?;
    if claimed.rows_affected() != 1 {
        release_ai_analysis(&state.db, company_id).await?;
        return Err(AppError::Conflict(format!(
            "Application is {:?} and cannot be analyzed",
            application.status
        )));
    }

    match score_application(&state.llm, &job, &application).await {
        Ok(analysis) => {
            let application = sqlx::query_as::<_, Application>(
                r#"
                UPDATE applications
                SET status = 'analyzed', ai_score = $2, ai_summary = $3,
                    ai_strengths = $4, ai_concerns = $5, analyzed_at = $6
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(application.id)
            .bind(analysis.score)
            .bind(&analysis.summary)
            .bind(&analysis.strengths)
            .bind(&analysis.concerns)
            .bind(Utc::now())
            .fetch_one(&state.db)
            .await?;

            info!(
                "Application {} analyzed: score {:.1}",
                application.id,
                application.ai_score.unwrap_or_default()
            );
            Ok(Json(application))
        }
        Err(e) => {
            sqlx::query("UPDATE applications SET status = 'pending' WHERE id = $1")
                .bind(application.id)
                .execute(&state.db)
                .await?;
            release_ai_analysis(&state.db, company_id).await?;
            Err(e)
        }
    }
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart field: {e}")))
}

async fn fetch_owned_job(
    state: &AppState,
    auth: &AuthUser,
    job_id: Uuid,
) -> Result<JobOffer, AppError> {
    auth.require_company()?;
    let job = sqlx::query_as::<_, JobOffer>("SELECT * FROM job_offers WHERE id = $1")
        .bind(job_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job offer {job_id} not found")))?;
    if job.company_id != auth.0.user_id()? {
        return Err(AppError::Forbidden);
    }
    Ok(job)
}

/// Fetches an application together with its job offer and enforces that the
/// caller owns the offer.
async fn fetch_owned_application(
    state: &AppState,
    auth: &AuthUser,
    id: Uuid,
) -> Result<(Application, JobOffer), AppError> {
    let application =
        sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    let job = fetch_owned_job(state, auth, application.job_offer_id).await?;
    Ok((application, job))
}

/// Best-effort acknowledgement to the applicant. Delivery failure is logged
/// and never fails the apply request.
async fn send_acknowledgement(state: &AppState, application: &Application, job: &JobOffer) {
    let to = match application_email(state, application).await {
        Some(email) => email,
        None => return,
    };

    let email = OutboundEmail {
        to,
        subject: format!("Your application to {}", job.title),
        body: format!(
            "We received your application for \"{}\". The hiring team will get back to you.",
            job.title
        ),
    };

    if let Err(e) = state.mailer.send(&email).await {
        warn!("Acknowledgement email for application {} failed: {e}", application.id);
    }
}

async fn application_email(state: &AppState, application: &Application) -> Option<String> {
    if let Some(email) = &application.guest_email {
        return Some(email.clone());
    }
    let candidate_id = application.candidate_id?;
    sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = $1")
        .bind(candidate_id)
        .fetch_optional(&state.db)
        .await
        .ok()
        .flatten()
}
