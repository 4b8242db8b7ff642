//! Axum route handlers for end-user support tickets.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::extract::AuthUser;
use crate::errors::AppError;
use crate::models::support::{SupportTicket, TicketMessage};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OpenTicketRequest {
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct TicketView {
    pub ticket: SupportTicket,
    pub messages: Vec<TicketMessage>,
}

/// POST /api/v1/support/tickets
pub async fn handle_open_ticket(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<OpenTicketRequest>,
) -> Result<(StatusCode, Json<TicketView>), AppError> {
    if req.subject.trim().is_empty() {
        return Err(AppError::Validation("subject cannot be empty".to_string()));
    }
    if req.body.trim().is_empty() {
        return Err(AppError::Validation("body cannot be empty".to_string()));
    }
    let user_id = auth.0.user_id()?;

    let ticket = sqlx::query_as::<_, SupportTicket>(
        r#"
        INSERT INTO support_tickets (user_id, subject)
        VALUES ($1, $2)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(req.subject.trim())
    .fetch_one(&state.db)
    .await?;

    let message = sqlx::query_as::<_, TicketMessage>(
        r#"
        INSERT INTO ticket_messages (ticket_id, author_id, body)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(ticket.id)
    .bind(user_id)
    .bind(req.body.trim())
    .fetch_one(&state.db)
    .await?;

    info!("User {user_id} opened support ticket {}", ticket.id);
    Ok((
        StatusCode::CREATED,
        Json(TicketView {
            ticket,
            messages: vec![message],
        }),
    ))
}

/// GET /api/v1/support/tickets
///
/// The caller's tickets, newest activity first, without message bodies.
pub async fn handle_list_own_tickets(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<SupportTicket>>, AppError> {
    let tickets = sqlx::query_as::<_, SupportTicket>(
        "SELECT * FROM support_tickets WHERE user_id = $1 ORDER BY updated_at DESC",
    )
    .bind(auth.0.user_id()?)
    .fetch_all(&state.db)
    .await?;
    Ok(Json(tickets))
}

/// GET /api/v1/support/tickets/:id
pub async fn handle_get_ticket(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketView>, AppError> {
    let ticket = sqlx::query_as::<_, SupportTicket>("SELECT * FROM support_tickets WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Ticket {id} not found")))?;

    if ticket.user_id != auth.0.user_id()? {
        return Err(AppError::Forbidden);
    }

    let messages = sqlx::query_as::<_, TicketMessage>(
        "SELECT * FROM ticket_messages WHERE ticket_id = $1 ORDER BY created_at",
    )
    .bind(ticket.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(TicketView { ticket, messages }))
}
