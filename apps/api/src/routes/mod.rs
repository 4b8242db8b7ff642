pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;
use crate::{admin, applications, auth, billing, jobs, support};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/register", post(auth::handlers::handle_register))
        .route("/api/v1/auth/login", post(auth::handlers::handle_login))
        .route("/api/v1/auth/me", get(auth::handlers::handle_me))
        // Job offers
        .route(
            "/api/v1/jobs",
            get(jobs::handlers::handle_list_jobs).post(jobs::handlers::handle_create_job),
        )
        .route("/api/v1/jobs/mine", get(jobs::handlers::handle_list_own_jobs))
        .route("/api/v1/jobs/mine/:id", get(jobs::handlers::handle_get_own_job))
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handlers::handle_get_job)
                .patch(jobs::handlers::handle_update_job)
                .delete(jobs::handlers::handle_delete_job),
        )
        .route("/api/v1/jobs/:id/publish", post(jobs::handlers::handle_publish_job))
        .route("/api/v1/jobs/:id/close", post(jobs::handlers::handle_close_job))
        .route("/api/v1/jobs/:id/archive", post(jobs::handlers::handle_archive_job))
        // Applications
        .route(
            "/api/v1/jobs/:id/applications",
            get(applications::handlers::handle_list_applications)
                .post(applications::handlers::handle_apply),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::handlers::handle_get_application),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(applications::handlers::handle_update_status),
        )
        .route(
            "/api/v1/applications/:id/analyze",
            post(applications::handlers::handle_analyze),
        )
        // Billing
        .route("/api/v1/billing/plans", get(billing::handlers::handle_list_plans))
        .route(
            "/api/v1/billing/subscription",
            get(billing::handlers::handle_get_subscription),
        )
        .route("/api/v1/billing/promo", post(billing::handlers::handle_redeem_promo))
        .route("/api/v1/billing/checkout", post(billing::handlers::handle_checkout))
        // Support
        .route(
            "/api/v1/support/tickets",
            get(support::handlers::handle_list_own_tickets)
                .post(support::handlers::handle_open_ticket),
        )
        .route(
            "/api/v1/support/tickets/:id",
            get(support::handlers::handle_get_ticket),
        )
        // Admin
        .route(
            "/api/v1/admin/users",
            get(admin::handlers::handle_list_users).post(admin::handlers::handle_create_user),
        )
        .route(
            "/api/v1/admin/users/:id",
            patch(admin::handlers::handle_update_user).delete(admin::handlers::handle_delete_user),
        )
        .route(
            "/api/v1/admin/users/:id/plan",
            patch(admin::handlers::handle_change_plan),
        )
        .route(
            "/api/v1/admin/promo-codes",
            get(admin::handlers::handle_list_promos).post(admin::handlers::handle_create_promo),
        )
        .route(
            "/api/v1/admin/promo-codes/:id",
            patch(admin::handlers::handle_update_promo),
        )
        .route(
            "/api/v1/admin/campaigns",
            get(admin::handlers::handle_list_campaigns)
                .post(admin::handlers::handle_create_campaign),
        )
        .route(
            "/api/v1/admin/campaigns/:id/send",
            post(admin::handlers::handle_send_campaign),
        )
        .route("/api/v1/admin/tickets", get(admin::handlers::handle_list_tickets))
        .route(
            "/api/v1/admin/tickets/:id/reply",
            post(admin::handlers::handle_reply_ticket),
        )
        .route(
            "/api/v1/admin/tickets/:id/close",
            patch(admin::handlers::handle_close_ticket),
        )
        .with_state(state)
}
