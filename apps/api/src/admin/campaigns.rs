//! Campaign delivery.
//!
//! Sending runs inside the request: recipients are fetched per the
//! audience filter and emailed one at a time with a fixed inter-send
//! delay. Failures are tallied and the failed addresses returned to the
//! caller; they are not persisted and there is no retry.

use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::mailer::{Mailer, OutboundEmail};
use crate::models::campaign::{CampaignAudience, CampaignStatus, EmailCampaign};
use crate::state::AppState;

/// Fixed pause between provider calls, to stay under send-rate limits.
pub const SEND_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Serialize)]
pub struct SendReport {
    pub sent: i32,
    pub failed: i32,
    pub failed_recipients: Vec<String>,
}

/// WHERE clause suffix selecting a campaign's recipient segment.
pub fn audience_filter_sql(audience: CampaignAudience) -> &'static str {
    match audience {
        CampaignAudience::All => "",
        CampaignAudience::Companies => " WHERE user_type = 'company'",
        CampaignAudience::Candidates => " WHERE user_type = 'candidate'",
    }
}

/// Sequentially delivers one message to every recipient, pausing `interval`
/// between provider calls.
pub async fn deliver_to_recipients(
    mailer: &dyn Mailer,
    subject: &str,
    body: &str,
    recipients: &[String],
    interval: Duration,
) -> SendReport {
    let mut report = SendReport {
        sent: 0,
        failed: 0,
        failed_recipients: Vec::new(),
    };

    for (i, to) in recipients.iter().enumerate() {
        let email = OutboundEmail {
            to: to.clone(),
            subject: subject.to_string(),
            body: body.to_string(),
        };
        match mailer.send(&email).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                warn!("Campaign send to {to} failed: {e}");
                report.failed += 1;
                report.failed_recipients.push(to.clone());
            }
        }
        if i + 1 < recipients.len() {
            tokio::time::sleep(interval).await;
        }
    }

    report
}

/// Sends a DRAFT campaign and marks it SENT with the delivery tallies.
pub async fn send_campaign(
    state: &AppState,
    campaign_id: Uuid,
) -> Result<(EmailCampaign, SendReport), AppError> {
    let campaign =
        sqlx::query_as::<_, EmailCampaign>("SELECT * FROM email_campaigns WHERE id = $1")
            .bind(campaign_id)
            .fetch_optional(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Campaign {campaign_id} not found")))?;

    if campaign.status != CampaignStatus::Draft {
        return Err(AppError::Conflict("This campaign was already sent".to_string()));
    }

    let query = format!(
        "SELECT email FROM users{} ORDER BY created_at",
        audience_filter_sql(campaign.audience)
    );
    let recipients: Vec<String> = sqlx::query_scalar(&query).fetch_all(&state.db).await?;

    info!(
        "Sending campaign {} to {} recipients ({:?})",
        campaign.id,
        recipients.len(),
        campaign.audience
    );

    let report = deliver_to_recipients(
        state.mailer.as_ref(),
        &campaign.subject,
        &campaign.body,
        &recipients,
        SEND_INTERVAL,
    )
    .await;

    let campaign = sqlx::query_as::<_, EmailCampaign>(
        r#"
        UPDATE email_campaigns
        SET status = 'sent', sent_count = $2, failed_count = $3, sent_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(campaign.id)
    .bind(report.sent)
    .bind(report.failed)
    .fetch_one(&state.db)
    .await?;

    info!(
        "Campaign {} sent: {} delivered, {} failed",
        campaign.id, report.sent, report.failed
    );
    Ok((campaign, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailer::mock::MockMailer;

    #[test]
    fn audience_filters() {
        assert_eq!(audience_filter_sql(CampaignAudience::All), "");
        assert_eq!(
            audience_filter_sql(CampaignAudience::Companies),
            " WHERE user_type = 'company'"
        );
        assert_eq!(
            audience_filter_sql(CampaignAudience::Candidates),
            " WHERE user_type = 'candidate'"
        );
    }

    #[tokio::test]
    async fn all_recipients_delivered() {
        let mailer = MockMailer::new();
        let recipients = vec!["a@x.io".to_string(), "b@x.io".to_string()];

        let report =
            deliver_to_recipients(&mailer, "Hello", "Body", &recipients, Duration::ZERO).await;

        assert_eq!(report.sent, 2);
        assert_eq!(report.failed, 0);
        assert!(report.failed_recipients.is_empty());
        assert_eq!(mailer.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failures_are_tallied_and_do_not_stop_the_run() {
        let mailer = MockMailer::failing_for(&["b@x.io"]);
        let recipients = vec![
            "a@x.io".to_string(),
            "b@x.io".to_string(),
            "c@x.io".to_string(),
        ];

        let report =
            deliver_to_recipients(&mailer, "Hello", "Body", &recipients, Duration::ZERO).await;

        assert_eq!(report.sent, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failed_recipients, vec!["b@x.io".to_string()]);
    }

    #[tokio::test]
    async fn empty_recipient_list_sends_nothing() {
        let mailer = MockMailer::new();
        let report = deliver_to_recipients(&mailer, "Hello", "Body", &[], Duration::ZERO).await;
        assert_eq!(report.sent, 0);
        assert_eq!(report.failed, 0);
    }
}
