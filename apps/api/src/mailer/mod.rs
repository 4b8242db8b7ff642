//! Outbound email — pluggable, trait-based sender behind `Arc<dyn Mailer>`.
//!
//! Default: `HttpMailer` posting to the transactional provider's HTTP API.
//! Tests swap in a mock so campaign and ticket flows run without network.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider error (status {status}): {message}")]
    Provider { status: u16, message: String },
}

/// A single outbound message. Plain-text body; the provider handles
/// templating and HTML wrapping.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// The mailer trait. Implement this to swap providers without touching
/// the campaign sender or ticket handlers.
///
/// Carried in `AppState` as `Arc<dyn Mailer>`.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError>;
}

#[derive(Debug, Serialize)]
struct ProviderRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// HTTP transactional email provider.
/// A single request/response call, no retry — delivery failures are the
/// caller's to tally or log.
pub struct HttpMailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
        let request = ProviderRequest {
            from: &self.from,
            to: &email.to,
            subject: &email.subject,
            text: &email.body,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(MailError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        debug!("Email sent to {}", email.to);
        Ok(())
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Records every send; addresses in `fail_for` return a provider error.
    pub struct MockMailer {
        pub sent: Mutex<Vec<OutboundEmail>>,
        pub fail_for: Vec<String>,
    }

    impl MockMailer {
        pub fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_for: Vec::new(),
            }
        }

        pub fn failing_for(addresses: &[&str]) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_for: addresses.iter().map(|a| a.to_string()).collect(),
            }
        }
    }

    #[async_trait]
    impl Mailer for MockMailer {
        async fn send(&self, email: &OutboundEmail) -> Result<(), MailError> {
            if self.fail_for.contains(&email.to) {
                return Err(MailError::Provider {
                    status: 500,
                    message: "mock failure".to_string(),
                });
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }
}
