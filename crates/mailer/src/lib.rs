pub mod templates;

use async_trait::async_trait;
use recall_config::MailConfig;
use recall_error::AppError;
use thiserror::Error;
use tracing::{debug, error};

/// A failed send is always surfaced to the caller; nothing here retries or
/// swallows.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("mail server rejected message: status {0}")]
    Rejected(reqwest::StatusCode),
}

impl From<MailError> for AppError {
    fn from(error: MailError) -> Self {
        AppError::MailError(error.to_string())
    }
}

/// Outbound mail seam. The production transport speaks a Mailgun-style HTTP
/// API; tests swap in a recording mock.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError>;
}

pub struct HttpMailer {
    client: reqwest::Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn from_address(&self) -> String {
        format!("{} <mailgun@{}.com>", self.config.sender, self.config.domain)
    }
}

#[async_trait]
impl MailTransport for HttpMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<(), MailError> {
        debug!("Sending mail to {}: {}", to, subject);

        let response = self
            .client
            .post(&self.config.api_url)
            .basic_auth("api", Some(&self.config.api_key))
            .form(&[
                ("from", self.from_address().as_str()),
                ("to", to),
                ("subject", subject),
                ("html", html),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            error!(
                "Mail server rejected message to {}: {}",
                to,
                response.status()
            );
            return Err(MailError::Rejected(response.status()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_errors_convert_to_typed_mail_errors() {
        let err = MailError::Rejected(reqwest::StatusCode::BAD_GATEWAY);
        let app_err: AppError = err.into();
        match app_err {
            AppError::MailError(msg) => assert!(msg.contains("502")),
            other => panic!("expected MailError, got {:?}", other),
        }
    }
}
