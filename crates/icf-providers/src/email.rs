//! Transactional email via Resend.

use async_trait::async_trait;
use icf_config::EmailConfig;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::http::{build_client, check_response};

const PROVIDER: &str = "resend";

/// A rendered email for a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Sends one email and returns the provider message id.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<String, ProviderError>;
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

pub struct ResendClient {
    http: reqwest::Client,
    api_key: String,
    from: String,
    reply_to: Option<String>,
    api_base: String,
}

impl ResendClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] without an API key and sender.
    pub fn from_config(config: &EmailConfig) -> Result<Self, ProviderError> {
        if !config.is_configured() {
            return Err(ProviderError::NotConfigured("email"));
        }
        Ok(Self {
            http: build_client()?,
            api_key: config.api_key.clone(),
            from: config.from.clone(),
            reply_to: (!config.reply_to.is_empty()).then(|| config.reply_to.clone()),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn request<'a>(&'a self, message: &'a EmailMessage) -> SendEmailRequest<'a> {
        SendEmailRequest {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
            text: &message.text,
            reply_to: self.reply_to.as_deref(),
        }
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    async fn send(&self, message: &EmailMessage) -> Result<String, ProviderError> {
        let resp = self
            .http
            .post(format!("{}/emails", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&self.request(message))
            .send()
            .await?;
        let body: SendEmailResponse = check_response(PROVIDER, resp).await?.json().await?;
        tracing::debug!(message_id = %body.id, "email accepted");
        Ok(body.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> EmailConfig {
        EmailConfig {
            api_key: "re_test".into(),
            from: "ICF Log <hello@icflog.app>".into(),
            ..Default::default()
        }
    }

    #[test]
    fn request_body_shape() {
        let client = ResendClient::from_config(&config()).unwrap();
        let message = EmailMessage {
            to: "coach@example.com".into(),
            subject: "Hi".into(),
            html: "<p>Hi</p>".into(),
            text: "Hi".into(),
        };
        let json = serde_json::to_value(client.request(&message)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "from": "ICF Log <hello@icflog.app>",
                "to": ["coach@example.com"],
                "subject": "Hi",
                "html": "<p>Hi</p>",
                "text": "Hi",
            })
        );
    }

    #[test]
    fn reply_to_included_when_set() {
        let mut cfg = config();
        cfg.reply_to = "support@icflog.app".into();
        let client = ResendClient::from_config(&cfg).unwrap();
        let message = EmailMessage {
            to: "a@b.c".into(),
            subject: String::new(),
            html: String::new(),
            text: String::new(),
        };
        let json = serde_json::to_value(client.request(&message)).unwrap();
        assert_eq!(json["reply_to"], "support@icflog.app");
    }

    #[test]
    fn unconfigured_is_rejected() {
        assert!(ResendClient::from_config(&EmailConfig::default()).is_err());
    }
}
