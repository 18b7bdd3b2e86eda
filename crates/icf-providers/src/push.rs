//! Web push delivery with VAPID (aes128gcm payload encryption).

use async_trait::async_trait;
use icf_config::PushConfig;
use icf_core::entities::PushSubscription;
use serde::{Deserialize, Serialize};
use web_push::{
    ContentEncoding, SubscriptionInfo, VapidSignatureBuilder, WebPushMessage,
    WebPushMessageBuilder,
};

use crate::error::ProviderError;
use crate::http::{build_client, check_response};

const PROVIDER: &str = "web-push";

/// Seconds the push service keeps an undelivered message.
const DEFAULT_TTL_SECS: u32 = 24 * 60 * 60;

/// Notification payload the service worker displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Delivers one message to one subscription.
///
/// Implementations return [`ProviderError::Gone`] when the push service
/// reports the endpoint as expired, so callers can delete it.
#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> Result<(), ProviderError>;
}

pub struct WebPushSender {
    http: reqwest::Client,
    private_key: String,
    subject: String,
}

impl WebPushSender {
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] without VAPID keys.
    pub fn from_config(config: &PushConfig) -> Result<Self, ProviderError> {
        if !config.is_configured() {
            return Err(ProviderError::NotConfigured("push"));
        }
        Ok(Self {
            http: build_client()?,
            private_key: config.vapid_private_key.clone(),
            subject: config.subject.clone(),
        })
    }

    fn build_message(
        &self,
        subscription: &PushSubscription,
        payload: &[u8],
    ) -> Result<WebPushMessage, ProviderError> {
        let info = SubscriptionInfo::new(
            &subscription.endpoint,
            &subscription.p256dh,
            &subscription.auth,
        );
        let mut signature =
            VapidSignatureBuilder::from_base64(&self.private_key, web_push::URL_SAFE_NO_PAD, &info)?;
        signature.add_claim("sub", self.subject.as_str());

        let mut builder = WebPushMessageBuilder::new(&info);
        builder.set_ttl(DEFAULT_TTL_SECS);
        builder.set_payload(ContentEncoding::Aes128Gcm, payload);
        builder.set_vapid_signature(signature.build()?);
        Ok(builder.build()?)
    }
}

#[async_trait]
impl PushSender for WebPushSender {
    async fn send(
        &self,
        subscription: &PushSubscription,
        message: &PushMessage,
    ) -> Result<(), ProviderError> {
        let body = serde_json::to_vec(message).map_err(|e| ProviderError::Parse(e.to_string()))?;
        let message = self.build_message(subscription, &body)?;

        let mut request = self
            .http
            .post(message.endpoint.to_string())
            .header("TTL", message.ttl.to_string());
        if let Some(payload) = message.payload {
            request = request
                .header(reqwest::header::CONTENT_ENCODING, "aes128gcm")
                .header(reqwest::header::CONTENT_TYPE, "application/octet-stream");
            for (name, value) in payload.crypto_headers {
                request = request.header(name, value);
            }
            request = request.body(payload.content);
        }

        let resp = request.send().await?;
        if matches!(resp.status().as_u16(), 404 | 410) {
            return Err(ProviderError::Gone(subscription.endpoint.clone()));
        }
        check_response(PROVIDER, resp).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    #[test]
    fn payload_omits_missing_url() {
        let message = PushMessage {
            title: "Time to log".into(),
            body: "You haven't logged a session in 8 days.".into(),
            url: None,
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            serde_json::json!({"title": "Time to log", "body": "You haven't logged a session in 8 days."})
        );
    }

    #[test]
    fn invalid_vapid_key_is_an_error() {
        let sender = WebPushSender::from_config(&PushConfig {
            vapid_public_key: "pub".into(),
            vapid_private_key: "not a key".into(),
            subject: "mailto:ops@icflog.app".into(),
        })
        .unwrap();
        let subscription = PushSubscription {
            id: "psh_1".into(),
            user_id: "user_1".into(),
            endpoint: "https://push.example.com/abc".into(),
            p256dh: "invalid".into(),
            auth: "invalid".into(),
            user_agent: None,
            created_at: Utc::now(),
        };
        assert!(sender.build_message(&subscription, b"{}").is_err());
    }

    #[test]
    fn signs_and_encrypts_for_a_browser_subscription() {
        let sender = WebPushSender::from_config(&PushConfig {
            vapid_public_key: "BMo1HqKF6skMZYykrte9duqYwBD08mDQKTunRkJdD3sTJ9E-yyN6sJlPWTpKNhp-y2KeS6oANHF-q3w37bClb7U".into(),
            vapid_private_key: "IQ9Ur0ykXoHS9gzfYX0aBjy9lvdrjx_PFUXmie9YRcY".into(),
            subject: "mailto:ops@icflog.app".into(),
        })
        .unwrap();
        let subscription = PushSubscription {
            id: "psh_2".into(),
            user_id: "user_1".into(),
            endpoint: "https://updates.push.services.mozilla.com/wpush/v2/gAAAAABaso4V".into(),
            p256dh: "BH1HTeKM7-NwaLGHEqxeu2IamQaVVLkcsFHPIHmsCnqxcBHPQBprF41bEMOr3O1hUQ2jU1opNEm1F_lZV_sxMP8".into(),
            auth: "sBXU5_tIYz-5w7G2B25BEw".into(),
            user_agent: None,
            created_at: Utc::now(),
        };

        let message = sender.build_message(&subscription, br#"{"title":"Hi"}"#).unwrap();
        assert_eq!(message.ttl, DEFAULT_TTL_SECS);
        assert_eq!(message.endpoint.to_string(), subscription.endpoint);
        let payload = message.payload.unwrap();
        assert!(!payload.content.is_empty());
        let authorization = payload
            .crypto_headers
            .iter()
            .find(|(name, _)| *name == "Authorization")
            .map(|(_, value)| value.as_str())
            .unwrap();
        assert!(authorization.starts_with("vapid t="));
    }

    #[test]
    fn unconfigured_is_rejected() {
        assert!(matches!(
            WebPushSender::from_config(&PushConfig::default()),
            Err(ProviderError::NotConfigured("push"))
        ));
    }
}
