//! Stripe client: subscription checkout, billing portal, subscription lookup,
//! and the webhook event shapes the server consumes.

use chrono::{DateTime, Utc};
use icf_config::StripeConfig;
use icf_core::enums::SubscriptionStatus;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::http::{build_client, check_response};

const PROVIDER: &str = "stripe";

/// Parameters for a subscription checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutRequest<'a> {
    /// Our user id, echoed back as `client_reference_id`.
    pub user_id: &'a str,
    pub email: &'a str,
    /// Reuse an existing customer instead of creating one from `email`.
    pub customer_id: Option<&'a str>,
    pub price_id: &'a str,
    /// Omitted when zero, or when the caller already had a subscription.
    pub trial_days: u32,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Deserialize)]
struct UrlResponse {
    url: Option<String>,
}

/// `checkout.session` object as delivered in `checkout.session.completed`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    pub client_reference_id: Option<String>,
    pub customer: Option<String>,
    pub subscription: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Price {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SubscriptionItem {
    pub price: Price,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SubscriptionItems {
    #[serde(default)]
    pub data: Vec<SubscriptionItem>,
}

/// `subscription` object, as fetched or delivered in `customer.subscription.*`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Subscription {
    pub id: String,
    pub customer: String,
    pub status: String,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    #[serde(default)]
    pub current_period_end: Option<i64>,
    #[serde(default)]
    pub trial_end: Option<i64>,
    #[serde(default)]
    pub items: SubscriptionItems,
}

impl Subscription {
    #[must_use]
    pub fn status(&self) -> SubscriptionStatus {
        parse_status(&self.status)
    }

    #[must_use]
    pub fn price_id(&self) -> Option<&str> {
        self.items.data.first().map(|item| item.price.id.as_str())
    }

    /// Period end from the subscription, or from its first item on newer API
    /// versions that moved the field.
    #[must_use]
    pub fn current_period_end(&self) -> Option<DateTime<Utc>> {
        self.current_period_end
            .or_else(|| self.items.data.first().and_then(|item| item.current_period_end))
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    #[must_use]
    pub fn trial_end(&self) -> Option<DateTime<Utc>> {
        self.trial_end.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }
}

/// `invoice` object; only the customer is needed.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Invoice {
    pub id: String,
    pub customer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// A webhook event envelope. `data.object` is decoded per event type.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

impl Event {
    /// Parse a verified webhook body.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Parse`] if the body is not an event envelope.
    pub fn from_slice(body: &[u8]) -> Result<Self, ProviderError> {
        serde_json::from_slice(body).map_err(|e| ProviderError::Parse(e.to_string()))
    }

    /// Decode `data.object` into a concrete type.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Parse`] when the object has another shape.
    pub fn object<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProviderError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| {
            ProviderError::Parse(format!("{} object: {e}", self.event_type))
        })
    }
}

/// Map a Stripe subscription status string. Unknown values are treated as
/// `incomplete` so they never grant access.
#[must_use]
pub fn parse_status(status: &str) -> SubscriptionStatus {
    match status {
        "trialing" => SubscriptionStatus::Trialing,
        "active" => SubscriptionStatus::Active,
        "past_due" => SubscriptionStatus::PastDue,
        "canceled" => SubscriptionStatus::Canceled,
        "incomplete_expired" => SubscriptionStatus::IncompleteExpired,
        "unpaid" => SubscriptionStatus::Unpaid,
        "paused" => SubscriptionStatus::Paused,
        _ => SubscriptionStatus::Incomplete,
    }
}

/// Stripe REST client (form-encoded requests, bearer secret key).
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] without a secret key.
    pub fn from_config(config: &StripeConfig) -> Result<Self, ProviderError> {
        if config.secret_key.is_empty() {
            return Err(ProviderError::NotConfigured("stripe"));
        }
        Ok(Self {
            http: build_client()?,
            secret_key: config.secret_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Create a subscription-mode checkout session and return its URL.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport or API failure, or when the
    /// response carries no URL.
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutRequest<'_>,
    ) -> Result<String, ProviderError> {
        let form = checkout_form(request);
        let resp = self
            .http
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await?;
        let body: UrlResponse = check_response(PROVIDER, resp).await?.json().await?;
        tracing::debug!(user_id = request.user_id, "stripe checkout session created");
        body.url
            .ok_or_else(|| ProviderError::Parse("checkout session without url".into()))
    }

    /// Create a billing portal session for an existing customer.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport or API failure.
    pub async fn create_portal_session(
        &self,
        customer_id: &str,
        return_url: &str,
    ) -> Result<String, ProviderError> {
        let resp = self
            .http
            .post(format!("{}/v1/billing_portal/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&[("customer", customer_id), ("return_url", return_url)])
            .send()
            .await?;
        let body: UrlResponse = check_response(PROVIDER, resp).await?.json().await?;
        body.url
            .ok_or_else(|| ProviderError::Parse("portal session without url".into()))
    }

    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport or API failure.
    pub async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Subscription, ProviderError> {
        let resp = self
            .http
            .get(format!(
                "{}/v1/subscriptions/{}",
                self.api_base,
                urlencoding::encode(subscription_id)
            ))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        Ok(check_response(PROVIDER, resp).await?.json().await?)
    }
}

fn checkout_form(request: &CheckoutRequest<'_>) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("mode", "subscription".to_string()),
        ("line_items[0][price]", request.price_id.to_string()),
        ("line_items[0][quantity]", "1".to_string()),
        ("client_reference_id", request.user_id.to_string()),
        ("success_url", request.success_url.clone()),
        ("cancel_url", request.cancel_url.clone()),
        ("allow_promotion_codes", "true".to_string()),
        ("metadata[user_id]", request.user_id.to_string()),
    ];
    match request.customer_id {
        Some(customer) => form.push(("customer", customer.to_string())),
        None => form.push(("customer_email", request.email.to_string())),
    }
    if request.trial_days > 0 {
        form.push((
            "subscription_data[trial_period_days]",
            request.trial_days.to_string(),
        ));
    }
    form
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SUBSCRIPTION_FIXTURE: &str = r#"{
        "id": "evt_1",
        "type": "customer.subscription.updated",
        "data": {
            "object": {
                "id": "sub_123",
                "object": "subscription",
                "customer": "cus_abc",
                "status": "trialing",
                "cancel_at_period_end": true,
                "trial_end": 1767225600,
                "items": {
                    "object": "list",
                    "data": [
                        {"id": "si_1", "price": {"id": "price_monthly"}, "current_period_end": 1769904000}
                    ]
                }
            }
        }
    }"#;

    #[test]
    fn parses_subscription_event() {
        let event = Event::from_slice(SUBSCRIPTION_FIXTURE.as_bytes()).unwrap();
        assert_eq!(event.event_type, "customer.subscription.updated");
        let sub: Subscription = event.object().unwrap();
        assert_eq!(sub.status(), SubscriptionStatus::Trialing);
        assert_eq!(sub.price_id(), Some("price_monthly"));
        assert!(sub.cancel_at_period_end);
        assert_eq!(
            sub.current_period_end().unwrap().timestamp(),
            1_769_904_000,
            "falls back to the item period end"
        );
        assert_eq!(sub.trial_end().unwrap().timestamp(), 1_767_225_600);
    }

    #[test]
    fn top_level_period_end_wins() {
        let sub: Subscription = serde_json::from_str(
            r#"{"id":"sub_1","customer":"cus_1","status":"active","current_period_end":100,
                "items":{"data":[{"price":{"id":"p"},"current_period_end":200}]}}"#,
        )
        .unwrap();
        assert_eq!(sub.current_period_end().unwrap().timestamp(), 100);
    }

    #[test]
    fn parses_checkout_session() {
        let event = Event::from_slice(
            br#"{"id":"evt_2","type":"checkout.session.completed","data":{"object":{
                "id":"cs_1","client_reference_id":"user_1","customer":"cus_1","subscription":"sub_1",
                "mode":"subscription"}}}"#,
        )
        .unwrap();
        let session: CheckoutSession = event.object().unwrap();
        assert_eq!(session.client_reference_id.as_deref(), Some("user_1"));
        assert_eq!(session.subscription.as_deref(), Some("sub_1"));
    }

    #[test]
    fn wrong_object_shape_is_parse_error() {
        let event = Event::from_slice(
            br#"{"id":"evt_3","type":"invoice.payment_failed","data":{"object":{"id":"in_1"}}}"#,
        )
        .unwrap();
        assert!(event.object::<Subscription>().is_err());
        let invoice: Invoice = event.object().unwrap();
        assert!(invoice.customer.is_none());
    }

    #[test]
    fn unknown_status_never_grants_access() {
        assert_eq!(parse_status("past_due"), SubscriptionStatus::PastDue);
        assert!(!parse_status("something_new").has_access());
    }

    #[test]
    fn checkout_form_uses_customer_or_email() {
        let mut request = CheckoutRequest {
            user_id: "user_1",
            email: "coach@example.com",
            customer_id: None,
            price_id: "price_annual",
            trial_days: 14,
            success_url: "https://app/sub?success=1".into(),
            cancel_url: "https://app/sub".into(),
        };
        let form = checkout_form(&request);
        assert!(form.contains(&("customer_email", "coach@example.com".to_string())));
        assert!(form.contains(&("subscription_data[trial_period_days]", "14".to_string())));

        request.customer_id = Some("cus_9");
        request.trial_days = 0;
        let form = checkout_form(&request);
        assert!(form.contains(&("customer", "cus_9".to_string())));
        assert!(!form.iter().any(|(k, _)| *k == "customer_email"));
        assert!(!form.iter().any(|(k, _)| k.starts_with("subscription_data")));
    }

    #[test]
    fn from_config_requires_secret() {
        assert!(matches!(
            StripeClient::from_config(&StripeConfig::default()),
            Err(ProviderError::NotConfigured("stripe"))
        ));
    }
}
