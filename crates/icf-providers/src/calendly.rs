//! Calendly client: OAuth code exchange and refresh, current user, webhook
//! subscriptions, scheduled events and invitees.

use chrono::{DateTime, TimeDelta, Utc};
use icf_config::CalendlyConfig;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::http::{build_client, check_response};

const PROVIDER: &str = "calendly";

/// Access tokens expiring within this many seconds are refreshed first.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// Webhook events the app subscribes to.
pub const WEBHOOK_EVENTS: [&str; 2] = ["invitee.created", "invitee.canceled"];

/// Response of the OAuth token endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    /// User URI of the token owner.
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
}

impl TokenGrant {
    /// An out-of-range `expires_in` is treated as already expired.
    #[must_use]
    pub fn expires_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        TimeDelta::try_seconds(self.expires_in)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .unwrap_or(now)
    }
}

/// Whether a token with this expiry must be refreshed before use.
#[must_use]
pub fn needs_refresh(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    expires_at.is_none_or(|at| at <= now + TimeDelta::seconds(REFRESH_MARGIN_SECS))
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CalendlyUser {
    pub uri: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub current_organization: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct EventMembership {
    pub user: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub uri: String,
    #[serde(default)]
    pub name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub event_memberships: Vec<EventMembership>,
}

impl ScheduledEvent {
    /// User URIs of the hosts.
    pub fn host_uris(&self) -> impl Iterator<Item = &str> {
        self.event_memberships.iter().map(|m| m.user.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Invitee {
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Invitee payload of `invitee.created` / `invitee.canceled` webhooks.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct InviteePayload {
    pub uri: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Scheduled event URI.
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub scheduled_event: Option<ScheduledEvent>,
}

/// Webhook body envelope.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct WebhookEvent {
    pub event: String,
    pub payload: InviteePayload,
}

impl WebhookEvent {
    /// # Errors
    ///
    /// Returns [`ProviderError::Parse`] for bodies of another shape.
    pub fn from_slice(body: &[u8]) -> Result<Self, ProviderError> {
        serde_json::from_slice(body).map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct Resource<T> {
    resource: T,
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Collection<T> {
    collection: Vec<T>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct WebhookSubscription {
    uri: String,
}

#[derive(Debug, Serialize)]
struct CreateWebhookRequest<'a> {
    url: &'a str,
    events: [&'static str; 2],
    organization: &'a str,
    user: &'a str,
    scope: &'static str,
    #[serde(skip_serializing_if = "str::is_empty")]
    signing_key: &'a str,
}

pub struct CalendlyClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_base: String,
    api_base: String,
}

impl CalendlyClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] without OAuth credentials.
    pub fn from_config(config: &CalendlyConfig) -> Result<Self, ProviderError> {
        if !config.is_configured() {
            return Err(ProviderError::NotConfigured("calendly"));
        }
        Ok(Self {
            http: build_client()?,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            auth_base: config.auth_base.trim_end_matches('/').to_string(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// OAuth authorize URL; `state` is echoed back to the callback.
    #[must_use]
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}/oauth/authorize?client_id={}&response_type=code&redirect_uri={}&state={}",
            self.auth_base,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(state),
        )
    }

    /// # Errors
    ///
    /// Returns [`ProviderError`] when the code is rejected.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, ProviderError> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])
        .await
    }

    /// # Errors
    ///
    /// Returns [`ProviderError`] when the refresh token is rejected.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, ProviderError> {
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<TokenGrant, ProviderError> {
        let mut form: Vec<(&str, &str)> = params.to_vec();
        form.push(("client_id", self.client_id.as_str()));
        form.push(("client_secret", self.client_secret.as_str()));
        let resp = self
            .http
            .post(format!("{}/oauth/token", self.auth_base))
            .form(&form)
            .send()
            .await?;
        Ok(check_response(PROVIDER, resp).await?.json().await?)
    }

    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport or API failure.
    pub async fn current_user(&self, access_token: &str) -> Result<CalendlyUser, ProviderError> {
        let resp = self
            .http
            .get(format!("{}/users/me", self.api_base))
            .bearer_auth(access_token)
            .send()
            .await?;
        let body: Resource<CalendlyUser> = check_response(PROVIDER, resp).await?.json().await?;
        Ok(body.resource)
    }

    /// Register a user-scoped webhook for invitee events; returns its URI.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport or API failure.
    pub async fn create_webhook_subscription(
        &self,
        access_token: &str,
        callback_url: &str,
        user: &CalendlyUser,
        signing_key: &str,
    ) -> Result<String, ProviderError> {
        let request = CreateWebhookRequest {
            url: callback_url,
            events: WEBHOOK_EVENTS,
            organization: &user.current_organization,
            user: &user.uri,
            scope: "user",
            signing_key,
        };
        let resp = self
            .http
            .post(format!("{}/webhook_subscriptions", self.api_base))
            .bearer_auth(access_token)
            .json(&request)
            .send()
            .await?;
        let body: Resource<WebhookSubscription> =
            check_response(PROVIDER, resp).await?.json().await?;
        Ok(body.resource.uri)
    }

    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport or API failure. A 404 counts as
    /// already deleted.
    pub async fn delete_webhook_subscription(
        &self,
        access_token: &str,
        webhook_uri: &str,
    ) -> Result<(), ProviderError> {
        let resp = self
            .http
            .delete(webhook_uri)
            .bearer_auth(access_token)
            .send()
            .await?;
        if resp.status() == 404 {
            return Ok(());
        }
        check_response(PROVIDER, resp).await?;
        Ok(())
    }

    /// Active scheduled events for `user_uri` starting within `[from, to)`.
    /// Follows pagination.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport or API failure.
    pub async fn list_scheduled_events(
        &self,
        access_token: &str,
        user_uri: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ScheduledEvent>, ProviderError> {
        let first = format!("{}/scheduled_events", self.api_base);
        let query = [
            ("user", user_uri.to_string()),
            ("min_start_time", from.to_rfc3339()),
            ("max_start_time", to.to_rfc3339()),
            ("status", "active".to_string()),
            ("count", "100".to_string()),
        ];
        let mut events = Vec::new();
        let mut resp = self
            .http
            .get(&first)
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await?;
        loop {
            let page: Collection<ScheduledEvent> =
                check_response(PROVIDER, resp).await?.json().await?;
            events.extend(page.collection);
            let Some(next) = page.pagination.next_page else {
                break;
            };
            resp = self.http.get(next).bearer_auth(access_token).send().await?;
        }
        Ok(events)
    }

    /// Active invitees of a scheduled event (first 100).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] on transport or API failure.
    pub async fn list_invitees(
        &self,
        access_token: &str,
        event_uri: &str,
    ) -> Result<Vec<Invitee>, ProviderError> {
        let resp = self
            .http
            .get(format!("{}/invitees", event_uri.trim_end_matches('/')))
            .bearer_auth(access_token)
            .query(&[("status", "active"), ("count", "100")])
            .send()
            .await?;
        let page: Collection<Invitee> = check_response(PROVIDER, resp).await?.json().await?;
        Ok(page.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client() -> CalendlyClient {
        CalendlyClient::from_config(&CalendlyConfig {
            client_id: "cid".into(),
            client_secret: "secret".into(),
            redirect_uri: "https://app.icflog.test/calendar?connected=1".into(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn authorize_url_is_encoded() {
        let url = client().authorize_url("user_1");
        assert_eq!(
            url,
            "https://auth.calendly.com/oauth/authorize?client_id=cid&response_type=code\
             &redirect_uri=https%3A%2F%2Fapp.icflog.test%2Fcalendar%3Fconnected%3D1&state=user_1"
        );
    }

    #[test]
    fn refresh_margin() {
        let now = Utc::now();
        assert!(needs_refresh(None, now));
        assert!(needs_refresh(Some(now + TimeDelta::seconds(30)), now));
        assert!(!needs_refresh(Some(now + TimeDelta::seconds(300)), now));
    }

    #[test]
    fn token_grant_expiry() {
        let grant: TokenGrant = serde_json::from_str(
            r#"{"token_type":"Bearer","access_token":"a","refresh_token":"r","expires_in":7200,
                "owner":"https://api.calendly.com/users/U1","organization":"https://api.calendly.com/organizations/O1"}"#,
        )
        .unwrap();
        let now = Utc::now();
        assert_eq!(grant.expires_at(now), now + TimeDelta::hours(2));
        assert_eq!(grant.owner.as_deref(), Some("https://api.calendly.com/users/U1"));

        let absurd = TokenGrant {
            expires_in: i64::MAX,
            ..grant
        };
        assert_eq!(absurd.expires_at(now), now);
        assert!(needs_refresh(Some(absurd.expires_at(now)), now));
    }

    #[test]
    fn parses_invitee_created_webhook() {
        let body = br#"{
            "event": "invitee.created",
            "created_at": "2026-03-01T10:00:00.000000Z",
            "payload": {
                "uri": "https://api.calendly.com/scheduled_events/E1/invitees/I1",
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "event": "https://api.calendly.com/scheduled_events/E1",
                "status": "active",
                "scheduled_event": {
                    "uri": "https://api.calendly.com/scheduled_events/E1",
                    "name": "Coaching 60",
                    "start_time": "2026-03-05T09:00:00.000000Z",
                    "end_time": "2026-03-05T10:00:00.000000Z",
                    "status": "active",
                    "event_memberships": [{"user": "https://api.calendly.com/users/U1"}]
                }
            }
        }"#;
        let event = WebhookEvent::from_slice(body).unwrap();
        assert_eq!(event.event, "invitee.created");
        let scheduled = event.payload.scheduled_event.unwrap();
        assert_eq!(
            scheduled.host_uris().collect::<Vec<_>>(),
            vec!["https://api.calendly.com/users/U1"]
        );
        assert_eq!((scheduled.end_time - scheduled.start_time).num_minutes(), 60);
    }

    #[test]
    fn webhook_request_omits_empty_signing_key() {
        let request = CreateWebhookRequest {
            url: "https://api.icflog.test/api/webhooks/calendly",
            events: WEBHOOK_EVENTS,
            organization: "org",
            user: "user",
            scope: "user",
            signing_key: "",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("signing_key").is_none());
        assert_eq!(json["events"][1], "invitee.canceled");
    }

    #[test]
    fn collection_page_parses() {
        let page: Collection<Invitee> = serde_json::from_str(
            r#"{"collection":[{"uri":"u","name":"N","email":null}],"pagination":{"next_page":null,"count":1}}"#,
        )
        .unwrap();
        assert_eq!(page.collection.len(), 1);
        assert!(page.pagination.next_page.is_none());
    }
}
