//! Router test harness: in-memory database, a fake token verifier,
//! `tower::ServiceExt::oneshot` requests and a local stand-in for the
//! payment and scheduling APIs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::{Form, Path, Query, State};
use axum::http::{HeaderMap, Request, StatusCode, header};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::{TimeDelta, Utc};
use icf_auth::{AuthError, SessionClaims, TokenVerifier};
use icf_config::IcfConfig;
use icf_core::enums::{Role, SubscriptionStatus};
use icf_db::service::IcfService;
use icf_db::updates::profile::SubscriptionUpdate;
use icf_notify::{Notifier, NotifySettings};
use icf_providers::{EmailMessage, EmailSender, ProviderError};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower::ServiceExt;

use super::router;
use crate::context::AppContext;

pub const CRON_SECRET: &str = "cron-secret-for-tests";

/// Treats the bearer token as the user id. `expired` is rejected.
pub struct FakeVerifier;

#[async_trait]
impl TokenVerifier for FakeVerifier {
    async fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        if token == "expired" {
            return Err(AuthError::TokenExpired);
        }
        Ok(SessionClaims {
            user_id: token.to_string(),
            expires_at: Utc::now() + TimeDelta::hours(1),
        })
    }
}

/// Records sent emails.
#[derive(Default)]
pub struct RecordingEmail {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl EmailSender for RecordingEmail {
    async fn send(&self, message: &EmailMessage) -> Result<String, ProviderError> {
        let mut sent = self.sent.lock().expect("email lock");
        sent.push(message.clone());
        Ok(format!("msg_{}", sent.len()))
    }
}

pub struct TestApp {
    pub service: Arc<IcfService>,
    pub email: Arc<RecordingEmail>,
    router: Router,
}

pub fn test_config() -> IcfConfig {
    let mut config = IcfConfig::default();
    config.notifications.cron_secret = CRON_SECRET.to_string();
    config.notifications.send_delay_ms = 0;
    config
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: IcfConfig) -> Self {
        let service = Arc::new(IcfService::new_local(":memory:").await.unwrap());
        let email = Arc::new(RecordingEmail::default());
        let mut ctx = AppContext::with_service(
            Arc::clone(&service),
            config.clone(),
            Some(Arc::new(FakeVerifier)),
        )
        .unwrap();
        ctx.notifier = Notifier::new(
            Arc::clone(&service),
            Some(Arc::clone(&email) as Arc<dyn EmailSender>),
            None,
            NotifySettings::from_config(&config),
        );
        Self {
            service,
            email,
            router: router(Arc::new(ctx)),
        }
    }

    /// A plain profile without subscription access.
    pub async fn profile(&self, user_id: &str) {
        self.service
            .ensure_profile(user_id, &format!("{user_id}@example.com"), Some("Test Coach"))
            .await
            .unwrap();
    }

    /// A profile in an active trial.
    pub async fn subscriber(&self, user_id: &str) {
        self.profile(user_id).await;
        self.service
            .update_subscription(user_id, &SubscriptionUpdate::status(SubscriptionStatus::Trialing))
            .await
            .unwrap();
    }

    pub async fn admin(&self, user_id: &str) {
        self.profile(user_id).await;
        self.service.set_role(user_id, Role::Admin).await.unwrap();
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body)
    }

    pub async fn raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        headers: &[(&str, &str)],
        body: impl Into<Body>,
    ) -> (StatusCode, Bytes) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.send(builder.body(body.into()).unwrap()).await
    }

    pub async fn json(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (headers, body): (&[(&str, &str)], Body) = match body {
            Some(value) => (
                &[("content-type", "application/json")],
                Body::from(value.to_string()),
            ),
            None => (&[], Body::empty()),
        };
        let (status, bytes) = self.raw(method, uri, token, headers, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.json("GET", uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.json("POST", uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.json("PATCH", uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.json("DELETE", uri, token, None).await
    }
}

/// One request seen by [`ProviderStub`].
#[derive(Debug, Clone)]
pub struct StubCall {
    pub route: &'static str,
    pub bearer: Option<String>,
    /// Form body or query string.
    pub params: HashMap<String, String>,
}

#[derive(Clone)]
struct StubState {
    base: String,
    calls: Arc<Mutex<Vec<StubCall>>>,
}

impl StubState {
    fn record(&self, route: &'static str, headers: &HeaderMap, params: HashMap<String, String>) {
        let bearer = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);
        self.calls.lock().unwrap().push(StubCall {
            route,
            bearer,
            params,
        });
    }
}

/// Serves the Stripe and Calendly endpoints the clients call, on a random
/// local port. Calendly URIs it hands out point back at itself.
pub struct ProviderStub {
    pub base: String,
    calls: Arc<Mutex<Vec<StubCall>>>,
}

pub const STUB_SUBSCRIPTION_END: i64 = 1_790_000_000;

impl ProviderStub {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let state = StubState {
            base: base.clone(),
            calls: Arc::default(),
        };
        let app = Router::new()
            .route("/v1/checkout/sessions", post(stripe_checkout))
            .route("/v1/billing_portal/sessions", post(stripe_portal))
            .route("/v1/subscriptions/{id}", get(stripe_subscription))
            .route("/oauth/token", post(calendly_token))
            .route("/users/me", get(calendly_me))
            .route("/webhook_subscriptions", post(calendly_create_webhook))
            .route("/webhook_subscriptions/{id}", delete(calendly_delete_webhook))
            .route("/scheduled_events", get(calendly_events))
            .route("/scheduled_events/{id}/invitees", get(calendly_invitees))
            .with_state(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base,
            calls: state.calls,
        }
    }

    /// Calls made to one route, oldest first.
    pub fn calls(&self, route: &str) -> Vec<StubCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.route == route)
            .cloned()
            .collect()
    }

    pub fn user_uri(&self) -> String {
        format!("{}/users/U1", self.base)
    }

    pub fn invitee_uri(&self, id: &str) -> String {
        format!("{}/scheduled_events/E1/invitees/{id}", self.base)
    }

    /// Test config with both providers pointed at this stub.
    pub fn config(&self) -> IcfConfig {
        let mut config = test_config();
        config.stripe.secret_key = "sk_test_stub".into();
        config.stripe.webhook_secret = "whsec_stub".into();
        config.stripe.monthly_price_id = "price_monthly".into();
        config.stripe.annual_price_id = "price_annual".into();
        config.stripe.api_base.clone_from(&self.base);
        config.calendly.client_id = "cid".into();
        config.calendly.client_secret = "csecret".into();
        config.calendly.redirect_uri = "https://icflog.test/calendar".into();
        config.calendly.webhook_signing_key = "calendly_stub_key".into();
        config.calendly.webhook_url = "https://icflog.test/api/webhooks/calendly".into();
        config.calendly.auth_base.clone_from(&self.base);
        config.calendly.api_base.clone_from(&self.base);
        config
    }
}

async fn stripe_checkout(
    State(stub): State<StubState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    stub.record("checkout", &headers, form);
    Json(json!({"id": "cs_1", "url": "https://checkout.stripe.test/cs_1"}))
}

async fn stripe_portal(
    State(stub): State<StubState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    stub.record("portal", &headers, form);
    Json(json!({"id": "bps_1", "url": "https://billing.stripe.test/bps_1"}))
}

async fn stripe_subscription(
    State(stub): State<StubState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Json<Value> {
    stub.record("subscription", &headers, HashMap::from([("id".into(), id.clone())]));
    Json(json!({
        "id": id,
        "customer": "cus_1",
        "status": "trialing",
        "cancel_at_period_end": false,
        "trial_end": STUB_SUBSCRIPTION_END,
        "items": {"data": [{"price": {"id": "price_monthly"}, "current_period_end": STUB_SUBSCRIPTION_END}]}
    }))
}

/// `authorization_code` grants `at_1`, `refresh_token` grants `at_2`.
async fn calendly_token(
    State(stub): State<StubState>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    let refreshed = form.get("grant_type").map(String::as_str) == Some("refresh_token");
    stub.record("token", &headers, form);
    let (access, refresh) = if refreshed { ("at_2", "rt_2") } else { ("at_1", "rt_1") };
    Json(json!({
        "token_type": "Bearer",
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": 7200,
    }))
}

async fn calendly_me(State(stub): State<StubState>, headers: HeaderMap) -> Json<Value> {
    stub.record("me", &headers, HashMap::new());
    Json(json!({"resource": {
        "uri": format!("{}/users/U1", stub.base),
        "name": "Coach One",
        "current_organization": format!("{}/organizations/O1", stub.base),
    }}))
}

async fn calendly_create_webhook(
    State(stub): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let params = HashMap::from([
        ("url".to_string(), body["url"].as_str().unwrap_or_default().to_string()),
        ("user".to_string(), body["user"].as_str().unwrap_or_default().to_string()),
    ]);
    stub.record("create_webhook", &headers, params);
    (
        StatusCode::CREATED,
        Json(json!({"resource": {"uri": format!("{}/webhook_subscriptions/W1", stub.base)}})),
    )
}

async fn calendly_delete_webhook(
    State(stub): State<StubState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> StatusCode {
    stub.record("delete_webhook", &headers, HashMap::from([("id".into(), id)]));
    StatusCode::NO_CONTENT
}

async fn calendly_events(
    State(stub): State<StubState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    stub.record("events", &headers, query);
    Json(json!({
        "collection": [{
            "uri": format!("{}/scheduled_events/E1", stub.base),
            "name": "Coaching",
            "start_time": "2026-04-01T10:00:00Z",
            "end_time": "2026-04-01T11:00:00Z",
            "status": "active",
            "event_memberships": [{"user": format!("{}/users/U1", stub.base)}]
        }],
        "pagination": {"next_page": null}
    }))
}

async fn calendly_invitees(
    State(stub): State<StubState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Json<Value> {
    stub.record("invitees", &headers, HashMap::from([("event".into(), id.clone())]));
    Json(json!({
        "collection": [
            {
                "uri": format!("{}/scheduled_events/{id}/invitees/I1", stub.base),
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "status": "active"
            },
            {
                "uri": format!("{}/scheduled_events/{id}/invitees/I2", stub.base),
                "name": "",
                "status": "active"
            }
        ],
        "pagination": {"next_page": null}
    }))
}
