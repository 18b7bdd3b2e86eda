//! Scheduling provider connection: OAuth, sync and disconnect. Inbound
//! webhooks live in `webhooks`.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, TimeDelta, Utc};
use icf_core::entities::CalendlyConnection;
use icf_core::enums::SessionSource;
use icf_db::error::DatabaseError;
use icf_db::inputs::NewCoachingSession;
use icf_db::service::IcfService;
use icf_providers::CalendlyClient;
use icf_providers::calendly::{ScheduledEvent, needs_refresh};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::ApiError;
use super::extract::{ApiJson, ApiQuery, CurrentUser, Subscriber};

const DEFAULT_SYNC_DAYS: i64 = 30;

fn client(state: &AppState) -> Result<&CalendlyClient, ApiError> {
    state
        .calendly
        .as_ref()
        .ok_or(ApiError::NotConfigured("calendly"))
}

/// The invitee half of a booking.
pub(crate) struct InviteeRecord<'a> {
    pub uri: &'a str,
    pub name: &'a str,
    pub email: Option<&'a str>,
}

/// Log a booked invitee as a coaching session for `user_id`. A client with
/// the invitee's email is linked. Returns `false` when the invitee was
/// already recorded.
pub(crate) async fn record_invitee(
    svc: &IcfService,
    user_id: &str,
    event: &ScheduledEvent,
    invitee: &InviteeRecord<'_>,
) -> Result<bool, ApiError> {
    if svc.session_exists_for_invitee(invitee.uri).await? {
        return Ok(false);
    }
    let name = if invitee.name.trim().is_empty() {
        event.name.as_deref().unwrap_or("Calendly booking")
    } else {
        invitee.name.trim()
    };
    let mut new =
        NewCoachingSession::from_range(name, event.start_time, event.end_time, SessionSource::Calendly);
    new.calendly_event_uri = Some(event.uri.clone());
    new.calendly_invitee_uri = Some(invitee.uri.to_string());
    if let Some(email) = invitee.email {
        new.client_id = svc
            .find_client_by_email(user_id, email)
            .await?
            .map(|client| client.id);
    }

    match svc.create_session(user_id, &new).await {
        Ok(_) => Ok(true),
        Err(DatabaseError::Conflict(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// A usable access token, refreshing and persisting it when close to expiry.
async fn access_token(
    state: &AppState,
    calendly: &CalendlyClient,
    user_id: &str,
    connection: &CalendlyConnection,
) -> Result<String, ApiError> {
    let Some(token) = connection.access_token.as_deref() else {
        return Err(ApiError::bad_request("calendly is not connected"));
    };
    let now = Utc::now();
    if !needs_refresh(connection.token_expires_at, now) {
        return Ok(token.to_string());
    }
    let Some(refresh_token) = connection.refresh_token.as_deref() else {
        return Err(ApiError::bad_request("calendly connection has expired"));
    };
    let grant = calendly.refresh(refresh_token).await?;
    let refreshed = CalendlyConnection {
        access_token: Some(grant.access_token.clone()),
        refresh_token: Some(grant.refresh_token.clone()),
        token_expires_at: Some(grant.expires_at(now)),
        ..connection.clone()
    };
    state
        .service
        .save_calendly_connection(user_id, &refreshed)
        .await?;
    tracing::debug!(user_id, "calendly token refreshed");
    Ok(grant.access_token)
}

#[derive(Debug, Serialize)]
pub struct AuthorizeUrl {
    pub url: String,
}

pub async fn connect(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<AuthorizeUrl>, ApiError> {
    let calendly = client(&state)?;
    Ok(Json(AuthorizeUrl {
        url: calendly.authorize_url(&user.user_id),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CallbackBody {
    pub code: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Finish the OAuth flow: store tokens and register the webhook
/// subscription. A failed webhook registration still leaves the account
/// connected; sync works without it.
pub async fn callback(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(body): ApiJson<CallbackBody>,
) -> Result<Json<CalendlyConnection>, ApiError> {
    let calendly = client(&state)?;
    if body.state.as_deref().is_some_and(|s| s != user.user_id) {
        return Err(ApiError::bad_request("oauth state does not match"));
    }
    let grant = calendly.exchange_code(&body.code).await?;
    let owner = calendly.current_user(&grant.access_token).await?;

    let config = &state.config.calendly;
    let webhook_uri = if config.webhook_url.is_empty() {
        None
    } else {
        match calendly
            .create_webhook_subscription(
                &grant.access_token,
                &config.webhook_url,
                &owner,
                &config.webhook_signing_key,
            )
            .await
        {
            Ok(uri) => Some(uri),
            Err(error) => {
                tracing::warn!(user_id = %user.user_id, %error, "calendly webhook registration failed");
                None
            }
        }
    };

    let connection = CalendlyConnection {
        token_expires_at: Some(grant.expires_at(Utc::now())),
        access_token: Some(grant.access_token),
        refresh_token: Some(grant.refresh_token),
        user_uri: Some(owner.uri),
        organization_uri: Some(owner.current_organization),
        webhook_uri,
    };
    state
        .service
        .save_calendly_connection(&user.user_id, &connection)
        .await?;
    tracing::info!(user_id = %user.user_id, "calendly connected");
    Ok(Json(connection))
}

#[derive(Debug, Default, Deserialize)]
pub struct SyncWindow {
    #[serde(default)]
    pub from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub events: usize,
    pub imported: usize,
    pub skipped: usize,
}

/// Import scheduled events in a window (default: the last 30 days).
pub async fn sync(
    State(state): State<AppState>,
    user: Subscriber,
    ApiQuery(window): ApiQuery<SyncWindow>,
) -> Result<Json<SyncReport>, ApiError> {
    let calendly = client(&state)?;
    let connection = &user.profile.calendly;
    let Some(user_uri) = connection.user_uri.as_deref() else {
        return Err(ApiError::bad_request("calendly is not connected"));
    };
    let to = window.to.unwrap_or_else(Utc::now);
    let from = window
        .from
        .unwrap_or_else(|| to - TimeDelta::days(DEFAULT_SYNC_DAYS));
    if from > to {
        return Err(ApiError::bad_request("from must not be after to"));
    }

    let token = access_token(&state, calendly, &user.user_id, connection).await?;
    let events = calendly
        .list_scheduled_events(&token, user_uri, from, to)
        .await?;
    let mut report = SyncReport {
        events: events.len(),
        ..SyncReport::default()
    };
    for event in &events {
        for invitee in calendly.list_invitees(&token, &event.uri).await? {
            let record = InviteeRecord {
                uri: &invitee.uri,
                name: &invitee.name,
                email: invitee.email.as_deref(),
            };
            if record_invitee(&state.service, &user.user_id, event, &record).await? {
                report.imported += 1;
            } else {
                report.skipped += 1;
            }
        }
    }
    tracing::info!(
        user_id = %user.user_id,
        events = report.events,
        imported = report.imported,
        skipped = report.skipped,
        "calendly sync finished"
    );
    Ok(Json(report))
}

/// Clear stored tokens. The webhook subscription is removed when possible.
pub async fn disconnect(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<StatusCode, ApiError> {
    let profile = state.service.get_profile(&user.user_id).await?;
    let connection = &profile.calendly;
    if let (Some(calendly), Some(webhook_uri)) =
        (state.calendly.as_ref(), connection.webhook_uri.as_deref())
    {
        let removed = match access_token(&state, calendly, &user.user_id, connection).await {
            Ok(token) => calendly
                .delete_webhook_subscription(&token, webhook_uri)
                .await
                .map_err(ApiError::from),
            Err(e) => Err(e),
        };
        if let Err(error) = removed {
            tracing::warn!(user_id = %user.user_id, %error, "calendly webhook not removed");
        }
    }
    state
        .service
        .save_calendly_connection(&user.user_id, &CalendlyConnection::default())
        .await?;
    tracing::info!(user_id = %user.user_id, "calendly disconnected");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{TimeDelta, Utc};
    use icf_auth::webhook_signature::sign;
    use icf_core::entities::CalendlyConnection;
    use icf_db::repos::session::SessionFilter;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::api::test_support::{ProviderStub, TestApp};

    #[tokio::test]
    async fn connect_needs_calendly() {
        let app = TestApp::new().await;
        let (status, body) = app.get("/api/calendly/connect", Some("u1")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "calendly is not configured");
    }

    #[tokio::test]
    async fn disconnect_clears_connection() {
        let app = TestApp::new().await;
        app.profile("u1").await;
        app.service
            .save_calendly_connection(
                "u1",
                &CalendlyConnection {
                    access_token: Some("at".into()),
                    refresh_token: Some("rt".into()),
                    user_uri: Some("https://api.calendly.com/users/me".into()),
                    ..CalendlyConnection::default()
                },
            )
            .await
            .unwrap();

        let (status, _) = app.delete("/api/calendly", Some("u1")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let profile = app.service.get_profile("u1").await.unwrap();
        assert!(!profile.calendly.is_connected());
        assert_eq!(profile.calendly.user_uri, None);
    }

    #[tokio::test]
    async fn callback_connects_and_registers_webhook() {
        let stub = ProviderStub::start().await;
        let app = TestApp::with_config(stub.config()).await;
        app.profile("u1").await;

        let (status, body) = app
            .post(
                "/api/calendly/callback",
                Some("u1"),
                json!({"code": "code_1", "state": "u1"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user_uri"], stub.user_uri());
        assert!(body.get("access_token").is_none());

        let tokens = stub.calls("token");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].params["grant_type"], "authorization_code");
        assert_eq!(tokens[0].params["code"], "code_1");
        assert_eq!(tokens[0].params["client_id"], "cid");

        let hooks = stub.calls("create_webhook");
        assert_eq!(hooks.len(), 1);
        assert_eq!(hooks[0].bearer.as_deref(), Some("at_1"));
        assert_eq!(hooks[0].params["url"], "https://icflog.test/api/webhooks/calendly");
        assert_eq!(hooks[0].params["user"], stub.user_uri());

        let connection = app.service.get_profile("u1").await.unwrap().calendly;
        assert_eq!(connection.access_token.as_deref(), Some("at_1"));
        assert_eq!(connection.refresh_token.as_deref(), Some("rt_1"));
        assert_eq!(
            connection.webhook_uri,
            Some(format!("{}/webhook_subscriptions/W1", stub.base))
        );
        assert!(connection.token_expires_at.unwrap() > Utc::now());

        let (status, _) = app.delete("/api/calendly", Some("u1")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let removed = stub.calls("delete_webhook");
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].params["id"], "W1");
        assert_eq!(removed[0].bearer.as_deref(), Some("at_1"));
    }

    #[tokio::test]
    async fn callback_rejects_foreign_state() {
        let stub = ProviderStub::start().await;
        let app = TestApp::with_config(stub.config()).await;
        app.profile("u1").await;

        let (status, body) = app
            .post(
                "/api/calendly/callback",
                Some("u1"),
                json!({"code": "code_1", "state": "u2"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "oauth state does not match");
        assert!(stub.calls("token").is_empty());
    }

    #[tokio::test]
    async fn sync_refreshes_stale_token_and_skips_known_invitees() {
        let stub = ProviderStub::start().await;
        let app = TestApp::with_config(stub.config()).await;
        app.subscriber("u1").await;
        app.service
            .save_calendly_connection(
                "u1",
                &CalendlyConnection {
                    access_token: Some("at_stale".into()),
                    refresh_token: Some("rt_0".into()),
                    token_expires_at: Some(Utc::now() - TimeDelta::minutes(5)),
                    user_uri: Some(stub.user_uri()),
                    ..CalendlyConnection::default()
                },
            )
            .await
            .unwrap();
        let (_, ada) = app
            .post(
                "/api/clients",
                Some("u1"),
                json!({"name": "Ada", "email": "ada@example.com"}),
            )
            .await;

        let (status, report) = app.json("POST", "/api/calendly/sync", Some("u1"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report, json!({"events": 1, "imported": 2, "skipped": 0}));

        let tokens = stub.calls("token");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].params["grant_type"], "refresh_token");
        assert_eq!(tokens[0].params["refresh_token"], "rt_0");
        let events = stub.calls("events");
        assert_eq!(events[0].bearer.as_deref(), Some("at_2"));
        assert_eq!(events[0].params["user"], stub.user_uri());
        let connection = app.service.get_profile("u1").await.unwrap().calendly;
        assert_eq!(connection.access_token.as_deref(), Some("at_2"));
        assert_eq!(connection.refresh_token.as_deref(), Some("rt_2"));

        let sessions = app
            .service
            .list_sessions("u1", &SessionFilter::default())
            .await
            .unwrap();
        assert_eq!(sessions.len(), 2);
        let linked = sessions
            .iter()
            .find(|s| s.calendly_invitee_uri.as_deref() == Some(stub.invitee_uri("I1").as_str()))
            .unwrap();
        assert_eq!(linked.client_name, "Ada Lovelace");
        assert_eq!(linked.client_id.as_deref(), ada["id"].as_str());
        assert_eq!(linked.duration_minutes, 60);
        let unnamed = sessions
            .iter()
            .find(|s| s.calendly_invitee_uri.as_deref() == Some(stub.invitee_uri("I2").as_str()))
            .unwrap();
        assert_eq!(unnamed.client_name, "Coaching");

        let (_, again) = app.json("POST", "/api/calendly/sync", Some("u1"), None).await;
        assert_eq!(again, json!({"events": 1, "imported": 0, "skipped": 2}));
        assert_eq!(stub.calls("token").len(), 1);

        let webhook = json!({
            "event": "invitee.created",
            "payload": {
                "uri": stub.invitee_uri("I1"),
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "scheduled_event": {
                    "uri": format!("{}/scheduled_events/E1", stub.base),
                    "name": "Coaching",
                    "start_time": "2026-04-01T10:00:00Z",
                    "end_time": "2026-04-01T11:00:00Z",
                    "event_memberships": [{"user": stub.user_uri()}]
                }
            }
        })
        .to_string();
        let signature = sign("calendly_stub_key", Utc::now().timestamp(), webhook.as_bytes());
        let (status, _) = app
            .raw(
                "POST",
                "/api/webhooks/calendly",
                None,
                &[
                    ("content-type", "application/json"),
                    ("calendly-webhook-signature", signature.as_str()),
                ],
                webhook,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let sessions = app
            .service
            .list_sessions("u1", &SessionFilter::default())
            .await
            .unwrap();
        assert_eq!(sessions.len(), 2);
    }
}
