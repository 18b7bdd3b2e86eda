use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use icf_core::entities::PushSubscription;
use icf_db::inputs::NewPushSubscription;
use icf_notify::{PushReport, ReminderReport};
use icf_providers::PushMessage;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::AppState;
use super::error::ApiError;
use super::extract::{AdminUser, ApiJson, BatchCaller, CurrentUser};

/// Public VAPID key the browser needs to subscribe.
pub async fn vapid_key(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let push = &state.config.push;
    if !push.is_configured() {
        return Err(ApiError::NotConfigured("push"));
    }
    Ok(Json(json!({"public_key": push.vapid_public_key})))
}

pub async fn subscribe(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(new): ApiJson<NewPushSubscription>,
) -> Result<(StatusCode, Json<PushSubscription>), ApiError> {
    if new.endpoint.trim().is_empty() || new.p256dh.is_empty() || new.auth.is_empty() {
        return Err(ApiError::bad_request("endpoint and keys are required"));
    }
    state.service.get_profile(&user.user_id).await?;
    let subscription = state
        .service
        .upsert_push_subscription(&user.user_id, &new)
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

#[derive(Debug, Deserialize)]
pub struct Unsubscribe {
    pub endpoint: String,
}

#[derive(Debug, Serialize)]
pub struct Removed {
    pub removed: bool,
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(body): ApiJson<Unsubscribe>,
) -> Result<Json<Removed>, ApiError> {
    let removed = state
        .service
        .delete_push_subscription(&user.user_id, &body.endpoint)
        .await?;
    Ok(Json(Removed { removed }))
}

#[derive(Debug, Deserialize)]
pub struct SendPush {
    /// Everyone with a subscription when absent.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub message: PushMessage,
}

pub async fn send_push(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(body): ApiJson<SendPush>,
) -> Result<Json<PushReport>, ApiError> {
    if body.message.title.trim().is_empty() {
        return Err(ApiError::bad_request("title is required"));
    }
    let report = state
        .notifier
        .send_push(body.user_id.as_deref(), &body.message)
        .await?;
    tracing::info!(
        admin = %admin.profile.user_id,
        sent = report.sent,
        failed = report.failed,
        "push broadcast"
    );
    Ok(Json(report))
}

pub async fn check_and_send(
    State(state): State<AppState>,
    caller: BatchCaller,
) -> Result<Json<ReminderReport>, ApiError> {
    tracing::info!(caller = ?caller, "reminder run requested");
    Ok(Json(state.notifier.check_and_send(Utc::now()).await?))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::api::test_support::{CRON_SECRET, TestApp};

    #[tokio::test]
    async fn check_and_send_accepts_cron_secret() {
        let app = TestApp::new().await;
        let (status, body) = app
            .json("POST", "/api/notifications/check-and-send", Some(CRON_SECRET), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["failures"], 0);
    }

    #[tokio::test]
    async fn check_and_send_rejects_coaches() {
        let app = TestApp::new().await;
        app.profile("coach").await;
        let (status, _) = app
            .json("POST", "/api/notifications/check-and-send", Some("coach"), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn subscribe_and_unsubscribe() {
        let app = TestApp::new().await;
        app.profile("u1").await;
        let endpoint = "https://push.example.com/send/abc";
        let (status, body) = app
            .post(
                "/api/push/subscribe",
                Some("u1"),
                json!({"endpoint": endpoint, "p256dh": "key", "auth": "secret"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["endpoint"], endpoint);

        let (status, body) = app
            .json(
                "DELETE",
                "/api/push/subscribe",
                Some("u1"),
                Some(json!({"endpoint": endpoint})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], true);
    }

    #[tokio::test]
    async fn push_send_needs_push_keys() {
        let app = TestApp::new().await;
        app.admin("boss").await;
        let (status, body) = app
            .post(
                "/api/push/send",
                Some("boss"),
                json!({"title": "Hello", "body": "Log your hours"}),
            )
            .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "push is not configured");
    }
}
