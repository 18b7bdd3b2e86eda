//! Admin console: user list and scheduled broadcast emails.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use icf_core::entities::{Profile, ScheduledEmail};
use icf_db::inputs::NewScheduledEmail;
use icf_notify::ScheduledReport;

use super::AppState;
use super::error::ApiError;
use super::extract::{AdminUser, ApiJson, BatchCaller};

pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Profile>>, ApiError> {
    Ok(Json(state.service.list_profiles().await?))
}

pub async fn list_scheduled_emails(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<ScheduledEmail>>, ApiError> {
    Ok(Json(state.service.list_scheduled_emails().await?))
}

pub async fn schedule_email(
    State(state): State<AppState>,
    admin: AdminUser,
    ApiJson(new): ApiJson<NewScheduledEmail>,
) -> Result<(StatusCode, Json<ScheduledEmail>), ApiError> {
    new.validate()?;
    let email = state
        .service
        .create_scheduled_email(&admin.profile.user_id, &new)
        .await?;
    tracing::info!(
        id = %email.id,
        audience = %email.audience,
        scheduled_for = %email.scheduled_for,
        "broadcast email scheduled"
    );
    Ok((StatusCode::CREATED, Json(email)))
}

/// Only pending emails can be cancelled.
pub async fn cancel_scheduled_email(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ScheduledEmail>, ApiError> {
    Ok(Json(state.service.cancel_scheduled_email(&id).await?))
}

pub async fn process_scheduled_emails(
    State(state): State<AppState>,
    caller: BatchCaller,
) -> Result<Json<ScheduledReport>, ApiError> {
    tracing::info!(caller = ?caller, "scheduled email run requested");
    Ok(Json(state.notifier.process_scheduled(Utc::now()).await?))
}
