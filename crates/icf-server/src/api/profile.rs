use axum::Json;
use axum::extract::State;
use icf_core::entities::Profile;
use icf_db::updates::profile::ProfileUpdate;
use serde::Deserialize;

use super::AppState;
use super::error::ApiError;
use super::extract::{ApiJson, CurrentUser};

#[derive(Debug, Deserialize)]
pub struct EnsureProfile {
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Create the caller's profile on first sign-in; later calls only refresh
/// the email.
pub async fn ensure_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(body): ApiJson<EnsureProfile>,
) -> Result<Json<Profile>, ApiError> {
    let email = body.email.trim();
    if !email.contains('@') {
        return Err(ApiError::bad_request("a valid email is required"));
    }
    let full_name = body.full_name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let profile = state
        .service
        .ensure_profile(&user.user_id, email, full_name)
        .await?;
    tracing::debug!(user_id = %user.user_id, "profile ensured");
    Ok(Json(profile))
}

pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.service.get_profile(&user.user_id).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(
        state.service.update_profile(&user.user_id, &update).await?,
    ))
}
