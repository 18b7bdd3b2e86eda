//! Request extractors: JSON/query bodies with `ApiError` rejections and the
//! caller identities (`CurrentUser`, `Subscriber`, `AdminUser`, `BatchCaller`).

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::Json;
use icf_auth::{AuthError, bearer_token, matches_cron_secret};
use icf_core::entities::Profile;
use serde::de::DeserializeOwned;

use super::AppState;
use super::error::ApiError;

/// `Json<T>` whose rejection renders as `{"error": ...}`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// `Query<T>` whose rejection renders as `{"error": ...}`.
pub struct ApiQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

fn request_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| AuthError::MissingToken.into())
}

async fn verify_user(state: &AppState, token: &str) -> Result<String, ApiError> {
    let verifier = state
        .verifier
        .as_ref()
        .ok_or(ApiError::NotConfigured("auth"))?;
    let claims = verifier.verify(token).await?;
    Ok(claims.user_id)
}

async fn require_admin(state: &AppState, user_id: &str) -> Result<Profile, ApiError> {
    match state.service.find_profile(user_id).await? {
        Some(profile) if profile.is_admin() => Ok(profile),
        _ => {
            tracing::warn!(user_id, "admin route refused");
            Err(AuthError::Forbidden.into())
        }
    }
}

/// Any caller holding a valid session token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = request_token(parts)?;
        let user_id = verify_user(state, token).await?;
        Ok(Self { user_id })
    }
}

/// A caller whose subscription is `trialing` or `active`.
#[derive(Debug, Clone)]
pub struct Subscriber {
    pub user_id: String,
    pub profile: Profile,
}

impl FromRequestParts<AppState> for Subscriber {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser { user_id } = CurrentUser::from_request_parts(parts, state).await?;
        let profile = state
            .service
            .find_profile(&user_id)
            .await?
            .filter(Profile::has_access)
            .ok_or(ApiError::PaymentRequired)?;
        Ok(Self { user_id, profile })
    }
}

/// A caller whose stored profile has the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub profile: Profile,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser { user_id } = CurrentUser::from_request_parts(parts, state).await?;
        let profile = require_admin(state, &user_id).await?;
        Ok(Self { profile })
    }
}

/// Batch routes accept the shared cron secret or an admin session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchCaller {
    Cron,
    Admin(String),
}

impl FromRequestParts<AppState> for BatchCaller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = request_token(parts)?;
        if matches_cron_secret(token, &state.config.notifications.cron_secret) {
            return Ok(Self::Cron);
        }
        let user_id = verify_user(state, token).await?;
        require_admin(state, &user_id).await?;
        Ok(Self::Admin(user_id))
    }
}
