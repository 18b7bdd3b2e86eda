//! Per-user CRUD: clients, coaching sessions, CPD entries, mentoring.
//!
//! Reads and deletes need only a session token. Creating sessions, CPD
//! entries and mentoring rows needs subscription access.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use icf_core::entities::{Client, CoachingSession, CpdEntry, MentoringSession};
use icf_core::enums::{MentoringKind, PaymentType, SessionSource, SessionType};
use icf_core::numeric::{NumberLocale, check_duration_minutes, parse_duration_minutes};
use icf_db::inputs::{NewClient, NewCoachingSession, NewCpdEntry, NewMentoringSession};
use icf_db::repos::DateRange;
use icf_db::repos::mentoring::MentoringFilter;
use icf_db::repos::session::SessionFilter;
use icf_db::updates::client::ClientUpdate;
use icf_db::updates::cpd::CpdUpdate;
use icf_db::updates::mentoring::MentoringUpdate;
use icf_db::updates::session::SessionUpdate;
use icf_providers::storage::key_belongs_to;
use serde::Deserialize;

use super::AppState;
use super::error::ApiError;
use super::extract::{ApiJson, ApiQuery, CurrentUser, Subscriber};

/// Document keys must come from an upload URL issued to the same user.
fn check_document(user_id: &str, path: Option<&str>) -> Result<(), ApiError> {
    match path {
        Some(key) if !key_belongs_to(key, user_id) => {
            Err(ApiError::Forbidden("document belongs to another user".into()))
        }
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ClientQuery {
    #[serde(default)]
    pub q: Option<String>,
}

pub async fn list_clients(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<ClientQuery>,
) -> Result<Json<Vec<Client>>, ApiError> {
    let q = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    Ok(Json(state.service.list_clients(&user.user_id, q).await?))
}

pub async fn create_client(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(new): ApiJson<NewClient>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    new.validate()?;
    let client = state.service.create_client(&user.user_id, &new).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn get_client(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Client>, ApiError> {
    Ok(Json(state.service.get_client(&user.user_id, &id).await?))
}

pub async fn update_client(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ClientUpdate>,
) -> Result<Json<Client>, ApiError> {
    Ok(Json(
        state.service.update_client(&user.user_id, &id, &update).await?,
    ))
}

pub async fn delete_client(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_client(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Coaching sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
    #[serde(default)]
    pub client_id: Option<String>,
}

/// Duration as whole minutes (`90`) or text (`"1:30"`, `"1,5h"`).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationInput {
    Minutes(i64),
    Text(String),
}

impl DurationInput {
    fn minutes(&self, locale: NumberLocale) -> Result<i64, ApiError> {
        match self {
            Self::Minutes(m) => Ok(check_duration_minutes(*m)?),
            Self::Text(text) => Ok(parse_duration_minutes(text, locale)?),
        }
    }
}

/// Create body. Either `ended_at` or `duration` fixes the length; the client
/// name defaults to the linked client's.
#[derive(Debug, Deserialize)]
pub struct SessionInput {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<DurationInput>,
    #[serde(default)]
    pub session_type: SessionType,
    #[serde(default)]
    pub payment_type: PaymentType,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub locale: NumberLocale,
}

pub async fn list_sessions(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<SessionQuery>,
) -> Result<Json<Vec<CoachingSession>>, ApiError> {
    let filter = SessionFilter {
        range: DateRange::new(query.from, query.to),
        client_id: query.client_id,
    };
    Ok(Json(state.service.list_sessions(&user.user_id, &filter).await?))
}

pub async fn create_session(
    State(state): State<AppState>,
    user: Subscriber,
    ApiJson(input): ApiJson<SessionInput>,
) -> Result<(StatusCode, Json<CoachingSession>), ApiError> {
    let ended_at = match (input.ended_at, &input.duration) {
        (Some(ended_at), _) => ended_at,
        (None, Some(duration)) => TimeDelta::try_minutes(duration.minutes(input.locale)?)
            .and_then(|length| input.started_at.checked_add_signed(length))
            .ok_or_else(|| ApiError::bad_request("session end is out of range"))?,
        (None, None) => {
            return Err(ApiError::bad_request("either ended_at or duration is required"));
        }
    };
    let client_name = match (&input.client_name, &input.client_id) {
        (Some(name), _) => name.clone(),
        (None, Some(client_id)) => state.service.get_client(&user.user_id, client_id).await?.name,
        (None, None) => String::new(),
    };

    let mut new =
        NewCoachingSession::from_range(client_name, input.started_at, ended_at, SessionSource::Manual);
    new.client_id = input.client_id;
    new.session_type = input.session_type;
    new.payment_type = input.payment_type;
    new.notes = input.notes;

    let session = state.service.create_session(&user.user_id, &new).await?;
    tracing::debug!(user_id = %user.user_id, session_id = %session.id, "session logged");
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_session(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<CoachingSession>, ApiError> {
    Ok(Json(state.service.get_session(&user.user_id, &id).await?))
}

pub async fn update_session(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<SessionUpdate>,
) -> Result<Json<CoachingSession>, ApiError> {
    Ok(Json(
        state.service.update_session(&user.user_id, &id, &update).await?,
    ))
}

pub async fn delete_session(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_session(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// CPD
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

pub async fn list_cpd(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> Result<Json<Vec<CpdEntry>>, ApiError> {
    let range = DateRange::new(query.from, query.to);
    Ok(Json(state.service.list_cpd_entries(&user.user_id, &range).await?))
}

pub async fn create_cpd(
    State(state): State<AppState>,
    user: Subscriber,
    ApiJson(new): ApiJson<NewCpdEntry>,
) -> Result<(StatusCode, Json<CpdEntry>), ApiError> {
    check_document(&user.user_id, new.document_path.as_deref())?;
    let entry = state.service.create_cpd_entry(&user.user_id, &new).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_cpd(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<CpdEntry>, ApiError> {
    Ok(Json(state.service.get_cpd_entry(&user.user_id, &id).await?))
}

pub async fn update_cpd(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<CpdUpdate>,
) -> Result<Json<CpdEntry>, ApiError> {
    check_document(&user.user_id, update.document_path.clone().flatten().as_deref())?;
    Ok(Json(
        state.service.update_cpd_entry(&user.user_id, &id, &update).await?,
    ))
}

pub async fn delete_cpd(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_cpd_entry(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Mentoring / supervision
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct MentoringQuery {
    #[serde(default)]
    pub kind: Option<MentoringKind>,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

pub async fn list_mentoring(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<MentoringQuery>,
) -> Result<Json<Vec<MentoringSession>>, ApiError> {
    let filter = MentoringFilter {
        range: DateRange::new(query.from, query.to),
        kind: query.kind,
    };
    Ok(Json(
        state
            .service
            .list_mentoring_sessions(&user.user_id, &filter)
            .await?,
    ))
}

pub async fn create_mentoring(
    State(state): State<AppState>,
    user: Subscriber,
    ApiJson(new): ApiJson<NewMentoringSession>,
) -> Result<(StatusCode, Json<MentoringSession>), ApiError> {
    check_document(&user.user_id, new.document_path.as_deref())?;
    let session = state
        .service
        .create_mentoring_session(&user.user_id, &new)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn get_mentoring(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<MentoringSession>, ApiError> {
    Ok(Json(
        state.service.get_mentoring_session(&user.user_id, &id).await?,
    ))
}

pub async fn update_mentoring(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<MentoringUpdate>,
) -> Result<Json<MentoringSession>, ApiError> {
    check_document(&user.user_id, update.document_path.clone().flatten().as_deref())?;
    Ok(Json(
        state
            .service
            .update_mentoring_session(&user.user_id, &id, &update)
            .await?,
    ))
}

pub async fn delete_mentoring(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .service
        .delete_mentoring_session(&user.user_id, &id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
