//! Coaching session repository.

use chrono::Utc;

use icf_core::entities::CoachingSession;
use icf_core::ids::PREFIX_SESSION;
use icf_core::numeric::MAX_SESSION_MINUTES;

use super::DateRange;
use crate::error::DatabaseError;
use crate::helpers::{collect_rows, get_opt_string, parse_datetime, parse_enum};
use crate::inputs::NewCoachingSession;
use crate::service::IcfService;
use crate::updates::session::SessionUpdate;

const SELECT_COLS: &str = "id, user_id, client_id, client_name, started_at, ended_at, \
    duration_minutes, session_type, payment_type, notes, source, \
    calendly_event_uri, calendly_invitee_uri, created_at, updated_at";

fn row_to_session(row: &libsql::Row) -> Result<CoachingSession, DatabaseError> {
    Ok(CoachingSession {
        id: row.get(0)?,
        user_id: row.get(1)?,
        client_id: get_opt_string(row, 2)?,
        client_name: row.get(3)?,
        started_at: parse_datetime(&row.get::<String>(4)?)?,
        ended_at: parse_datetime(&row.get::<String>(5)?)?,
        duration_minutes: row.get(6)?,
        session_type: parse_enum(&row.get::<String>(7)?)?,
        payment_type: parse_enum(&row.get::<String>(8)?)?,
        notes: get_opt_string(row, 9)?,
        source: parse_enum(&row.get::<String>(10)?)?,
        calendly_event_uri: get_opt_string(row, 11)?,
        calendly_invitee_uri: get_opt_string(row, 12)?,
        created_at: parse_datetime(&row.get::<String>(13)?)?,
        updated_at: parse_datetime(&row.get::<String>(14)?)?,
    })
}

/// Filters for listing sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub range: DateRange,
    pub client_id: Option<String>,
}

impl IcfService {
    /// Insert a session. A `client_id` that is not the caller's is rejected.
    ///
    /// # Errors
    ///
    /// `DatabaseError::Conflict` when the scheduling invitee URI already exists.
    pub async fn create_session(
        &self,
        user_id: &str,
        new: &NewCoachingSession,
    ) -> Result<CoachingSession, DatabaseError> {
        new.validate()
            .map_err(|e| DatabaseError::InvalidState(e.to_string()))?;
        if let Some(ref client_id) = new.client_id {
            self.get_client(user_id, client_id).await?;
        }

        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_SESSION).await?;
        let result = self
            .db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO coaching_sessions ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)"
                ),
                libsql::params![
                    id.as_str(),
                    user_id,
                    new.client_id.as_deref(),
                    new.client_name.trim(),
                    new.started_at.to_rfc3339(),
                    new.ended_at.to_rfc3339(),
                    new.duration_minutes,
                    new.session_type.as_str(),
                    new.payment_type.as_str(),
                    new.notes.as_deref(),
                    new.source.as_str(),
                    new.calendly_event_uri.as_deref(),
                    new.calendly_invitee_uri.as_deref(),
                    now.to_rfc3339()
                ],
            )
            .await;
        if let Err(e) = result {
            let err = DatabaseError::from(e);
            if err.is_unique_violation() {
                return Err(DatabaseError::Conflict(format!(
                    "session for invitee {} already exists",
                    new.calendly_invitee_uri.as_deref().unwrap_or_default()
                )));
            }
            return Err(err);
        }

        Ok(CoachingSession {
            id,
            user_id: user_id.to_string(),
            client_id: new.client_id.clone(),
            client_name: new.client_name.trim().to_string(),
            started_at: new.started_at,
            ended_at: new.ended_at,
            duration_minutes: new.duration_minutes,
            session_type: new.session_type,
            payment_type: new.payment_type,
            notes: new.notes.clone(),
            source: new.source,
            calendly_event_uri: new.calendly_event_uri.clone(),
            calendly_invitee_uri: new.calendly_invitee_uri.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_session(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<CoachingSession, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM coaching_sessions WHERE id = ?1 AND user_id = ?2"
                ),
                [id, user_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("session", id))?;
        row_to_session(&row)
    }

    /// Sessions newest first.
    pub async fn list_sessions(
        &self,
        user_id: &str,
        filter: &SessionFilter,
    ) -> Result<Vec<CoachingSession>, DatabaseError> {
        let mut clauses = vec!["user_id = ?1".to_string()];
        let mut params: Vec<libsql::Value> = vec![user_id.to_string().into()];
        filter.range.push_filters("started_at", &mut clauses, &mut params);
        if let Some(ref client_id) = filter.client_id {
            params.push(client_id.clone().into());
            clauses.push(format!("client_id = ?{}", params.len()));
        }
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM coaching_sessions WHERE {} ORDER BY started_at DESC",
                    clauses.join(" AND ")
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        collect_rows(rows, row_to_session).await
    }

    /// Apply a partial update. The merged row must keep `ended_at >= started_at`;
    /// when the range changes without an explicit duration, the duration is
    /// re-derived from the range.
    pub async fn update_session(
        &self,
        user_id: &str,
        id: &str,
        update: &SessionUpdate,
    ) -> Result<CoachingSession, DatabaseError> {
        let current = self.get_session(user_id, id).await?;
        let mut update = update.clone();
        if update.touches_timing() {
            let started = update.started_at.unwrap_or(current.started_at);
            let ended = update.ended_at.unwrap_or(current.ended_at);
            if ended < started {
                return Err(DatabaseError::InvalidState(
                    "session end must not be before its start".into(),
                ));
            }
            if update.duration_minutes.is_none()
                && (update.started_at.is_some() || update.ended_at.is_some())
            {
                update.duration_minutes = Some((ended - started).num_minutes());
            }
            if update.duration_minutes.is_some_and(|m| m <= 0) {
                return Err(DatabaseError::InvalidState(
                    "session duration must be positive".into(),
                ));
            }
            if update.duration_minutes.is_some_and(|m| m > MAX_SESSION_MINUTES) {
                return Err(DatabaseError::InvalidState(
                    "session duration must be at most 24 hours".into(),
                ));
            }
        }
        if let Some(Some(ref client_id)) = update.client_id {
            self.get_client(user_id, client_id).await?;
        }

        let sets = update.to_set_clauses();
        if sets.is_empty() {
            return Ok(current);
        }
        let now = Utc::now().to_rfc3339();
        let (sql, params) = sets.into_statement("coaching_sessions", "id", id, user_id, &now);
        self.db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        self.get_session(user_id, id).await
    }

    pub async fn delete_session(&self, user_id: &str, id: &str) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "DELETE FROM coaching_sessions WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("session", id));
        }
        Ok(())
    }

    /// Whether a session already exists for a scheduling invitee.
    pub async fn session_exists_for_invitee(
        &self,
        invitee_uri: &str,
    ) -> Result<bool, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT 1 FROM coaching_sessions WHERE calendly_invitee_uri = ?1",
                [invitee_uri],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }

    /// Remove the session created for a canceled booking. Returns rows removed.
    pub async fn delete_session_by_invitee(&self, invitee_uri: &str) -> Result<u64, DatabaseError> {
        Ok(self
            .db()
            .conn()
            .execute(
                "DELETE FROM coaching_sessions WHERE calendly_invitee_uri = ?1",
                [invitee_uri],
            )
            .await?)
    }
}
