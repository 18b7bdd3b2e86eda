//! Mentoring / supervision repository.

use chrono::Utc;

use icf_core::entities::MentoringSession;
use icf_core::enums::MentoringKind;
use icf_core::ids::PREFIX_MENTORING;

use super::DateRange;
use crate::error::DatabaseError;
use crate::helpers::{
    collect_rows, get_bool, get_opt_string, parse_date, parse_datetime, parse_enum,
};
use crate::inputs::NewMentoringSession;
use crate::service::IcfService;
use crate::updates::mentoring::MentoringUpdate;

const SELECT_COLS: &str = "id, user_id, kind, session_date, duration_minutes, is_group, \
    provider_name, provider_credential, focus_area, notes, document_path, created_at, updated_at";

fn row_to_mentoring(row: &libsql::Row) -> Result<MentoringSession, DatabaseError> {
    Ok(MentoringSession {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: parse_enum(&row.get::<String>(2)?)?,
        session_date: parse_date(&row.get::<String>(3)?)?,
        duration_minutes: row.get(4)?,
        is_group: get_bool(row, 5)?,
        provider_name: row.get(6)?,
        provider_credential: get_opt_string(row, 7)?,
        focus_area: get_opt_string(row, 8)?,
        notes: get_opt_string(row, 9)?,
        document_path: get_opt_string(row, 10)?,
        created_at: parse_datetime(&row.get::<String>(11)?)?,
        updated_at: parse_datetime(&row.get::<String>(12)?)?,
    })
}

/// Filters for listing mentoring rows.
#[derive(Debug, Clone, Default)]
pub struct MentoringFilter {
    pub range: DateRange,
    pub kind: Option<MentoringKind>,
}

impl IcfService {
    pub async fn create_mentoring_session(
        &self,
        user_id: &str,
        new: &NewMentoringSession,
    ) -> Result<MentoringSession, DatabaseError> {
        new.validate()
            .map_err(|e| DatabaseError::InvalidState(e.to_string()))?;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_MENTORING).await?;
        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO mentoring_sessions ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)"
                ),
                libsql::params![
                    id.as_str(),
                    user_id,
                    new.kind.as_str(),
                    new.session_date.to_string(),
                    new.duration_minutes,
                    i64::from(new.is_group),
                    new.provider_name.trim(),
                    new.provider_credential.as_deref(),
                    new.focus_area.as_deref(),
                    new.notes.as_deref(),
                    new.document_path.as_deref(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(MentoringSession {
            id,
            user_id: user_id.to_string(),
            kind: new.kind,
            session_date: new.session_date,
            duration_minutes: new.duration_minutes,
            is_group: new.is_group,
            provider_name: new.provider_name.trim().to_string(),
            provider_credential: new.provider_credential.clone(),
            focus_area: new.focus_area.clone(),
            notes: new.notes.clone(),
            document_path: new.document_path.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_mentoring_session(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<MentoringSession, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM mentoring_sessions WHERE id = ?1 AND user_id = ?2"
                ),
                [id, user_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("mentoring session", id))?;
        row_to_mentoring(&row)
    }

    /// Mentoring rows, most recent first.
    pub async fn list_mentoring_sessions(
        &self,
        user_id: &str,
        filter: &MentoringFilter,
    ) -> Result<Vec<MentoringSession>, DatabaseError> {
        let mut clauses = vec!["user_id = ?1".to_string()];
        let mut params: Vec<libsql::Value> = vec![user_id.to_string().into()];
        filter.range.push_filters("session_date", &mut clauses, &mut params);
        if let Some(kind) = filter.kind {
            params.push(kind.as_str().into());
            clauses.push(format!("kind = ?{}", params.len()));
        }
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM mentoring_sessions WHERE {}
                     ORDER BY session_date DESC, created_at DESC",
                    clauses.join(" AND ")
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        collect_rows(rows, row_to_mentoring).await
    }

    pub async fn update_mentoring_session(
        &self,
        user_id: &str,
        id: &str,
        update: &MentoringUpdate,
    ) -> Result<MentoringSession, DatabaseError> {
        if update.duration_minutes.is_some_and(|m| m <= 0) {
            return Err(DatabaseError::InvalidState("duration must be positive".into()));
        }
        let sets = update.to_set_clauses();
        if sets.is_empty() {
            return self.get_mentoring_session(user_id, id).await;
        }
        let now = Utc::now().to_rfc3339();
        let (sql, params) = sets.into_statement("mentoring_sessions", "id", id, user_id, &now);
        let changed = self
            .db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("mentoring session", id));
        }
        self.get_mentoring_session(user_id, id).await
    }

    pub async fn delete_mentoring_session(
        &self,
        user_id: &str,
        id: &str,
    ) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "DELETE FROM mentoring_sessions WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("mentoring session", id));
        }
        Ok(())
    }
}
