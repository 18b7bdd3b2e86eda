//! CPD entry repository.

use chrono::Utc;

use icf_core::entities::CpdEntry;
use icf_core::ids::PREFIX_CPD;

use super::DateRange;
use crate::error::DatabaseError;
use crate::helpers::{
    collect_rows, encode_string_list, get_opt_string, parse_date, parse_datetime, parse_enum,
    parse_string_list,
};
use crate::inputs::NewCpdEntry;
use crate::service::IcfService;
use crate::updates::cpd::CpdUpdate;

const SELECT_COLS: &str = "id, user_id, title, activity_date, hours, cpd_type, learning_method, \
    provider, competencies, document_path, notes, created_at, updated_at";

fn row_to_cpd(row: &libsql::Row) -> Result<CpdEntry, DatabaseError> {
    Ok(CpdEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        activity_date: parse_date(&row.get::<String>(3)?)?,
        hours: row.get(4)?,
        cpd_type: parse_enum(&row.get::<String>(5)?)?,
        learning_method: parse_enum(&row.get::<String>(6)?)?,
        provider: get_opt_string(row, 7)?,
        competencies: parse_string_list(&row.get::<String>(8)?)?,
        document_path: get_opt_string(row, 9)?,
        notes: get_opt_string(row, 10)?,
        created_at: parse_datetime(&row.get::<String>(11)?)?,
        updated_at: parse_datetime(&row.get::<String>(12)?)?,
    })
}

impl IcfService {
    pub async fn create_cpd_entry(
        &self,
        user_id: &str,
        new: &NewCpdEntry,
    ) -> Result<CpdEntry, DatabaseError> {
        new.validate()
            .map_err(|e| DatabaseError::InvalidState(e.to_string()))?;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_CPD).await?;
        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO cpd_entries ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)"
                ),
                libsql::params![
                    id.as_str(),
                    user_id,
                    new.title.trim(),
                    new.activity_date.to_string(),
                    new.hours,
                    new.cpd_type.as_str(),
                    new.learning_method.as_str(),
                    new.provider.as_deref(),
                    encode_string_list(&new.competencies)?,
                    new.document_path.as_deref(),
                    new.notes.as_deref(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(CpdEntry {
            id,
            user_id: user_id.to_string(),
            title: new.title.trim().to_string(),
            activity_date: new.activity_date,
            hours: new.hours,
            cpd_type: new.cpd_type,
            learning_method: new.learning_method,
            provider: new.provider.clone(),
            competencies: new.competencies.clone(),
            document_path: new.document_path.clone(),
            notes: new.notes.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_cpd_entry(&self, user_id: &str, id: &str) -> Result<CpdEntry, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM cpd_entries WHERE id = ?1 AND user_id = ?2"),
                [id, user_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("cpd entry", id))?;
        row_to_cpd(&row)
    }

    /// CPD entries, most recent activity first.
    pub async fn list_cpd_entries(
        &self,
        user_id: &str,
        range: &DateRange,
    ) -> Result<Vec<CpdEntry>, DatabaseError> {
        let mut clauses = vec!["user_id = ?1".to_string()];
        let mut params: Vec<libsql::Value> = vec![user_id.to_string().into()];
        range.push_filters("activity_date", &mut clauses, &mut params);
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM cpd_entries WHERE {}
                     ORDER BY activity_date DESC, created_at DESC",
                    clauses.join(" AND ")
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        collect_rows(rows, row_to_cpd).await
    }

    pub async fn update_cpd_entry(
        &self,
        user_id: &str,
        id: &str,
        update: &CpdUpdate,
    ) -> Result<CpdEntry, DatabaseError> {
        if update.hours.is_some_and(|h| !h.is_finite() || h <= 0.0) {
            return Err(DatabaseError::InvalidState("hours must be positive".into()));
        }
        let sets = update.to_set_clauses()?;
        if sets.is_empty() {
            return self.get_cpd_entry(user_id, id).await;
        }
        let now = Utc::now().to_rfc3339();
        let (sql, params) = sets.into_statement("cpd_entries", "id", id, user_id, &now);
        let changed = self
            .db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("cpd entry", id));
        }
        self.get_cpd_entry(user_id, id).await
    }

    pub async fn delete_cpd_entry(&self, user_id: &str, id: &str) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "DELETE FROM cpd_entries WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("cpd entry", id));
        }
        Ok(())
    }
}
