//! Client repository.

use chrono::Utc;

use icf_core::entities::Client;
use icf_core::ids::PREFIX_CLIENT;

use crate::error::DatabaseError;
use crate::helpers::{collect_rows, get_opt_string, parse_datetime};
use crate::inputs::NewClient;
use crate::service::IcfService;
use crate::updates::client::ClientUpdate;

const SELECT_COLS: &str =
    "id, user_id, name, email, phone, company, notes, created_at, updated_at";

fn row_to_client(row: &libsql::Row) -> Result<Client, DatabaseError> {
    Ok(Client {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        email: get_opt_string(row, 3)?,
        phone: get_opt_string(row, 4)?,
        company: get_opt_string(row, 5)?,
        notes: get_opt_string(row, 6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
    })
}

impl IcfService {
    pub async fn create_client(
        &self,
        user_id: &str,
        new: &NewClient,
    ) -> Result<Client, DatabaseError> {
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_CLIENT).await?;
        self.db()
            .conn()
            .execute(
                &format!("INSERT INTO clients ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)"),
                libsql::params![
                    id.as_str(),
                    user_id,
                    new.name.trim(),
                    new.email.as_deref(),
                    new.phone.as_deref(),
                    new.company.as_deref(),
                    new.notes.as_deref(),
                    now.to_rfc3339()
                ],
            )
            .await?;

        Ok(Client {
            id,
            user_id: user_id.to_string(),
            name: new.name.trim().to_string(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            company: new.company.clone(),
            notes: new.notes.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_client(&self, user_id: &str, id: &str) -> Result<Client, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM clients WHERE id = ?1 AND user_id = ?2"),
                [id, user_id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("client", id))?;
        row_to_client(&row)
    }

    /// Clients sorted by name; `query` filters by case-insensitive substring
    /// of name, email or company.
    pub async fn list_clients(
        &self,
        user_id: &str,
        query: Option<&str>,
    ) -> Result<Vec<Client>, DatabaseError> {
        let rows = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                let pattern = format!("%{}%", q.to_lowercase());
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SELECT_COLS} FROM clients
                             WHERE user_id = ?1
                               AND (lower(name) LIKE ?2 OR lower(coalesce(email, '')) LIKE ?2
                                    OR lower(coalesce(company, '')) LIKE ?2)
                             ORDER BY name COLLATE NOCASE"
                        ),
                        libsql::params![user_id, pattern],
                    )
                    .await?
            }
            None => {
                self.db()
                    .conn()
                    .query(
                        &format!(
                            "SELECT {SELECT_COLS} FROM clients WHERE user_id = ?1 ORDER BY name COLLATE NOCASE"
                        ),
                        [user_id],
                    )
                    .await?
            }
        };
        collect_rows(rows, row_to_client).await
    }

    /// Case-insensitive email lookup, used to link scheduled bookings.
    pub async fn find_client_by_email(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<Option<Client>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM clients
                     WHERE user_id = ?1 AND lower(email) = lower(?2)
                     ORDER BY created_at LIMIT 1"
                ),
                [user_id, email.trim()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_client(&row)?)),
            None => Ok(None),
        }
    }

    pub async fn update_client(
        &self,
        user_id: &str,
        id: &str,
        update: &ClientUpdate,
    ) -> Result<Client, DatabaseError> {
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(DatabaseError::InvalidState("client name is required".into()));
        }
        let sets = update.to_set_clauses();
        if sets.is_empty() {
            return self.get_client(user_id, id).await;
        }
        let now = Utc::now().to_rfc3339();
        let (sql, params) = sets.into_statement("clients", "id", id, user_id, &now);
        let changed = self
            .db()
            .conn()
            .execute(&sql, libsql::params_from_iter(params))
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("client", id));
        }
        self.get_client(user_id, id).await
    }

    /// Delete a client. Linked sessions keep their `client_name` and lose the link.
    pub async fn delete_client(&self, user_id: &str, id: &str) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "DELETE FROM clients WHERE id = ?1 AND user_id = ?2",
                [id, user_id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("client", id));
        }
        Ok(())
    }
}
