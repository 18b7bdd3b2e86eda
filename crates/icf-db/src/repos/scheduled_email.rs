//! Scheduled broadcast email repository.
//!
//! Status moves `pending -> sending -> sent|failed`, or `pending -> cancelled`.
//! Claiming is a conditional update so a row is only processed once even if
//! two batch runs overlap.

use chrono::{DateTime, Utc};

use icf_core::entities::ScheduledEmail;
use icf_core::enums::ScheduledEmailStatus;
use icf_core::ids::PREFIX_SCHEDULED_EMAIL;

use crate::error::DatabaseError;
use crate::helpers::{
    collect_rows, encode_string_list, get_opt_string, parse_datetime, parse_enum,
    parse_optional_datetime, parse_string_list,
};
use crate::inputs::NewScheduledEmail;
use crate::service::IcfService;

const SELECT_COLS: &str = "id, created_by, subject, content, audience, custom_recipients, \
    scheduled_for, status, recipient_count, sent_count, failed_count, last_error, sent_at, created_at";

fn row_to_scheduled_email(row: &libsql::Row) -> Result<ScheduledEmail, DatabaseError> {
    Ok(ScheduledEmail {
        id: row.get(0)?,
        created_by: row.get(1)?,
        subject: row.get(2)?,
        content: row.get(3)?,
        audience: parse_enum(&row.get::<String>(4)?)?,
        custom_recipients: parse_string_list(&row.get::<String>(5)?)?,
        scheduled_for: parse_datetime(&row.get::<String>(6)?)?,
        status: parse_enum(&row.get::<String>(7)?)?,
        recipient_count: row.get(8)?,
        sent_count: row.get(9)?,
        failed_count: row.get(10)?,
        last_error: get_opt_string(row, 11)?,
        sent_at: parse_optional_datetime(get_opt_string(row, 12)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(13)?)?,
    })
}

/// Final counters written when a send run finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOutcome {
    pub recipient_count: i64,
    pub sent_count: i64,
    pub failed_count: i64,
    pub last_error: Option<String>,
}

impl SendOutcome {
    /// `failed` only when there were recipients and none succeeded.
    #[must_use]
    pub const fn final_status(&self) -> ScheduledEmailStatus {
        if self.recipient_count > 0 && self.sent_count == 0 {
            ScheduledEmailStatus::Failed
        } else {
            ScheduledEmailStatus::Sent
        }
    }
}

impl IcfService {
    pub async fn create_scheduled_email(
        &self,
        created_by: &str,
        new: &NewScheduledEmail,
    ) -> Result<ScheduledEmail, DatabaseError> {
        new.validate()
            .map_err(|e| DatabaseError::InvalidState(e.to_string()))?;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_SCHEDULED_EMAIL).await?;
        self.db()
            .conn()
            .execute(
                "INSERT INTO scheduled_emails
                    (id, created_by, subject, content, audience, custom_recipients,
                     scheduled_for, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                libsql::params![
                    id.as_str(),
                    created_by,
                    new.subject.trim(),
                    new.content.as_str(),
                    new.audience.as_str(),
                    encode_string_list(&new.custom_recipients)?,
                    new.scheduled_for.to_rfc3339(),
                    ScheduledEmailStatus::Pending.as_str(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        self.get_scheduled_email(&id).await
    }

    pub async fn get_scheduled_email(&self, id: &str) -> Result<ScheduledEmail, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM scheduled_emails WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("scheduled email", id))?;
        row_to_scheduled_email(&row)
    }

    /// All scheduled emails, latest `scheduled_for` first.
    pub async fn list_scheduled_emails(&self) -> Result<Vec<ScheduledEmail>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM scheduled_emails ORDER BY scheduled_for DESC"),
                (),
            )
            .await?;
        collect_rows(rows, row_to_scheduled_email).await
    }

    /// Pending rows whose `scheduled_for` has passed.
    pub async fn list_due_scheduled_emails(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ScheduledEmail>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM scheduled_emails
                     WHERE status = ?1 AND scheduled_for <= ?2
                     ORDER BY scheduled_for"
                ),
                libsql::params![ScheduledEmailStatus::Pending.as_str(), now.to_rfc3339()],
            )
            .await?;
        collect_rows(rows, row_to_scheduled_email).await
    }

    /// Move a row from `pending` to `sending`. Returns `false` when another
    /// run already claimed it or it was cancelled.
    pub async fn claim_scheduled_email(&self, id: &str) -> Result<bool, DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE scheduled_emails SET status = ?1 WHERE id = ?2 AND status = ?3",
                libsql::params![
                    ScheduledEmailStatus::Sending.as_str(),
                    id,
                    ScheduledEmailStatus::Pending.as_str()
                ],
            )
            .await?;
        tracing::debug!(id, claimed = changed == 1, "claim scheduled email");
        Ok(changed == 1)
    }

    /// Record the outcome of a claimed row and set its terminal status.
    pub async fn finish_scheduled_email(
        &self,
        id: &str,
        outcome: &SendOutcome,
    ) -> Result<ScheduledEmail, DatabaseError> {
        let status = outcome.final_status();
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE scheduled_emails SET
                    status = ?1, recipient_count = ?2, sent_count = ?3, failed_count = ?4,
                    last_error = ?5, sent_at = ?6
                 WHERE id = ?7 AND status = ?8",
                libsql::params![
                    status.as_str(),
                    outcome.recipient_count,
                    outcome.sent_count,
                    outcome.failed_count,
                    outcome.last_error.as_deref(),
                    Utc::now().to_rfc3339(),
                    id,
                    ScheduledEmailStatus::Sending.as_str()
                ],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::InvalidState(format!(
                "scheduled email {id} is not being sent"
            )));
        }
        self.get_scheduled_email(id).await
    }

    /// Mark a claimed row `failed` when the run broke off before it could
    /// record an outcome, so it does not stay in `sending`.
    pub async fn abort_scheduled_email(
        &self,
        id: &str,
        error: &str,
    ) -> Result<ScheduledEmail, DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE scheduled_emails SET status = ?1, last_error = ?2
                 WHERE id = ?3 AND status = ?4",
                libsql::params![
                    ScheduledEmailStatus::Failed.as_str(),
                    error,
                    id,
                    ScheduledEmailStatus::Sending.as_str()
                ],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::InvalidState(format!(
                "scheduled email {id} is not being sent"
            )));
        }
        self.get_scheduled_email(id).await
    }

    /// Cancel a pending row. Any other status is an invalid transition.
    pub async fn cancel_scheduled_email(&self, id: &str) -> Result<ScheduledEmail, DatabaseError> {
        let current = self.get_scheduled_email(id).await?;
        if !current
            .status
            .can_transition_to(ScheduledEmailStatus::Cancelled)
        {
            return Err(DatabaseError::InvalidState(format!(
                "cannot cancel scheduled email in status '{}'",
                current.status
            )));
        }
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE scheduled_emails SET status = ?1 WHERE id = ?2 AND status = ?3",
                libsql::params![
                    ScheduledEmailStatus::Cancelled.as_str(),
                    id,
                    ScheduledEmailStatus::Pending.as_str()
                ],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::InvalidState(format!(
                "scheduled email {id} is no longer pending"
            )));
        }
        self.get_scheduled_email(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_service;
    use chrono::Duration;
    use icf_core::enums::EmailAudience;
    use pretty_assertions::assert_eq;

    fn new_email(offset_minutes: i64) -> NewScheduledEmail {
        NewScheduledEmail {
            subject: "Spring update".into(),
            content: "Hi {{ first_name }}".into(),
            audience: EmailAudience::All,
            custom_recipients: vec![],
            scheduled_for: Utc::now() + Duration::minutes(offset_minutes),
        }
    }

    #[tokio::test]
    async fn due_rows_and_single_claim() {
        let svc = test_service().await;
        let due = svc.create_scheduled_email("admin_1", &new_email(-5)).await.unwrap();
        svc.create_scheduled_email("admin_1", &new_email(60)).await.unwrap();
        assert!(due.id.starts_with("eml-"));
        assert_eq!(due.status, ScheduledEmailStatus::Pending);

        let rows = svc.list_due_scheduled_emails(Utc::now()).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, due.id);

        assert!(svc.claim_scheduled_email(&due.id).await.unwrap());
        assert!(!svc.claim_scheduled_email(&due.id).await.unwrap());
        assert!(svc.list_due_scheduled_emails(Utc::now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn finish_sets_counts_and_status() {
        let svc = test_service().await;
        let row = svc.create_scheduled_email("admin_1", &new_email(-1)).await.unwrap();
        svc.claim_scheduled_email(&row.id).await.unwrap();
        let outcome = SendOutcome {
            recipient_count: 3,
            sent_count: 2,
            failed_count: 1,
            last_error: Some("bounced".into()),
        };
        let done = svc.finish_scheduled_email(&row.id, &outcome).await.unwrap();
        assert_eq!(done.status, ScheduledEmailStatus::Sent);
        assert_eq!(done.sent_count, 2);
        assert_eq!(done.last_error.as_deref(), Some("bounced"));
        assert!(done.sent_at.is_some());
    }

    #[tokio::test]
    async fn all_failed_is_failed() {
        let outcome = SendOutcome {
            recipient_count: 2,
            sent_count: 0,
            failed_count: 2,
            last_error: Some("down".into()),
        };
        assert_eq!(outcome.final_status(), ScheduledEmailStatus::Failed);
        assert_eq!(SendOutcome::default().final_status(), ScheduledEmailStatus::Sent);
    }

    #[tokio::test]
    async fn only_pending_can_be_cancelled() {
        let svc = test_service().await;
        let row = svc.create_scheduled_email("admin_1", &new_email(30)).await.unwrap();
        let cancelled = svc.cancel_scheduled_email(&row.id).await.unwrap();
        assert_eq!(cancelled.status, ScheduledEmailStatus::Cancelled);
        assert!(matches!(
            svc.cancel_scheduled_email(&row.id).await,
            Err(DatabaseError::InvalidState(_))
        ));
        assert!(!svc.claim_scheduled_email(&row.id).await.unwrap());
    }

    #[tokio::test]
    async fn abort_fails_a_claimed_row() {
        let svc = test_service().await;
        let row = svc.create_scheduled_email("admin_1", &new_email(-1)).await.unwrap();
        assert!(matches!(
            svc.abort_scheduled_email(&row.id, "boom").await,
            Err(DatabaseError::InvalidState(_))
        ));

        svc.claim_scheduled_email(&row.id).await.unwrap();
        let aborted = svc.abort_scheduled_email(&row.id, "boom").await.unwrap();
        assert_eq!(aborted.status, ScheduledEmailStatus::Failed);
        assert_eq!(aborted.last_error.as_deref(), Some("boom"));
        assert!(aborted.sent_at.is_none());
    }

    #[tokio::test]
    async fn list_is_latest_first() {
        let svc = test_service().await;
        let early = svc.create_scheduled_email("admin_1", &new_email(10)).await.unwrap();
        let late = svc.create_scheduled_email("admin_1", &new_email(120)).await.unwrap();
        let ids: Vec<String> = svc
            .list_scheduled_emails()
            .await
            .unwrap()
            .into_iter()
            .map(|email| email.id)
            .collect();
        assert_eq!(ids, vec![late.id, early.id]);
    }
}
