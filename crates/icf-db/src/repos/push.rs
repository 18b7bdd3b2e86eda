//! Browser push subscription repository.

use chrono::Utc;

use icf_core::entities::PushSubscription;
use icf_core::ids::PREFIX_PUSH_SUBSCRIPTION;

use crate::error::DatabaseError;
use crate::helpers::{collect_rows, get_opt_string, parse_datetime};
use crate::inputs::NewPushSubscription;
use crate::service::IcfService;

const SELECT_COLS: &str = "id, user_id, endpoint, p256dh, auth, user_agent, created_at";

fn row_to_push(row: &libsql::Row) -> Result<PushSubscription, DatabaseError> {
    Ok(PushSubscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        endpoint: row.get(2)?,
        p256dh: row.get(3)?,
        auth: row.get(4)?,
        user_agent: get_opt_string(row, 5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

impl IcfService {
    /// Store a subscription. Re-subscribing the same endpoint replaces its keys
    /// and owner.
    pub async fn upsert_push_subscription(
        &self,
        user_id: &str,
        new: &NewPushSubscription,
    ) -> Result<PushSubscription, DatabaseError> {
        let id = self.db().generate_id(PREFIX_PUSH_SUBSCRIPTION).await?;
        self.db()
            .conn()
            .execute(
                "INSERT INTO push_subscriptions (id, user_id, endpoint, p256dh, auth, user_agent, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(endpoint) DO UPDATE SET
                    user_id = excluded.user_id,
                    p256dh = excluded.p256dh,
                    auth = excluded.auth,
                    user_agent = excluded.user_agent",
                libsql::params![
                    id.as_str(),
                    user_id,
                    new.endpoint.as_str(),
                    new.p256dh.as_str(),
                    new.auth.as_str(),
                    new.user_agent.as_deref(),
                    Utc::now().to_rfc3339()
                ],
            )
            .await?;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM push_subscriptions WHERE endpoint = ?1"),
                [new.endpoint.as_str()],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_push(&row)
    }

    pub async fn list_push_subscriptions(
        &self,
        user_id: &str,
    ) -> Result<Vec<PushSubscription>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM push_subscriptions WHERE user_id = ?1 ORDER BY created_at"
                ),
                [user_id],
            )
            .await?;
        collect_rows(rows, row_to_push).await
    }

    pub async fn list_all_push_subscriptions(
        &self,
    ) -> Result<Vec<PushSubscription>, DatabaseError> {
        let rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM push_subscriptions ORDER BY user_id, created_at"),
                (),
            )
            .await?;
        collect_rows(rows, row_to_push).await
    }

    /// Caller-initiated unsubscribe. Returns whether a row was removed.
    pub async fn delete_push_subscription(
        &self,
        user_id: &str,
        endpoint: &str,
    ) -> Result<bool, DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "DELETE FROM push_subscriptions WHERE endpoint = ?1 AND user_id = ?2",
                [endpoint, user_id],
            )
            .await?;
        Ok(changed > 0)
    }

    /// Drop an endpoint the push service reported as gone.
    pub async fn delete_push_endpoint(&self, endpoint: &str) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "DELETE FROM push_subscriptions WHERE endpoint = ?1",
                [endpoint],
            )
            .await?;
        Ok(())
    }
}
