//! Processed webhook ids, for replay protection.

use crate::error::DatabaseError;
use crate::service::IcfService;

impl IcfService {
    /// Record an event id. Returns `false` if it was already processed.
    pub async fn record_webhook_event(
        &self,
        provider: &str,
        event_id: &str,
    ) -> Result<bool, DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "INSERT OR IGNORE INTO processed_webhooks (provider, event_id) VALUES (?1, ?2)",
                [provider, event_id],
            )
            .await?;
        Ok(changed == 1)
    }

    /// Forget an event id so a failed delivery can be retried by the sender.
    pub async fn forget_webhook_event(
        &self,
        provider: &str,
        event_id: &str,
    ) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "DELETE FROM processed_webhooks WHERE provider = ?1 AND event_id = ?2",
                [provider, event_id],
            )
            .await?;
        Ok(())
    }
}
