//! Notification log: one-shot notices that must not repeat.

use chrono::Utc;

use icf_core::entities::NotificationLogEntry;
use icf_core::enums::{NotificationChannel, NotificationKind};
use icf_core::ids::PREFIX_NOTIFICATION;

use crate::error::DatabaseError;
use crate::service::IcfService;

impl IcfService {
    pub async fn log_notification(
        &self,
        user_id: &str,
        kind: NotificationKind,
        channel: NotificationChannel,
    ) -> Result<NotificationLogEntry, DatabaseError> {
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_NOTIFICATION).await?;
        self.db()
            .conn()
            .execute(
                "INSERT INTO notification_log (id, user_id, kind, channel, sent_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                libsql::params![
                    id.as_str(),
                    user_id,
                    kind.as_str(),
                    channel.as_str(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        Ok(NotificationLogEntry {
            id,
            user_id: user_id.to_string(),
            kind,
            channel,
            sent_at: now,
        })
    }

    pub async fn has_notification(
        &self,
        user_id: &str,
        kind: NotificationKind,
    ) -> Result<bool, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT 1 FROM notification_log WHERE user_id = ?1 AND kind = ?2 LIMIT 1",
                [user_id, kind.as_str()],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{seed_profile, test_service};
    use icf_core::enums::{NotificationChannel, NotificationKind};

    #[tokio::test]
    async fn logged_notice_is_remembered_per_kind() {
        let svc = test_service().await;
        seed_profile(&svc, "user_1").await;
        assert!(!svc
            .has_notification("user_1", NotificationKind::TrialEnding)
            .await
            .unwrap());
        let entry = svc
            .log_notification("user_1", NotificationKind::TrialEnding, NotificationChannel::Email)
            .await
            .unwrap();
        assert!(entry.id.starts_with("ntf-"));
        assert!(svc
            .has_notification("user_1", NotificationKind::TrialEnding)
            .await
            .unwrap());
        assert!(!svc
            .has_notification("user_1", NotificationKind::LoggingReminder)
            .await
            .unwrap());
    }
}
