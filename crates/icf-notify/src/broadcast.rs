//! Admin push notifications to one user or every subscriber.

use icf_core::enums::{NotificationChannel, NotificationKind};
use icf_providers::{ProviderError, PushMessage};
use serde::Serialize;

use crate::error::NotifyError;
use crate::pacer::Pacer;
use crate::Notifier;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
    pub removed: usize,
}

impl Notifier {
    /// Deliver `message` to every stored subscription of `user_id`, or of
    /// everyone when `user_id` is `None`. Gone endpoints are deleted.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::NotConfigured`] without VAPID keys, or a
    /// database error.
    pub async fn send_push(
        &self,
        user_id: Option<&str>,
        message: &PushMessage,
    ) -> Result<PushReport, NotifyError> {
        let sender = self.push_sender()?;
        let subscriptions = match user_id {
            Some(user_id) => self.svc.list_push_subscriptions(user_id).await?,
            None => self.svc.list_all_push_subscriptions().await?,
        };

        let mut pacer = Pacer::new(self.settings.send_delay);
        let mut report = PushReport {
            attempted: subscriptions.len(),
            ..PushReport::default()
        };
        for subscription in &subscriptions {
            pacer.wait().await;
            match sender.send(subscription, message).await {
                Ok(()) => report.sent += 1,
                Err(ProviderError::Gone(endpoint)) => {
                    self.svc.delete_push_endpoint(&endpoint).await?;
                    report.removed += 1;
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(user_id = %subscription.user_id, error = %e, "push send failed");
                }
            }
        }

        if let Some(user_id) = user_id {
            if report.sent > 0 {
                self.svc
                    .log_notification(user_id, NotificationKind::Broadcast, NotificationChannel::Push)
                    .await?;
            }
        }
        tracing::info!(
            attempted = report.attempted,
            sent = report.sent,
            removed = report.removed,
            "push broadcast finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use icf_db::inputs::NewPushSubscription;
    use icf_db::service::IcfService;
    use pretty_assertions::assert_eq;

    use crate::test_support::{FakePush, notifier, test_service};

    async fn subscribe(svc: &IcfService, user_id: &str, endpoint: &str) {
        svc.ensure_profile(user_id, &format!("{user_id}@example.com"), None)
            .await
            .unwrap();
        svc.upsert_push_subscription(
            user_id,
            &NewPushSubscription {
                endpoint: endpoint.into(),
                p256dh: "p".into(),
                auth: "a".into(),
                user_agent: Some("test".into()),
            },
        )
        .await
        .unwrap();
    }

    fn message() -> PushMessage {
        PushMessage {
            title: "New feature".into(),
            body: "XLSX export is live".into(),
            url: None,
        }
    }

    #[tokio::test]
    async fn broadcasts_to_everyone_and_prunes() {
        let svc = test_service().await;
        subscribe(&svc, "u1", "https://push.test/1").await;
        subscribe(&svc, "u2", "https://push.test/2").await;
        subscribe(&svc, "u2", "https://push.test/gone").await;
        let push = Arc::new(FakePush::with_gone(&["https://push.test/gone"]));

        let report = notifier(&svc, None, Some(Arc::clone(&push)))
            .send_push(None, &message())
            .await
            .unwrap();
        assert_eq!(
            report,
            PushReport {
                attempted: 3,
                sent: 2,
                failed: 0,
                removed: 1
            }
        );
        assert_eq!(svc.list_all_push_subscriptions().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn targets_a_single_user() {
        let svc = test_service().await;
        subscribe(&svc, "u1", "https://push.test/1").await;
        subscribe(&svc, "u2", "https://push.test/2").await;
        let push = Arc::new(FakePush::default());

        let report = notifier(&svc, None, Some(Arc::clone(&push)))
            .send_push(Some("u2"), &message())
            .await
            .unwrap();
        assert_eq!(report.sent, 1);
        assert_eq!(push.endpoints(), vec!["https://push.test/2"]);
        assert!(svc.has_notification("u2", NotificationKind::Broadcast).await.unwrap());
    }

    #[tokio::test]
    async fn requires_push_sender() {
        let svc = test_service().await;
        let err = notifier(&svc, None, None)
            .send_push(None, &message())
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::NotConfigured("push")));
    }
}
