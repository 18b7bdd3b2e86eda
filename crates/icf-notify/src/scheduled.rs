//! Dispatch of due scheduled broadcast emails.

use chrono::{DateTime, Utc};
use icf_core::entities::ScheduledEmail;
use icf_core::enums::{EmailAudience, ScheduledEmailStatus};
use icf_db::repos::scheduled_email::SendOutcome;
use icf_providers::{EmailMessage, EmailSender};
use serde::Serialize;

use crate::error::NotifyError;
use crate::pacer::Pacer;
use crate::template::{recipient_vars, render_email};
use crate::Notifier;

/// Result for one processed scheduled email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduledRunItem {
    pub id: String,
    pub status: ScheduledEmailStatus,
    pub recipient_count: i64,
    pub sent_count: i64,
    pub failed_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduledReport {
    pub due: usize,
    /// Claimed by a concurrent run before this one got to them.
    pub skipped: usize,
    pub processed: Vec<ScheduledRunItem>,
}

struct Recipient {
    email: String,
    full_name: Option<String>,
}

impl Notifier {
    /// Send every `pending` email whose `scheduled_for` has passed.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::NotConfigured`] without an email sender, or a
    /// database error. Individual send failures are recorded on the row.
    pub async fn process_scheduled(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ScheduledReport, NotifyError> {
        let sender = self.email_sender()?;
        let mut pacer = Pacer::new(self.settings.send_delay);
        let mut report = ScheduledReport::default();

        let due = self.svc.list_due_scheduled_emails(now).await?;
        report.due = due.len();
        for email in due {
            if !self.svc.claim_scheduled_email(&email.id).await? {
                report.skipped += 1;
                continue;
            }
            let item = match self.send_claimed(sender, &mut pacer, &email).await {
                Ok(item) => item,
                Err(error) => {
                    tracing::warn!(email_id = %email.id, %error, "scheduled email run aborted");
                    let aborted = self
                        .svc
                        .abort_scheduled_email(&email.id, &error.to_string())
                        .await?;
                    ScheduledRunItem {
                        id: aborted.id,
                        status: aborted.status,
                        recipient_count: aborted.recipient_count,
                        sent_count: aborted.sent_count,
                        failed_count: aborted.failed_count,
                    }
                }
            };
            report.processed.push(item);
        }
        Ok(report)
    }

    /// Deliver one claimed email and record its outcome.
    async fn send_claimed(
        &self,
        sender: &dyn EmailSender,
        pacer: &mut Pacer,
        email: &ScheduledEmail,
    ) -> Result<ScheduledRunItem, NotifyError> {
        let recipients = self.resolve_recipients(email).await?;
        let mut outcome = SendOutcome {
            recipient_count: i64::try_from(recipients.len()).unwrap_or(i64::MAX),
            ..SendOutcome::default()
        };
        for recipient in &recipients {
            let vars = recipient_vars(
                recipient.full_name.as_deref(),
                &recipient.email,
                &self.settings.app_url,
            );
            let rendered =
                render_email(&email.subject, &email.content, &vars, &self.settings.app_url);
            pacer.wait().await;
            let result = sender
                .send(&EmailMessage {
                    to: recipient.email.clone(),
                    subject: rendered.subject,
                    html: rendered.html,
                    text: rendered.text,
                })
                .await;
            match result {
                Ok(_) => outcome.sent_count += 1,
                Err(e) => {
                    outcome.failed_count += 1;
                    tracing::warn!(email_id = %email.id, error = %e, "broadcast send failed");
                    outcome.last_error = Some(e.to_string());
                }
            }
        }
        let finished = self.svc.finish_scheduled_email(&email.id, &outcome).await?;
        tracing::info!(
            email_id = %email.id,
            status = %finished.status,
            sent = outcome.sent_count,
            failed = outcome.failed_count,
            "scheduled email processed"
        );
        Ok(ScheduledRunItem {
            id: finished.id,
            status: finished.status,
            recipient_count: outcome.recipient_count,
            sent_count: outcome.sent_count,
            failed_count: outcome.failed_count,
        })
    }

    async fn resolve_recipients(
        &self,
        email: &ScheduledEmail,
    ) -> Result<Vec<Recipient>, NotifyError> {
        if email.audience == EmailAudience::Custom {
            let mut seen = std::collections::HashSet::new();
            let mut recipients = Vec::new();
            for address in &email.custom_recipients {
                if !seen.insert(address.to_lowercase()) {
                    continue;
                }
                recipients.push(Recipient {
                    email: address.clone(),
                    full_name: None,
                });
            }
            return Ok(recipients);
        }
        Ok(self
            .svc
            .list_audience(email.audience)
            .await?
            .into_iter()
            .map(|profile| Recipient {
                email: profile.email,
                full_name: profile.full_name,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::TimeDelta;
    use icf_core::enums::SubscriptionStatus;
    use icf_db::inputs::NewScheduledEmail;
    use icf_db::updates::profile::{ProfileUpdateBuilder, SubscriptionUpdate};
    use pretty_assertions::assert_eq;

    use crate::test_support::{FakeEmail, notifier, test_service};

    fn broadcast(audience: EmailAudience, custom: &[&str], at: DateTime<Utc>) -> NewScheduledEmail {
        NewScheduledEmail {
            subject: "News for {{ first_name }}".into(),
            content: "Hi {{ first_name }},\n\n- new export\n- faster sync".into(),
            audience,
            custom_recipients: custom.iter().map(|s| (*s).to_string()).collect(),
            scheduled_for: at,
        }
    }

    #[tokio::test]
    async fn sends_due_emails_to_audience() {
        let svc = test_service().await;
        for (user, status) in [
            ("active_1", SubscriptionStatus::Active),
            ("active_2", SubscriptionStatus::Active),
            ("trial_1", SubscriptionStatus::Trialing),
        ] {
            svc.ensure_profile(user, &format!("{user}@example.com"), Some("Alex Doe"))
                .await
                .unwrap();
            svc.update_subscription(user, &SubscriptionUpdate::status(status))
                .await
                .unwrap();
        }
        svc.update_profile(
            "active_2",
            &ProfileUpdateBuilder::new().marketing_emails(false).build(),
        )
        .await
        .unwrap();

        let now = Utc::now();
        let due = svc
            .create_scheduled_email(
                "admin",
                &broadcast(EmailAudience::ActiveSubscribers, &[], now - TimeDelta::minutes(1)),
            )
            .await
            .unwrap();
        let later = svc
            .create_scheduled_email(
                "admin",
                &broadcast(EmailAudience::All, &[], now + TimeDelta::hours(1)),
            )
            .await
            .unwrap();

        let email = Arc::new(FakeEmail::default());
        let report = notifier(&svc, Some(Arc::clone(&email)), None)
            .process_scheduled(now)
            .await
            .unwrap();

        assert_eq!(report.due, 1);
        assert_eq!(email.recipients(), vec!["active_1@example.com"]);
        let sent = email.sent.lock().unwrap()[0].clone();
        assert_eq!(sent.subject, "News for Alex");
        assert!(sent.html.contains("<ul><li>new export</li><li>faster sync</li></ul>"));

        let row = svc.get_scheduled_email(&due.id).await.unwrap();
        assert_eq!(row.status, ScheduledEmailStatus::Sent);
        assert_eq!((row.recipient_count, row.sent_count), (1, 1));
        assert!(row.sent_at.is_some());
        let untouched = svc.get_scheduled_email(&later.id).await.unwrap();
        assert_eq!(untouched.status, ScheduledEmailStatus::Pending);
    }

    #[tokio::test]
    async fn all_failures_mark_failed() {
        let svc = test_service().await;
        let now = Utc::now();
        let row = svc
            .create_scheduled_email(
                "admin",
                &broadcast(EmailAudience::Custom, &["x@bad.test"], now - TimeDelta::minutes(5)),
            )
            .await
            .unwrap();
        let email = Arc::new(FakeEmail::rejecting(&["x@bad.test"]));
        let report = notifier(&svc, Some(email), None)
            .process_scheduled(now)
            .await
            .unwrap();
        assert_eq!(report.processed[0].status, ScheduledEmailStatus::Failed);
        let stored = svc.get_scheduled_email(&row.id).await.unwrap();
        assert_eq!(stored.failed_count, 1);
        assert!(stored.last_error.unwrap().contains("invalid recipient"));
    }

    #[tokio::test]
    async fn partial_failure_is_still_sent() {
        let svc = test_service().await;
        let now = Utc::now();
        svc.create_scheduled_email(
            "admin",
            &broadcast(
                EmailAudience::Custom,
                &["ok@example.com", "x@bad.test", "OK@example.com"],
                now,
            ),
        )
        .await
        .unwrap();
        let email = Arc::new(FakeEmail::rejecting(&["x@bad.test"]));
        let report = notifier(&svc, Some(Arc::clone(&email)), None)
            .process_scheduled(now)
            .await
            .unwrap();
        let item = &report.processed[0];
        assert_eq!(item.status, ScheduledEmailStatus::Sent);
        assert_eq!((item.recipient_count, item.sent_count, item.failed_count), (2, 1, 1));
        assert_eq!(email.recipients(), vec!["ok@example.com"]);
    }

    #[tokio::test]
    async fn processed_rows_are_not_sent_twice() {
        let svc = test_service().await;
        let now = Utc::now();
        svc.create_scheduled_email(
            "admin",
            &broadcast(EmailAudience::Custom, &["a@example.com"], now),
        )
        .await
        .unwrap();
        let email = Arc::new(FakeEmail::default());
        let n = notifier(&svc, Some(Arc::clone(&email)), None);
        n.process_scheduled(now).await.unwrap();
        let second = n.process_scheduled(now).await.unwrap();
        assert_eq!(second.due, 0);
        assert_eq!(email.recipients().len(), 1);
    }

    #[tokio::test]
    async fn requires_email_sender() {
        let svc = test_service().await;
        let err = notifier(&svc, None, None)
            .process_scheduled(Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::NotConfigured("email")));
    }

    #[tokio::test]
    async fn broken_run_does_not_leave_row_sending() {
        let svc = test_service().await;
        let email = Arc::new(FakeEmail::default());
        let due = svc
            .create_scheduled_email(
                "admin",
                &broadcast(EmailAudience::All, &[], Utc::now() - TimeDelta::minutes(1)),
            )
            .await
            .unwrap();
        svc.db()
            .conn()
            .execute("ALTER TABLE profiles RENAME TO profiles_offline", ())
            .await
            .unwrap();

        let report = notifier(&svc, Some(Arc::clone(&email)), None)
            .process_scheduled(Utc::now())
            .await
            .unwrap();
        assert_eq!(report.processed.len(), 1);
        assert_eq!(report.processed[0].status, ScheduledEmailStatus::Failed);

        let row = svc.get_scheduled_email(&due.id).await.unwrap();
        assert_eq!(row.status, ScheduledEmailStatus::Failed);
        assert!(row.last_error.is_some());
        assert!(email.recipients().is_empty());
    }
}
