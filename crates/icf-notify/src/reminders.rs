//! Logging reminders and trial ending warnings (`check-and-send`).

use chrono::{DateTime, TimeDelta, Utc};
use icf_core::entities::Profile;
use icf_core::enums::{NotificationChannel, NotificationKind};
use icf_providers::{EmailMessage, ProviderError, PushMessage};
use serde::Serialize;

use crate::error::NotifyError;
use crate::pacer::Pacer;
use crate::template::{recipient_vars, render_email};
use crate::Notifier;

const REMINDER_SUBJECT: &str = "Time to log your coaching hours";
const REMINDER_BODY: &str = "Hi {{ first_name }},

It has been {{ days }} days since you last logged anything in ICF Log.

A current log makes your next credential application painless:
- coaching sessions
- CPD activities
- mentoring and supervision

Log now: {{ app_url }}/sessions";

const TRIAL_SUBJECT: &str = "Your ICF Log trial ends on {{ trial_end }}";
const TRIAL_BODY: &str = "Hi {{ first_name }},

Your free trial ends on **{{ trial_end }}**. Pick a plan to keep logging sessions, CPD and mentoring hours without interruption.

Choose a plan: {{ app_url }}/subscription

Everything you logged so far stays in your account either way.";

/// Counts returned by a reminder run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    pub candidates: usize,
    /// Reminded within their frequency window already.
    pub skipped_recent: usize,
    /// Logged something recently enough.
    pub not_due: usize,
    pub reminded: usize,
    pub emails_sent: usize,
    pub pushes_sent: usize,
    pub trial_warnings_sent: usize,
    pub endpoints_removed: usize,
    pub failures: usize,
}

/// Whole days between the last logged activity (or signup) and `now`, when a
/// reminder is due.
fn days_inactive_if_due(
    profile: &Profile,
    latest_activity: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<i64> {
    let frequency = profile.notifications.reminder_frequency_days.max(1);
    let since = latest_activity.unwrap_or(profile.created_at);
    let days = (now - since).num_days();
    (days >= frequency).then_some(days)
}

fn reminded_recently(profile: &Profile, now: DateTime<Utc>) -> bool {
    let frequency = profile.notifications.reminder_frequency_days.max(1);
    profile
        .last_reminder_sent_at
        .is_some_and(|at| now - at < TimeDelta::days(frequency))
}

impl Notifier {
    /// One reminder run over every eligible profile.
    ///
    /// Provider failures are counted and logged; database failures abort.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Database`] if profiles cannot be read or stamped.
    pub async fn check_and_send(&self, now: DateTime<Utc>) -> Result<ReminderReport, NotifyError> {
        let mut report = ReminderReport::default();
        let mut pacer = Pacer::new(self.settings.send_delay);

        let candidates = self.svc.list_reminder_candidates().await?;
        report.candidates = candidates.len();
        for profile in &candidates {
            if reminded_recently(profile, now) {
                report.skipped_recent += 1;
                continue;
            }
            let latest = self.svc.latest_activity_at(&profile.user_id).await?;
            let Some(days) = days_inactive_if_due(profile, latest, now) else {
                report.not_due += 1;
                continue;
            };
            self.remind(profile, days, now, &mut pacer, &mut report)
                .await?;
        }

        self.warn_trials_ending(now, &mut pacer, &mut report).await?;

        tracing::info!(
            candidates = report.candidates,
            reminded = report.reminded,
            emails = report.emails_sent,
            pushes = report.pushes_sent,
            trial_warnings = report.trial_warnings_sent,
            failures = report.failures,
            "reminder run finished"
        );
        Ok(report)
    }

    async fn remind(
        &self,
        profile: &Profile,
        days: i64,
        now: DateTime<Utc>,
        pacer: &mut Pacer,
        report: &mut ReminderReport,
    ) -> Result<(), NotifyError> {
        let mut delivered = None;

        let email = self
            .email
            .as_deref()
            .filter(|_| profile.notifications.email_reminders);
        if let Some(email) = email {
            let mut vars = recipient_vars(
                profile.full_name.as_deref(),
                &profile.email,
                &self.settings.app_url,
            );
            vars.insert("days".into(), days.to_string());
            let rendered = render_email(REMINDER_SUBJECT, REMINDER_BODY, &vars, &self.settings.app_url);
            pacer.wait().await;
            match email
                .send(&EmailMessage {
                    to: profile.email.clone(),
                    subject: rendered.subject,
                    html: rendered.html,
                    text: rendered.text,
                })
                .await
            {
                Ok(_) => {
                    report.emails_sent += 1;
                    delivered = Some(NotificationChannel::Email);
                }
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!(user_id = %profile.user_id, error = %e, "reminder email failed");
                }
            }
        }

        let push = self
            .push
            .as_deref()
            .filter(|_| profile.notifications.push_reminders);
        if let Some(push) = push {
            let message = PushMessage {
                title: "Time to log your hours".into(),
                body: format!("It has been {days} days since your last entry."),
                url: Some(format!("{}/sessions", self.settings.app_url)),
            };
            for subscription in self.svc.list_push_subscriptions(&profile.user_id).await? {
                pacer.wait().await;
                match push.send(&subscription, &message).await {
                    Ok(()) => {
                        report.pushes_sent += 1;
                        delivered.get_or_insert(NotificationChannel::Push);
                    }
                    Err(ProviderError::Gone(endpoint)) => {
                        self.svc.delete_push_endpoint(&endpoint).await?;
                        report.endpoints_removed += 1;
                    }
                    Err(e) => {
                        report.failures += 1;
                        tracing::warn!(user_id = %profile.user_id, error = %e, "reminder push failed");
                    }
                }
            }
        }

        if let Some(channel) = delivered {
            self.svc.mark_reminder_sent(&profile.user_id, now).await?;
            self.svc
                .log_notification(&profile.user_id, NotificationKind::LoggingReminder, channel)
                .await?;
            report.reminded += 1;
            tracing::debug!(user_id = %profile.user_id, days, "logging reminder sent");
        }
        Ok(())
    }

    async fn warn_trials_ending(
        &self,
        now: DateTime<Utc>,
        pacer: &mut Pacer,
        report: &mut ReminderReport,
    ) -> Result<(), NotifyError> {
        let Some(email) = self.email.as_deref() else {
            return Ok(());
        };
        let until = now + TimeDelta::days(self.settings.trial_warning_days);
        for profile in self.svc.list_trials_ending(now, until).await? {
            if self
                .svc
                .has_notification(&profile.user_id, NotificationKind::TrialEnding)
                .await?
            {
                continue;
            }
            let Some(trial_end) = profile.subscription.trial_ends_at else {
                continue;
            };
            let mut vars = recipient_vars(
                profile.full_name.as_deref(),
                &profile.email,
                &self.settings.app_url,
            );
            vars.insert("trial_end".into(), trial_end.format("%B %-d, %Y").to_string());
            let rendered = render_email(TRIAL_SUBJECT, TRIAL_BODY, &vars, &self.settings.app_url);
            pacer.wait().await;
            match email
                .send(&EmailMessage {
                    to: profile.email.clone(),
                    subject: rendered.subject,
                    html: rendered.html,
                    text: rendered.text,
                })
                .await
            {
                Ok(_) => {
                    self.svc
                        .log_notification(
                            &profile.user_id,
                            NotificationKind::TrialEnding,
                            NotificationChannel::Email,
                        )
                        .await?;
                    report.trial_warnings_sent += 1;
                }
                Err(e) => {
                    report.failures += 1;
                    tracing::warn!(user_id = %profile.user_id, error = %e, "trial warning email failed");
                }
            }
        }
        Ok(())
    }
}
