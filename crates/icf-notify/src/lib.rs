//! # icf-notify
//!
//! Outbound notifications for ICF Log:
//! - [`template`]: `{{ placeholder }}` substitution and plain text → HTML
//! - [`reminders`]: the `check-and-send` logging reminder and trial ending run
//! - [`scheduled`]: dispatch of due admin broadcast emails
//! - [`broadcast`]: admin push notifications
//!
//! Runs are triggered externally (cron route or CLI). Sends are sequential
//! with a fixed delay between provider calls to stay under rate limits.

pub mod broadcast;
pub mod error;
pub mod reminders;
pub mod scheduled;
pub mod template;

mod pacer;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Duration;

use icf_config::IcfConfig;
use icf_db::service::IcfService;
use icf_providers::{EmailSender, PushSender};

pub use broadcast::PushReport;
pub use error::NotifyError;
pub use reminders::ReminderReport;
pub use scheduled::ScheduledReport;

/// Knobs shared by all runs.
#[derive(Debug, Clone)]
pub struct NotifySettings {
    /// Public base URL of the web app, without trailing slash.
    pub app_url: String,
    /// Pause between two provider calls.
    pub send_delay: Duration,
    /// Trial ending warnings go out this many days ahead.
    pub trial_warning_days: i64,
}

impl NotifySettings {
    #[must_use]
    pub fn from_config(config: &IcfConfig) -> Self {
        Self {
            app_url: config.server.app_url().to_string(),
            send_delay: config.notifications.send_delay(),
            trial_warning_days: config.notifications.trial_warning_days,
        }
    }
}

/// Database plus whichever delivery channels are configured.
pub struct Notifier {
    svc: Arc<IcfService>,
    email: Option<Arc<dyn EmailSender>>,
    push: Option<Arc<dyn PushSender>>,
    settings: NotifySettings,
}

impl Notifier {
    #[must_use]
    pub fn new(
        svc: Arc<IcfService>,
        email: Option<Arc<dyn EmailSender>>,
        push: Option<Arc<dyn PushSender>>,
        settings: NotifySettings,
    ) -> Self {
        Self {
            svc,
            email,
            push,
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &NotifySettings {
        &self.settings
    }

    fn email_sender(&self) -> Result<&dyn EmailSender, NotifyError> {
        self.email
            .as_deref()
            .ok_or(NotifyError::NotConfigured("email"))
    }

    fn push_sender(&self) -> Result<&dyn PushSender, NotifyError> {
        self.push.as_deref().ok_or(NotifyError::NotConfigured("push"))
    }
}
