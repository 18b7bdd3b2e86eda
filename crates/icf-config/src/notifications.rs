//! Batch notification settings.

use serde::{Deserialize, Serialize};

const fn default_send_delay_ms() -> u64 {
    600
}

const fn default_trial_warning_days() -> i64 {
    3
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationsConfig {
    /// Shared secret the cron trigger sends as a bearer token.
    #[serde(default)]
    pub cron_secret: String,

    /// Fixed pause between outbound sends, to stay under provider rate limits.
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,

    #[serde(default = "default_trial_warning_days")]
    pub trial_warning_days: i64,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            cron_secret: String::new(),
            send_delay_ms: default_send_delay_ms(),
            trial_warning_days: default_trial_warning_days(),
        }
    }
}

impl NotificationsConfig {
    pub fn is_configured(&self) -> bool {
        !self.cron_secret.is_empty()
    }

    pub const fn send_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.send_delay_ms)
    }
}
