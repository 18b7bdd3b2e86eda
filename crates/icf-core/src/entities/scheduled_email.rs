use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{EmailAudience, ScheduledEmailStatus};

/// An admin broadcast email queued for a future send time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledEmail {
    pub id: String,
    pub created_by: String,
    pub subject: String,
    /// Plain text body with `{{ placeholder }}` markers.
    pub content: String,
    pub audience: EmailAudience,
    /// Only used when `audience` is `custom`.
    pub custom_recipients: Vec<String>,
    pub scheduled_for: DateTime<Utc>,
    pub status: ScheduledEmailStatus,
    pub recipient_count: i64,
    pub sent_count: i64,
    pub failed_count: i64,
    pub last_error: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
