use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{NotificationChannel, NotificationKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationLogEntry {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub channel: NotificationChannel,
    pub sent_at: DateTime<Utc>,
}
