use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A browser push subscription (the `PushSubscription.toJSON()` shape, flattened).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushSubscription {
    pub id: String,
    pub user_id: String,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}
