use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{PaymentType, SessionSource, SessionType};

/// A logged coaching session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CoachingSession {
    pub id: String,
    pub user_id: String,
    pub client_id: Option<String>,
    pub client_name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_minutes: i64,
    pub session_type: SessionType,
    pub payment_type: PaymentType,
    pub notes: Option<String>,
    pub source: SessionSource,
    pub calendly_event_uri: Option<String>,
    pub calendly_invitee_uri: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CoachingSession {
    /// Logged duration in hours.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hours(&self) -> f64 {
        self.duration_minutes as f64 / 60.0
    }
}
