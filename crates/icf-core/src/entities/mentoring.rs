use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::MentoringKind;

/// A mentor coaching or supervision session the coach received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MentoringSession {
    pub id: String,
    pub user_id: String,
    pub kind: MentoringKind,
    pub session_date: NaiveDate,
    pub duration_minutes: i64,
    pub is_group: bool,
    pub provider_name: String,
    pub provider_credential: Option<String>,
    pub focus_area: Option<String>,
    pub notes: Option<String>,
    pub document_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MentoringSession {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hours(&self) -> f64 {
        self.duration_minutes as f64 / 60.0
    }
}
