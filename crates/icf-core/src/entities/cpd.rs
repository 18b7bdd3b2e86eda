use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{CpdType, LearningMethod};

/// A continuing professional development activity (one hour = one CCEU).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CpdEntry {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub activity_date: NaiveDate,
    pub hours: f64,
    pub cpd_type: CpdType,
    pub learning_method: LearningMethod,
    pub provider: Option<String>,
    /// ICF core competencies addressed, free-form labels.
    pub competencies: Vec<String>,
    /// Object storage key of the certificate or supporting document.
    pub document_path: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
