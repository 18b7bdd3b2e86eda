//! Mentoring / supervision update builder.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use icf_core::enums::MentoringKind;

use super::{SetClauses, double_option};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MentoringUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MentoringKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_group: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_name: Option<String>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub provider_credential: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub focus_area: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub document_path: Option<Option<String>>,
}

impl MentoringUpdate {
    pub(crate) fn to_set_clauses(&self) -> SetClauses {
        let mut sets = SetClauses::default();
        if let Some(kind) = self.kind {
            sets.push("kind", kind.as_str());
        }
        if let Some(date) = self.session_date {
            sets.push("session_date", date.to_string());
        }
        if let Some(minutes) = self.duration_minutes {
            sets.push("duration_minutes", minutes);
        }
        if let Some(group) = self.is_group {
            sets.push("is_group", i64::from(group));
        }
        if let Some(ref name) = self.provider_name {
            sets.push("provider_name", name.clone());
        }
        if let Some(ref credential) = self.provider_credential {
            sets.push_opt("provider_credential", credential.clone());
        }
        if let Some(ref focus) = self.focus_area {
            sets.push_opt("focus_area", focus.clone());
        }
        if let Some(ref notes) = self.notes {
            sets.push_opt("notes", notes.clone());
        }
        if let Some(ref path) = self.document_path {
            sets.push_opt("document_path", path.clone());
        }
        sets
    }
}

pub struct MentoringUpdateBuilder(MentoringUpdate);

impl MentoringUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(MentoringUpdate::default())
    }

    #[must_use]
    pub const fn kind(mut self, kind: MentoringKind) -> Self {
        self.0.kind = Some(kind);
        self
    }

    #[must_use]
    pub const fn duration_minutes(mut self, minutes: i64) -> Self {
        self.0.duration_minutes = Some(minutes);
        self
    }

    #[must_use]
    pub fn focus_area(mut self, focus: Option<String>) -> Self {
        self.0.focus_area = Some(focus);
        self
    }

    #[must_use]
    pub fn build(self) -> MentoringUpdate {
        self.0
    }
}

impl Default for MentoringUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
