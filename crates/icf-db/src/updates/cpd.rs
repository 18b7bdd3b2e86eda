//! CPD entry update builder.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use icf_core::enums::{CpdType, LearningMethod};

use super::{SetClauses, double_option};
use crate::error::DatabaseError;
use crate::helpers::encode_string_list;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CpdUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpd_type: Option<CpdType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_method: Option<LearningMethod>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub provider: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competencies: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub document_path: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl CpdUpdate {
    pub(crate) fn to_set_clauses(&self) -> Result<SetClauses, DatabaseError> {
        let mut sets = SetClauses::default();
        if let Some(ref title) = self.title {
            sets.push("title", title.clone());
        }
        if let Some(date) = self.activity_date {
            sets.push("activity_date", date.to_string());
        }
        if let Some(hours) = self.hours {
            sets.push("hours", hours);
        }
        if let Some(kind) = self.cpd_type {
            sets.push("cpd_type", kind.as_str());
        }
        if let Some(method) = self.learning_method {
            sets.push("learning_method", method.as_str());
        }
        if let Some(ref provider) = self.provider {
            sets.push_opt("provider", provider.clone());
        }
        if let Some(ref competencies) = self.competencies {
            sets.push("competencies", encode_string_list(competencies)?);
        }
        if let Some(ref path) = self.document_path {
            sets.push_opt("document_path", path.clone());
        }
        if let Some(ref notes) = self.notes {
            sets.push_opt("notes", notes.clone());
        }
        Ok(sets)
    }
}

pub struct CpdUpdateBuilder(CpdUpdate);

impl CpdUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(CpdUpdate::default())
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.0.title = Some(title.into());
        self
    }

    #[must_use]
    pub const fn hours(mut self, hours: f64) -> Self {
        self.0.hours = Some(hours);
        self
    }

    #[must_use]
    pub const fn cpd_type(mut self, cpd_type: CpdType) -> Self {
        self.0.cpd_type = Some(cpd_type);
        self
    }

    #[must_use]
    pub fn competencies(mut self, competencies: Vec<String>) -> Self {
        self.0.competencies = Some(competencies);
        self
    }

    #[must_use]
    pub fn document_path(mut self, path: Option<String>) -> Self {
        self.0.document_path = Some(path);
        self
    }

    #[must_use]
    pub fn build(self) -> CpdUpdate {
        self.0
    }
}

impl Default for CpdUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
