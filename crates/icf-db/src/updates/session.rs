//! Coaching session update builder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use icf_core::enums::{PaymentType, SessionType};

use super::{SetClauses, double_option};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionUpdate {
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_type: Option<SessionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_type: Option<PaymentType>,
    #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl SessionUpdate {
    /// Whether the time range or duration changes, so the merged row must be re-checked.
    #[must_use]
    pub const fn touches_timing(&self) -> bool {
        self.started_at.is_some() || self.ended_at.is_some() || self.duration_minutes.is_some()
    }

    pub(crate) fn to_set_clauses(&self) -> SetClauses {
        let mut sets = SetClauses::default();
        if let Some(ref client_id) = self.client_id {
            sets.push_opt("client_id", client_id.clone());
        }
        if let Some(ref name) = self.client_name {
            sets.push("client_name", name.clone());
        }
        if let Some(started) = self.started_at {
            sets.push("started_at", started.to_rfc3339());
        }
        if let Some(ended) = self.ended_at {
            sets.push("ended_at", ended.to_rfc3339());
        }
        if let Some(minutes) = self.duration_minutes {
            sets.push("duration_minutes", minutes);
        }
        if let Some(kind) = self.session_type {
            sets.push("session_type", kind.as_str());
        }
        if let Some(payment) = self.payment_type {
            sets.push("payment_type", payment.as_str());
        }
        if let Some(ref notes) = self.notes {
            sets.push_opt("notes", notes.clone());
        }
        sets
    }
}

pub struct SessionUpdateBuilder(SessionUpdate);

impl SessionUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self(SessionUpdate::default())
    }

    #[must_use]
    pub fn client_id(mut self, client_id: Option<String>) -> Self {
        self.0.client_id = Some(client_id);
        self
    }

    #[must_use]
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.0.client_name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn range(mut self, started_at: DateTime<Utc>, ended_at: DateTime<Utc>) -> Self {
        self.0.started_at = Some(started_at);
        self.0.ended_at = Some(ended_at);
        self
    }

    #[must_use]
    pub const fn duration_minutes(mut self, minutes: i64) -> Self {
        self.0.duration_minutes = Some(minutes);
        self
    }

    #[must_use]
    pub const fn payment_type(mut self, payment: PaymentType) -> Self {
        self.0.payment_type = Some(payment);
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.0.notes = Some(notes);
        self
    }

    #[must_use]
    pub fn build(self) -> SessionUpdate {
        self.0
    }
}

impl Default for SessionUpdateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
