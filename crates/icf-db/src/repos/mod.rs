//! Repository modules implementing the ICF Log persistence operations.
//!
//! Each module adds methods to `IcfService` via `impl IcfService` blocks.

pub mod client;
pub mod cpd;
pub mod mentoring;
pub mod notification;
pub mod profile;
pub mod push;
pub mod scheduled_email;
pub mod session;
pub mod webhook;

use chrono::NaiveDate;
use serde::Deserialize;

/// Inclusive calendar-date window used by list and export queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    #[must_use]
    pub const fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// Append `AND substr(col, 1, 10) >= ?n` style filters for a date or
    /// RFC 3339 column.
    pub(crate) fn push_filters(
        &self,
        column: &str,
        clauses: &mut Vec<String>,
        params: &mut Vec<libsql::Value>,
    ) {
        if let Some(from) = self.from {
            params.push(from.to_string().into());
            clauses.push(format!("substr({column}, 1, 10) >= ?{}", params.len()));
        }
        if let Some(to) = self.to {
            params.push(to.to_string().into());
            clauses.push(format!("substr({column}, 1, 10) <= ?{}", params.len()));
        }
    }
}
