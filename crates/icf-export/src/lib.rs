//! # icf-export
//!
//! Spreadsheet exports of a coach's log (CSV and XLSX) and CSV import of
//! coaching sessions. Exports list rows oldest first with a totals row so
//! they can be attached to credential applications as-is.

pub mod error;
pub mod import;
pub mod table;
pub mod writer;

use chrono::NaiveDate;
use icf_db::repos::DateRange;
use icf_db::repos::mentoring::MentoringFilter;
use icf_db::repos::session::SessionFilter;
use icf_db::service::IcfService;
use serde::Deserialize;

pub use error::ExportError;
pub use import::{ImportReport, RowError, import_sessions, parse_sessions_csv};
pub use writer::{ExportFile, ExportFormat};

/// Which log to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Sessions,
    Cpd,
    Mentoring,
}

impl ExportKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sessions => "sessions",
            Self::Cpd => "cpd",
            Self::Mentoring => "mentoring",
        }
    }
}

/// Load the caller's rows in `range` and serialise them.
///
/// # Errors
///
/// Returns [`ExportError`] on a database or serialisation failure.
pub async fn export(
    svc: &IcfService,
    user_id: &str,
    kind: ExportKind,
    range: DateRange,
    format: ExportFormat,
    today: NaiveDate,
) -> Result<ExportFile, ExportError> {
    let table = match kind {
        ExportKind::Sessions => {
            let mut sessions = svc
                .list_sessions(
                    user_id,
                    &SessionFilter {
                        range,
                        client_id: None,
                    },
                )
                .await?;
            sessions.sort_by_key(|s| s.started_at);
            table::sessions_table(&sessions)
        }
        ExportKind::Cpd => {
            let mut entries = svc.list_cpd_entries(user_id, &range).await?;
            entries.sort_by_key(|e| e.activity_date);
            table::cpd_table(&entries)
        }
        ExportKind::Mentoring => {
            let mut sessions = svc
                .list_mentoring_sessions(user_id, &MentoringFilter { range, kind: None })
                .await?;
            sessions.sort_by_key(|m| m.session_date);
            table::mentoring_table(&sessions)
        }
    };
    tracing::debug!(user_id, kind = kind.as_str(), rows = table.rows.len(), "export built");
    writer::write_table(
        &table,
        format,
        &format!("icflog-{}-{}", kind.as_str(), today.format("%Y-%m-%d")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};
    use icf_core::enums::SessionSource;
    use icf_db::inputs::NewCoachingSession;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn exports_sessions_oldest_first_in_range() {
        let svc = IcfService::new_local(":memory:").await.unwrap();
        svc.ensure_profile("user_1", "coach@example.com", None)
            .await
            .unwrap();
        for (day, name) in [(3, "Later"), (1, "Earlier"), (20, "Outside")] {
            let start = Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap();
            svc.create_session(
                "user_1",
                &NewCoachingSession::from_range(
                    name,
                    start,
                    start + TimeDelta::minutes(30),
                    SessionSource::Manual,
                ),
            )
            .await
            .unwrap();
        }

        let range = DateRange::new(NaiveDate::from_ymd_opt(2026, 3, 1), NaiveDate::from_ymd_opt(2026, 3, 10));
        let file = export(
            &svc,
            "user_1",
            ExportKind::Sessions,
            range,
            ExportFormat::Csv,
            NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(file.file_name, "icflog-sessions-2026-10-17.csv");
        let csv = String::from_utf8(file.bytes).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Date,Start,End,Client"));
        assert!(lines[1].contains("Earlier"));
        assert!(lines[2].contains("Later"));
        assert!(lines[3].starts_with("Total,"));
        assert!(lines[3].contains("1.00"));
    }

    #[tokio::test]
    async fn empty_cpd_export_still_has_headers() {
        let svc = IcfService::new_local(":memory:").await.unwrap();
        let file = export(
            &svc,
            "nobody",
            ExportKind::Cpd,
            DateRange::default(),
            ExportFormat::Xlsx,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        )
        .await
        .unwrap();
        assert_eq!(file.file_name, "icflog-cpd-2026-01-01.xlsx");
        assert!(!file.bytes.is_empty());
    }
}
