//! Tabular views of logged records, shared by the CSV and XLSX writers.

use icf_core::entities::{CoachingSession, CpdEntry, MentoringSession};

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    /// Rendered with two decimals.
    Hours(f64),
}

impl Cell {
    fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    fn opt(value: Option<&str>) -> Self {
        Self::Text(value.unwrap_or_default().to_string())
    }

    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Hours(h) => format!("{h:.2}"),
        }
    }
}

/// Header row, data rows and a totals row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub sheet_name: &'static str,
    pub headers: &'static [&'static str],
    pub rows: Vec<Vec<Cell>>,
    pub totals: Option<Vec<Cell>>,
}

/// `pro_bono` → `Pro bono`.
fn label(value: &str) -> String {
    let spaced = value.replace('_', " ");
    let mut chars = spaced.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

fn totals_row(width: usize, hours_col: usize, total: f64) -> Vec<Cell> {
    (0..width)
        .map(|i| match i {
            0 => Cell::text("Total"),
            i if i == hours_col => Cell::Hours(total),
            _ => Cell::text(""),
        })
        .collect()
}

const SESSION_HEADERS: &[&str] = &[
    "Date",
    "Start",
    "End",
    "Client",
    "Type",
    "Payment",
    "Duration (hours)",
    "Source",
    "Notes",
];

#[must_use]
pub fn sessions_table(sessions: &[CoachingSession]) -> Table {
    let rows = sessions
        .iter()
        .map(|s| {
            vec![
                Cell::text(s.started_at.format("%Y-%m-%d").to_string()),
                Cell::text(s.started_at.format("%H:%M").to_string()),
                Cell::text(s.ended_at.format("%H:%M").to_string()),
                Cell::text(s.client_name.clone()),
                Cell::text(label(s.session_type.as_str())),
                Cell::text(label(s.payment_type.as_str())),
                Cell::Hours(s.hours()),
                Cell::text(label(s.source.as_str())),
                Cell::opt(s.notes.as_deref()),
            ]
        })
        .collect();
    let total = sessions.iter().map(CoachingSession::hours).sum();
    Table {
        sheet_name: "Coaching sessions",
        headers: SESSION_HEADERS,
        rows,
        totals: Some(totals_row(SESSION_HEADERS.len(), 6, total)),
    }
}

const CPD_HEADERS: &[&str] = &[
    "Date",
    "Title",
    "Type",
    "Learning method",
    "Provider",
    "Hours",
    "Competencies",
    "Document",
    "Notes",
];

#[must_use]
pub fn cpd_table(entries: &[CpdEntry]) -> Table {
    let rows = entries
        .iter()
        .map(|e| {
            vec![
                Cell::text(e.activity_date.format("%Y-%m-%d").to_string()),
                Cell::text(e.title.clone()),
                Cell::text(e.cpd_type.label()),
                Cell::text(label(e.learning_method.as_str())),
                Cell::opt(e.provider.as_deref()),
                Cell::Hours(e.hours),
                Cell::text(e.competencies.join("; ")),
                Cell::opt(e.document_path.as_deref()),
                Cell::opt(e.notes.as_deref()),
            ]
        })
        .collect();
    let total = entries.iter().map(|e| e.hours).sum();
    Table {
        sheet_name: "CPD",
        headers: CPD_HEADERS,
        rows,
        totals: Some(totals_row(CPD_HEADERS.len(), 5, total)),
    }
}

const MENTORING_HEADERS: &[&str] = &[
    "Date",
    "Kind",
    "Provider",
    "Provider credential",
    "Format",
    "Duration (hours)",
    "Focus area",
    "Document",
    "Notes",
];

#[must_use]
pub fn mentoring_table(sessions: &[MentoringSession]) -> Table {
    let rows = sessions
        .iter()
        .map(|m| {
            vec![
                Cell::text(m.session_date.format("%Y-%m-%d").to_string()),
                Cell::text(label(m.kind.as_str())),
                Cell::text(m.provider_name.clone()),
                Cell::opt(m.provider_credential.as_deref()),
                Cell::text(if m.is_group { "Group" } else { "Individual" }),
                Cell::Hours(m.hours()),
                Cell::opt(m.focus_area.as_deref()),
                Cell::opt(m.document_path.as_deref()),
                Cell::opt(m.notes.as_deref()),
            ]
        })
        .collect();
    let total = sessions.iter().map(MentoringSession::hours).sum();
    Table {
        sheet_name: "Mentoring",
        headers: MENTORING_HEADERS,
        rows,
        totals: Some(totals_row(MENTORING_HEADERS.len(), 5, total)),
    }
}
