//! CSV import of coaching sessions.
//!
//! Headers are matched case-insensitively: `date`, `client`, `duration`
//! (required) and `start_time`, `type`, `payment`, `notes` (optional). Both
//! `,` and `;` delimited files are accepted. Bad rows are reported with their
//! 1-based data row number and skipped.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use icf_core::enums::{PaymentType, SessionSource, SessionType};
use icf_core::numeric::{NumberLocale, parse_duration_minutes};
use icf_db::inputs::NewCoachingSession;
use icf_db::service::IcfService;
use serde::Serialize;

use crate::error::ExportError;

/// Time of day used when a row has no `start_time`.
const DEFAULT_START: NaiveTime = match NaiveTime::from_hms_opt(12, 0, 0) {
    Some(t) => t,
    None => NaiveTime::MIN,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

/// A session parsed from one data row.
#[derive(Debug, Clone)]
pub struct ParsedRow {
    pub row: usize,
    pub session: NewCoachingSession,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedImport {
    pub rows: Vec<ParsedRow>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: Vec<RowError>,
}

struct Columns {
    date: usize,
    client: usize,
    duration: usize,
    start_time: Option<usize>,
    session_type: Option<usize>,
    payment: Option<usize>,
    notes: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, ExportError> {
        let index: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim().trim_start_matches('\u{feff}').to_lowercase(), i))
            .collect();
        let find = |names: &[&str]| names.iter().find_map(|n| index.get(*n).copied());
        Ok(Self {
            date: find(&["date"]).ok_or(ExportError::MissingColumn("date"))?,
            client: find(&["client", "client_name"]).ok_or(ExportError::MissingColumn("client"))?,
            duration: find(&["duration", "duration_minutes"])
                .ok_or(ExportError::MissingColumn("duration"))?,
            start_time: find(&["start_time", "start"]),
            session_type: find(&["type", "session_type"]),
            payment: find(&["payment", "payment_type"]),
            notes: find(&["notes"]),
        })
    }
}

fn field<'r>(record: &'r csv::StringRecord, col: Option<usize>) -> Option<&'r str> {
    col.and_then(|c| record.get(c))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_date(value: &str, locale: NumberLocale) -> Result<NaiveDate, String> {
    let slash_format = if locale == NumberLocale::Us {
        "%m/%d/%Y"
    } else {
        "%d/%m/%Y"
    };
    ["%Y-%m-%d", "%d.%m.%Y", slash_format]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .ok_or_else(|| format!("unrecognised date '{value}'"))
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    ["%H:%M", "%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| format!("unrecognised start time '{value}'"))
}

fn parse_session_type(value: &str) -> Result<SessionType, String> {
    match value.to_lowercase().as_str() {
        "individual" | "1:1" | "one-on-one" => Ok(SessionType::Individual),
        "group" => Ok(SessionType::Group),
        "team" => Ok(SessionType::Team),
        other => Err(format!("unknown session type '{other}'")),
    }
}

fn parse_payment(value: &str) -> Result<PaymentType, String> {
    match value.to_lowercase().replace(['-', ' '], "_").as_str() {
        "paid" => Ok(PaymentType::Paid),
        "pro_bono" | "probono" => Ok(PaymentType::ProBono),
        other => Err(format!("unknown payment type '{other}'")),
    }
}

fn parse_row(
    record: &csv::StringRecord,
    cols: &Columns,
    locale: NumberLocale,
) -> Result<NewCoachingSession, String> {
    let date = field(record, Some(cols.date)).ok_or("date is required")?;
    let client = field(record, Some(cols.client)).ok_or("client is required")?;
    let duration = field(record, Some(cols.duration)).ok_or("duration is required")?;

    let date = parse_date(date, locale)?;
    let start = field(record, cols.start_time)
        .map(parse_time)
        .transpose()?
        .unwrap_or(DEFAULT_START);
    let minutes = parse_duration_minutes(duration, locale).map_err(|e| e.to_string())?;
    let started_at = date.and_time(start).and_utc();
    let ended_at = TimeDelta::try_minutes(minutes)
        .and_then(|length| started_at.checked_add_signed(length))
        .ok_or("session end is out of range")?;

    let mut session =
        NewCoachingSession::from_range(client, started_at, ended_at, SessionSource::Import);
    if let Some(value) = field(record, cols.session_type) {
        session.session_type = parse_session_type(value)?;
    }
    if let Some(value) = field(record, cols.payment) {
        session.payment_type = parse_payment(value)?;
    }
    session.notes = field(record, cols.notes).map(str::to_string);
    Ok(session)
}

fn detect_delimiter(data: &[u8]) -> u8 {
    let header = data.split(|b| *b == b'\n').next().unwrap_or_default();
    let commas = header.iter().filter(|b| **b == b',').count();
    let semicolons = header.iter().filter(|b| **b == b';').count();
    if semicolons > commas { b';' } else { b',' }
}

/// Parse a CSV body without touching the database.
///
/// # Errors
///
/// Returns [`ExportError::MissingColumn`] / [`ExportError::Empty`] when the
/// header row is unusable. Row-level problems land in `errors`.
pub fn parse_sessions_csv(data: &[u8], locale: NumberLocale) -> Result<ParsedImport, ExportError> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(ExportError::Empty);
    }
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(data))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);
    let cols = Columns::from_headers(reader.headers()?)?;

    let mut parsed = ParsedImport::default();
    for (idx, record) in reader.records().enumerate() {
        let row = idx + 1;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                parsed.errors.push(RowError {
                    row,
                    message: e.to_string(),
                });
                continue;
            }
        };
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        match parse_row(&record, &cols, locale) {
            Ok(session) => parsed.rows.push(ParsedRow { row, session }),
            Err(message) => parsed.errors.push(RowError { row, message }),
        }
    }
    Ok(parsed)
}

/// Parse and insert sessions for `user_id`. Rows whose client name matches
/// an existing client (case-insensitive) are linked to it.
///
/// # Errors
///
/// Returns [`ExportError`] for an unusable file or a failed client lookup.
/// Insert failures are reported per row.
pub async fn import_sessions(
    svc: &IcfService,
    user_id: &str,
    data: &[u8],
    locale: NumberLocale,
) -> Result<ImportReport, ExportError> {
    let parsed = parse_sessions_csv(data, locale)?;
    let clients: HashMap<String, String> = svc
        .list_clients(user_id, None)
        .await?
        .into_iter()
        .map(|c| (c.name.to_lowercase(), c.id))
        .collect();

    let mut report = ImportReport {
        imported: 0,
        errors: parsed.errors,
    };
    for ParsedRow { row, mut session } in parsed.rows {
        session.client_id = clients.get(&session.client_name.to_lowercase()).cloned();
        match svc.create_session(user_id, &session).await {
            Ok(_) => report.imported += 1,
            Err(e) => report.errors.push(RowError {
                row,
                message: e.to_string(),
            }),
        }
    }
    report.errors.sort_by_key(|e| e.row);
    tracing::info!(user_id, imported = report.imported, errors = report.errors.len(), "session import finished");
    Ok(report)
}
