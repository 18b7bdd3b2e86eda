//! Credential progress, spreadsheet export and CSV import.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::{NaiveDate, Utc};
use icf_core::credential::{ProgressReport, progress_report};
use icf_core::numeric::NumberLocale;
use icf_db::repos::DateRange;
use icf_db::repos::mentoring::MentoringFilter;
use icf_db::repos::session::SessionFilter;
use icf_export::{ExportFormat, ExportKind, ImportReport};
use serde::Deserialize;

use super::AppState;
use super::error::ApiError;
use super::extract::{ApiQuery, CurrentUser, Subscriber};

pub async fn progress(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<ProgressReport>, ApiError> {
    let all = DateRange::default();
    let sessions = state
        .service
        .list_sessions(&user.user_id, &SessionFilter::default())
        .await?;
    let cpd = state.service.list_cpd_entries(&user.user_id, &all).await?;
    let mentoring = state
        .service
        .list_mentoring_sessions(
            &user.user_id,
            &MentoringFilter {
                range: all,
                kind: None,
            },
        )
        .await?;
    Ok(Json(progress_report(
        &sessions,
        &cpd,
        &mentoring,
        Utc::now().date_naive(),
    )))
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

pub async fn export(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(kind): Path<String>,
    ApiQuery(query): ApiQuery<ExportQuery>,
) -> Result<Response, ApiError> {
    let kind = match kind.as_str() {
        "sessions" => ExportKind::Sessions,
        "cpd" => ExportKind::Cpd,
        "mentoring" => ExportKind::Mentoring,
        other => return Err(ApiError::NotFound(format!("unknown export '{other}'"))),
    };
    let file = icf_export::export(
        &state.service,
        &user.user_id,
        kind,
        DateRange::new(query.from, query.to),
        query.format,
        Utc::now().date_naive(),
    )
    .await?;
    tracing::info!(user_id = %user.user_id, file = %file.file_name, "export served");

    let disposition = format!("attachment; filename=\"{}\"", file.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct ImportQuery {
    #[serde(default)]
    pub locale: NumberLocale,
}

/// The request body is the raw CSV file.
pub async fn import_sessions(
    State(state): State<AppState>,
    user: Subscriber,
    ApiQuery(query): ApiQuery<ImportQuery>,
    body: Bytes,
) -> Result<Json<ImportReport>, ApiError> {
    let report =
        icf_export::import_sessions(&state.service, &user.user_id, &body, query.locale).await?;
    tracing::info!(
        user_id = %user.user_id,
        imported = report.imported,
        errors = report.errors.len(),
        "session import finished"
    );
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::api::test_support::TestApp;

    #[tokio::test]
    async fn import_then_export_csv() {
        let app = TestApp::new().await;
        app.subscriber("u1").await;

        let csv = "Date;Client;Duration;Payment\n02.03.2026;Ada;1,5;paid\nnot-a-date;Bob;60;paid\n";
        let (status, bytes) = app
            .raw(
                "POST",
                "/api/import/sessions?locale=eu",
                Some("u1"),
                &[("content-type", "text/csv")],
                csv,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let report: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(report["imported"], 1);
        assert_eq!(report["errors"][0]["row"], 2);

        let (status, bytes) = app
            .raw("GET", "/api/export/sessions?format=csv", Some("u1"), &[], "")
            .await;
        assert_eq!(status, StatusCode::OK);
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.starts_with("Date,Start,End,Client"));
        assert!(text.contains("Ada"));
        assert!(text.contains("1.50"));
    }

    #[tokio::test]
    async fn unknown_export_kind() {
        let app = TestApp::new().await;
        let (status, _) = app.get("/api/export/invoices", Some("u1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn progress_counts_logged_hours() {
        let app = TestApp::new().await;
        app.subscriber("u1").await;
        app.post(
            "/api/sessions",
            Some("u1"),
            json!({"client_name": "Ada", "started_at": "2026-03-02T09:00:00Z", "duration": 120}),
        )
        .await;
        let (status, report) = app.get("/api/progress", Some("u1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(report["totals"]["coaching_hours"], 2.0);
        assert_eq!(report["levels"].as_array().unwrap().len(), 3);
    }
}
