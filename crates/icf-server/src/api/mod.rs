//! HTTP API: route table, CORS and request tracing.
//!
//! Every handler authenticates through an extractor, reads or writes rows
//! through `IcfService`, optionally calls a provider, and answers JSON.
//! Failures leave as [`ApiError`].

pub mod admin;
pub mod billing;
pub mod calendly;
pub mod data;
pub mod error;
pub mod extract;
pub mod notifications;
pub mod profile;
pub mod records;
pub mod uploads;
pub mod webhooks;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::{Json, response::IntoResponse};
use serde_json::json;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
pub use error::ApiError;

pub type AppState = Arc<AppContext>;

/// Build the full router over shared state.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.allowed_origins());

    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/profile",
            get(profile::get_profile)
                .post(profile::ensure_profile)
                .patch(profile::update_profile),
        )
        .route(
            "/api/clients",
            get(records::list_clients).post(records::create_client),
        )
        .route(
            "/api/clients/{id}",
            get(records::get_client)
                .patch(records::update_client)
                .delete(records::delete_client),
        )
        .route(
            "/api/sessions",
            get(records::list_sessions).post(records::create_session),
        )
        .route(
            "/api/sessions/{id}",
            get(records::get_session)
                .patch(records::update_session)
                .delete(records::delete_session),
        )
        .route("/api/cpd", get(records::list_cpd).post(records::create_cpd))
        .route(
            "/api/cpd/{id}",
            get(records::get_cpd)
                .patch(records::update_cpd)
                .delete(records::delete_cpd),
        )
        .route(
            "/api/mentoring",
            get(records::list_mentoring).post(records::create_mentoring),
        )
        .route(
            "/api/mentoring/{id}",
            get(records::get_mentoring)
                .patch(records::update_mentoring)
                .delete(records::delete_mentoring),
        )
        .route("/api/progress", get(data::progress))
        .route(
            "/api/uploads",
            get(uploads::download_url).post(uploads::upload_url),
        )
        .route("/api/export/{kind}", get(data::export))
        .route("/api/import/sessions", post(data::import_sessions))
        .route("/api/billing/checkout", post(billing::checkout))
        .route("/api/billing/portal", post(billing::portal))
        .route("/api/webhooks/stripe", post(webhooks::stripe))
        .route("/api/calendly", delete(calendly::disconnect))
        .route("/api/calendly/connect", get(calendly::connect))
        .route("/api/calendly/callback", post(calendly::callback))
        .route("/api/calendly/sync", post(calendly::sync))
        .route("/api/webhooks/calendly", post(webhooks::calendly))
        .route("/api/push/vapid-key", get(notifications::vapid_key))
        .route(
            "/api/push/subscribe",
            post(notifications::subscribe).delete(notifications::unsubscribe),
        )
        .route("/api/push/send", post(notifications::send_push))
        .route(
            "/api/notifications/check-and-send",
            post(notifications::check_and_send),
        )
        .route("/api/admin/users", get(admin::list_users))
        .route(
            "/api/admin/scheduled-emails",
            get(admin::list_scheduled_emails).post(admin::schedule_email),
        )
        .route(
            "/api/admin/scheduled-emails/process",
            post(admin::process_scheduled_emails),
        )
        .route(
            "/api/admin/scheduled-emails/{id}",
            delete(admin::cancel_scheduled_email),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
