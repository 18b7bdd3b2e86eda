//! `ApiError`: every crate error converges here and leaves as
//! `{"error": "<message>"}` with a matching status code.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use icf_auth::AuthError;
use icf_core::errors::CoreError;
use icf_db::error::DatabaseError;
use icf_export::ExportError;
use icf_notify::NotifyError;
use icf_providers::ProviderError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("an active subscription is required")]
    PaymentRequired,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// A third-party API call failed.
    #[error("{0}")]
    Upstream(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal details stay in the logs.
        let message = match &self {
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "request failed");
                "internal server error".to_string()
            }
            Self::Upstream(detail) => {
                tracing::warn!(error = %detail, "provider call failed");
                self.to_string()
            }
            _ => self.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity, .. } => Self::NotFound(format!("{entity} not found")),
            DatabaseError::Conflict(message) => Self::Conflict(message),
            DatabaseError::InvalidState(message) => Self::BadRequest(message),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(message) => Self::BadRequest(message),
            CoreError::NotFound { entity_type, .. } => {
                Self::NotFound(format!("{entity_type} not found"))
            }
            err @ CoreError::InvalidTransition { .. } => Self::Conflict(err.to_string()),
            CoreError::Other(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden => Self::Forbidden(err.to_string()),
            AuthError::InvalidSignature(_) | AuthError::StaleSignature => {
                Self::BadRequest(err.to_string())
            }
            AuthError::MissingToken
            | AuthError::TokenExpired
            | AuthError::JwksValidation(_)
            | AuthError::Other(_) => Self::Unauthorized(err.to_string()),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotConfigured(provider) => Self::NotConfigured(provider),
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl From<NotifyError> for ApiError {
    fn from(err: NotifyError) -> Self {
        match err {
            NotifyError::Database(e) => e.into(),
            NotifyError::NotConfigured(channel) => Self::NotConfigured(channel),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::Database(e) => e.into(),
            ExportError::Csv(_) | ExportError::MissingColumn(_) | ExportError::Empty => {
                Self::BadRequest(err.to_string())
            }
            ExportError::Xlsx(_) | ExportError::Buffer(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn database_errors_map_to_client_statuses() {
        assert_eq!(
            ApiError::from(DatabaseError::not_found("client", "cli-1")).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(DatabaseError::Conflict("dup".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(DatabaseError::InvalidState("bad".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(DatabaseError::Query("boom".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn auth_errors() {
        assert_eq!(
            ApiError::from(AuthError::MissingToken).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AuthError::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AuthError::StaleSignature).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn provider_errors() {
        assert_eq!(
            ApiError::from(ProviderError::NotConfigured("stripe")).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(ProviderError::Parse("x".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[tokio::test]
    async fn internal_details_are_hidden() {
        let response = ApiError::Internal("db password leaked".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], br#"{"error":"internal server error"}"#);
    }
}
