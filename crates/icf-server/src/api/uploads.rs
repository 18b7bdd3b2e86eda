//! Presigned URLs for supporting documents (certificates, mentor letters).

use axum::Json;
use axum::extract::State;
use icf_providers::storage::key_belongs_to;
use icf_providers::{DocumentKind, SignedUpload};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::ApiError;
use super::extract::{ApiJson, ApiQuery, CurrentUser};

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub kind: DocumentKind,
    pub file_name: String,
}

pub async fn upload_url(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiJson(request): ApiJson<UploadRequest>,
) -> Result<Json<SignedUpload>, ApiError> {
    let store = state
        .storage
        .as_ref()
        .ok_or(ApiError::NotConfigured("storage"))?;
    if request.file_name.trim().is_empty() {
        return Err(ApiError::bad_request("file_name is required"));
    }
    let upload = store
        .upload_url(&user.user_id, request.kind, &request.file_name)
        .await?;
    tracing::debug!(user_id = %user.user_id, key = %upload.key, "upload url issued");
    Ok(Json(upload))
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct DownloadUrl {
    pub url: String,
}

pub async fn download_url(
    State(state): State<AppState>,
    user: CurrentUser,
    ApiQuery(query): ApiQuery<DownloadQuery>,
) -> Result<Json<DownloadUrl>, ApiError> {
    let store = state
        .storage
        .as_ref()
        .ok_or(ApiError::NotConfigured("storage"))?;
    if !key_belongs_to(&query.key, &user.user_id) {
        return Err(ApiError::Forbidden("document belongs to another user".into()));
    }
    Ok(Json(DownloadUrl {
        url: store.download_url(&query.key).await?,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::api::test_support::{TestApp, test_config};

    async fn app_with_storage() -> TestApp {
        let mut config = test_config();
        config.storage.endpoint = "http://localhost:9000".into();
        config.storage.access_key_id = "AKIDEXAMPLE".into();
        config.storage.secret_access_key = "secret".into();
        config.storage.bucket_name = "icflog-docs".into();
        TestApp::with_config(config).await
    }

    #[tokio::test]
    async fn storage_must_be_configured() {
        let app = TestApp::new().await;
        let (status, body) = app
            .post(
                "/api/uploads",
                Some("u1"),
                json!({"kind": "cpd", "file_name": "cert.pdf"}),
            )
            .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "storage is not configured");
    }

    #[tokio::test]
    async fn download_is_limited_to_own_documents() {
        let app = app_with_storage().await;
        let (status, upload) = app
            .post(
                "/api/uploads",
                Some("u1"),
                json!({"kind": "mentoring", "file_name": "letter.pdf"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let key = upload["key"].as_str().unwrap();
        assert!(key.starts_with("mentoring/u1/"));

        let (status, body) = app.get(&format!("/api/uploads?key={key}"), Some("u1")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["url"].as_str().unwrap().contains("X-Amz-Signature="));

        let (status, body) = app.get(&format!("/api/uploads?key={key}"), Some("u2")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "document belongs to another user");
    }
}
