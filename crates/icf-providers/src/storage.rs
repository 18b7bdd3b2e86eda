//! Presigned upload URLs for supporting documents (R2 / S3-compatible).

use std::time::Duration;

use chrono::Utc;
use icf_config::StorageConfig;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// Which record a document is attached to. Also the key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Cpd,
    Mentoring,
}

impl DocumentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cpd => "cpd",
            Self::Mentoring => "mentoring",
        }
    }
}

/// A presigned PUT target. `key` is stored on the record as `document_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedUpload {
    pub key: String,
    pub upload_url: String,
    pub expires_in_secs: u64,
}

pub struct DocumentStore {
    store: AmazonS3,
    expiry: Duration,
}

impl DocumentStore {
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] without credentials, or
    /// [`ProviderError::Storage`] if the client cannot be built.
    pub fn from_config(config: &StorageConfig) -> Result<Self, ProviderError> {
        if !config.is_configured() {
            return Err(ProviderError::NotConfigured("storage"));
        }
        let store = AmazonS3Builder::new()
            .with_endpoint(config.endpoint_url())
            .with_region("auto")
            .with_bucket_name(&config.bucket_name)
            .with_access_key_id(&config.access_key_id)
            .with_secret_access_key(&config.secret_access_key)
            .with_allow_http(true)
            .build()?;
        Ok(Self {
            store,
            expiry: Duration::from_secs(config.url_expiry_secs),
        })
    }

    /// Presign a PUT for a new document owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Storage`] if signing fails.
    pub async fn upload_url(
        &self,
        user_id: &str,
        kind: DocumentKind,
        file_name: &str,
    ) -> Result<SignedUpload, ProviderError> {
        let key = document_key(user_id, kind, file_name, Utc::now().timestamp_millis());
        let url = self
            .store
            .signed_url(::http::Method::PUT, &Path::from(key.as_str()), self.expiry)
            .await?;
        Ok(SignedUpload {
            key,
            upload_url: url.to_string(),
            expires_in_secs: self.expiry.as_secs(),
        })
    }

    /// Presign a GET for an existing document key.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Storage`] if signing fails.
    pub async fn download_url(&self, key: &str) -> Result<String, ProviderError> {
        let url = self
            .store
            .signed_url(::http::Method::GET, &Path::from(key), self.expiry)
            .await?;
        Ok(url.to_string())
    }
}

/// Whether `key` was issued to `user_id` by [`document_key`].
#[must_use]
pub fn key_belongs_to(key: &str, user_id: &str) -> bool {
    let mut parts = key.splitn(3, '/');
    matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some("cpd" | "mentoring"), Some(owner), Some(_)) if owner == user_id
    )
}

/// `{kind}/{user_id}/{millis}-{sanitized name}`.
fn document_key(user_id: &str, kind: DocumentKind, file_name: &str, millis: i64) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let mut sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    sanitized = sanitized.trim_matches('.').to_string();
    if sanitized.is_empty() {
        sanitized = String::from("document");
    }
    format!("{}/{user_id}/{millis}-{sanitized}", kind.as_str())
}
