//! Document storage (Cloudflare R2 / S3-compatible) configuration.

use serde::{Deserialize, Serialize};

fn default_bucket_name() -> String {
    String::from("icflog-documents")
}

const fn default_url_expiry_secs() -> u64 {
    600
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Cloudflare account ID.
    #[serde(default)]
    pub account_id: String,

    #[serde(default)]
    pub access_key_id: String,

    #[serde(default)]
    pub secret_access_key: String,

    #[serde(default = "default_bucket_name")]
    pub bucket_name: String,

    /// Custom endpoint URL. If empty, built from `account_id`.
    #[serde(default)]
    pub endpoint: String,

    /// Lifetime of signed upload/download URLs.
    #[serde(default = "default_url_expiry_secs")]
    pub url_expiry_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            bucket_name: default_bucket_name(),
            endpoint: String::new(),
            url_expiry_secs: default_url_expiry_secs(),
        }
    }
}

impl StorageConfig {
    pub fn is_configured(&self) -> bool {
        (!self.account_id.is_empty() || !self.endpoint.is_empty())
            && !self.access_key_id.is_empty()
            && !self.secret_access_key.is_empty()
            && !self.bucket_name.is_empty()
    }

    /// Returns the custom `endpoint` if set, otherwise the R2 endpoint for `account_id`.
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.is_empty() {
            format!("https://{}.r2.cloudflarestorage.com", self.account_id)
        } else {
            self.endpoint.clone()
        }
    }
}
