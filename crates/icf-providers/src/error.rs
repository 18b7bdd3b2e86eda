//! Provider error types.

use thiserror::Error;

/// Errors from third-party service calls.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider returned a non-success status code.
    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    /// The provider returned a 429 Too Many Requests response.
    #[error("{provider} rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        provider: &'static str,
        retry_after_secs: u64,
    },

    /// Failed to parse a provider response or payload.
    #[error("parse error: {0}")]
    Parse(String),

    /// Push endpoint no longer exists (HTTP 404/410); the subscription should be deleted.
    #[error("push endpoint gone: {0}")]
    Gone(String),

    /// Push payload encryption or VAPID signing failed.
    #[error("web push error: {0}")]
    WebPush(#[from] web_push::WebPushError),

    /// Object storage client or signing failure.
    #[error("storage error: {0}")]
    Storage(#[from] object_store::Error),

    /// The provider section is missing required settings.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}
