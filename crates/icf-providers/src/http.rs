//! Shared HTTP helpers for provider clients.
//!
//! Status handling lives here so each client module only builds requests and
//! maps responses. Error bodies in the `{"error": {"message": ..}}` (Stripe)
//! or `{"message": ..}` (Resend, Calendly) shapes are reduced to the message.

use std::time::Duration;

use crate::error::ProviderError;

const USER_AGENT: &str = concat!("icflog/", env!("CARGO_PKG_VERSION"));

/// Build the shared `reqwest` client.
///
/// # Errors
///
/// Returns [`ProviderError::Http`] if the TLS backend cannot be initialised.
pub fn build_client() -> Result<reqwest::Client, ProviderError> {
    Ok(reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(15))
        .build()?)
}

/// Return the response unchanged on success, otherwise a typed error.
///
/// - 429 → [`ProviderError::RateLimited`] (`Retry-After` seconds, default 60)
/// - other non-success → [`ProviderError::Api`] with the extracted message
pub async fn check_response(
    provider: &'static str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = resp.status();
    if status == 429 {
        return Err(ProviderError::RateLimited {
            provider,
            retry_after_secs: parse_retry_after(&resp),
        });
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ProviderError::Api {
            provider,
            status: status.as_u16(),
            message: error_message(&body),
        });
    }
    Ok(resp)
}

fn parse_retry_after(resp: &reqwest::Response) -> u64 {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}

fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };
    value
        .pointer("/error/message")
        .or_else(|| value.get("message"))
        .or_else(|| value.get("error_description"))
        .and_then(serde_json::Value::as_str)
        .map_or_else(|| body.trim().to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mock_response(status: u16, body: &'static str) -> reqwest::Response {
        reqwest::Response::from(
            ::http::Response::builder()
                .status(status)
                .body(body)
                .unwrap(),
        )
    }

    #[tokio::test]
    async fn rate_limited_uses_retry_after() {
        let resp = reqwest::Response::from(
            ::http::Response::builder()
                .status(429)
                .header("Retry-After", "30")
                .body("")
                .unwrap(),
        );
        let err = check_response("stripe", resp).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::RateLimited {
                retry_after_secs: 30,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn rate_limited_defaults_to_sixty_seconds() {
        let err = check_response("resend", mock_response(429, ""))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::RateLimited {
                retry_after_secs: 60,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn stripe_error_body_is_reduced_to_message() {
        let resp = mock_response(
            400,
            r#"{"error":{"type":"invalid_request_error","message":"No such price: 'price_x'"}}"#,
        );
        let err = check_response("stripe", resp).await.unwrap_err();
        match err {
            ProviderError::Api {
                provider,
                status,
                message,
            } => {
                assert_eq!(provider, "stripe");
                assert_eq!(status, 400);
                assert_eq!(message, "No such price: 'price_x'");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn plain_text_body_kept() {
        let err = check_response("calendly", mock_response(502, "bad gateway\n"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Api { ref message, .. } if message == "bad gateway"));
    }

    #[tokio::test]
    async fn success_passes_through() {
        assert!(check_response("stripe", mock_response(200, "{}")).await.is_ok());
    }

    #[test]
    fn top_level_message_extracted() {
        assert_eq!(
            error_message(r#"{"statusCode":422,"message":"Invalid `to` field"}"#),
            "Invalid `to` field"
        );
    }
}
