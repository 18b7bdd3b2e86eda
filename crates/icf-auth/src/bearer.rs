//! `Authorization: Bearer` parsing and the batch-trigger shared secret.

use subtle::ConstantTimeEq;

/// Extract the token from an `Authorization` header value.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Constant-time comparison of a presented token with the cron secret.
/// An empty secret never matches.
#[must_use]
pub fn matches_cron_secret(token: &str, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    token.as_bytes().ct_eq(secret.as_bytes()).into()
}
