//! Timestamped HMAC-SHA256 webhook signatures.
//!
//! Header format: `t=<unix seconds>,v1=<hex>[,v1=<hex>...]`. The signed
//! payload is `"{t}.{raw body}"`. Both the payment processor and the
//! scheduling provider use this scheme.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum accepted age (either direction) of the signed timestamp.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

/// Parse a `t=...,v1=...` header. Unknown schemes (e.g. `v0`) are ignored.
///
/// # Errors
///
/// `AuthError::InvalidSignature` when the timestamp or every `v1` entry is
/// missing or malformed.
pub fn parse_header(header: &str) -> Result<SignatureHeader, AuthError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    AuthError::InvalidSignature("malformed timestamp".into())
                })?);
            }
            "v1" => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }
    let timestamp =
        timestamp.ok_or_else(|| AuthError::InvalidSignature("missing timestamp".into()))?;
    if signatures.is_empty() {
        return Err(AuthError::InvalidSignature("missing v1 signature".into()));
    }
    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn compute(secret: &str, timestamp: i64, body: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length.
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return Vec::new();
    };
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}

/// Build a header value for `body`, as the sender would.
#[must_use]
pub fn sign(secret: &str, timestamp: i64, body: &[u8]) -> String {
    format!("t={timestamp},v1={}", hex::encode(compute(secret, timestamp, body)))
}

/// Verify a signature header against the raw body.
///
/// # Errors
///
/// `AuthError::InvalidSignature` when no `v1` entry matches,
/// `AuthError::StaleSignature` when the timestamp is outside `tolerance_secs`
/// of `now`.
pub fn verify(
    header: &str,
    body: &[u8],
    secret: &str,
    tolerance_secs: i64,
    now: i64,
) -> Result<(), AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSignature("no signing secret configured".into()));
    }
    let parsed = parse_header(header)?;
    let expected = compute(secret, parsed.timestamp, body);
    let matched = parsed
        .signatures
        .iter()
        .any(|candidate| bool::from(candidate.as_slice().ct_eq(expected.as_slice())));
    if !matched {
        return Err(AuthError::InvalidSignature("no matching signature".into()));
    }
    if (now - parsed.timestamp).abs() > tolerance_secs {
        return Err(AuthError::StaleSignature);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SECRET: &str = "whsec_test";
    const BODY: &[u8] = br#"{"id":"evt_1","type":"invoice.payment_failed"}"#;

    #[test]
    fn valid_signature_passes() {
        let header = sign(SECRET, 1_700_000_000, BODY);
        assert!(verify(&header, BODY, SECRET, DEFAULT_TOLERANCE_SECS, 1_700_000_100).is_ok());
    }

    #[test]
    fn tampered_body_fails() {
        let header = sign(SECRET, 1_700_000_000, BODY);
        let err = verify(&header, b"{}", SECRET, DEFAULT_TOLERANCE_SECS, 1_700_000_000).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature(_)));
    }

    #[test]
    fn wrong_secret_fails() {
        let header = sign("other", 1_700_000_000, BODY);
        assert!(verify(&header, BODY, SECRET, DEFAULT_TOLERANCE_SECS, 1_700_000_000).is_err());
    }

    #[test]
    fn stale_timestamp_fails() {
        let header = sign(SECRET, 1_700_000_000, BODY);
        let err = verify(&header, BODY, SECRET, DEFAULT_TOLERANCE_SECS, 1_700_000_301).unwrap_err();
        assert!(matches!(err, AuthError::StaleSignature));
    }

    #[test]
    fn any_matching_v1_is_accepted() {
        let good = sign(SECRET, 1_700_000_000, BODY);
        let good_sig = good.split_once(",v1=").unwrap().1;
        let header = format!("t=1700000000,v1={},v0=abc,v1={good_sig}", "00".repeat(32));
        assert!(verify(&header, BODY, SECRET, DEFAULT_TOLERANCE_SECS, 1_700_000_000).is_ok());
    }

    #[test]
    fn parse_rejects_missing_parts() {
        assert!(parse_header("v1=abcd").is_err());
        assert!(parse_header("t=123").is_err());
        assert!(parse_header("t=abc,v1=abcd").is_err());
        let parsed = parse_header("t=5,v1=0a0b").unwrap();
        assert_eq!(parsed.timestamp, 5);
        assert_eq!(parsed.signatures, vec![vec![0x0a, 0x0b]]);
    }

    #[test]
    fn empty_secret_never_verifies() {
        let header = sign("", 1_700_000_000, BODY);
        assert!(verify(&header, BODY, "", DEFAULT_TOLERANCE_SECS, 1_700_000_000).is_err());
    }
}
