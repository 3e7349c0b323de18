//! Cryptographic utilities for webhook verification.
//!
//! Payment confirmations carry an `x-xolbor-signature` header of the form
//! `t=<unix seconds>,v1=<hex>`, where the hex digest is the HMAC-SHA256 of
//! `"<t>.<raw body>"` under the shared webhook secret. Several `v1` entries may
//! be present while the provider rotates secrets.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the webhook signature header.
pub const SIGNATURE_HEADER: &str = "x-xolbor-signature";

/// Reasons a webhook signature is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// The header is not `t=...,v1=...`.
    #[error("malformed signature header")]
    Malformed,

    /// The timestamp is outside the tolerance window.
    #[error("signature timestamp outside tolerance")]
    Stale,

    /// No `v1` digest matched.
    #[error("signature mismatch")]
    Mismatch,
}

/// Compute HMAC-SHA256 and return the hex-encoded result (64 characters).
///
/// Returns `None` only if the MAC rejects the key, which HMAC never does.
#[must_use]
pub fn hmac_sha256_hex(secret: &str, message: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(message.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Build a signature header value for `body` at `timestamp`.
#[must_use]
pub fn sign_payload(secret: &str, timestamp: i64, body: &str) -> Option<String> {
    let digest = hmac_sha256_hex(secret, &format!("{timestamp}.{body}"))?;
    Some(format!("t={timestamp},v1={digest}"))
}

/// Verify a signature header against `body`.
///
/// # Errors
///
/// Returns `SignatureError` if the header is malformed, too old (or too far in
/// the future), or none of its digests match.
pub fn verify_signature(
    secret: &str,
    header: &str,
    body: &str,
    now: i64,
    tolerance_seconds: i64,
) -> Result<(), SignatureError> {
    let mut timestamp = None;
    let mut digests = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
            Some(("v1", value)) => digests.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(SignatureError::Malformed)?;
    if digests.is_empty() {
        return Err(SignatureError::Malformed);
    }
    if (now - timestamp).abs() > tolerance_seconds {
        return Err(SignatureError::Stale);
    }

    let expected = hmac_sha256_hex(secret, &format!("{timestamp}.{body}"))
        .ok_or(SignatureError::Mismatch)?;
    if digests.iter().any(|d| constant_time_eq(d, &expected)) {
        Ok(())
    } else {
        Err(SignatureError::Mismatch)
    }
}

/// Constant-time string comparison to prevent timing attacks.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";
    const BODY: &str = r#"{"id":"pay_123","type":"payment.succeeded"}"#;

    #[test]
    fn hmac_sha256_produces_correct_length() {
        let result = hmac_sha256_hex("key", "The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(result.len(), 64); // SHA256 = 32 bytes = 64 hex chars
        assert_eq!(
            result,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn signed_payload_verifies() {
        let header = sign_payload(SECRET, 1_700_000_000, BODY).unwrap();
        assert_eq!(
            verify_signature(SECRET, &header, BODY, 1_700_000_010, 300),
            Ok(())
        );
    }

    #[test]
    fn tampered_body_is_rejected() {
        let header = sign_payload(SECRET, 1_700_000_000, BODY).unwrap();
        let tampered = BODY.replace("pay_123", "pay_999");
        assert_eq!(
            verify_signature(SECRET, &header, &tampered, 1_700_000_000, 300),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let header = sign_payload("other", 1_700_000_000, BODY).unwrap();
        assert_eq!(
            verify_signature(SECRET, &header, BODY, 1_700_000_000, 300),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let header = sign_payload(SECRET, 1_700_000_000, BODY).unwrap();
        assert_eq!(
            verify_signature(SECRET, &header, BODY, 1_700_001_000, 300),
            Err(SignatureError::Stale)
        );
    }

    #[test]
    fn any_matching_digest_is_accepted() {
        let good = sign_payload(SECRET, 1_700_000_000, BODY).unwrap();
        let header = format!("t=1700000000,v1=deadbeef,{}", &good[13..]);
        assert_eq!(
            verify_signature(SECRET, &header, BODY, 1_700_000_000, 300),
            Ok(())
        );
    }

    #[test]
    fn malformed_headers_are_rejected() {
        for header in ["", "v1=abc", "t=now,v1=abc", "t=1700000000"] {
            assert_eq!(
                verify_signature(SECRET, header, BODY, 1_700_000_000, 300),
                Err(SignatureError::Malformed),
                "{header:?}"
            );
        }
    }

    #[test]
    fn constant_time_eq_behaves_like_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(constant_time_eq("", ""));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "ab"));
        assert!(!constant_time_eq("abc", "ABC"));
    }
}
