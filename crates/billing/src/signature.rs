//! Stripe webhook signature verification
//!
//! Header format: `t=<timestamp>,v1=<hex hmac>[,v1=<hex hmac>...][,v0=<legacy>]`.
//! The signed payload is `"{timestamp}.{raw body}"`, keyed by the full
//! `whsec_...` signing secret. Several `v1` entries appear while a secret is
//! being rolled; any one of them matching is enough.

use std::time::Duration;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{BillingError, BillingResult};

type HmacSha256 = Hmac<Sha256>;

/// Parsed `stripe-signature` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> BillingResult<Self> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp = value.parse().ok(),
                "v1" => {
                    // Malformed entries can never match; skip them.
                    if let Ok(bytes) = hex::decode(value) {
                        v1_signatures.push(bytes);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            tracing::warn!("Missing timestamp in signature header");
            BillingError::WebhookSignatureInvalid
        })?;

        if v1_signatures.is_empty() {
            tracing::warn!("Missing v1 signature in signature header");
            return Err(BillingError::WebhookSignatureInvalid);
        }

        Ok(Self {
            timestamp,
            v1_signatures,
        })
    }
}

/// HMAC-SHA256 over `"{timestamp}.{payload}"`
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> BillingResult<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| {
        tracing::error!("Invalid webhook secret key");
        BillingError::WebhookSignatureInvalid
    })?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Build a `stripe-signature` header value for `payload`.
///
/// Used by local tooling and tests to produce deliveries the receiver accepts.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> BillingResult<String> {
    let signature = compute_signature(secret, timestamp, payload)?;
    Ok(format!("t={},v1={}", timestamp, hex::encode(signature)))
}

/// Check `header` against `payload` at time `now` (unix seconds)
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    tolerance: Duration,
    now: i64,
) -> BillingResult<()> {
    let header = SignatureHeader::parse(header)?;

    let age = now.abs_diff(header.timestamp);
    if age > tolerance.as_secs() {
        tracing::warn!(
            timestamp = header.timestamp,
            now = now,
            diff = age,
            "Webhook timestamp outside tolerance"
        );
        return Err(BillingError::WebhookSignatureInvalid);
    }

    let expected = compute_signature(secret, header.timestamp, payload)?;
    let matched = header.v1_signatures.iter().any(|candidate| {
        candidate.len() == expected.len()
            && bool::from(candidate.as_slice().ct_eq(expected.as_slice()))
    });

    if !matched {
        tracing::warn!("Webhook signature mismatch");
        return Err(BillingError::WebhookSignatureInvalid);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret_12345";
    const NOW: i64 = 1_750_000_000;
    const TOLERANCE: Duration = Duration::from_secs(300);

    #[test]
    fn test_extreme_timestamp_rejected_without_overflow() {
        let payload = b"{}";
        for header in [
            "t=-9223372036854775808,v1=00",
            "t=9223372036854775807,v1=00",
        ] {
            let err = verify_signature(payload, header, SECRET, TOLERANCE, NOW).unwrap_err();
            assert!(matches!(err, BillingError::WebhookSignatureInvalid), "{header}");
        }
    }

    #[test]
    fn test_parse_header_collects_all_v1_entries() {
        let a = "a".repeat(64);
        let b = "b".repeat(64);
        let header = SignatureHeader::parse(&format!("t=123,v1={a},v0=ignored,v1={b}")).unwrap();
        assert_eq!(header.timestamp, 123);
        assert_eq!(header.v1_signatures.len(), 2);
    }

    #[test]
    fn test_parse_header_requires_timestamp_and_v1() {
        assert!(SignatureHeader::parse("v1=abcd").is_err());
        assert!(SignatureHeader::parse("t=123").is_err());
        assert!(SignatureHeader::parse("t=123,v1=not-hex").is_err());
        assert!(SignatureHeader::parse("").is_err());
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = br#"{"id":"evt_1","type":"invoice.paid"}"#;
        let header = sign_payload(SECRET, NOW, payload).unwrap();
        assert!(verify_signature(payload, &header, SECRET, TOLERANCE, NOW + 10).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let header = sign_payload(SECRET, NOW, br#"{"amount":100}"#).unwrap();
        let result = verify_signature(br#"{"amount":999}"#, &header, SECRET, TOLERANCE, NOW);
        assert!(matches!(result, Err(BillingError::WebhookSignatureInvalid)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = b"{}";
        let header = sign_payload("whsec_other", NOW, payload).unwrap();
        assert!(verify_signature(payload, &header, SECRET, TOLERANCE, NOW).is_err());
    }

    #[test]
    fn test_stale_and_future_timestamps_rejected() {
        let payload = b"{}";
        let header = sign_payload(SECRET, NOW, payload).unwrap();
        assert!(verify_signature(payload, &header, SECRET, TOLERANCE, NOW + 301).is_err());
        assert!(verify_signature(payload, &header, SECRET, TOLERANCE, NOW - 301).is_err());
        assert!(verify_signature(payload, &header, SECRET, TOLERANCE, NOW + 300).is_ok());
    }

    #[test]
    fn test_any_matching_v1_accepted_during_secret_roll() {
        let payload = b"{\"id\":\"evt_roll\"}";
        let old = compute_signature("whsec_old", NOW, payload).unwrap();
        let new = compute_signature(SECRET, NOW, payload).unwrap();
        let header = format!("t={NOW},v1={},v1={}", hex::encode(old), hex::encode(new));
        assert!(verify_signature(payload, &header, SECRET, TOLERANCE, NOW).is_ok());
    }

    #[test]
    fn test_secret_prefix_is_part_of_key() {
        let payload = b"{}";
        let stripped = SECRET.strip_prefix("whsec_").unwrap();
        let header = sign_payload(stripped, NOW, payload).unwrap();
        assert!(verify_signature(payload, &header, SECRET, TOLERANCE, NOW).is_err());
    }
}
