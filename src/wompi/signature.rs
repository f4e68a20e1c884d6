//! Integrity signatures for outbound transactions and inbound event checksums.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signing secret is not configured")]
    MissingSecret,

    #[error("Missing signature")]
    MissingSignature,

    #[error("Invalid signature")]
    InvalidSignature,
}

/// SHA-256 over `reference + amount_in_cents + currency + secret`, hex encoded.
pub fn sign_transaction(
    reference: &str,
    amount_in_cents: i64,
    currency: &str,
    secret: &str,
) -> Result<String, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::MissingSecret);
    }

    let concatenated = format!("{}{}{}{}", reference, amount_in_cents, currency, secret);
    Ok(hex::encode(Sha256::digest(concatenated.as_bytes())))
}

/// HMAC-SHA256 of the exact body bytes, hex encoded.
pub fn sign_webhook(raw_body: &[u8], secret: &str) -> Result<String, SignatureError> {
    let mut mac = new_mac(secret)?;
    mac.update(raw_body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_webhook(raw_body: &[u8], received_signature: &str, secret: &str) -> bool {
    check_webhook_signature(raw_body, Some(received_signature), Some(secret)).is_ok()
}

/// Fails closed: a missing secret, a missing header or any mismatch is an error.
pub fn check_webhook_signature(
    raw_body: &[u8],
    received_signature: Option<&str>,
    secret: Option<&str>,
) -> Result<(), SignatureError> {
    let received = received_signature
        .map(str::trim)
        .filter(|sig| !sig.is_empty())
        .ok_or(SignatureError::MissingSignature)?;

    let secret = secret
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::MissingSecret)?;

    // hex::decode accepts either case
    let received = hex::decode(received).map_err(|_| SignatureError::InvalidSignature)?;

    let mut mac = new_mac(secret)?;
    mac.update(raw_body);
    mac.verify_slice(&received)
        .map_err(|_| SignatureError::InvalidSignature)
}

fn new_mac(secret: &str) -> Result<HmacSha256, SignatureError> {
    if secret.is_empty() {
        return Err(SignatureError::MissingSecret);
    }
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::MissingSecret)
}
