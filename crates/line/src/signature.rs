use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header is not valid base64")]
    MalformedSignature,
    #[error("signature does not match the request body")]
    Mismatch,
}

/// Verifies the `x-line-signature` header of a webhook request.
///
/// LINE signs each delivery as `base64(HMAC-SHA256(channel_secret, body))`
/// over the raw request bytes, so verification must run before the body is
/// parsed.
pub fn verify_signature(
    channel_secret: &SecretString,
    body: &[u8],
    signature: &str,
) -> Result<(), SignatureError> {
    let provided =
        STANDARD.decode(signature.trim()).map_err(|_| SignatureError::MalformedSignature)?;

    let mut mac = HmacSha256::new_from_slice(channel_secret.expose_secret().as_bytes())
        .map_err(|_| SignatureError::Mismatch)?;
    mac.update(body);
    mac.verify_slice(&provided).map_err(|_| SignatureError::Mismatch)
}
