//! Messenger webhook signature verification.
//!
//! Facebook signs every delivery with the app secret and sends the result in
//! the `X-Hub-Signature-256` header as `sha256=<hex digest of the raw body>`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

use crate::error::DriverError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Decode a `sha256=<hex>` header value into raw digest bytes.
pub fn parse_signature_header(header: &str) -> Result<Vec<u8>, DriverError> {
    let digest = header
        .trim()
        .strip_prefix("sha256=")
        .ok_or(DriverError::InvalidSignature("missing sha256= prefix"))?;

    hex::decode(digest).map_err(|_| DriverError::InvalidSignature("digest is not valid hex"))
}

/// Verify a webhook body against its signature header.
///
/// # Arguments
///
/// * `app_secret` - The Facebook app secret
/// * `body` - The raw request body, exactly as received
/// * `header` - The `X-Hub-Signature-256` header value, if any
///
/// # Returns
///
/// `true` if the header is present and matches the body.
pub fn verify_signature(app_secret: &str, body: &[u8], header: Option<&str>) -> bool {
    let Some(header) = header.filter(|h| !h.is_empty()) else {
        warn!(body_length = body.len(), "signature_header_missing");
        return false;
    };

    let expected = match parse_signature_header(header) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "signature_header_invalid");
            return false;
        }
    };

    let mut mac = match HmacSha256::new_from_slice(app_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("signature_invalid_key");
            return false;
        }
    };

    mac.update(body);

    // verify_slice compares in constant time
    let valid = mac.verify_slice(&expected).is_ok();

    if !valid {
        warn!(
            body_length = body.len(),
            digest_length = expected.len(),
            "signature_mismatch"
        );
    }

    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_verify_signature_valid() {
        let body = br#"{"object":"page","entry":[]}"#;
        let header = sign("app-secret", body);

        assert!(verify_signature("app-secret", body, Some(&header)));
    }

    #[test]
    fn test_verify_signature_wrong_secret_or_body() {
        let body = b"{}";
        let header = sign("app-secret", body);

        assert!(!verify_signature("other-secret", body, Some(&header)));
        assert!(!verify_signature("app-secret", b"{ }", Some(&header)));
    }

    #[test]
    fn test_verify_signature_missing_header() {
        assert!(!verify_signature("app-secret", b"{}", None));
        assert!(!verify_signature("app-secret", b"{}", Some("")));
    }

    #[test]
    fn test_parse_signature_header() {
        assert_eq!(parse_signature_header("sha256=00ff").unwrap(), vec![0x00, 0xff]);
        assert!(matches!(
            parse_signature_header("sha1=00ff"),
            Err(DriverError::InvalidSignature(_))
        ));
        assert!(matches!(
            parse_signature_header("sha256=not_valid_hex_zz"),
            Err(DriverError::InvalidSignature(_))
        ));
    }
}
