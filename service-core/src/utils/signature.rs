use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `payload` keyed with `secret`.
pub fn hmac_sha256_hex(secret: &str, payload: &str) -> Result<String, anyhow::Error> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid key length: {}", e))?;

    mac.update(payload.as_bytes());
    let result = mac.finalize();

    Ok(hex::encode(result.into_bytes()))
}

/// Verify a hex HMAC-SHA256 signature using constant-time comparison.
pub fn verify_hmac_sha256_hex(
    secret: &str,
    payload: &str,
    signature: &str,
) -> Result<bool, anyhow::Error> {
    let expected_signature = hmac_sha256_hex(secret, payload)?;

    let expected_bytes = expected_signature.as_bytes();
    let signature_bytes = signature.as_bytes();

    if expected_bytes.len() != signature_bytes.len() {
        return Ok(false);
    }

    Ok(expected_bytes.ct_eq(signature_bytes).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2
        let signature = hmac_sha256_hex("Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(
            signature,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_signature_generation_and_verification() {
        let secret = "my_secret_key";
        let payload = "order_123|pay_456";

        let signature = hmac_sha256_hex(secret, payload).unwrap();
        assert!(verify_hmac_sha256_hex(secret, payload, &signature).unwrap());
    }

    #[test]
    fn test_invalid_signature() {
        let secret = "my_secret_key";
        let payload = "order_123|pay_456";

        let signature = hmac_sha256_hex(secret, payload).unwrap();
        let invalid_signature = format!("a{}", &signature[1..]);
        let invalid_signature = if invalid_signature == signature {
            format!("b{}", &signature[1..])
        } else {
            invalid_signature
        };

        assert!(!verify_hmac_sha256_hex(secret, payload, &invalid_signature).unwrap());
    }

    #[test]
    fn test_tampered_payload_and_length_mismatch() {
        let secret = "my_secret_key";
        let signature = hmac_sha256_hex(secret, "order_123|pay_456").unwrap();

        assert!(!verify_hmac_sha256_hex(secret, "order_123|pay_457", &signature).unwrap());
        assert!(!verify_hmac_sha256_hex(secret, "order_123|pay_456", "deadbeef").unwrap());
    }
}
