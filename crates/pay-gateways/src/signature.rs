//! Hashing and signature helpers shared by the adapters and decoders.

use hmac::{Hmac, Mac};
use pay_core::{PaymentError, PaymentResult};
use sha2::{Digest, Sha256, Sha512};

type HmacSha256 = Hmac<Sha256>;
type HmacSha512 = Hmac<Sha512>;

/// Lower-case hex HMAC-SHA256 of `message`
pub fn hmac_sha256_hex(secret: &str, message: &[u8]) -> PaymentResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Internal(format!("HMAC key rejected: {}", e)))?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Lower-case hex HMAC-SHA512 of `message`
pub fn hmac_sha512_hex(secret: &str, message: &[u8]) -> PaymentResult<String> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .map_err(|e| PaymentError::Internal(format!("HMAC key rejected: {}", e)))?;
    mac.update(message);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Lower-case hex SHA-512 of `message`
pub fn sha512_hex(message: &str) -> String {
    hex::encode(Sha512::digest(message.as_bytes()))
}

/// Lower-case hex MD5 of `message`
pub fn md5_hex(message: &str) -> String {
    format!("{:x}", md5::compute(message.as_bytes()))
}

/// Compare two signatures without short-circuiting on the first mismatch
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_lengths() {
        assert_eq!(hmac_sha256_hex("secret", b"{}").unwrap().len(), 64);
        assert_eq!(hmac_sha512_hex("secret", b"{}").unwrap().len(), 128);
    }

    #[test]
    fn test_known_digests() {
        assert_eq!(md5_hex(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            sha512_hex("abc"),
            "ddaf35a193617abacc417349ae20413112e6fa4e89a97ea20a9eeee64b55d39a\
             2192992a274fc1a836ba3c23a3feebbd454d4423643ce80e2a9ac94fa54ca49f"
        );
    }

    #[test]
    fn test_hmac_depends_on_secret() {
        let a = hmac_sha512_hex("one", b"payload").unwrap();
        let b = hmac_sha512_hex("two", b"payload").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
