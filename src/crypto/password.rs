//! Registration-time password hashes.
//!
//! Stored form is `base64(salt ‖ PBKDF2-HMAC-SHA1(password, salt))`, with the
//! 16-byte salt also kept on its own as Base64 next to the hash.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STD;
use pbkdf2::pbkdf2_hmac;
use rand::Rng;
use sha1::Sha1;
use subtle::ConstantTimeEq;
use tracing::warn;
use zeroize::Zeroize;

use super::CryptoError;

pub const SALT_LEN: usize = 16;
pub const HASH_LEN: usize = 20;
pub const HASH_ITERATIONS: u32 = 10_000;

/// 16 random bytes from the thread CSPRNG, Base64-encoded.
#[must_use]
pub fn generate_salt() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; SALT_LEN] = rng.random();
    BASE64_STD.encode(bytes)
}

pub fn hash_password(password: &str, salt: &str) -> Result<String, CryptoError> {
    let salt_bytes = decode_salt(salt)?;

    let mut derived = derive_digest(password.as_bytes(), &salt_bytes, HASH_ITERATIONS);

    let mut combined = [0u8; SALT_LEN + HASH_LEN];
    combined[..SALT_LEN].copy_from_slice(&salt_bytes);
    combined[SALT_LEN..].copy_from_slice(&derived);
    let encoded = BASE64_STD.encode(combined);

    derived.zeroize();
    combined.zeroize();
    Ok(encoded)
}

/// A malformed salt is a failed verification, not an error.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str, salt: &str) -> bool {
    match hash_password(password, salt) {
        Ok(computed) => constant_time_eq(&computed, stored_hash),
        Err(err) => {
            warn!(error = %err, "Stored salt is malformed, rejecting password");
            false
        }
    }
}

#[must_use]
pub fn constant_time_eq(left: &str, right: &str) -> bool {
    left.as_bytes().ct_eq(right.as_bytes()).into()
}

fn derive_digest(password: &[u8], salt: &[u8], iterations: u32) -> [u8; HASH_LEN] {
    let mut derived = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha1>(password, salt, iterations, &mut derived);
    derived
}

fn decode_salt(salt: &str) -> Result<[u8; SALT_LEN], CryptoError> {
    let decoded = BASE64_STD.decode(salt.as_bytes())?;
    <[u8; SALT_LEN]>::try_from(decoded.as_slice()).map_err(|_| CryptoError::InvalidSalt {
        expected: SALT_LEN,
        actual: decoded.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn salt_is_sixteen_random_bytes() {
        let first = generate_salt();
        let second = generate_salt();
        assert_eq!(BASE64_STD.decode(&first).unwrap().len(), SALT_LEN);
        assert_ne!(first, second);
    }

    #[test]
    fn hash_layout_is_salt_then_digest() {
        let salt = generate_salt();
        let hash = hash_password("correct horse", &salt).unwrap();
        assert_eq!(hash.len(), 48);

        let raw = BASE64_STD.decode(&hash).unwrap();
        assert_eq!(raw.len(), SALT_LEN + HASH_LEN);
        assert_eq!(raw[..SALT_LEN], BASE64_STD.decode(&salt).unwrap()[..]);
    }

    #[test]
    fn digest_matches_rfc6070_vectors() {
        assert_eq!(
            derive_digest(b"password", b"salt", 2),
            [
                0xea, 0x6c, 0x01, 0x4d, 0xc7, 0x2d, 0x6f, 0x8c, 0xcd, 0x1e, 0xd9, 0x2a, 0xce, 0x1d,
                0x41, 0xf0, 0xd8, 0xde, 0x89, 0x57,
            ]
        );
        assert_eq!(
            derive_digest(b"password", b"salt", 4096),
            [
                0x4b, 0x00, 0x79, 0x01, 0xb7, 0x65, 0x48, 0x9a, 0xbe, 0xad, 0x49, 0xd9, 0x26, 0xf7,
                0x21, 0xd0, 0x65, 0xa4, 0x29, 0xc1,
            ]
        );
    }

    #[test]
    fn known_hash_for_fixed_salt() {
        let salt = BASE64_STD.encode([7u8; SALT_LEN]);
        assert_eq!(salt, "BwcHBwcHBwcHBwcHBwcHBw==");
        assert_eq!(
            hash_password("password", &salt).unwrap(),
            "BwcHBwcHBwcHBwcHBwcHB6a0O+hbq/iGh4NvShy8BdUMf0Po"
        );
    }

    #[test]
    fn hash_is_deterministic() {
        let salt = generate_salt();
        assert_eq!(
            hash_password("pw-1234", &salt).unwrap(),
            hash_password("pw-1234", &salt).unwrap()
        );
    }

    #[test]
    fn verify_accepts_right_and_rejects_wrong() {
        let salt = generate_salt();
        let hash = hash_password("s3cret-ledger", &salt).unwrap();
        assert!(verify_password("s3cret-ledger", &hash, &salt));
        assert!(!verify_password("s3cret-ledgeR", &hash, &salt));
        assert!(!verify_password("", &hash, &salt));
    }

    #[test]
    fn verify_rejects_other_salt() {
        let salt = generate_salt();
        let hash = hash_password("s3cret-ledger", &salt).unwrap();
        assert!(!verify_password("s3cret-ledger", &hash, &generate_salt()));
    }

    #[test]
    fn malformed_salt_errors_on_hash_and_fails_verify() {
        let err = hash_password("pw", "c2hvcnQ=").expect_err("short salt");
        assert!(matches!(
            err,
            CryptoError::InvalidSalt {
                expected: 16,
                actual: 5
            }
        ));
        assert!(matches!(
            hash_password("pw", "***").expect_err("bad base64"),
            CryptoError::Base64(_)
        ));
        assert!(!verify_password("pw", "anything", "***"));
    }

    #[test]
    fn constant_time_eq_handles_lengths() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
    }
}
