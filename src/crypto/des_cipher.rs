//! Legacy DES-CBC credential cipher.
//!
//! Kept so rows written by the old code path can still be read. Unlike
//! [`super::AesCipher`], every failure is returned to the caller.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STD;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use des::Des;
use tracing::debug;

use super::kdf::{self, DesKeyMaterial};
use super::{CipherScheme, CredentialCipher, CryptoError};
use crate::config::DesKeyConfig;

const DES_BLOCK_LEN: usize = 8;

type DesCbcEnc = cbc::Encryptor<Des>;
type DesCbcDec = cbc::Decryptor<Des>;

pub struct LegacyDesCipher {
    material: DesKeyMaterial,
}

impl LegacyDesCipher {
    #[must_use]
    pub fn new(config: &DesKeyConfig) -> Self {
        Self {
            material: kdf::derive_des_key_iv(config),
        }
    }

    fn encryptor(&self) -> DesCbcEnc {
        DesCbcEnc::new((&self.material.key).into(), (&self.material.iv).into())
    }

    fn decryptor(&self) -> DesCbcDec {
        DesCbcDec::new((&self.material.key).into(), (&self.material.iv).into())
    }
}

impl CredentialCipher for LegacyDesCipher {
    fn scheme(&self) -> CipherScheme {
        CipherScheme::Des
    }

    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut buffer = plaintext.as_bytes().to_vec();
        let padded_len = (buffer.len() / DES_BLOCK_LEN + 1) * DES_BLOCK_LEN;
        buffer.resize(padded_len, 0u8);

        let ciphertext = self
            .encryptor()
            .encrypt_padded_mut::<Pkcs7>(&mut buffer, plaintext.len())
            .map_err(|_| CryptoError::Padding)?;

        Ok(BASE64_STD.encode(ciphertext))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        if ciphertext.is_empty() {
            return Ok(String::new());
        }

        let mut buffer = BASE64_STD.decode(ciphertext.as_bytes())?;
        if buffer.is_empty() || buffer.len() % DES_BLOCK_LEN != 0 {
            debug!(len = buffer.len(), "Rejecting DES ciphertext with bad length");
            return Err(CryptoError::InvalidLength(buffer.len()));
        }

        let plaintext = self
            .decryptor()
            .decrypt_padded_mut::<Pkcs7>(&mut buffer)
            .map_err(|_| CryptoError::Padding)?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| CryptoError::InvalidUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> LegacyDesCipher {
        LegacyDesCipher::new(&DesKeyConfig::default())
    }

    #[test]
    fn roundtrip() {
        let cipher = cipher();
        for plaintext in ["a", "hello world", "8bytes!!", "gl-\u{e9}xport"] {
            let encrypted = cipher.encrypt(plaintext).unwrap();
            assert_ne!(encrypted, plaintext);
            assert_eq!(cipher.decrypt(&encrypted).unwrap(), plaintext);
        }
    }

    #[test]
    fn block_aligned_input_gets_full_padding_block() {
        let encrypted = cipher().encrypt("8bytes!!").unwrap();
        let raw = BASE64_STD.decode(encrypted).unwrap();
        assert_eq!(raw.len(), 16);
    }

    #[test]
    fn known_ciphertext_under_default_key() {
        let cipher = cipher();
        assert_eq!(
            cipher.encrypt("ledger-admin-pw").unwrap(),
            "0OMDgU7m30DNVhMiPtNxrA=="
        );
        assert_eq!(
            cipher.decrypt("0OMDgU7m30DNVhMiPtNxrA==").unwrap(),
            "ledger-admin-pw"
        );
    }

    #[test]
    fn empty_and_absent_pass_through() {
        let cipher = cipher();
        assert_eq!(cipher.encrypt("").unwrap(), "");
        assert_eq!(cipher.decrypt("").unwrap(), "");
        assert_eq!(cipher.encrypt_opt(None).unwrap(), None);
    }

    #[test]
    fn decrypt_propagates_bad_base64() {
        let err = cipher().decrypt("not base64!").expect_err("must fail");
        assert!(matches!(err, CryptoError::Base64(_)));
    }

    #[test]
    fn decrypt_propagates_bad_length() {
        let err = cipher().decrypt("aGVsbG8=").expect_err("must fail");
        assert!(matches!(err, CryptoError::InvalidLength(5)));
    }

    #[test]
    fn decrypt_rejects_ciphertext_from_other_key() {
        let other = LegacyDesCipher::new(&DesKeyConfig {
            passphrase: "another legacy key".to_string(),
            ..DesKeyConfig::default()
        });
        let encrypted = cipher().encrypt("hello world").unwrap();
        match other.decrypt(&encrypted) {
            Ok(plaintext) => assert_ne!(plaintext, "hello world"),
            Err(err) => assert!(matches!(
                err,
                CryptoError::Padding | CryptoError::InvalidUtf8
            )),
        }
    }

    #[test]
    fn is_encrypted_short_input_is_false() {
        let cipher = cipher();
        assert!(!cipher.is_encrypted("").unwrap());
        assert!(!cipher.is_encrypted("ab").unwrap());
    }

    #[test]
    fn is_encrypted_detects_own_ciphertext() {
        let cipher = cipher();
        let encrypted = cipher.encrypt("hello world").unwrap();
        assert!(cipher.is_encrypted(&encrypted).unwrap());
    }

    #[test]
    fn is_encrypted_propagates_decrypt_errors() {
        assert!(cipher().is_encrypted("hello world").is_err());
    }
}
