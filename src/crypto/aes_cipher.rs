//! AES-128-CBC credential cipher.
//!
//! Key from PBKDF2-HMAC-SHA512 (see [`kdf::derive_aes_key`]), all-zero IV,
//! PKCS7 padding, standard Base64 text. Decryption never fails: anything
//! that does not decrypt cleanly comes back unchanged, which is what
//! [`AesCipher::is_encrypted`] relies on.

use aes::Aes128;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STD;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use tracing::warn;

use super::kdf::{self, AES_BLOCK_LEN, AES_IV, AesKeyMaterial};
use super::{CipherScheme, CredentialCipher, CryptoError, MIN_CIPHERTEXT_CHARS};
use crate::config::AesKeyConfig;

type Aes128CbcEnc = cbc::Encryptor<Aes128>;
type Aes128CbcDec = cbc::Decryptor<Aes128>;

pub struct AesCipher {
    material: AesKeyMaterial,
}

impl AesCipher {
    #[must_use]
    pub fn new(config: &AesKeyConfig) -> Self {
        Self {
            material: kdf::derive_aes_key(config),
        }
    }

    fn encryptor(&self) -> Aes128CbcEnc {
        Aes128CbcEnc::new((&self.material.key).into(), &AES_IV.into())
    }

    fn decryptor(&self) -> Aes128CbcDec {
        Aes128CbcDec::new((&self.material.key).into(), &AES_IV.into())
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut buffer = plaintext.as_bytes().to_vec();
        let padded_len = (buffer.len() / AES_BLOCK_LEN + 1) * AES_BLOCK_LEN;
        buffer.resize(padded_len, 0u8);

        let ciphertext = self
            .encryptor()
            .encrypt_padded_mut::<Pkcs7>(&mut buffer, plaintext.len())
            .map_err(|_| CryptoError::Padding)?;

        Ok(BASE64_STD.encode(ciphertext))
    }

    /// Returns the plaintext, or `ciphertext` itself when it cannot be decrypted.
    #[must_use]
    pub fn decrypt(&self, ciphertext: &str) -> String {
        if ciphertext.is_empty() {
            return String::new();
        }

        match self.try_decrypt(ciphertext) {
            Ok(plaintext) => plaintext,
            Err(err) => {
                // CBC state is rebuilt per call, so dropping the failed
                // decryptor is the whole re-initialization.
                warn!(error = %err, "AES decrypt failed, returning input unchanged");
                ciphertext.to_string()
            }
        }
    }

    #[must_use]
    pub fn is_encrypted(&self, text: &str) -> bool {
        text.chars().count() >= MIN_CIPHERTEXT_CHARS && self.decrypt(text) != text
    }

    fn try_decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let mut buffer = BASE64_STD.decode(ciphertext.as_bytes())?;
        if buffer.is_empty() || buffer.len() % AES_BLOCK_LEN != 0 {
            return Err(CryptoError::InvalidLength(buffer.len()));
        }

        let plaintext = self
            .decryptor()
            .decrypt_padded_mut::<Pkcs7>(&mut buffer)
            .map_err(|_| CryptoError::Padding)?;

        String::from_utf8(plaintext.to_vec()).map_err(|_| CryptoError::InvalidUtf8)
    }
}

impl CredentialCipher for AesCipher {
    fn scheme(&self) -> CipherScheme {
        CipherScheme::Aes
    }

    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        Self::encrypt(self, plaintext)
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        Ok(Self::decrypt(self, ciphertext))
    }

    fn is_encrypted(&self, text: &str) -> Result<bool, CryptoError> {
        Ok(Self::is_encrypted(self, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> AesCipher {
        AesCipher::new(&AesKeyConfig::default())
    }

    #[test]
    fn roundtrip() {
        let cipher = cipher();
        for plaintext in ["a", "hello world", "exactly16bytes!!", "P@ssw0rd-\u{e9}t\u{e9}"] {
            let encrypted = cipher.encrypt(plaintext).unwrap();
            assert_ne!(encrypted, plaintext);
            assert_eq!(cipher.decrypt(&encrypted), plaintext);
        }
    }

    #[test]
    fn output_is_base64_of_whole_blocks() {
        let cipher = cipher();
        let encrypted = cipher.encrypt("exactly16bytes!!").unwrap();
        let raw = BASE64_STD.decode(encrypted).unwrap();
        // A full block of padding follows block-aligned input.
        assert_eq!(raw.len(), 32);
    }

    #[test]
    fn encryption_is_deterministic_with_fixed_iv() {
        let first = cipher().encrypt("hello world").unwrap();
        let second = cipher().encrypt("hello world").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn known_ciphertext_under_default_key() {
        let cipher = cipher();
        assert_eq!(
            cipher.encrypt("ledger-admin-pw").unwrap(),
            "O8wZ5kYLLqJ5xTNU5DMeqA=="
        );
        assert_eq!(cipher.decrypt("O8wZ5kYLLqJ5xTNU5DMeqA=="), "ledger-admin-pw");
    }

    #[test]
    fn empty_and_absent_pass_through() {
        let cipher = cipher();
        assert_eq!(cipher.encrypt("").unwrap(), "");
        assert_eq!(cipher.decrypt(""), "");
        assert_eq!(cipher.encrypt_opt(None).unwrap(), None);
        assert_eq!(cipher.encrypt_opt(Some("")).unwrap(), Some(String::new()));
    }

    #[test]
    fn decrypt_returns_input_on_garbage() {
        let cipher = cipher();
        for input in [
            "not base64 at all!",
            "aGVsbG8=",
            "AAAAAAAAAAAAAAAAAAAAAA==",
            "////////////////////////////////////////////",
        ] {
            assert_eq!(cipher.decrypt(input), input);
        }
    }

    #[test]
    fn decrypt_under_other_key_returns_input() {
        let other = AesCipher::new(&AesKeyConfig {
            passphrase: "someone else".to_string(),
            ..AesKeyConfig::default()
        });
        let encrypted = cipher().encrypt("hello world").unwrap();
        let decrypted = other.decrypt(&encrypted);
        assert_ne!(decrypted, "hello world");
    }

    #[test]
    fn is_encrypted_heuristic() {
        let cipher = cipher();
        let encrypted = cipher.encrypt("hello world").unwrap();
        assert!(cipher.is_encrypted(&encrypted));
        assert!(!cipher.is_encrypted("hello world"));
        assert!(!cipher.is_encrypted(""));
        assert!(!cipher.is_encrypted("ab"));
    }

    #[test]
    fn short_ciphertext_is_never_flagged() {
        let cipher = cipher();
        // Even real ciphertext is ignored when too short to be one.
        assert!(!cipher.is_encrypted("AA"));
        assert!(!CredentialCipher::is_encrypted(&cipher, "xy").unwrap());
    }

    #[test]
    fn trait_decrypt_never_errors() {
        let cipher = cipher();
        let decrypted = CredentialCipher::decrypt(&cipher, "%%%garbage%%%").unwrap();
        assert_eq!(decrypted, "%%%garbage%%%");
    }
}
