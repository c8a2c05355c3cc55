//! Credential protection primitives.
//!
//! Two cipher schemes protect stored credential rows: [`AesCipher`] for
//! everything written today and [`LegacyDesCipher`] for rows written by the
//! older code path. They are not interchangeable; the scheme recorded
//! next to each row decides which one is used. Registration-time password
//! hashes live in [`password`] and do not depend on either cipher.

pub mod aes_cipher;
pub mod des_cipher;
pub mod kdf;
pub mod password;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::CipherConfig;

pub use aes_cipher::AesCipher;
pub use des_cipher::LegacyDesCipher;

/// Inputs shorter than this are never treated as ciphertext.
pub const MIN_CIPHERTEXT_CHARS: usize = 3;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("ciphertext length {0} is not a positive multiple of the block size")]
    InvalidLength(usize),

    #[error("padding check failed")]
    Padding,

    #[error("decrypted data is not valid UTF-8")]
    InvalidUtf8,

    #[error("salt must decode to {expected} bytes, got {actual}")]
    InvalidSalt { expected: usize, actual: usize },
}

/// Cipher used to protect a stored credential row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CipherScheme {
    Aes,
    Des,
}

impl CipherScheme {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aes => "aes",
            Self::Des => "des",
        }
    }

    /// Derives key material for this scheme and returns a ready cipher.
    #[must_use]
    pub fn build(self, config: &CipherConfig) -> Box<dyn CredentialCipher + Send + Sync> {
        match self {
            Self::Aes => Box::new(AesCipher::new(&config.aes)),
            Self::Des => Box::new(LegacyDesCipher::new(&config.des)),
        }
    }
}

impl fmt::Display for CipherScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aes" => Ok(Self::Aes),
            "des" => Ok(Self::Des),
            other => Err(format!("unknown cipher scheme '{other}' (expected aes or des)")),
        }
    }
}

/// Text-in, Base64-out encryption of credential strings.
pub trait CredentialCipher {
    fn scheme(&self) -> CipherScheme;

    /// Empty input is returned unchanged.
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError>;

    /// Empty input is returned unchanged.
    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError>;

    /// Guesses whether `text` is ciphertext produced by this scheme.
    ///
    /// Short strings are never ciphertext. Otherwise the text counts as
    /// encrypted when decrypting it changes it. A ciphertext that happens to
    /// decrypt to itself is misclassified as plaintext.
    fn is_encrypted(&self, text: &str) -> Result<bool, CryptoError> {
        if text.chars().count() < MIN_CIPHERTEXT_CHARS {
            return Ok(false);
        }
        Ok(self.decrypt(text)? != text)
    }

    /// `None` passes through untouched.
    fn encrypt_opt(&self, plaintext: Option<&str>) -> Result<Option<String>, CryptoError> {
        plaintext.map(|text| self.encrypt(text)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_parses_case_insensitively() {
        assert_eq!("AES".parse::<CipherScheme>().unwrap(), CipherScheme::Aes);
        assert_eq!("des".parse::<CipherScheme>().unwrap(), CipherScheme::Des);
        assert!("rot13".parse::<CipherScheme>().is_err());
    }

    #[test]
    fn build_returns_matching_scheme() {
        let config = CipherConfig::default();
        assert_eq!(CipherScheme::Aes.build(&config).scheme(), CipherScheme::Aes);
        assert_eq!(CipherScheme::Des.build(&config).scheme(), CipherScheme::Des);
    }

    #[test]
    fn schemes_are_not_interchangeable() {
        let config = CipherConfig::default();
        let aes = CipherScheme::Aes.build(&config);
        let des = CipherScheme::Des.build(&config);

        let ciphertext = aes.encrypt("ledger-admin-pw").unwrap();
        if let Ok(plaintext) = des.decrypt(&ciphertext) {
            assert_ne!(plaintext, "ledger-admin-pw");
        }
    }
}
