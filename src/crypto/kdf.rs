use pbkdf2::pbkdf2_hmac;
use sha1::Sha1;
use sha2::Sha512;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::{AesKeyConfig, DesKeyConfig};

pub const AES_KEY_LEN: usize = 16;
pub const AES_BLOCK_LEN: usize = 16;
/// The AES scheme never derives an IV.
pub const AES_IV: [u8; AES_BLOCK_LEN] = [0u8; AES_BLOCK_LEN];

pub const DES_KEY_LEN: usize = 8;
pub const DES_IV_LEN: usize = 8;

#[derive(Zeroize, ZeroizeOnDrop)]
pub struct AesKeyMaterial {
    pub key: [u8; AES_KEY_LEN],
}

#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DesKeyMaterial {
    pub key: [u8; DES_KEY_LEN],
    pub iv: [u8; DES_IV_LEN],
}

/// PBKDF2-HMAC-SHA512 over the UTF-8 passphrase, 16 bytes of output.
#[must_use]
pub fn derive_aes_key(config: &AesKeyConfig) -> AesKeyMaterial {
    let mut key = [0u8; AES_KEY_LEN];
    pbkdf2_hmac::<Sha512>(
        config.passphrase.as_bytes(),
        &config.salt,
        config.iterations,
        &mut key,
    );
    AesKeyMaterial { key }
}

/// PKCS#5 v2 generator (PBKDF2-HMAC-SHA1) producing key and IV in one run.
///
/// The passphrase goes through [`pkcs5_password_to_bytes`], not UTF-8, so
/// that rows encrypted by the legacy writer stay readable.
#[must_use]
pub fn derive_des_key_iv(config: &DesKeyConfig) -> DesKeyMaterial {
    let mut password = pkcs5_password_to_bytes(&config.passphrase);
    let mut derived = [0u8; DES_KEY_LEN + DES_IV_LEN];
    pbkdf2_hmac::<Sha1>(&password, &config.salt, config.iterations, &mut derived);

    let mut material = DesKeyMaterial {
        key: [0u8; DES_KEY_LEN],
        iv: [0u8; DES_IV_LEN],
    };
    material.key.copy_from_slice(&derived[..DES_KEY_LEN]);
    material.iv.copy_from_slice(&derived[DES_KEY_LEN..]);

    password.zeroize();
    derived.zeroize();
    material
}

/// PKCS#5 password-to-bytes: one byte per UTF-16 code unit, high bits dropped.
#[must_use]
pub fn pkcs5_password_to_bytes(password: &str) -> Vec<u8> {
    password
        .encode_utf16()
        .map(|unit| unit.to_le_bytes()[0])
        .collect()
}
