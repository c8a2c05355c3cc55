//! Cipher and hashing command handlers

use crate::config::Config;
use crate::crypto::password;
use crate::crypto::{CipherScheme, CredentialCipher};

use super::read_secret;

pub fn cmd_encrypt(config: &Config, scheme: CipherScheme, text: &str) -> anyhow::Result<()> {
    let cipher = scheme.build(&config.security.ciphers);
    println!("{}", cipher.encrypt(text)?);
    Ok(())
}

pub fn cmd_decrypt(config: &Config, scheme: CipherScheme, text: &str) -> anyhow::Result<()> {
    let cipher = scheme.build(&config.security.ciphers);
    println!("{}", cipher.decrypt(text)?);
    Ok(())
}

pub fn cmd_is_encrypted(config: &Config, scheme: CipherScheme, text: &str) -> anyhow::Result<()> {
    let cipher = scheme.build(&config.security.ciphers);
    println!("{}", cipher.is_encrypted(text)?);
    Ok(())
}

pub fn cmd_hash_password(salt: Option<&str>) -> anyhow::Result<()> {
    let password = read_secret("Password")?;
    let salt = salt.map_or_else(password::generate_salt, str::to_string);
    let hash = password::hash_password(&password, &salt)?;

    println!("salt: {salt}");
    println!("hash: {hash}");
    Ok(())
}
