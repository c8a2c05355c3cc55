//! Init command handler

use crate::config::Config;

pub fn cmd_init() -> anyhow::Result<()> {
    if Config::create_default_if_missing()? {
        println!("Created config.toml with default settings.");
        println!("Move the cipher passphrases into LEDGERAUTH_AES_PASSPHRASE / LEDGERAUTH_DES_PASSPHRASE before deploying.");
    } else {
        println!("config.toml already exists, leaving it untouched.");
    }
    Ok(())
}
