//! CLI module - Command-line interface for ledgerauth
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

use crate::crypto::CipherScheme;

/// ledgerauth - credential tooling for the GL reporting application
/// Encrypts stored credentials, hashes passwords, and manages account lockout
#[derive(Parser)]
#[command(name = "ledgerauth")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Encrypt a value with a credential cipher
    #[command(alias = "enc")]
    Encrypt {
        /// Cipher scheme (aes or des)
        #[arg(long, default_value = "aes")]
        scheme: CipherScheme,
        /// Plaintext to encrypt
        text: String,
    },

    /// Decrypt a value with a credential cipher
    #[command(alias = "dec")]
    Decrypt {
        /// Cipher scheme (aes or des)
        #[arg(long, default_value = "aes")]
        scheme: CipherScheme,
        /// Base64 ciphertext
        text: String,
    },

    /// Guess whether a value is already ciphertext
    IsEncrypted {
        /// Cipher scheme (aes or des)
        #[arg(long, default_value = "aes")]
        scheme: CipherScheme,
        text: String,
    },

    /// Hash a password, generating a salt unless one is given
    HashPassword {
        /// Base64 salt (16 bytes)
        #[arg(long)]
        salt: Option<String>,
    },

    /// Register a new account
    Register {
        username: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long, default_value = "1")]
        role: i32,
    },

    /// Check a username/password pair, updating lockout state
    Login { username: String },

    /// Change an account's password
    ChangePassword { username: String },

    /// Store a new credential row for an account
    Provision {
        /// Owning account ID
        user_id: i32,
        /// Cipher scheme (aes or des)
        #[arg(long, default_value = "aes")]
        scheme: CipherScheme,
        /// Store the value without encryption
        #[arg(long, conflicts_with = "scheme")]
        plain: bool,
    },

    /// Re-encrypt an account's legacy credential under AES
    MigrateCredential { user_id: i32 },

    /// Clear an account's lock and failure counter
    Unlock { username: String },

    /// Disable logins for an account
    Deactivate { username: String },

    /// Re-enable logins for an account
    Activate { username: String },

    /// Show lock and activity state for an account
    Status {
        username: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

pub use commands::*;
