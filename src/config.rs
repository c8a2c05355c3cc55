use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

pub const ENV_AES_PASSPHRASE: &str = "LEDGERAUTH_AES_PASSPHRASE";
pub const ENV_DES_PASSPHRASE: &str = "LEDGERAUTH_DES_PASSPHRASE";
pub const ENV_DATABASE_URL: &str = "LEDGERAUTH_DATABASE_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// "text" or "json"
    pub log_format: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    pub max_db_connections: u32,

    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/ledgerauth.db".to_string(),
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub lockout: LockoutConfig,

    pub password: PasswordPolicyConfig,

    /// Key derivation inputs for the stored-credential ciphers.
    /// Changing these makes every existing ciphertext undecryptable.
    pub ciphers: CipherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    /// Consecutive failed logins after which the account is locked.
    pub max_failed_attempts: u32,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicyConfig {
    pub min_length: usize,
}

impl Default for PasswordPolicyConfig {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherConfig {
    pub aes: AesKeyConfig,

    pub des: DesKeyConfig,
}

/// PBKDF2-HMAC-SHA512 inputs for the AES credential cipher.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AesKeyConfig {
    pub passphrase: String,

    pub salt: [u8; 8],

    pub iterations: u32,
}

impl Default for AesKeyConfig {
    fn default() -> Self {
        Self {
            passphrase: "GLRpt#Cred!2014".to_string(),
            salt: [0x26, 0x19, 0x81, 0x4e, 0xa0, 0x6d, 0x95, 0x34],
            iterations: 1024,
        }
    }
}

impl fmt::Debug for AesKeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesKeyConfig")
            .field("passphrase", &"<redacted>")
            .field("salt", &self.salt)
            .field("iterations", &self.iterations)
            .finish()
    }
}

/// PKCS#5 v2 inputs for the legacy DES credential cipher.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesKeyConfig {
    pub passphrase: String,

    pub salt: [u8; 8],

    pub iterations: u32,
}

impl Default for DesKeyConfig {
    fn default() -> Self {
        Self {
            passphrase: "GLReportLegacyPassKey".to_string(),
            salt: [0xa9, 0x9b, 0xc8, 0x32, 0x56, 0x35, 0xe3, 0x03],
            iterations: 19,
        }
    }
}

impl fmt::Debug for DesKeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesKeyConfig")
            .field("passphrase", &"<redacted>")
            .field("salt", &self.salt)
            .field("iterations", &self.iterations)
            .finish()
    }
}

impl Config {
    /// Loads the first config file found, then applies environment overrides.
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = paths
            .iter()
            .find(|path| path.exists())
            .map_or_else(
                || {
                    info!("No config file found, using defaults");
                    Ok(Self::default())
                },
                |path| {
                    info!("Loading config from: {}", path.display());
                    Self::load_from_path(path)
                },
            )?;

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Secrets kept out of the config file win over it.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(passphrase) = std::env::var(ENV_AES_PASSPHRASE) {
            self.security.ciphers.aes.passphrase = passphrase;
        }

        if let Ok(passphrase) = std::env::var(ENV_DES_PASSPHRASE) {
            self.security.ciphers.des.passphrase = passphrase;
        }

        if let Ok(url) = std::env::var(ENV_DATABASE_URL) {
            self.general.database_path = url;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("ledgerauth").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".ledgerauth").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.general.database_path.is_empty() {
            anyhow::bail!("Database path cannot be empty");
        }

        if self.general.min_db_connections > self.general.max_db_connections {
            anyhow::bail!("min_db_connections cannot exceed max_db_connections");
        }

        if self.security.lockout.max_failed_attempts == 0 {
            anyhow::bail!("Lockout threshold must be at least 1");
        }

        let ciphers = &self.security.ciphers;
        if ciphers.aes.iterations == 0 || ciphers.des.iterations == 0 {
            anyhow::bail!("Cipher key derivation iterations must be > 0");
        }

        if ciphers.aes.passphrase.is_empty() || ciphers.des.passphrase.is_empty() {
            anyhow::bail!("Cipher passphrases cannot be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.security.lockout.max_failed_attempts, 5);
        assert_eq!(config.security.password.min_length, 8);
        assert_eq!(config.security.ciphers.aes.iterations, 1024);
        assert_eq!(config.security.ciphers.des.iterations, 19);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[security.lockout]"));
        assert!(toml_str.contains("[security.ciphers.aes]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [security.lockout]
            max_failed_attempts = 3

            [security.ciphers.des]
            iterations = 50
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.security.lockout.max_failed_attempts, 3);
        assert_eq!(config.security.ciphers.des.iterations, 50);

        assert_eq!(config.security.ciphers.aes.iterations, 1024);
        assert_eq!(
            config.security.ciphers.des.salt,
            DesKeyConfig::default().salt
        );
    }

    #[test]
    fn test_debug_redacts_passphrases() {
        let config = Config::default();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains(&config.security.ciphers.aes.passphrase));
        assert!(!rendered.contains(&config.security.ciphers.des.passphrase));
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let mut config = Config::default();
        config.security.lockout.max_failed_attempts = 0;
        assert!(config.validate().is_err());
    }
}
