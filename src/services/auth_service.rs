//! Domain service for authentication and account administration.
//!
//! Handles registration, login with lockout, password changes, and the
//! provisioning of encrypted credential rows.

use serde::Serialize;
use thiserror::Error;

use crate::crypto::{CipherScheme, CryptoError};
use crate::db::{Account, CredentialRecord};
use crate::services::lockout::LoginOutcome;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is locked")]
    AccountLocked,

    #[error("Account is inactive")]
    AccountInactive,

    #[error("User not found")]
    UserNotFound,

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl AuthError {
    /// Maps a rejected login to the error shown to the caller.
    #[must_use]
    pub const fn from_outcome(outcome: LoginOutcome) -> Option<Self> {
        match outcome {
            LoginOutcome::Authenticated => None,
            LoginOutcome::InvalidPassword { .. } => Some(Self::InvalidCredentials),
            LoginOutcome::LockedOut | LoginOutcome::Locked => Some(Self::AccountLocked),
            LoginOutcome::Inactive => Some(Self::AccountInactive),
        }
    }
}

/// Account state DTO for responses.
#[derive(Debug, Clone, Serialize)]
pub struct AccountStatus {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub role_id: i32,
    pub is_active: bool,
    pub is_locked: bool,
    pub failed_login_attempts: u32,
    pub last_login_at: Option<String>,
}

impl From<Account> for AccountStatus {
    fn from(account: Account) -> Self {
        Self {
            user_id: account.user_id,
            username: account.username,
            email: account.email,
            role_id: account.role_id,
            is_active: account.is_active,
            is_locked: account.is_locked,
            failed_login_attempts: account.failed_login_attempts,
            last_login_at: account.last_login_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user_id: i32,
    pub username: String,
    pub role_id: i32,
}

/// Credential row metadata; the secret itself is never returned.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialInfo {
    pub id: i32,
    pub subject_id: i32,
    pub scheme: Option<CipherScheme>,
    pub created_at: String,
}

impl From<CredentialRecord> for CredentialInfo {
    fn from(record: CredentialRecord) -> Self {
        Self {
            id: record.id,
            subject_id: record.subject_id,
            scheme: record.scheme,
            created_at: record.created_at,
        }
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an active, unlocked account with a salted password hash.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UsernameTaken`] or [`AuthError::Validation`].
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role_id: i32,
    ) -> Result<AccountStatus, AuthError>;

    /// Verifies credentials, applying the lockout policy.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`], [`AuthError::AccountLocked`]
    /// or [`AuthError::AccountInactive`] if login is rejected.
    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError>;

    /// Changes an account's registration password.
    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Stores a new active credential row, encrypted with `scheme`
    /// (`None` stores it as plaintext).
    async fn provision_credential(
        &self,
        subject_id: i32,
        password: &str,
        scheme: Option<CipherScheme>,
    ) -> Result<CredentialInfo, AuthError>;

    /// Re-encrypts a legacy DES or plaintext credential under AES.
    /// Returns `false` when the active row already uses AES.
    async fn migrate_credential(&self, subject_id: i32) -> Result<bool, AuthError>;

    /// Clears the lock flag and the failure counter.
    async fn unlock(&self, username: &str) -> Result<(), AuthError>;

    async fn set_active(&self, username: &str, is_active: bool) -> Result<(), AuthError>;

    async fn account_status(&self, username: &str) -> Result<AccountStatus, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_map_to_errors() {
        assert!(AuthError::from_outcome(LoginOutcome::Authenticated).is_none());
        assert!(matches!(
            AuthError::from_outcome(LoginOutcome::InvalidPassword {
                attempts_remaining: 2
            }),
            Some(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            AuthError::from_outcome(LoginOutcome::LockedOut),
            Some(AuthError::AccountLocked)
        ));
        assert!(matches!(
            AuthError::from_outcome(LoginOutcome::Locked),
            Some(AuthError::AccountLocked)
        ));
        assert!(matches!(
            AuthError::from_outcome(LoginOutcome::Inactive),
            Some(AuthError::AccountInactive)
        ));
    }
}
