//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::Utc;
use tokio::task;
use tracing::{info, warn};

use crate::config::SecurityConfig;
use crate::crypto::password::{self, constant_time_eq};
use crate::crypto::{CipherScheme, CredentialCipher};
use crate::db::{Account, CredentialRecord, NewAccount, Store, StoredPassword};
use crate::services::auth_service::{
    AccountStatus, AuthError, AuthService, CredentialInfo, LoginResult,
};
use crate::services::lockout::{LockoutPolicy, LoginOutcome};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    fn policy(&self) -> LockoutPolicy {
        LockoutPolicy::from(&self.security.lockout)
    }

    fn validate_new_password(&self, password: &str) -> Result<(), AuthError> {
        let min_length = self.security.password.min_length;
        if password.chars().count() < min_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {min_length} characters"
            )));
        }
        Ok(())
    }

    async fn require_account(&self, username: &str) -> Result<Account, AuthError> {
        self.store
            .get_account_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Registration hash when present, otherwise the active credential row.
    async fn verify_account_password(
        &self,
        account: &Account,
        stored: Option<StoredPassword>,
        password: &str,
    ) -> Result<bool, AuthError> {
        if let Some(stored) = stored {
            let password = password.to_string();
            return blocking(move || {
                password::verify_password(&password, &stored.hash, &stored.salt)
            })
            .await;
        }

        let Some(record) = self.store.get_active_credential(account.user_id).await? else {
            warn!(
                user_id = account.user_id,
                "Account has neither a password hash nor an active credential"
            );
            return Ok(false);
        };

        let stored_plaintext = self.reveal(record).await?;
        Ok(constant_time_eq(&stored_plaintext, password))
    }

    /// Decrypts a credential row with the cipher named on the row.
    async fn reveal(&self, record: CredentialRecord) -> Result<String, AuthError> {
        let Some(scheme) = record.scheme else {
            return Ok(record.secret);
        };

        let ciphers = self.security.ciphers.clone();
        let secret = record.secret;
        let plaintext = blocking(move || scheme.build(&ciphers).decrypt(&secret)).await?;
        Ok(plaintext?)
    }

    async fn encrypt_with(&self, scheme: CipherScheme, plaintext: &str) -> Result<String, AuthError> {
        let ciphers = self.security.ciphers.clone();
        let plaintext = plaintext.to_string();
        let secret = blocking(move || {
            let cipher = scheme.build(&ciphers);
            // A legacy decrypt error just means the value is not our ciphertext.
            if cipher.is_encrypted(&plaintext).unwrap_or(false) {
                return Ok(None);
            }
            cipher.encrypt(&plaintext).map(Some)
        })
        .await??;

        secret.ok_or_else(|| {
            AuthError::Validation(format!("Value is already {scheme} ciphertext"))
        })
    }
}

async fn blocking<T, F>(f: F) -> Result<T, AuthError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Internal(format!("Crypto task panicked: {e}")))
}

fn count_login(outcome: LoginOutcome) {
    metrics::counter!("auth_login_attempts_total", "outcome" => outcome.as_str()).increment(1);
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role_id: i32,
    ) -> Result<AccountStatus, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        self.validate_new_password(password)?;

        if self.store.get_account_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken(username.to_string()));
        }

        let password = password.to_string();
        let stored = blocking(move || {
            let salt = password::generate_salt();
            password::hash_password(&password, &salt).map(|hash| StoredPassword { hash, salt })
        })
        .await??;

        let account = self
            .store
            .create_account(NewAccount {
                username: username.to_string(),
                email: email.trim().to_string(),
                password: stored,
                role_id,
            })
            .await?;

        info!(user_id = account.user_id, "Registered account: {}", account.username);
        Ok(AccountStatus::from(account))
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let Some((account, stored)) = self.store.get_account_with_password(username).await? else {
            metrics::counter!("auth_login_attempts_total", "outcome" => "unknown_user")
                .increment(1);
            return Err(AuthError::InvalidCredentials);
        };

        let policy = self.policy();
        let state = account.lockout_state();

        if let Err(outcome) = policy.admit(&state) {
            count_login(outcome);
            warn!(user_id = account.user_id, outcome = outcome.as_str(), "Login rejected");
            return Err(AuthError::from_outcome(outcome).unwrap_or(AuthError::InvalidCredentials));
        }

        let verified = self
            .verify_account_password(&account, stored, password)
            .await?;

        let transition = policy.record(&state, verified, Utc::now());
        self.store
            .record_login_attempt(account.user_id, &transition.update)
            .await?;

        count_login(transition.outcome);
        match AuthError::from_outcome(transition.outcome) {
            None => {
                info!(user_id = account.user_id, "Login succeeded: {}", account.username);
                Ok(LoginResult {
                    user_id: account.user_id,
                    username: account.username,
                    role_id: account.role_id,
                })
            }
            Some(err) => {
                if transition.outcome == LoginOutcome::LockedOut {
                    warn!(
                        user_id = account.user_id,
                        attempts = transition.update.failed_login_attempts,
                        "Account locked after repeated failures"
                    );
                }
                Err(err)
            }
        }
    }

    async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.validate_new_password(new_password)?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let (account, stored) = self
            .store
            .get_account_with_password(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if let Err(outcome) = self.policy().admit(&account.lockout_state()) {
            return Err(AuthError::from_outcome(outcome).unwrap_or(AuthError::InvalidCredentials));
        }

        if !self
            .verify_account_password(&account, stored, current_password)
            .await?
        {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let new_password = new_password.to_string();
        let stored = blocking(move || {
            let salt = password::generate_salt();
            password::hash_password(&new_password, &salt).map(|hash| StoredPassword { hash, salt })
        })
        .await??;

        self.store
            .update_account_password(&account.username, stored)
            .await?;

        info!(user_id = account.user_id, "Password changed");
        Ok(())
    }

    async fn provision_credential(
        &self,
        subject_id: i32,
        password: &str,
        scheme: Option<CipherScheme>,
    ) -> Result<CredentialInfo, AuthError> {
        if password.is_empty() {
            return Err(AuthError::Validation("Password is required".to_string()));
        }

        self.store
            .get_account_by_id(subject_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let secret = match scheme {
            Some(scheme) => self.encrypt_with(scheme, password).await?,
            None => password.to_string(),
        };

        let record = self.store.add_credential(subject_id, secret, scheme).await?;
        info!(
            subject_id,
            scheme = scheme.map_or("plain", CipherScheme::as_str),
            "Provisioned credential"
        );
        Ok(CredentialInfo::from(record))
    }

    async fn migrate_credential(&self, subject_id: i32) -> Result<bool, AuthError> {
        let record = self
            .store
            .get_active_credential(subject_id)
            .await?
            .ok_or_else(|| AuthError::Validation(format!("No active credential for {subject_id}")))?;

        if record.scheme == Some(CipherScheme::Aes) {
            return Ok(false);
        }

        let from = record.scheme.map_or("plain", CipherScheme::as_str);
        let plaintext = self.reveal(record).await?;

        let ciphers = self.security.ciphers.clone();
        let secret = blocking(move || CipherScheme::Aes.build(&ciphers).encrypt(&plaintext)).await??;

        self.store
            .add_credential(subject_id, secret, Some(CipherScheme::Aes))
            .await?;

        info!(subject_id, from, "Migrated credential to aes");
        Ok(true)
    }

    async fn unlock(&self, username: &str) -> Result<(), AuthError> {
        if !self.store.unlock_account(username).await? {
            return Err(AuthError::UserNotFound);
        }
        info!("Account unlocked: {username}");
        Ok(())
    }

    async fn set_active(&self, username: &str, is_active: bool) -> Result<(), AuthError> {
        if !self.store.set_account_active(username, is_active).await? {
            return Err(AuthError::UserNotFound);
        }
        info!(is_active, "Account activation changed: {username}");
        Ok(())
    }

    async fn account_status(&self, username: &str) -> Result<AccountStatus, AuthError> {
        Ok(AccountStatus::from(self.require_account(username).await?))
    }
}
