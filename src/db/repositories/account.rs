use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde::Serialize;
use tracing::debug;

use crate::entities::accounts;
use crate::services::lockout::{AccountState, AccountUpdate};

/// Account data returned from the repository (without password material)
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_locked: bool,
    pub failed_login_attempts: u32,
    pub last_login_at: Option<String>,
    pub role_id: i32,
    pub created_at: String,
    pub updated_at: String,
}

impl Account {
    #[must_use]
    pub const fn lockout_state(&self) -> AccountState {
        AccountState {
            is_active: self.is_active,
            is_locked: self.is_locked,
            failed_login_attempts: self.failed_login_attempts,
        }
    }
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            user_id: model.user_id,
            username: model.username,
            email: model.email,
            is_active: model.is_active,
            is_locked: model.is_locked,
            failed_login_attempts: u32::try_from(model.failed_login_attempts).unwrap_or(0),
            last_login_at: model.last_login_at,
            role_id: model.role_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Registration hash and its salt, both Base64.
#[derive(Clone)]
pub struct StoredPassword {
    pub hash: String,
    pub salt: String,
}

pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: StoredPassword,
    pub role_id: i32,
}

pub struct AccountRepository {
    conn: DatabaseConnection,
}

impl AccountRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    async fn find_model(&self, username: &str) -> Result<Option<accounts::Model>> {
        accounts::Entity::find()
            .filter(accounts::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query account by username")
    }

    /// Get account by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<Account>> {
        Ok(self.find_model(username).await?.map(Account::from))
    }

    /// Get account by username together with its registration hash, if any
    pub async fn get_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(Account, Option<StoredPassword>)>> {
        Ok(self.find_model(username).await?.map(|model| {
            let password = match (model.password_hash.clone(), model.salt.clone()) {
                (Some(hash), Some(salt)) => Some(StoredPassword { hash, salt }),
                _ => None,
            };
            (Account::from(model), password)
        }))
    }

    /// Get account by ID
    pub async fn get_by_id(&self, user_id: i32) -> Result<Option<Account>> {
        let account = accounts::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query account by ID")?;

        Ok(account.map(Account::from))
    }

    pub async fn create(&self, new_account: NewAccount) -> Result<Account> {
        let now = chrono::Utc::now().to_rfc3339();

        let active = accounts::ActiveModel {
            username: Set(new_account.username),
            email: Set(new_account.email),
            password_hash: Set(Some(new_account.password.hash)),
            salt: Set(Some(new_account.password.salt)),
            is_active: Set(true),
            is_locked: Set(false),
            failed_login_attempts: Set(0),
            last_login_at: Set(None),
            role_id: Set(new_account.role_id),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert account")?;

        Ok(Account::from(model))
    }

    /// Writes the lockout counters after a verified login attempt.
    ///
    /// Plain read-modify-write: two concurrent attempts on one account can
    /// lose an increment. The lock flag is only ever raised here; clearing it
    /// is left to [`Self::unlock`].
    pub async fn record_login_attempt(&self, user_id: i32, update: &AccountUpdate) -> Result<()> {
        let account = accounts::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query account for login update")?
            .ok_or_else(|| anyhow::anyhow!("Account not found: {user_id}"))?;

        // Locked since this attempt was admitted; the stale update is dropped.
        if account.is_locked && !update.is_locked {
            debug!(user_id, "Account locked concurrently, skipping login update");
            return Ok(());
        }

        let mut active: accounts::ActiveModel = account.into();
        active.failed_login_attempts =
            Set(i32::try_from(update.failed_login_attempts).unwrap_or(i32::MAX));
        if update.is_locked {
            active.is_locked = Set(true);
        }
        if let Some(at) = update.last_login_at {
            active.last_login_at = Set(Some(at.to_rfc3339()));
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn update_password(&self, username: &str, password: StoredPassword) -> Result<()> {
        let account = self
            .find_model(username)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Account not found: {username}"))?;

        let mut active: accounts::ActiveModel = account.into();
        active.password_hash = Set(Some(password.hash));
        active.salt = Set(Some(password.salt));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Clears the lock and the failure counter. Returns false if no such account.
    pub async fn unlock(&self, username: &str) -> Result<bool> {
        let Some(account) = self.find_model(username).await? else {
            return Ok(false);
        };

        let mut active: accounts::ActiveModel = account.into();
        active.is_locked = Set(false);
        active.failed_login_attempts = Set(0);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }

    /// Returns false if no such account.
    pub async fn set_active(&self, username: &str, is_active: bool) -> Result<bool> {
        let Some(account) = self.find_model(username).await? else {
            return Ok(false);
        };

        let mut active: accounts::ActiveModel = account.into();
        active.is_active = Set(is_active);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(true)
    }
}
