use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::crypto::CipherScheme;
use crate::services::lockout::AccountUpdate;

pub mod migrator;
pub mod repositories;

pub use repositories::account::{Account, NewAccount, StoredPassword};
pub use repositories::credential::CredentialRecord;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn from_config(config: &crate::config::Config) -> Result<Self> {
        Self::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await
    }

    fn account_repo(&self) -> repositories::account::AccountRepository {
        repositories::account::AccountRepository::new(self.conn.clone())
    }

    fn credential_repo(&self) -> repositories::credential::CredentialRepository {
        repositories::credential::CredentialRepository::new(self.conn.clone())
    }

    // ========== Account Repository Methods ==========

    pub async fn get_account_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.account_repo().get_by_username(username).await
    }

    pub async fn get_account_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(Account, Option<StoredPassword>)>> {
        self.account_repo()
            .get_by_username_with_password(username)
            .await
    }

    pub async fn get_account_by_id(&self, user_id: i32) -> Result<Option<Account>> {
        self.account_repo().get_by_id(user_id).await
    }

    pub async fn create_account(&self, new_account: NewAccount) -> Result<Account> {
        self.account_repo().create(new_account).await
    }

    pub async fn record_login_attempt(&self, user_id: i32, update: &AccountUpdate) -> Result<()> {
        self.account_repo()
            .record_login_attempt(user_id, update)
            .await
    }

    pub async fn update_account_password(
        &self,
        username: &str,
        password: StoredPassword,
    ) -> Result<()> {
        self.account_repo()
            .update_password(username, password)
            .await
    }

    pub async fn unlock_account(&self, username: &str) -> Result<bool> {
        self.account_repo().unlock(username).await
    }

    pub async fn set_account_active(&self, username: &str, is_active: bool) -> Result<bool> {
        self.account_repo().set_active(username, is_active).await
    }

    // ========== Credential Repository Methods ==========

    pub async fn get_active_credential(&self, subject_id: i32) -> Result<Option<CredentialRecord>> {
        self.credential_repo().get_active(subject_id).await
    }

    pub async fn credential_history(&self, subject_id: i32) -> Result<Vec<CredentialRecord>> {
        self.credential_repo().history(subject_id).await
    }

    pub async fn add_credential(
        &self,
        subject_id: i32,
        secret: String,
        scheme: Option<CipherScheme>,
    ) -> Result<CredentialRecord> {
        self.credential_repo()
            .insert_active(subject_id, secret, scheme)
            .await
    }
}
