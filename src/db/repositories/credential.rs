use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::crypto::CipherScheme;
use crate::entities::credentials::{self, SCHEME_PLAIN, STATUS_ACTIVE, STATUS_INACTIVE};

/// A provisioned password row. `scheme` is `None` for plaintext rows.
#[derive(Clone)]
pub struct CredentialRecord {
    pub id: i32,
    pub subject_id: i32,
    pub secret: String,
    pub scheme: Option<CipherScheme>,
    pub is_active: bool,
    pub created_at: String,
}

impl std::fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("subject_id", &self.subject_id)
            .field("scheme", &self.scheme)
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl TryFrom<credentials::Model> for CredentialRecord {
    type Error = anyhow::Error;

    fn try_from(model: credentials::Model) -> Result<Self> {
        let scheme = scheme_from_column(&model.cipher_scheme)?;
        Ok(Self {
            id: model.id,
            subject_id: model.subject_id,
            secret: model.secret,
            scheme,
            is_active: model.record_status == STATUS_ACTIVE,
            created_at: model.created_at,
        })
    }
}

fn scheme_from_column(value: &str) -> Result<Option<CipherScheme>> {
    if value == SCHEME_PLAIN {
        return Ok(None);
    }
    value
        .parse::<CipherScheme>()
        .map(Some)
        .map_err(|e| anyhow::anyhow!("Corrupt credential row: {e}"))
}

const fn scheme_to_column(scheme: Option<CipherScheme>) -> &'static str {
    match scheme {
        Some(scheme) => scheme.as_str(),
        None => SCHEME_PLAIN,
    }
}

pub struct CredentialRepository {
    conn: DatabaseConnection,
}

impl CredentialRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Newest active row for the subject
    pub async fn get_active(&self, subject_id: i32) -> Result<Option<CredentialRecord>> {
        let model = credentials::Entity::find()
            .filter(credentials::Column::SubjectId.eq(subject_id))
            .filter(credentials::Column::RecordStatus.eq(STATUS_ACTIVE))
            .order_by_desc(credentials::Column::Id)
            .one(&self.conn)
            .await
            .context("Failed to query active credential")?;

        model.map(CredentialRecord::try_from).transpose()
    }

    /// All rows for the subject, newest first
    pub async fn history(&self, subject_id: i32) -> Result<Vec<CredentialRecord>> {
        let models = credentials::Entity::find()
            .filter(credentials::Column::SubjectId.eq(subject_id))
            .order_by_desc(credentials::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to query credential history")?;

        models.into_iter().map(CredentialRecord::try_from).collect()
    }

    /// Retires the current active rows and appends a new active one.
    pub async fn insert_active(
        &self,
        subject_id: i32,
        secret: String,
        scheme: Option<CipherScheme>,
    ) -> Result<CredentialRecord> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to start credential transaction")?;

        credentials::Entity::update_many()
            .col_expr(credentials::Column::RecordStatus, Expr::value(STATUS_INACTIVE))
            .filter(credentials::Column::SubjectId.eq(subject_id))
            .filter(credentials::Column::RecordStatus.eq(STATUS_ACTIVE))
            .exec(&txn)
            .await
            .context("Failed to retire previous credentials")?;

        let model = credentials::ActiveModel {
            subject_id: Set(subject_id),
            secret: Set(secret),
            cipher_scheme: Set(scheme_to_column(scheme).to_string()),
            record_status: Set(STATUS_ACTIVE.to_string()),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert credential")?;

        txn.commit()
            .await
            .context("Failed to commit credential transaction")?;

        CredentialRecord::try_from(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_column_mapping() {
        assert_eq!(scheme_from_column("plain").unwrap(), None);
        assert_eq!(scheme_from_column("aes").unwrap(), Some(CipherScheme::Aes));
        assert_eq!(scheme_from_column("des").unwrap(), Some(CipherScheme::Des));
        assert!(scheme_from_column("rc4").is_err());
        assert_eq!(scheme_to_column(None), "plain");
        assert_eq!(scheme_to_column(Some(CipherScheme::Des)), "des");
    }

    #[test]
    fn debug_hides_secret() {
        let record = CredentialRecord {
            id: 1,
            subject_id: 2,
            secret: "hunter2-secret".to_string(),
            scheme: None,
            is_active: true,
            created_at: String::new(),
        };
        assert!(!format!("{record:?}").contains("hunter2"));
    }
}
