use crate::entities::credentials;
use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

const CREDENTIALS_LOOKUP_INDEX: &str = "idx_credentials_subject_status";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Accounts)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Credentials)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Every credential login filters on both columns.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(CREDENTIALS_LOOKUP_INDEX)
                    .table(Credentials)
                    .col(credentials::Column::SubjectId)
                    .col(credentials::Column::RecordStatus)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Credentials).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Accounts).to_owned())
            .await?;

        Ok(())
    }
}
