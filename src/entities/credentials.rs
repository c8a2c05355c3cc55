use sea_orm::entity::prelude::*;

pub const STATUS_ACTIVE: &str = "A";
pub const STATUS_INACTIVE: &str = "I";

/// Stored value is kept as-is, without encryption.
pub const SCHEME_PLAIN: &str = "plain";

/// History-style password rows: new rows supersede old ones, which are
/// retired by flipping `record_status` rather than being rewritten.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "credentials")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub subject_id: i32,

    pub secret: String,

    /// "aes", "des" or "plain"
    pub cipher_scheme: String,

    pub record_status: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::SubjectId",
        to = "super::accounts::Column::UserId",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
