use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub user_id: i32,

    #[sea_orm(unique)]
    pub username: String,

    pub email: String,

    /// `base64(salt ‖ pbkdf2)`; absent for accounts that log in through a
    /// provisioned credential row instead.
    pub password_hash: Option<String>,

    /// Base64 of the 16 salt bytes.
    pub salt: Option<String>,

    pub is_active: bool,

    pub is_locked: bool,

    pub failed_login_attempts: i32,

    pub last_login_at: Option<String>,

    pub role_id: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::credentials::Entity")]
    Credentials,
}

impl Related<super::credentials::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Credentials.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
