//! Admin user entity - Staff accounts for the admin console.
//!
//! An admin authenticates with username and password once to link their
//! Discord account (`discord_id`); afterwards the console resolves them from
//! the Discord user invoking a command.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Admin user database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_users")]
pub struct Model {
    /// Unique identifier for the admin
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Unique login name
    #[sea_orm(unique)]
    pub username: String,
    /// Unique contact email
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Assigned role
    pub role_id: i64,
    /// Linked Discord user ID, once the admin has logged in from Discord
    #[sea_orm(unique)]
    pub discord_id: Option<String>,
}

/// Defines relationships between AdminUser and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each admin holds one role
    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::Id"
    )]
    Role,
    /// Actions performed by this admin
    #[sea_orm(has_many = "super::activity_log::Entity")]
    ActivityLogs,
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::activity_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivityLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
