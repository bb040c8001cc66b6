//! Channel membership entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Channel roles, coarsest authorization level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ChannelRole {
    #[sea_orm(string_value = "owner")]
    Owner,
    #[sea_orm(string_value = "moderator")]
    Moderator,
    #[sea_orm(string_value = "member")]
    Member,
}

/// Channel membership - one row per (channel, user) pair.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "channel_member")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub channel_id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    pub role: ChannelRole,

    /// Permission bit granted on top of the role.
    #[sea_orm(default_value = false)]
    pub can_manage_messages: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::channel::Entity",
        from = "Column::ChannelId",
        to = "super::channel::Column::Id",
        on_delete = "Cascade"
    )]
    Channel,
}

impl Related<super::channel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Channel.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
