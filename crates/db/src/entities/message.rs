//! Message entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "message")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Channel the message was posted to. Never changes after creation.
    #[sea_orm(indexed)]
    pub channel_id: String,

    /// Author user ID.
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Message text. Null when the message carries only attachments.
    #[sea_orm(column_type = "Text", nullable)]
    pub content: Option<String>,

    /// Parent message ID. Set for thread replies; replies are excluded
    /// from top-level channel listings by default.
    #[sea_orm(nullable, indexed)]
    pub parent_message_id: Option<String>,

    /// Set exactly once on the first content edit; never reverts.
    #[sea_orm(default_value = false)]
    pub is_edited: bool,

    /// Soft-delete flag. The row is retained and content is unchanged.
    #[sea_orm(default_value = false)]
    pub is_deleted: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::channel::Entity",
        from = "Column::ChannelId",
        to = "super::channel::Column::Id"
    )]
    Channel,

    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentMessageId",
        to = "Column::Id"
    )]
    Parent,

    #[sea_orm(has_many = "super::attachment::Entity")]
    Attachments,

    #[sea_orm(has_many = "super::reaction::Entity")]
    Reactions,

    #[sea_orm(has_many = "super::mention::Entity")]
    Mentions,
}

impl Related<super::channel::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Channel.def()
    }
}

impl Related<super::attachment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
