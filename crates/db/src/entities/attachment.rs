//! Attachment entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A file attached to a message. Immutable after creation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attachment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning message. Null only between a pre-upload and the send that
    /// binds the attachment to its message.
    #[sea_orm(nullable, indexed)]
    pub message_id: Option<String>,

    pub file_name: String,

    /// MIME content type.
    pub file_type: String,

    /// File size in bytes.
    pub size: i64,

    /// Opaque blob-store location. The core never interprets this.
    pub blob_location: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::message::Entity",
        from = "Column::MessageId",
        to = "super::message::Column::Id",
        on_delete = "Cascade"
    )]
    Message,
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Message.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
