//! Create message table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Message::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Message::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Message::ChannelId).string_len(32).not_null())
                    .col(ColumnDef::new(Message::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Message::Content).text())
                    .col(ColumnDef::new(Message::ParentMessageId).string_len(32))
                    .col(
                        ColumnDef::new(Message::IsEdited)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Message::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Message::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Message::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_channel")
                            .from(Message::Table, Message::ChannelId)
                            .to(Channel::Table, Channel::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_message_parent")
                            .from(Message::Table, Message::ParentMessageId)
                            .to(Message::Table, Message::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Compound index: (channel_id, created_at, id) - the pagination key
        manager
            .create_index(
                Index::create()
                    .name("idx_message_channel_created_id")
                    .table(Message::Table)
                    .col(Message::ChannelId)
                    .col(Message::CreatedAt)
                    .col(Message::Id)
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for listing a user's messages)
        manager
            .create_index(
                Index::create()
                    .name("idx_message_user_id")
                    .table(Message::Table)
                    .col(Message::UserId)
                    .to_owned(),
            )
            .await?;

        // Index: parent_message_id (for thread lookups)
        manager
            .create_index(
                Index::create()
                    .name("idx_message_parent_id")
                    .table(Message::Table)
                    .col(Message::ParentMessageId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Message::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
    ChannelId,
    UserId,
    Content,
    ParentMessageId,
    IsEdited,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Channel {
    Table,
    Id,
}
