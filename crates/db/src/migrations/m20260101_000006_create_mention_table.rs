//! Create mention table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Mention::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Mention::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Mention::MessageId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Mention::MentionedUserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Mention::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mention_message")
                            .from(Mention::Table, Mention::MessageId)
                            .to(Message::Table, Message::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (message_id, mentioned_user_id) - one row per user per message
        manager
            .create_index(
                Index::create()
                    .name("idx_mention_message_user")
                    .table(Mention::Table)
                    .col(Mention::MessageId)
                    .col(Mention::MentionedUserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: mentioned_user_id (for a user's mention feed)
        manager
            .create_index(
                Index::create()
                    .name("idx_mention_mentioned_user_id")
                    .table(Mention::Table)
                    .col(Mention::MentionedUserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Mention::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Mention {
    Table,
    Id,
    MessageId,
    MentionedUserId,
    CreatedAt,
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
}
