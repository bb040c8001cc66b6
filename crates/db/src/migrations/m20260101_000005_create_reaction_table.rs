//! Create reaction table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reaction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Reaction::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Reaction::MessageId).string_len(32).not_null())
                    .col(ColumnDef::new(Reaction::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Reaction::Emoji).string_len(64).not_null())
                    .col(
                        ColumnDef::new(Reaction::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reaction_message")
                            .from(Reaction::Table, Reaction::MessageId)
                            .to(Message::Table, Message::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (message_id, user_id, emoji) - the toggle invariant
        manager
            .create_index(
                Index::create()
                    .name("idx_reaction_message_user_emoji")
                    .table(Reaction::Table)
                    .col(Reaction::MessageId)
                    .col(Reaction::UserId)
                    .col(Reaction::Emoji)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for listing a user's reactions)
        manager
            .create_index(
                Index::create()
                    .name("idx_reaction_user_id")
                    .table(Reaction::Table)
                    .col(Reaction::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Reaction::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Reaction {
    Table,
    Id,
    MessageId,
    UserId,
    Emoji,
    CreatedAt,
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
}
