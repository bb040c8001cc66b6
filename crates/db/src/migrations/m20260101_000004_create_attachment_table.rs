//! Create attachment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Attachment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Attachment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    // Nullable: blobs are uploaded before the message exists
                    .col(ColumnDef::new(Attachment::MessageId).string_len(32))
                    .col(
                        ColumnDef::new(Attachment::FileName)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Attachment::FileType)
                            .string_len(128)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Attachment::Size).big_integer().not_null())
                    .col(
                        ColumnDef::new(Attachment::BlobLocation)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Attachment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_attachment_message")
                            .from(Attachment::Table, Attachment::MessageId)
                            .to(Message::Table, Message::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: message_id (for listing a message's attachments)
        manager
            .create_index(
                Index::create()
                    .name("idx_attachment_message_id")
                    .table(Attachment::Table)
                    .col(Attachment::MessageId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Attachment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Attachment {
    Table,
    Id,
    MessageId,
    FileName,
    FileType,
    Size,
    BlobLocation,
    CreatedAt,
}

#[derive(Iden)]
enum Message {
    Table,
    Id,
}
