//! Create channel member table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ChannelMember::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ChannelMember::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ChannelMember::ChannelId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChannelMember::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ChannelMember::Role).string_len(16).not_null())
                    .col(
                        ColumnDef::new(ChannelMember::CanManageMessages)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(ChannelMember::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_channel_member_channel")
                            .from(ChannelMember::Table, ChannelMember::ChannelId)
                            .to(Channel::Table, Channel::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (channel_id, user_id) - one membership per user per channel
        manager
            .create_index(
                Index::create()
                    .name("idx_channel_member_channel_user")
                    .table(ChannelMember::Table)
                    .col(ChannelMember::ChannelId)
                    .col(ChannelMember::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for listing a user's memberships)
        manager
            .create_index(
                Index::create()
                    .name("idx_channel_member_user_id")
                    .table(ChannelMember::Table)
                    .col(ChannelMember::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChannelMember::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ChannelMember {
    Table,
    Id,
    ChannelId,
    UserId,
    Role,
    CanManageMessages,
    CreatedAt,
}

#[derive(Iden)]
enum Channel {
    Table,
    Id,
}
