//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20260101_000001_create_channel_table;
mod m20260101_000002_create_channel_member_table;
mod m20260101_000003_create_message_table;
mod m20260101_000004_create_attachment_table;
mod m20260101_000005_create_reaction_table;
mod m20260101_000006_create_mention_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_channel_table::Migration),
            Box::new(m20260101_000002_create_channel_member_table::Migration),
            Box::new(m20260101_000003_create_message_table::Migration),
            Box::new(m20260101_000004_create_attachment_table::Migration),
            Box::new(m20260101_000005_create_reaction_table::Migration),
            Box::new(m20260101_000006_create_mention_table::Migration),
        ]
    }
}
