use sea_orm_migration::prelude::*;

use super::{mapped_col, uuid_col};
use crate::db::Identifiable;
use netstore_core::descriptors;

/// One table per equipment family, laid out from the mapping registry.
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        for descriptor in descriptors() {
            let table = descriptor.table;
            let mut create = Table::create();
            create
                .table(Alias::new(table))
                .if_not_exists()
                .col(uuid_col(backend, Identifiable::NetworkUuid, false))
                .col(ColumnDef::new(Identifiable::VariantNum).integer().not_null())
                .col(ColumnDef::new(Identifiable::Id).string().not_null());
            for (name, value_type) in &descriptor.columns {
                create.col(mapped_col(name, *value_type));
            }
            create.primary_key(
                Index::create()
                    .name(format!("pk_{table}"))
                    .col(Identifiable::NetworkUuid)
                    .col(Identifiable::VariantNum)
                    .col(Identifiable::Id),
            );
            manager.create_table(create.to_owned()).await?;

            for container in &descriptor.container_columns {
                manager
                    .create_index(
                        Index::create()
                            .name(format!("idx_{table}_{container}"))
                            .table(Alias::new(table))
                            .col(Identifiable::NetworkUuid)
                            .col(Identifiable::VariantNum)
                            .col(Alias::new(*container))
                            .if_not_exists()
                            .to_owned(),
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for descriptor in descriptors().iter().rev() {
            manager
                .drop_table(
                    Table::drop()
                        .table(Alias::new(descriptor.table))
                        .if_exists()
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }
}
