use sea_orm_migration::prelude::*;

use super::{mapped_col, uuid_col};
use crate::db::*;
use netstore_core::{ExternalAttributeKind, NetworkAttributes};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();

        let mut network = Table::create();
        network
            .table(Network::Table)
            .if_not_exists()
            .col(uuid_col(backend, Network::Uuid, false))
            .col(ColumnDef::new(Network::VariantNum).integer().not_null())
            .col(ColumnDef::new(Network::Id).string().not_null());
        for (name, value_type) in NetworkAttributes::mapping().descriptor().columns {
            network.col(mapped_col(&name, value_type));
        }
        network.primary_key(
            Index::create()
                .name("pk_network")
                .col(Network::Uuid)
                .col(Network::VariantNum),
        );
        manager.create_table(network.to_owned()).await?;

        manager
            .create_table(
                Table::create()
                    .table(TombstonedIdentifiables::Table)
                    .if_not_exists()
                    .col(uuid_col(backend, TombstonedIdentifiables::NetworkUuid, false))
                    .col(
                        ColumnDef::new(TombstonedIdentifiables::VariantNum)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TombstonedIdentifiables::EquipmentId)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_tombstoned_identifiables")
                            .col(TombstonedIdentifiables::NetworkUuid)
                            .col(TombstonedIdentifiables::VariantNum)
                            .col(TombstonedIdentifiables::EquipmentId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TombstonedExternalAttributes::Table)
                    .if_not_exists()
                    .col(uuid_col(
                        backend,
                        TombstonedExternalAttributes::NetworkUuid,
                        false,
                    ))
                    .col(
                        ColumnDef::new(TombstonedExternalAttributes::VariantNum)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TombstonedExternalAttributes::AttributeKind)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TombstonedExternalAttributes::EquipmentId)
                            .string()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .name("pk_tombstoned_external_attributes")
                            .col(TombstonedExternalAttributes::NetworkUuid)
                            .col(TombstonedExternalAttributes::VariantNum)
                            .col(TombstonedExternalAttributes::AttributeKind)
                            .col(TombstonedExternalAttributes::EquipmentId),
                    )
                    .to_owned(),
            )
            .await?;

        for kind in ExternalAttributeKind::LIST_KINDS {
            let table = kind.table_name();
            manager
                .create_table(
                    Table::create()
                        .table(Alias::new(table))
                        .if_not_exists()
                        .col(uuid_col(backend, ExternalAttribute::NetworkUuid, false))
                        .col(
                            ColumnDef::new(ExternalAttribute::VariantNum)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ExternalAttribute::EquipmentId)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ExternalAttribute::EquipmentType)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ExternalAttribute::Payload).text().not_null())
                        .primary_key(
                            Index::create()
                                .name(format!("pk_{table}"))
                                .col(ExternalAttribute::NetworkUuid)
                                .col(ExternalAttribute::VariantNum)
                                .col(ExternalAttribute::EquipmentId),
                        )
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(RegulatingPoints::Table)
                    .if_not_exists()
                    .col(uuid_col(backend, RegulatingPoints::NetworkUuid, false))
                    .col(
                        ColumnDef::new(RegulatingPoints::VariantNum)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RegulatingPoints::EquipmentId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RegulatingPoints::EquipmentType)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RegulatingPoints::TapChangerType)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RegulatingPoints::RegulatedEquipmentId).string())
                    .col(ColumnDef::new(RegulatingPoints::Payload).text().not_null())
                    .primary_key(
                        Index::create()
                            .name("pk_regulating_points")
                            .col(RegulatingPoints::NetworkUuid)
                            .col(RegulatingPoints::VariantNum)
                            .col(RegulatingPoints::EquipmentId)
                            .col(RegulatingPoints::TapChangerType),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_regulating_points_regulated")
                    .table(RegulatingPoints::Table)
                    .col(RegulatingPoints::NetworkUuid)
                    .col(RegulatingPoints::VariantNum)
                    .col(RegulatingPoints::RegulatedEquipmentId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Extensions::Table)
                    .if_not_exists()
                    .col(uuid_col(backend, Extensions::NetworkUuid, false))
                    .col(ColumnDef::new(Extensions::VariantNum).integer().not_null())
                    .col(ColumnDef::new(Extensions::EquipmentId).string().not_null())
                    .col(ColumnDef::new(Extensions::EquipmentType).string().not_null())
                    .col(ColumnDef::new(Extensions::Name).string().not_null())
                    .col(ColumnDef::new(Extensions::Payload).text())
                    .primary_key(
                        Index::create()
                            .name("pk_extensions")
                            .col(Extensions::NetworkUuid)
                            .col(Extensions::VariantNum)
                            .col(Extensions::EquipmentId)
                            .col(Extensions::Name),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Extensions::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(RegulatingPoints::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        for kind in ExternalAttributeKind::LIST_KINDS {
            manager
                .drop_table(
                    Table::drop()
                        .table(Alias::new(kind.table_name()))
                        .if_exists()
                        .to_owned(),
                )
                .await?;
        }
        manager
            .drop_table(
                Table::drop()
                    .table(TombstonedExternalAttributes::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(TombstonedIdentifiables::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Network::Table).if_exists().to_owned())
            .await?;
        Ok(())
    }
}
