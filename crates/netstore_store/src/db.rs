use sea_orm::sea_query;
use sea_orm_migration::prelude::Iden;

/// Per-variant network rows; the mapped columns come from the network mapping.
#[derive(Iden, Clone, Copy)]
pub enum Network {
    Table,
    Uuid,
    VariantNum,
    Id,
    VariantId,
    FullVariantNum,
}

/// Key columns of every per-variant table other than `network`.
#[derive(Iden, Clone, Copy)]
pub enum VariantRow {
    NetworkUuid,
    VariantNum,
}

/// Key columns shared by every equipment family table.
#[derive(Iden, Clone, Copy)]
pub enum Identifiable {
    NetworkUuid,
    VariantNum,
    Id,
}

#[derive(Iden, Clone, Copy)]
pub enum TombstonedIdentifiables {
    Table,
    NetworkUuid,
    VariantNum,
    EquipmentId,
}

#[derive(Iden, Clone, Copy)]
pub enum TombstonedExternalAttributes {
    Table,
    NetworkUuid,
    VariantNum,
    AttributeKind,
    EquipmentId,
}

/// Columns of the list-shaped external attribute tables.
#[derive(Iden, Clone, Copy)]
pub enum ExternalAttribute {
    NetworkUuid,
    VariantNum,
    EquipmentId,
    EquipmentType,
    Payload,
}

#[derive(Iden, Clone, Copy)]
pub enum RegulatingPoints {
    Table,
    NetworkUuid,
    VariantNum,
    EquipmentId,
    EquipmentType,
    TapChangerType,
    RegulatedEquipmentId,
    Payload,
}

#[derive(Iden, Clone, Copy)]
pub enum Extensions {
    Table,
    NetworkUuid,
    VariantNum,
    EquipmentId,
    EquipmentType,
    Name,
    Payload,
}
