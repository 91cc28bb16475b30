use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

use netstore_core::ValueType;

mod m20250101_000001_init;
mod m20250101_000002_equipment_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_init::Migration),
            Box::new(m20250101_000002_equipment_tables::Migration),
        ]
    }
}

/// Network UUID column in the native representation of each backend.
fn uuid_col(backend: DatabaseBackend, col: impl Iden, nullable: bool) -> ColumnDef {
    let mut col_def = ColumnDef::new(col);
    match backend {
        DatabaseBackend::Postgres => {
            col_def.uuid();
        }
        DatabaseBackend::MySql => {
            col_def.binary_len(16);
        }
        _ => {
            col_def.string_len(36);
        }
    }
    if nullable {
        col_def.null();
    } else {
        col_def.not_null();
    }
    col_def.to_owned()
}

/// Column of a mapped attribute; always nullable since NULL encodes absent values.
fn mapped_col(name: &str, value_type: ValueType) -> ColumnDef {
    let mut col_def = ColumnDef::new(Alias::new(name.to_string()));
    match value_type {
        ValueType::Str => {
            col_def.string();
        }
        ValueType::I64 => {
            col_def.big_integer();
        }
        ValueType::F64 => {
            col_def.double();
        }
        ValueType::Bool => {
            col_def.boolean();
        }
        ValueType::Json => {
            col_def.text();
        }
    }
    col_def.null();
    col_def.to_owned()
}
