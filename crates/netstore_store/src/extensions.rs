//! Named extension payloads attached to equipments.
//!
//! Rows live in the `extensions` table and follow the same copy-on-write rules as
//! external attributes. In a partial variant a row with a `NULL` payload hides
//! the inherited extension of the same owner and name.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use sea_orm::ConnectionTrait;
use sea_orm::sea_query::{Expr, ExprTrait, OnConflict, Query, Value as SeaValue};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::NetworkStore;
use crate::db::*;
use crate::store::{begin, col_name, exec, finish, query_all, query_error};
use netstore_core::resolve::resolve_map;
use netstore_core::{
    ExtensionApi, ExtensionOwnerInfo, ExtensionResource, NetstoreError, NetstoreResult,
    OwnerInfo, ResourceType, VariantNum, VariantScope,
};

pub(crate) type ExtensionRows = BTreeMap<ExtensionOwnerInfo, Option<JsonValue>>;

impl NetworkStore {
    /// Rows the variant itself holds, removal markers included.
    pub(crate) async fn fetch_extension_rows<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        owners: Option<&[String]>,
        name: Option<&str>,
    ) -> NetstoreResult<ExtensionRows> {
        let mut rows = BTreeMap::new();
        for chunk in self.id_chunks(owners) {
            let mut select = Query::select();
            select
                .from(Extensions::Table)
                .columns([
                    Extensions::EquipmentId,
                    Extensions::EquipmentType,
                    Extensions::Name,
                    Extensions::Payload,
                ])
                .and_where(Expr::col(Extensions::NetworkUuid).eq(self.uuid_value(network_uuid)))
                .and_where(Expr::col(Extensions::VariantNum).eq(variant_num));
            if let Some(chunk) = chunk {
                select.and_where(Expr::col(Extensions::EquipmentId).is_in(chunk.iter().cloned()));
            }
            if let Some(name) = name {
                select.and_where(Expr::col(Extensions::Name).eq(name));
            }
            for row in query_all(conn, &select).await? {
                let id: String = row.try_get("", &col_name(Extensions::EquipmentId))?;
                let equipment_type: String =
                    row.try_get("", &col_name(Extensions::EquipmentType))?;
                let name: String = row.try_get("", &col_name(Extensions::Name))?;
                let payload: Option<String> = row.try_get("", &col_name(Extensions::Payload))?;
                let equipment_type = ResourceType::parse(&equipment_type).ok_or_else(|| {
                    NetstoreError::storage(format!("unknown equipment type {equipment_type}"))
                })?;
                let payload = payload
                    .map(|raw| serde_json::from_str(&raw).map_err(NetstoreError::codec))
                    .transpose()?;
                rows.insert(
                    ExtensionOwnerInfo {
                        owner: OwnerInfo::new(network_uuid, variant_num, id, equipment_type),
                        name,
                    },
                    payload,
                );
            }
        }
        Ok(rows)
    }

    /// Extensions visible in the variant; removal markers are kept so that
    /// callers materializing a variant can tell them apart.
    pub(crate) async fn resolve_extensions<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        scope: VariantScope,
        owners: Option<&[String]>,
        name: Option<&str>,
    ) -> NetstoreResult<ExtensionRows> {
        resolve_map(
            scope,
            move |variant_num| {
                self.fetch_extension_rows(conn, network_uuid, variant_num, owners, name)
            },
            || async { Ok(BTreeSet::new()) },
            move || self.tombstoned_identifiable_ids(conn, network_uuid, scope.variant_num, owners),
        )
        .await
    }

    pub(crate) async fn insert_extension_rows<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        rows: &ExtensionRows,
    ) -> NetstoreResult<()> {
        let rows = rows
            .iter()
            .map(|(key, payload)| {
                let payload = payload
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()
                    .map_err(NetstoreError::codec)?;
                Ok((key, payload))
            })
            .collect::<NetstoreResult<Vec<_>>>()?;
        for chunk in rows.chunks(self.chunk_size(6)) {
            let mut insert = Query::insert();
            insert
                .into_table(Extensions::Table)
                .columns([
                    Extensions::NetworkUuid,
                    Extensions::VariantNum,
                    Extensions::EquipmentId,
                    Extensions::EquipmentType,
                    Extensions::Name,
                    Extensions::Payload,
                ])
                .on_conflict(
                    OnConflict::columns([
                        Extensions::NetworkUuid,
                        Extensions::VariantNum,
                        Extensions::EquipmentId,
                        Extensions::Name,
                    ])
                    .do_nothing()
                    .to_owned(),
                );
            for (key, payload) in chunk {
                insert
                    .values([
                        self.uuid_value(network_uuid).into(),
                        variant_num.into(),
                        key.owner.equipment_id.clone().into(),
                        key.owner.equipment_type.as_str().into(),
                        key.name.clone().into(),
                        SeaValue::String(payload.clone()).into(),
                    ])
                    .map_err(query_error)?;
            }
            exec(conn, &insert).await?;
        }
        Ok(())
    }

    async fn delete_extension_rows<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        owner_id: &str,
        name: &str,
    ) -> NetstoreResult<u64> {
        let delete = Query::delete()
            .from_table(Extensions::Table)
            .and_where(Expr::col(Extensions::NetworkUuid).eq(self.uuid_value(network_uuid)))
            .and_where(Expr::col(Extensions::VariantNum).eq(variant_num))
            .and_where(Expr::col(Extensions::EquipmentId).eq(owner_id))
            .and_where(Expr::col(Extensions::Name).eq(name))
            .to_owned();
        exec(conn, &delete).await
    }

    /// Drops every extension row the variant holds for these equipments.
    pub(crate) async fn delete_owned_extensions<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        ids: &[String],
    ) -> NetstoreResult<()> {
        for chunk in ids.chunks(self.id_chunk_size()) {
            let delete = Query::delete()
                .from_table(Extensions::Table)
                .and_where(Expr::col(Extensions::NetworkUuid).eq(self.uuid_value(network_uuid)))
                .and_where(Expr::col(Extensions::VariantNum).eq(variant_num))
                .and_where(Expr::col(Extensions::EquipmentId).is_in(chunk.iter().cloned()))
                .to_owned();
            exec(conn, &delete).await?;
        }
        Ok(())
    }

    /// Hides the ancestor's extensions of equipments re-created in a partial
    /// variant, so that a recreated equipment starts without extensions.
    pub(crate) async fn shadow_inherited_extensions<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        scope: VariantScope,
        ids: &[String],
    ) -> NetstoreResult<()> {
        if scope.is_full() || ids.is_empty() {
            return Ok(());
        }
        let markers: ExtensionRows = self
            .fetch_extension_rows(conn, network_uuid, scope.full_variant_num, Some(ids), None)
            .await?
            .into_keys()
            .map(|key| (key, None))
            .collect();
        if markers.is_empty() {
            return Ok(());
        }
        self.insert_extension_rows(conn, network_uuid, scope.variant_num, &markers)
            .await
    }

    async fn upsert_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        extensions: Vec<ExtensionResource>,
    ) -> NetstoreResult<()> {
        let mut by_variant: BTreeMap<VariantNum, ExtensionRows> = BTreeMap::new();
        for extension in extensions {
            let key = ExtensionOwnerInfo {
                owner: OwnerInfo::new(
                    network_uuid,
                    extension.variant_num,
                    extension.owner_id,
                    extension.owner_type,
                ),
                name: extension.name,
            };
            by_variant
                .entry(extension.variant_num)
                .or_default()
                .insert(key, Some(extension.attributes));
        }
        for (variant_num, rows) in by_variant {
            self.variant_scope(conn, network_uuid, variant_num).await?;
            for key in rows.keys() {
                self.delete_extension_rows(
                    conn,
                    network_uuid,
                    variant_num,
                    &key.owner.equipment_id,
                    &key.name,
                )
                .await?;
            }
            self.insert_extension_rows(conn, network_uuid, variant_num, &rows)
                .await?;
            log::debug!(
                "upserted {} extensions in variant {variant_num}",
                rows.len()
            );
        }
        Ok(())
    }

    async fn remove_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        owner_id: &str,
        name: &str,
    ) -> NetstoreResult<()> {
        let scope = self.variant_scope(conn, network_uuid, variant_num).await?;
        self.delete_extension_rows(conn, network_uuid, variant_num, owner_id, name)
            .await?;
        if scope.is_full() {
            return Ok(());
        }
        let owners = [owner_id.to_string()];
        let markers: ExtensionRows = self
            .fetch_extension_rows(
                conn,
                network_uuid,
                scope.full_variant_num,
                Some(&owners[..]),
                Some(name),
            )
            .await?
            .into_keys()
            .map(|key| (key, None))
            .collect();
        self.insert_extension_rows(conn, network_uuid, variant_num, &markers)
            .await
    }
}

fn to_resource(key: ExtensionOwnerInfo, attributes: JsonValue) -> ExtensionResource {
    ExtensionResource::new(
        key.owner.equipment_id,
        key.owner.equipment_type,
        key.owner.variant_num,
        key.name,
        attributes,
    )
}

#[async_trait]
impl ExtensionApi for NetworkStore {
    async fn upsert_extensions(
        &self,
        network_uuid: Uuid,
        extensions: Vec<ExtensionResource>,
    ) -> NetstoreResult<()> {
        if extensions.is_empty() {
            return Ok(());
        }
        let tx = begin(&self.conn).await?;
        let result = self.upsert_in(&tx, network_uuid, extensions).await;
        finish(tx, result).await
    }

    async fn get_extension(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
        owner_id: &str,
        name: &str,
    ) -> NetstoreResult<Option<ExtensionResource>> {
        let conn = &self.conn;
        let scope = self.variant_scope(conn, network_uuid, variant_num).await?;
        let owners = [owner_id.to_string()];
        let resolved = self
            .resolve_extensions(conn, network_uuid, scope, Some(&owners[..]), Some(name))
            .await?;
        Ok(resolved
            .into_iter()
            .find_map(|(key, payload)| payload.map(|attributes| to_resource(key, attributes))))
    }

    async fn get_extensions(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
        owner_id: &str,
    ) -> NetstoreResult<BTreeMap<String, ExtensionResource>> {
        let conn = &self.conn;
        let scope = self.variant_scope(conn, network_uuid, variant_num).await?;
        let owners = [owner_id.to_string()];
        let resolved = self
            .resolve_extensions(conn, network_uuid, scope, Some(&owners[..]), None)
            .await?;
        Ok(resolved
            .into_iter()
            .filter_map(|(key, payload)| {
                payload.map(|attributes| (key.name.clone(), to_resource(key, attributes)))
            })
            .collect())
    }

    async fn remove_extension(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
        owner_id: &str,
        name: &str,
    ) -> NetstoreResult<()> {
        let tx = begin(&self.conn).await?;
        let result = self
            .remove_in(&tx, network_uuid, variant_num, owner_id, name)
            .await;
        finish(tx, result).await
    }
}
