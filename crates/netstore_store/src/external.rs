//! Side tables holding one-to-many sub-records of equipments.
//!
//! List-shaped kinds store one serialized payload list per owner; regulating
//! points store one row per owner and tap changer. Deletions in partial variants
//! are recorded in `tombstoned_external_attributes`.

use std::collections::{BTreeMap, BTreeSet};

use sea_orm::ConnectionTrait;
use sea_orm::sea_query::{Alias, Expr, ExprTrait, OnConflict, Query, Value as SeaValue};
use uuid::Uuid;

use crate::NetworkStore;
use crate::db::*;
use crate::store::{col_name, exec, query_all, query_error, read_string_set};
use netstore_core::resolve::{owners_to_tombstone, resolve_map};
use netstore_core::{
    ExternalAttributeKind, ExternalAttributes, NetstoreError, NetstoreResult, OwnerInfo,
    RegulatingEquipmentIdentifier, RegulatingOwnerInfo, RegulatingPointAttributes,
    RegulatingTapChangerType, ResourceType, VariantNum, VariantScope,
};

/// Rows of one owner ready to be written, keyed by equipment id.
pub(crate) type ExternalEntries = [(String, ExternalAttributes)];

fn kind_table(kind: ExternalAttributeKind) -> Alias {
    Alias::new(kind.table_name())
}

fn parse_resource_type(value: &str) -> NetstoreResult<ResourceType> {
    ResourceType::parse(value)
        .ok_or_else(|| NetstoreError::storage(format!("unknown equipment type {value}")))
}

impl NetworkStore {
    /// Appends rows; existing rows of the owners are left untouched.
    pub(crate) async fn insert_external_attributes<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        equipment_type: ResourceType,
        entries: &ExternalEntries,
        kinds: &[ExternalAttributeKind],
    ) -> NetstoreResult<()> {
        for kind in kinds {
            if *kind == ExternalAttributeKind::RegulatingPoint {
                self.insert_regulating_points(conn, network_uuid, variant_num, equipment_type, entries)
                    .await?;
                continue;
            }
            let rows = entries
                .iter()
                .filter(|(_, external)| !external.is_empty(*kind))
                .map(|(id, external)| Ok((id.as_str(), external.encode_list(*kind)?)))
                .collect::<NetstoreResult<Vec<_>>>()?;
            for chunk in rows.chunks(self.chunk_size(5)) {
                let mut insert = Query::insert();
                insert.into_table(kind_table(*kind)).columns([
                    ExternalAttribute::NetworkUuid,
                    ExternalAttribute::VariantNum,
                    ExternalAttribute::EquipmentId,
                    ExternalAttribute::EquipmentType,
                    ExternalAttribute::Payload,
                ]);
                for (id, payload) in chunk {
                    insert
                        .values([
                            self.uuid_value(network_uuid).into(),
                            variant_num.into(),
                            (*id).into(),
                            equipment_type.as_str().into(),
                            payload.clone().into(),
                        ])
                        .map_err(query_error)?;
                }
                exec(conn, &insert).await?;
            }
            log::debug!(
                "inserted {} {kind} rows in variant {variant_num}",
                rows.len()
            );
        }
        Ok(())
    }

    async fn insert_regulating_points<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        equipment_type: ResourceType,
        entries: &ExternalEntries,
    ) -> NetstoreResult<()> {
        let mut rows = Vec::new();
        for (id, external) in entries {
            for (tap_changer_type, point) in &external.regulating_points {
                let payload = serde_json::to_string(point).map_err(NetstoreError::codec)?;
                let regulated = point
                    .regulating_terminal
                    .as_ref()
                    .map(|terminal| terminal.connectable_id.clone());
                rows.push((id.as_str(), *tap_changer_type, regulated, payload));
            }
        }
        for chunk in rows.chunks(self.chunk_size(7)) {
            let mut insert = Query::insert();
            insert.into_table(RegulatingPoints::Table).columns([
                RegulatingPoints::NetworkUuid,
                RegulatingPoints::VariantNum,
                RegulatingPoints::EquipmentId,
                RegulatingPoints::EquipmentType,
                RegulatingPoints::TapChangerType,
                RegulatingPoints::RegulatedEquipmentId,
                RegulatingPoints::Payload,
            ]);
            for (id, tap_changer_type, regulated, payload) in chunk {
                insert
                    .values([
                        self.uuid_value(network_uuid).into(),
                        variant_num.into(),
                        (*id).into(),
                        equipment_type.as_str().into(),
                        tap_changer_type.as_str().into(),
                        SeaValue::String(regulated.clone()).into(),
                        payload.clone().into(),
                    ])
                    .map_err(query_error)?;
            }
            exec(conn, &insert).await?;
        }
        Ok(())
    }

    /// Physically deletes the variant's own rows of these owners.
    pub(crate) async fn delete_external_attributes<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        kinds: &[ExternalAttributeKind],
        ids: &[String],
    ) -> NetstoreResult<()> {
        for kind in kinds {
            for chunk in ids.chunks(self.id_chunk_size()) {
                let delete = Query::delete()
                    .from_table(kind_table(*kind))
                    .and_where(
                        Expr::col(ExternalAttribute::NetworkUuid)
                            .eq(self.uuid_value(network_uuid)),
                    )
                    .and_where(Expr::col(ExternalAttribute::VariantNum).eq(variant_num))
                    .and_where(Expr::col(ExternalAttribute::EquipmentId).is_in(chunk.iter().cloned()))
                    .to_owned();
                exec(conn, &delete).await?;
            }
        }
        Ok(())
    }

    /// Replaces the owners' rows and hides inherited rows of owners that became empty.
    pub(crate) async fn update_external_attributes<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        scope: VariantScope,
        equipment_type: ResourceType,
        entries: &ExternalEntries,
        kinds: &[ExternalAttributeKind],
    ) -> NetstoreResult<()> {
        if kinds.is_empty() || entries.is_empty() {
            return Ok(());
        }
        let ids: Vec<String> = entries.iter().map(|(id, _)| id.clone()).collect();
        self.delete_external_attributes(conn, network_uuid, scope.variant_num, kinds, &ids)
            .await?;
        self.insert_external_attributes(
            conn,
            network_uuid,
            scope.variant_num,
            equipment_type,
            entries,
            kinds,
        )
        .await?;
        self.tombstone_emptied_external_attributes(conn, network_uuid, scope, entries, kinds)
            .await
    }

    pub(crate) async fn tombstone_emptied_external_attributes<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        scope: VariantScope,
        entries: &ExternalEntries,
        kinds: &[ExternalAttributeKind],
    ) -> NetstoreResult<()> {
        for kind in kinds {
            let candidates: BTreeSet<String> = entries
                .iter()
                .filter(|(_, external)| external.is_empty(*kind))
                .map(|(id, _)| id.clone())
                .collect();
            let tombstones = owners_to_tombstone(
                scope,
                candidates,
                move |full_variant_num, ids| async move {
                    self.owners_with_rows(conn, network_uuid, full_variant_num, *kind, &ids)
                        .await
                },
                move || async move {
                    self.external_tombstoned_ids(conn, network_uuid, scope.variant_num, *kind, None)
                        .await
                },
            )
            .await?;
            if tombstones.is_empty() {
                continue;
            }
            let ids: Vec<String> = tombstones.into_iter().collect();
            for chunk in ids.chunks(self.chunk_size(4)) {
                let mut insert = Query::insert();
                insert
                    .into_table(TombstonedExternalAttributes::Table)
                    .columns([
                        TombstonedExternalAttributes::NetworkUuid,
                        TombstonedExternalAttributes::VariantNum,
                        TombstonedExternalAttributes::AttributeKind,
                        TombstonedExternalAttributes::EquipmentId,
                    ])
                    .on_conflict(
                        OnConflict::columns([
                            TombstonedExternalAttributes::NetworkUuid,
                            TombstonedExternalAttributes::VariantNum,
                            TombstonedExternalAttributes::AttributeKind,
                            TombstonedExternalAttributes::EquipmentId,
                        ])
                        .do_nothing()
                        .to_owned(),
                    );
                for id in chunk {
                    insert
                        .values([
                            self.uuid_value(network_uuid).into(),
                            scope.variant_num.into(),
                            kind.as_str().into(),
                            id.clone().into(),
                        ])
                        .map_err(query_error)?;
                }
                exec(conn, &insert).await?;
            }
            log::debug!(
                "tombstoned {kind} of {} owners in variant {}",
                ids.len(),
                scope.variant_num
            );
        }
        Ok(())
    }

    pub(crate) async fn delete_external_tombstones<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        kinds: &[ExternalAttributeKind],
        ids: &[String],
    ) -> NetstoreResult<()> {
        if kinds.is_empty() {
            return Ok(());
        }
        for chunk in ids.chunks(self.id_chunk_size()) {
            let delete = Query::delete()
                .from_table(TombstonedExternalAttributes::Table)
                .and_where(
                    Expr::col(TombstonedExternalAttributes::NetworkUuid)
                        .eq(self.uuid_value(network_uuid)),
                )
                .and_where(Expr::col(TombstonedExternalAttributes::VariantNum).eq(variant_num))
                .and_where(
                    Expr::col(TombstonedExternalAttributes::AttributeKind)
                        .is_in(kinds.iter().map(|kind| kind.as_str())),
                )
                .and_where(
                    Expr::col(TombstonedExternalAttributes::EquipmentId)
                        .is_in(chunk.iter().cloned()),
                )
                .to_owned();
            exec(conn, &delete).await?;
        }
        Ok(())
    }

    async fn external_tombstoned_ids<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        kind: ExternalAttributeKind,
        owners: Option<&[String]>,
    ) -> NetstoreResult<BTreeSet<String>> {
        let mut ids = BTreeSet::new();
        for chunk in self.id_chunks(owners) {
            let mut select = Query::select();
            select
                .from(TombstonedExternalAttributes::Table)
                .column(TombstonedExternalAttributes::EquipmentId)
                .and_where(
                    Expr::col(TombstonedExternalAttributes::NetworkUuid)
                        .eq(self.uuid_value(network_uuid)),
                )
                .and_where(Expr::col(TombstonedExternalAttributes::VariantNum).eq(variant_num))
                .and_where(Expr::col(TombstonedExternalAttributes::AttributeKind).eq(kind.as_str()));
            if let Some(chunk) = chunk {
                select.and_where(
                    Expr::col(TombstonedExternalAttributes::EquipmentId)
                        .is_in(chunk.iter().cloned()),
                );
            }
            let rows = query_all(conn, &select).await?;
            ids.extend(read_string_set(&rows, TombstonedExternalAttributes::EquipmentId)?);
        }
        Ok(ids)
    }

    /// Owners among `ids` having rows of `kind` in the variant itself.
    async fn owners_with_rows<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        kind: ExternalAttributeKind,
        ids: &[String],
    ) -> NetstoreResult<BTreeSet<String>> {
        let mut owners = BTreeSet::new();
        for chunk in ids.chunks(self.id_chunk_size()) {
            let select = Query::select()
                .distinct()
                .from(kind_table(kind))
                .column(ExternalAttribute::EquipmentId)
                .and_where(
                    Expr::col(ExternalAttribute::NetworkUuid).eq(self.uuid_value(network_uuid)),
                )
                .and_where(Expr::col(ExternalAttribute::VariantNum).eq(variant_num))
                .and_where(Expr::col(ExternalAttribute::EquipmentId).is_in(chunk.iter().cloned()))
                .to_owned();
            let rows = query_all(conn, &select).await?;
            owners.extend(read_string_set(&rows, ExternalAttribute::EquipmentId)?);
        }
        Ok(owners)
    }

    async fn fetch_external_payloads<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        kind: ExternalAttributeKind,
        equipment_type: ResourceType,
        owners: Option<&[String]>,
    ) -> NetstoreResult<BTreeMap<OwnerInfo, String>> {
        let mut payloads = BTreeMap::new();
        for chunk in self.id_chunks(owners) {
            let mut select = Query::select();
            select
                .from(kind_table(kind))
                .columns([ExternalAttribute::EquipmentId, ExternalAttribute::Payload])
                .and_where(
                    Expr::col(ExternalAttribute::NetworkUuid).eq(self.uuid_value(network_uuid)),
                )
                .and_where(Expr::col(ExternalAttribute::VariantNum).eq(variant_num))
                .and_where(Expr::col(ExternalAttribute::EquipmentType).eq(equipment_type.as_str()));
            if let Some(chunk) = chunk {
                select.and_where(
                    Expr::col(ExternalAttribute::EquipmentId).is_in(chunk.iter().cloned()),
                );
            }
            for row in query_all(conn, &select).await? {
                let id: String = row.try_get("", &col_name(ExternalAttribute::EquipmentId))?;
                let payload: String = row.try_get("", &col_name(ExternalAttribute::Payload))?;
                payloads.insert(
                    OwnerInfo::new(network_uuid, variant_num, id, equipment_type),
                    payload,
                );
            }
        }
        Ok(payloads)
    }

    /// Serialized payload lists of `kind` visible in the variant.
    pub(crate) async fn get_external_payloads<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        scope: VariantScope,
        kind: ExternalAttributeKind,
        equipment_type: ResourceType,
        owners: Option<&[String]>,
    ) -> NetstoreResult<BTreeMap<OwnerInfo, String>> {
        resolve_map(
            scope,
            move |variant_num| {
                self.fetch_external_payloads(
                    conn,
                    network_uuid,
                    variant_num,
                    kind,
                    equipment_type,
                    owners,
                )
            },
            move || self.external_tombstoned_ids(conn, network_uuid, scope.variant_num, kind, owners),
            move || self.tombstoned_identifiable_ids(conn, network_uuid, scope.variant_num, owners),
        )
        .await
    }

    async fn fetch_regulating_points<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        equipment_type: Option<ResourceType>,
        owners: Option<&[String]>,
        regulated: Option<&[String]>,
    ) -> NetstoreResult<BTreeMap<RegulatingOwnerInfo, RegulatingPointAttributes>> {
        let mut points = BTreeMap::new();
        // At most one of the two id filters is set by callers.
        for chunk in self.id_chunks(owners.or(regulated)) {
            let mut select = Query::select();
            select
                .from(RegulatingPoints::Table)
                .columns([
                    RegulatingPoints::EquipmentId,
                    RegulatingPoints::EquipmentType,
                    RegulatingPoints::TapChangerType,
                    RegulatingPoints::Payload,
                ])
                .and_where(
                    Expr::col(RegulatingPoints::NetworkUuid).eq(self.uuid_value(network_uuid)),
                )
                .and_where(Expr::col(RegulatingPoints::VariantNum).eq(variant_num));
            if let Some(equipment_type) = equipment_type {
                select.and_where(
                    Expr::col(RegulatingPoints::EquipmentType).eq(equipment_type.as_str()),
                );
            }
            if let Some(chunk) = chunk {
                let column = if owners.is_some() {
                    RegulatingPoints::EquipmentId
                } else {
                    RegulatingPoints::RegulatedEquipmentId
                };
                select.and_where(Expr::col(column).is_in(chunk.iter().cloned()));
            }
            for row in query_all(conn, &select).await? {
                let id: String = row.try_get("", &col_name(RegulatingPoints::EquipmentId))?;
                let equipment_type: String =
                    row.try_get("", &col_name(RegulatingPoints::EquipmentType))?;
                let tap_changer_type: String =
                    row.try_get("", &col_name(RegulatingPoints::TapChangerType))?;
                let payload: String = row.try_get("", &col_name(RegulatingPoints::Payload))?;
                let key = RegulatingOwnerInfo {
                    owner: OwnerInfo::new(
                        network_uuid,
                        variant_num,
                        id,
                        parse_resource_type(&equipment_type)?,
                    ),
                    tap_changer_type: RegulatingTapChangerType::parse(&tap_changer_type)
                        .ok_or_else(|| {
                            NetstoreError::storage(format!(
                                "unknown tap changer type {tap_changer_type}"
                            ))
                        })?,
                };
                let point = serde_json::from_str(&payload).map_err(NetstoreError::codec)?;
                points.insert(key, point);
            }
        }
        Ok(points)
    }

    /// Regulating points owned by equipments of `equipment_type`.
    pub(crate) async fn get_regulating_points<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        scope: VariantScope,
        equipment_type: ResourceType,
        owners: Option<&[String]>,
    ) -> NetstoreResult<BTreeMap<RegulatingOwnerInfo, RegulatingPointAttributes>> {
        resolve_map(
            scope,
            move |variant_num| {
                self.fetch_regulating_points(
                    conn,
                    network_uuid,
                    variant_num,
                    Some(equipment_type),
                    owners,
                    None,
                )
            },
            move || {
                self.external_tombstoned_ids(
                    conn,
                    network_uuid,
                    scope.variant_num,
                    ExternalAttributeKind::RegulatingPoint,
                    owners,
                )
            },
            move || self.tombstoned_identifiable_ids(conn, network_uuid, scope.variant_num, owners),
        )
        .await
    }

    /// Equipments regulating each of `regulated` (or every regulated equipment).
    ///
    /// Inherited points are looked up by their target; the variant's own points
    /// are all read so that a retargeted override hides the inherited point.
    pub(crate) async fn regulating_equipments<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        scope: VariantScope,
        regulated: Option<&[String]>,
    ) -> NetstoreResult<BTreeMap<String, BTreeSet<RegulatingEquipmentIdentifier>>> {
        let points = resolve_map(
            scope,
            move |variant_num| {
                let filter = if scope.is_full() || variant_num == scope.full_variant_num {
                    regulated
                } else {
                    None
                };
                self.fetch_regulating_points(conn, network_uuid, variant_num, None, None, filter)
            },
            move || {
                self.external_tombstoned_ids(
                    conn,
                    network_uuid,
                    scope.variant_num,
                    ExternalAttributeKind::RegulatingPoint,
                    None,
                )
            },
            move || self.tombstoned_identifiable_ids(conn, network_uuid, scope.variant_num, None),
        )
        .await?;

        let mut by_regulated: BTreeMap<String, BTreeSet<RegulatingEquipmentIdentifier>> =
            BTreeMap::new();
        for (key, point) in points {
            let Some(terminal) = point.regulating_terminal else {
                continue;
            };
            if regulated.is_some_and(|ids| !ids.contains(&terminal.connectable_id)) {
                continue;
            }
            by_regulated
                .entry(terminal.connectable_id)
                .or_default()
                .insert(RegulatingEquipmentIdentifier {
                    equipment_id: key.owner.equipment_id,
                    resource_type: key.owner.equipment_type,
                    tap_changer_type: key.tap_changer_type,
                });
        }
        Ok(by_regulated)
    }
}
