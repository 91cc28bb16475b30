//! Equipment rows of every family, resolved through the variant engine.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use sea_orm::ConnectionTrait;
use sea_orm::sea_query::{Alias, Condition, Expr, ExprTrait, OnConflict, Order, Query};
use uuid::Uuid;

use crate::NetworkStore;
use crate::db::*;
use crate::families::get_identifiable_of_type;
use crate::store::{
    AFTER_EXTERNAL_ATTRIBUTES_INSERT, AFTER_IDENTIFIABLES_INSERT, begin, col_name, exec, finish,
    group_by_variant, mapped_values, query_all, query_error, query_one, read_mapped,
    read_string_set,
};
use netstore_core::resolve::{resolve_one, resolve_set};
use netstore_core::{
    ExternalAttributeKind, ExternalAttributes, IdentifiableApi, IdentifiableAttributes,
    IdentifiableResource, NetstoreError, NetstoreResult, Resource, ResourceType, Value,
    VariantNum, VariantScope, descriptors,
};

/// Row selection within one variant of a family table.
#[derive(Clone, Copy)]
pub(crate) enum RowFilter<'a> {
    All,
    Ids(&'a [String]),
    Container(&'a str),
}

impl<'a> RowFilter<'a> {
    fn ids(self) -> Option<&'a [String]> {
        match self {
            RowFilter::Ids(ids) => Some(ids),
            _ => None,
        }
    }
}

fn key_columns() -> Vec<Alias> {
    vec![
        Alias::new(col_name(Identifiable::NetworkUuid)),
        Alias::new(col_name(Identifiable::VariantNum)),
        Alias::new(col_name(Identifiable::Id)),
    ]
}

fn external_entries<T: IdentifiableAttributes>(
    resources: &[Resource<T>],
) -> Vec<(String, ExternalAttributes)> {
    resources
        .iter()
        .map(|resource| (resource.id.clone(), resource.attributes.external_attributes()))
        .collect()
}

fn in_container<T: IdentifiableAttributes>(attributes: &T, container_id: &str) -> bool {
    let mapping = T::mapping();
    mapping.container_columns().iter().any(|column| {
        mapping
            .read(attributes, column)
            .is_ok_and(|value| value == Value::from(container_id))
    })
}

impl NetworkStore {
    async fn insert_identifiable_rows<C, T>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        resources: &[Resource<T>],
    ) -> NetstoreResult<()>
    where
        C: ConnectionTrait,
        T: IdentifiableAttributes,
    {
        let mapping = T::mapping();
        let mut columns = key_columns();
        columns.extend(
            mapping
                .column_names()
                .into_iter()
                .map(|name| Alias::new(name.to_string())),
        );
        for chunk in resources.chunks(self.chunk_size(columns.len())) {
            let mut insert = Query::insert();
            insert
                .into_table(Alias::new(mapping.table()))
                .columns(columns.clone());
            for resource in chunk {
                let mut row = vec![
                    self.uuid_value(network_uuid),
                    resource.variant_num.into(),
                    resource.id.clone().into(),
                ];
                row.extend(mapped_values(mapping, &resource.attributes)?);
                insert
                    .values(row.into_iter().map(Into::into))
                    .map_err(query_error)?;
            }
            exec(conn, &insert).await?;
        }
        log::debug!(
            "inserted {} {} rows",
            resources.len(),
            T::RESOURCE_TYPE
        );
        Ok(())
    }

    async fn update_identifiable_row<C, T>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        resource: &Resource<T>,
    ) -> NetstoreResult<()>
    where
        C: ConnectionTrait,
        T: IdentifiableAttributes,
    {
        let mapping = T::mapping();
        let values = mapping
            .column_names()
            .into_iter()
            .map(|name| Alias::new(name.to_string()))
            .zip(mapped_values(mapping, &resource.attributes)?)
            .map(|(column, value)| (column, value.into()));
        let update = Query::update()
            .table(Alias::new(mapping.table()))
            .values(values)
            .and_where(Expr::col(Identifiable::NetworkUuid).eq(self.uuid_value(network_uuid)))
            .and_where(Expr::col(Identifiable::VariantNum).eq(resource.variant_num))
            .and_where(Expr::col(Identifiable::Id).eq(resource.id.as_str()))
            .to_owned();
        exec(conn, &update).await?;
        Ok(())
    }

    pub(crate) async fn fetch_identifiable_rows<C, T>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        filter: RowFilter<'_>,
    ) -> NetstoreResult<Vec<Resource<T>>>
    where
        C: ConnectionTrait,
        T: IdentifiableAttributes,
    {
        let mapping = T::mapping();
        if let RowFilter::Container(_) = filter
            && mapping.container_columns().is_empty()
        {
            return Ok(Vec::new());
        }
        let mut resources = Vec::new();
        for chunk in self.id_chunks(filter.ids()) {
            let mut select = Query::select();
            select
                .from(Alias::new(mapping.table()))
                .column(Identifiable::Id)
                .columns(
                    mapping
                        .column_names()
                        .into_iter()
                        .map(|name| Alias::new(name.to_string())),
                )
                .and_where(Expr::col(Identifiable::NetworkUuid).eq(self.uuid_value(network_uuid)))
                .and_where(Expr::col(Identifiable::VariantNum).eq(variant_num))
                .order_by(Identifiable::Id, Order::Asc);
            if let Some(chunk) = chunk {
                select.and_where(Expr::col(Identifiable::Id).is_in(chunk.iter().cloned()));
            }
            if let RowFilter::Container(container_id) = filter {
                let mut any = Condition::any();
                for column in mapping.container_columns() {
                    any = any.add(Expr::col(Alias::new(*column)).eq(container_id));
                }
                select.cond_where(any);
            }
            for row in query_all(conn, &select).await? {
                let id: String = row.try_get("", &col_name(Identifiable::Id))?;
                resources.push(Resource::new(id, variant_num, read_mapped(mapping, &row)?));
            }
        }
        Ok(resources)
    }

    async fn fetch_identifiable_ids<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        table: &'static str,
        variant_num: VariantNum,
    ) -> NetstoreResult<Vec<String>> {
        let select = Query::select()
            .from(Alias::new(table))
            .column(Identifiable::Id)
            .and_where(Expr::col(Identifiable::NetworkUuid).eq(self.uuid_value(network_uuid)))
            .and_where(Expr::col(Identifiable::VariantNum).eq(variant_num))
            .to_owned();
        let rows = query_all(conn, &select).await?;
        Ok(read_string_set(&rows, Identifiable::Id)?.into_iter().collect())
    }

    /// Subset of `ids` the family table holds in `variant_num`.
    async fn existing_ids<C, T>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        ids: &[String],
    ) -> NetstoreResult<BTreeSet<String>>
    where
        C: ConnectionTrait,
        T: IdentifiableAttributes,
    {
        let mut existing = BTreeSet::new();
        for chunk in ids.chunks(self.id_chunk_size()) {
            let select = Query::select()
                .from(Alias::new(T::mapping().table()))
                .column(Identifiable::Id)
                .and_where(Expr::col(Identifiable::NetworkUuid).eq(self.uuid_value(network_uuid)))
                .and_where(Expr::col(Identifiable::VariantNum).eq(variant_num))
                .and_where(Expr::col(Identifiable::Id).is_in(chunk.iter().cloned()))
                .to_owned();
            let rows = query_all(conn, &select).await?;
            existing.extend(read_string_set(&rows, Identifiable::Id)?);
        }
        Ok(existing)
    }

    pub(crate) async fn tombstoned_identifiable_ids<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        ids: Option<&[String]>,
    ) -> NetstoreResult<BTreeSet<String>> {
        let mut tombstoned = BTreeSet::new();
        for chunk in self.id_chunks(ids) {
            let mut select = Query::select();
            select
                .from(TombstonedIdentifiables::Table)
                .column(TombstonedIdentifiables::EquipmentId)
                .and_where(
                    Expr::col(TombstonedIdentifiables::NetworkUuid)
                        .eq(self.uuid_value(network_uuid)),
                )
                .and_where(Expr::col(TombstonedIdentifiables::VariantNum).eq(variant_num));
            if let Some(chunk) = chunk {
                select.and_where(
                    Expr::col(TombstonedIdentifiables::EquipmentId).is_in(chunk.iter().cloned()),
                );
            }
            let rows = query_all(conn, &select).await?;
            tombstoned.extend(read_string_set(&rows, TombstonedIdentifiables::EquipmentId)?);
        }
        Ok(tombstoned)
    }

    async fn insert_identifiable_tombstones<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        ids: &[String],
    ) -> NetstoreResult<()> {
        for chunk in ids.chunks(self.chunk_size(3)) {
            let mut insert = Query::insert();
            insert
                .into_table(TombstonedIdentifiables::Table)
                .columns([
                    TombstonedIdentifiables::NetworkUuid,
                    TombstonedIdentifiables::VariantNum,
                    TombstonedIdentifiables::EquipmentId,
                ])
                .on_conflict(
                    OnConflict::columns([
                        TombstonedIdentifiables::NetworkUuid,
                        TombstonedIdentifiables::VariantNum,
                        TombstonedIdentifiables::EquipmentId,
                    ])
                    .do_nothing()
                    .to_owned(),
                );
            for id in chunk {
                insert
                    .values([
                        self.uuid_value(network_uuid).into(),
                        variant_num.into(),
                        id.clone().into(),
                    ])
                    .map_err(query_error)?;
            }
            exec(conn, &insert).await?;
        }
        Ok(())
    }

    async fn delete_identifiable_tombstones<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        ids: &[String],
    ) -> NetstoreResult<()> {
        for chunk in ids.chunks(self.id_chunk_size()) {
            let delete = Query::delete()
                .from_table(TombstonedIdentifiables::Table)
                .and_where(
                    Expr::col(TombstonedIdentifiables::NetworkUuid)
                        .eq(self.uuid_value(network_uuid)),
                )
                .and_where(Expr::col(TombstonedIdentifiables::VariantNum).eq(variant_num))
                .and_where(
                    Expr::col(TombstonedIdentifiables::EquipmentId).is_in(chunk.iter().cloned()),
                )
                .to_owned();
            exec(conn, &delete).await?;
        }
        Ok(())
    }

    /// Merges side-table data and regulating back-references into resolved rows.
    async fn enrich<C, T>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        scope: VariantScope,
        resources: &mut [Resource<T>],
        owners: Option<&[String]>,
    ) -> NetstoreResult<()>
    where
        C: ConnectionTrait,
        T: IdentifiableAttributes,
    {
        if resources.is_empty() {
            return Ok(());
        }
        let mut by_owner: BTreeMap<String, ExternalAttributes> = BTreeMap::new();
        for kind in T::EXTERNAL_KINDS {
            if *kind == ExternalAttributeKind::RegulatingPoint {
                let points = self
                    .get_regulating_points(conn, network_uuid, scope, T::RESOURCE_TYPE, owners)
                    .await?;
                for (key, point) in points {
                    by_owner
                        .entry(key.owner.equipment_id)
                        .or_default()
                        .regulating_points
                        .insert(key.tap_changer_type, point);
                }
            } else {
                let payloads = self
                    .get_external_payloads(conn, network_uuid, scope, *kind, T::RESOURCE_TYPE, owners)
                    .await?;
                for (owner, payload) in payloads {
                    by_owner
                        .entry(owner.equipment_id)
                        .or_default()
                        .decode_list(*kind, &payload)?;
                }
            }
        }
        for resource in resources.iter_mut() {
            if let Some(external) = by_owner.remove(&resource.id) {
                resource.attributes.attach_external_attributes(external)?;
            }
        }

        let regulatable = resources
            .first_mut()
            .is_some_and(|resource| resource.attributes.regulating_equipments_mut().is_some());
        if regulatable {
            let mut regulating = self
                .regulating_equipments(conn, network_uuid, scope, owners)
                .await?;
            for resource in resources.iter_mut() {
                let found = regulating.remove(&resource.id).unwrap_or_default();
                if let Some(equipments) = resource.attributes.regulating_equipments_mut() {
                    *equipments = found;
                }
            }
        }
        Ok(())
    }

    async fn resolve_identifiables<C, T>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        scope: VariantScope,
        filter: RowFilter<'_>,
    ) -> NetstoreResult<Vec<Resource<T>>>
    where
        C: ConnectionTrait,
        T: IdentifiableAttributes,
    {
        resolve_set(
            scope,
            None,
            move |variant_num| {
                // Own rows are read unfiltered by container so that an override
                // moving the equipment elsewhere hides the inherited row.
                let filter = match filter {
                    RowFilter::Container(_) if variant_num != scope.full_variant_num => {
                        RowFilter::All
                    }
                    other => other,
                };
                self.fetch_identifiable_rows::<C, T>(conn, network_uuid, variant_num, filter)
            },
            move || self.tombstoned_identifiable_ids(conn, network_uuid, scope.variant_num, filter.ids()),
        )
        .await
    }

    async fn create_in<C, T>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        resources: Vec<Resource<T>>,
    ) -> NetstoreResult<()>
    where
        C: ConnectionTrait,
        T: IdentifiableAttributes,
    {
        for (variant_num, batch) in group_by_variant(resources) {
            let scope = self.variant_scope(conn, network_uuid, variant_num).await?;
            self.insert_identifiable_rows(conn, network_uuid, &batch)
                .await?;
            self.maybe_failpoint(AFTER_IDENTIFIABLES_INSERT)?;

            let entries = external_entries(&batch);
            self.insert_external_attributes(
                conn,
                network_uuid,
                variant_num,
                T::RESOURCE_TYPE,
                &entries,
                T::EXTERNAL_KINDS,
            )
            .await?;
            self.maybe_failpoint(AFTER_EXTERNAL_ATTRIBUTES_INSERT)?;

            if !scope.is_full() {
                let ids: Vec<String> = batch.iter().map(|resource| resource.id.clone()).collect();
                let tombstoned = self
                    .tombstoned_identifiable_ids(conn, network_uuid, variant_num, Some(ids.as_slice()))
                    .await?;
                // Only a tombstone hiding an inherited row of this family is
                // lifted; one hiding another family's row stays in place.
                let revived: Vec<String> = if tombstoned.is_empty() {
                    Vec::new()
                } else {
                    let tombstoned: Vec<String> = tombstoned.into_iter().collect();
                    self.existing_ids::<C, T>(
                        conn,
                        network_uuid,
                        scope.full_variant_num,
                        &tombstoned,
                    )
                    .await?
                    .into_iter()
                    .collect()
                };
                if !revived.is_empty() {
                    self.delete_identifiable_tombstones(conn, network_uuid, variant_num, &revived)
                        .await?;
                    self.delete_external_tombstones(
                        conn,
                        network_uuid,
                        variant_num,
                        T::EXTERNAL_KINDS,
                        &revived,
                    )
                    .await?;
                    self.shadow_inherited_extensions(conn, network_uuid, scope, &revived)
                        .await?;
                    log::debug!(
                        "recreated {} tombstoned ids in variant {variant_num}",
                        revived.len()
                    );
                }
                self.tombstone_emptied_external_attributes(
                    conn,
                    network_uuid,
                    scope,
                    &entries,
                    T::EXTERNAL_KINDS,
                )
                .await?;
            }
        }
        Ok(())
    }

    async fn update_in<C, T>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        resources: Vec<Resource<T>>,
    ) -> NetstoreResult<()>
    where
        C: ConnectionTrait,
        T: IdentifiableAttributes,
    {
        for (variant_num, batch) in group_by_variant(resources) {
            let scope = self.variant_scope(conn, network_uuid, variant_num).await?;
            let ids: Vec<String> = batch.iter().map(|resource| resource.id.clone()).collect();
            let existing = self
                .existing_ids::<C, T>(conn, network_uuid, variant_num, &ids)
                .await?;
            let (overrides, updates): (Vec<_>, Vec<_>) = batch
                .iter()
                .partition(|resource| !existing.contains(&resource.id));
            for resource in &updates {
                self.update_identifiable_row(conn, network_uuid, resource)
                    .await?;
            }
            let overrides: Vec<Resource<T>> = overrides.into_iter().cloned().collect();
            self.insert_identifiable_rows(conn, network_uuid, &overrides)
                .await?;
            log::debug!(
                "variant {variant_num}: updated {} and inserted {} {} rows",
                updates.len(),
                overrides.len(),
                T::RESOURCE_TYPE
            );

            let entries = external_entries(&batch);
            self.update_external_attributes(
                conn,
                network_uuid,
                scope,
                T::RESOURCE_TYPE,
                &entries,
                T::EXTERNAL_KINDS,
            )
            .await?;
        }
        Ok(())
    }

    async fn delete_in<C, T>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        ids: &[String],
    ) -> NetstoreResult<()>
    where
        C: ConnectionTrait,
        T: IdentifiableAttributes,
    {
        let scope = self.variant_scope(conn, network_uuid, variant_num).await?;
        let table = Alias::new(T::mapping().table());
        for chunk in ids.chunks(self.id_chunk_size()) {
            let delete = Query::delete()
                .from_table(table.clone())
                .and_where(Expr::col(Identifiable::NetworkUuid).eq(self.uuid_value(network_uuid)))
                .and_where(Expr::col(Identifiable::VariantNum).eq(variant_num))
                .and_where(Expr::col(Identifiable::Id).is_in(chunk.iter().cloned()))
                .to_owned();
            exec(conn, &delete).await?;
        }
        self.delete_external_attributes(conn, network_uuid, variant_num, T::EXTERNAL_KINDS, ids)
            .await?;
        self.delete_owned_extensions(conn, network_uuid, variant_num, ids)
            .await?;
        if !scope.is_full() {
            self.insert_identifiable_tombstones(conn, network_uuid, variant_num, ids)
                .await?;
        }
        log::debug!(
            "deleted {} {} ids in variant {variant_num}",
            ids.len(),
            T::RESOURCE_TYPE
        );
        Ok(())
    }

    /// Family table holding `id` in exactly `variant_num`.
    async fn family_of<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
        id: &str,
    ) -> NetstoreResult<Option<ResourceType>> {
        for descriptor in descriptors() {
            let select = Query::select()
                .from(Alias::new(descriptor.table))
                .column(Identifiable::Id)
                .and_where(Expr::col(Identifiable::NetworkUuid).eq(self.uuid_value(network_uuid)))
                .and_where(Expr::col(Identifiable::VariantNum).eq(variant_num))
                .and_where(Expr::col(Identifiable::Id).eq(id))
                .limit(1)
                .to_owned();
            if query_one(conn, &select).await?.is_some() {
                return Ok(Some(descriptor.resource_type));
            }
        }
        Ok(None)
    }

    /// Family of the row `id` resolves to: an own row first, then the
    /// ancestor's unless the id is tombstoned.
    async fn resolve_resource_type<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        scope: VariantScope,
        id: &str,
    ) -> NetstoreResult<Option<ResourceType>> {
        let own = self
            .family_of(conn, network_uuid, scope.variant_num, id)
            .await?;
        if own.is_some() || scope.is_full() {
            return Ok(own);
        }
        let ids = [id.to_string()];
        if self
            .tombstoned_identifiable_ids(conn, network_uuid, scope.variant_num, Some(&ids))
            .await?
            .contains(id)
        {
            return Ok(None);
        }
        self.family_of(conn, network_uuid, scope.full_variant_num, id)
            .await
    }
}

#[async_trait]
impl IdentifiableApi for NetworkStore {
    async fn create_identifiables<T: IdentifiableAttributes>(
        &self,
        network_uuid: Uuid,
        resources: Vec<Resource<T>>,
    ) -> NetstoreResult<()> {
        if resources.is_empty() {
            return Ok(());
        }
        let tx = begin(&self.conn).await?;
        let result = self.create_in(&tx, network_uuid, resources).await;
        finish(tx, result).await
    }

    async fn get_identifiable<T: IdentifiableAttributes>(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
        id: &str,
    ) -> NetstoreResult<Option<Resource<T>>> {
        let conn = &self.conn;
        let scope = self.variant_scope(conn, network_uuid, variant_num).await?;
        let ids = [id.to_string()];
        let ids = &ids[..];
        let resolved = resolve_one(
            scope,
            move |variant_num| async move {
                Ok(self
                    .fetch_identifiable_rows::<_, T>(conn, network_uuid, variant_num, RowFilter::Ids(ids))
                    .await?
                    .pop())
            },
            move || async move {
                Ok(!self
                    .tombstoned_identifiable_ids(conn, network_uuid, variant_num, Some(ids))
                    .await?
                    .is_empty())
            },
        )
        .await?;
        let Some(resource) = resolved else {
            return Ok(None);
        };
        let mut resources = [resource];
        self.enrich(conn, network_uuid, scope, &mut resources, Some(ids))
            .await?;
        let [resource] = resources;
        Ok(Some(resource))
    }

    async fn get_identifiables<T: IdentifiableAttributes>(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
    ) -> NetstoreResult<Vec<Resource<T>>> {
        let conn = &self.conn;
        let scope = self.variant_scope(conn, network_uuid, variant_num).await?;
        let mut resources = self
            .resolve_identifiables::<_, T>(conn, network_uuid, scope, RowFilter::All)
            .await?;
        self.enrich(conn, network_uuid, scope, &mut resources, None)
            .await?;
        Ok(resources)
    }

    async fn get_container_identifiables<T: IdentifiableAttributes>(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
        container_id: &str,
    ) -> NetstoreResult<Vec<Resource<T>>> {
        let conn = &self.conn;
        let scope = self.variant_scope(conn, network_uuid, variant_num).await?;
        let mut resources: Vec<Resource<T>> = self
            .resolve_identifiables::<_, T>(
                conn,
                network_uuid,
                scope,
                RowFilter::Container(container_id),
            )
            .await?
            .into_iter()
            .filter(|resource| in_container(&resource.attributes, container_id))
            .collect();
        let ids: Vec<String> = resources.iter().map(|resource| resource.id.clone()).collect();
        self.enrich(conn, network_uuid, scope, &mut resources, Some(ids.as_slice()))
            .await?;
        Ok(resources)
    }

    async fn update_identifiables<T: IdentifiableAttributes>(
        &self,
        network_uuid: Uuid,
        resources: Vec<Resource<T>>,
    ) -> NetstoreResult<()> {
        if resources.is_empty() {
            return Ok(());
        }
        let tx = begin(&self.conn).await?;
        let result = self.update_in(&tx, network_uuid, resources).await;
        finish(tx, result).await
    }

    async fn delete_identifiables<T: IdentifiableAttributes>(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
        ids: &[String],
    ) -> NetstoreResult<()> {
        if ids.is_empty() {
            return Err(NetstoreError::invalid(format!(
                "no {} ids to delete",
                T::RESOURCE_TYPE
            )));
        }
        let tx = begin(&self.conn).await?;
        let result = self
            .delete_in::<_, T>(&tx, network_uuid, variant_num, ids)
            .await;
        finish(tx, result).await
    }

    async fn get_identifiable_by_id(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
        id: &str,
    ) -> NetstoreResult<Option<IdentifiableResource>> {
        let scope = self.variant_scope(&self.conn, network_uuid, variant_num).await?;
        let Some(resource_type) = self
            .resolve_resource_type(&self.conn, network_uuid, scope, id)
            .await?
        else {
            return Ok(None);
        };
        get_identifiable_of_type(self, resource_type, network_uuid, variant_num, id).await
    }

    async fn get_identifiables_ids(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
    ) -> NetstoreResult<Vec<String>> {
        let conn = &self.conn;
        let scope = self.variant_scope(conn, network_uuid, variant_num).await?;
        let tombstoned = if scope.is_full() {
            BTreeSet::new()
        } else {
            self.tombstoned_identifiable_ids(conn, network_uuid, variant_num, None)
                .await?
        };
        let mut ids = Vec::new();
        for descriptor in descriptors() {
            let table = descriptor.table;
            let tombstoned = &tombstoned;
            let family_ids = resolve_set(
                scope,
                None,
                move |variant_num| self.fetch_identifiable_ids(conn, network_uuid, table, variant_num),
                move || async move { Ok(tombstoned.clone()) },
            )
            .await?;
            ids.extend(family_ids);
        }
        ids.sort();
        Ok(ids)
    }
}
