//! Network rows, variant lifecycle and clone operations.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sea_orm::ConnectionTrait;
use sea_orm::sea_query::{Alias, Condition, Expr, ExprTrait, Order, Query};
use uuid::Uuid;

use crate::NetworkStore;
use crate::db::*;
use crate::extensions::ExtensionRows;
use crate::store::{
    AFTER_CLONE_ROWS, begin, col_name, exec, finish, mapped_values, query_all, query_error,
    query_one, read_mapped, read_uuid,
};
use netstore_core::{
    ExternalAttributeKind, INITIAL_VARIANT_NUM, NetstoreError, NetstoreResult, NetworkApi,
    NetworkAttributes, NetworkInfos, Resource, ResourceType, TableDescriptor, VariantInfos,
    VariantNum, VariantScope, descriptors,
};

/// A table holding rows per network variant, keyed by `network_uuid, variant_num`.
#[derive(Clone, Copy)]
enum VariantTable {
    Family(&'static TableDescriptor),
    External(ExternalAttributeKind),
    IdentifiableTombstones,
    ExternalTombstones,
    Extensions,
}

impl VariantTable {
    fn all() -> Vec<VariantTable> {
        let mut tables: Vec<VariantTable> = descriptors().iter().map(VariantTable::Family).collect();
        tables.extend(ExternalAttributeKind::ALL.into_iter().map(VariantTable::External));
        tables.extend([
            VariantTable::IdentifiableTombstones,
            VariantTable::ExternalTombstones,
            VariantTable::Extensions,
        ]);
        tables
    }

    fn is_tombstone(&self) -> bool {
        matches!(
            self,
            VariantTable::IdentifiableTombstones | VariantTable::ExternalTombstones
        )
    }

    fn alias(&self) -> Alias {
        match self {
            VariantTable::Family(descriptor) => Alias::new(descriptor.table),
            VariantTable::External(kind) => Alias::new(kind.table_name()),
            VariantTable::IdentifiableTombstones => {
                Alias::new(col_name(TombstonedIdentifiables::Table))
            }
            VariantTable::ExternalTombstones => {
                Alias::new(col_name(TombstonedExternalAttributes::Table))
            }
            VariantTable::Extensions => Alias::new(col_name(Extensions::Table)),
        }
    }

    /// Column naming the owning equipment.
    fn owner_column(&self) -> String {
        match self {
            VariantTable::Family(_) => col_name(Identifiable::Id),
            _ => col_name(ExternalAttribute::EquipmentId),
        }
    }

    /// Every column but the two key columns rewritten on copy.
    fn data_columns(&self) -> Vec<String> {
        match self {
            VariantTable::Family(descriptor) => std::iter::once(col_name(Identifiable::Id))
                .chain(descriptor.columns.iter().map(|(name, _)| name.clone()))
                .collect(),
            VariantTable::External(ExternalAttributeKind::RegulatingPoint) => vec![
                col_name(RegulatingPoints::EquipmentId),
                col_name(RegulatingPoints::EquipmentType),
                col_name(RegulatingPoints::TapChangerType),
                col_name(RegulatingPoints::RegulatedEquipmentId),
                col_name(RegulatingPoints::Payload),
            ],
            VariantTable::External(_) => vec![
                col_name(ExternalAttribute::EquipmentId),
                col_name(ExternalAttribute::EquipmentType),
                col_name(ExternalAttribute::Payload),
            ],
            VariantTable::IdentifiableTombstones => {
                vec![col_name(TombstonedIdentifiables::EquipmentId)]
            }
            VariantTable::ExternalTombstones => vec![
                col_name(TombstonedExternalAttributes::AttributeKind),
                col_name(TombstonedExternalAttributes::EquipmentId),
            ],
            VariantTable::Extensions => vec![
                col_name(Extensions::EquipmentId),
                col_name(Extensions::EquipmentType),
                col_name(Extensions::Name),
                col_name(Extensions::Payload),
            ],
        }
    }
}

fn read_variant_num(row: &sea_orm::QueryResult, column: &str) -> NetstoreResult<VariantNum> {
    let value: i64 = row.try_get("", column)?;
    VariantNum::try_from(value)
        .map_err(|_| NetstoreError::storage(format!("variant number {value} out of range")))
}

impl NetworkStore {
    async fn insert_network_row<C: ConnectionTrait>(
        &self,
        conn: &C,
        network: &Resource<NetworkAttributes>,
    ) -> NetstoreResult<()> {
        let mapping = NetworkAttributes::mapping();
        let mut columns = vec![
            Alias::new(col_name(Network::Uuid)),
            Alias::new(col_name(Network::VariantNum)),
            Alias::new(col_name(Network::Id)),
        ];
        columns.extend(
            mapping
                .column_names()
                .into_iter()
                .map(|name| Alias::new(name.to_string())),
        );
        let mut row = vec![
            self.uuid_value(network.attributes.uuid),
            network.variant_num.into(),
            network.id.clone().into(),
        ];
        row.extend(mapped_values(mapping, &network.attributes)?);
        let mut insert = Query::insert();
        insert
            .into_table(Network::Table)
            .columns(columns)
            .values(row.into_iter().map(Into::into))
            .map_err(query_error)?;
        exec(conn, &insert).await?;
        Ok(())
    }

    async fn fetch_network_row<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
    ) -> NetstoreResult<Option<Resource<NetworkAttributes>>> {
        let mapping = NetworkAttributes::mapping();
        let select = Query::select()
            .from(Network::Table)
            .column(Network::Id)
            .columns(
                mapping
                    .column_names()
                    .into_iter()
                    .map(|name| Alias::new(name.to_string())),
            )
            .and_where(Expr::col(Network::Uuid).eq(self.uuid_value(network_uuid)))
            .and_where(Expr::col(Network::VariantNum).eq(variant_num))
            .to_owned();
        let Some(row) = query_one(conn, &select).await? else {
            return Ok(None);
        };
        let id: String = row.try_get("", &col_name(Network::Id))?;
        let mut attributes = read_mapped(mapping, &row)?;
        attributes.uuid = network_uuid;
        Ok(Some(Resource {
            resource_type: ResourceType::Network,
            id,
            variant_num,
            attributes,
        }))
    }

    async fn fetch_variants_infos<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
    ) -> NetstoreResult<Vec<VariantInfos>> {
        let select = Query::select()
            .from(Network::Table)
            .columns([Network::VariantNum, Network::VariantId, Network::FullVariantNum])
            .and_where(Expr::col(Network::Uuid).eq(self.uuid_value(network_uuid)))
            .order_by(Network::VariantNum, Order::Asc)
            .to_owned();
        query_all(conn, &select)
            .await?
            .iter()
            .map(|row| {
                Ok(VariantInfos {
                    id: row.try_get("", &col_name(Network::VariantId))?,
                    num: row.try_get("", &col_name(Network::VariantNum))?,
                    full_variant_num: read_variant_num(row, &col_name(Network::FullVariantNum))?,
                })
            })
            .collect()
    }

    /// Copies the rows one variant holds in `table` to another variant,
    /// rewriting the network uuid and variant number in the same statement.
    async fn copy_variant_rows<C: ConnectionTrait>(
        &self,
        conn: &C,
        table: VariantTable,
        from: (Uuid, VariantNum),
        to: (Uuid, VariantNum),
        filter: Option<Condition>,
    ) -> NetstoreResult<u64> {
        let data_columns: Vec<Alias> = table.data_columns().into_iter().map(Alias::new).collect();
        let mut select = Query::select();
        select
            .from(table.alias())
            .expr(Expr::val(self.uuid_value(to.0)))
            .expr(Expr::val(to.1))
            .columns(data_columns.clone())
            .and_where(Expr::col(VariantRow::NetworkUuid).eq(self.uuid_value(from.0)))
            .and_where(Expr::col(VariantRow::VariantNum).eq(from.1));
        if let Some(filter) = filter {
            select.cond_where(filter);
        }
        let mut columns = vec![
            Alias::new(col_name(VariantRow::NetworkUuid)),
            Alias::new(col_name(VariantRow::VariantNum)),
        ];
        columns.extend(data_columns);
        let mut insert = Query::insert();
        insert
            .into_table(table.alias())
            .columns(columns)
            .select_from(select)
            .map_err(query_error)?;
        exec(conn, &insert).await
    }

    /// Copies every row a variant itself holds, tombstones included.
    async fn copy_variant_delta<C: ConnectionTrait>(
        &self,
        conn: &C,
        from: (Uuid, VariantNum),
        to: (Uuid, VariantNum),
        extension_filter: Option<Condition>,
    ) -> NetstoreResult<u64> {
        let mut copied = 0;
        for table in VariantTable::all() {
            let filter = match table {
                VariantTable::Extensions => extension_filter.clone(),
                _ => None,
            };
            copied += self.copy_variant_rows(conn, table, from, to, filter).await?;
        }
        Ok(copied)
    }

    /// Rows of the partial variant `source` merged with the rows of its ancestor
    /// it does not override, hide or tombstone, written as a full variant.
    async fn materialize_variant<C: ConnectionTrait>(
        &self,
        conn: &C,
        source_uuid: Uuid,
        source: VariantScope,
        to: (Uuid, VariantNum),
    ) -> NetstoreResult<u64> {
        let own = (source_uuid, source.variant_num);
        let ancestor = (source_uuid, source.full_variant_num);
        let mut copied = 0;
        for table in VariantTable::all() {
            if table.is_tombstone() || matches!(table, VariantTable::Extensions) {
                continue;
            }
            copied += self.copy_variant_rows(conn, table, own, to, None).await?;

            let owner = Alias::new(table.owner_column());
            let mut hidden = Condition::all()
                .add(
                    Expr::col(owner.clone()).not_in_subquery(
                        Query::select()
                            .column(owner.clone())
                            .from(table.alias())
                            .and_where(
                                Expr::col(VariantRow::NetworkUuid)
                                    .eq(self.uuid_value(source_uuid)),
                            )
                            .and_where(Expr::col(VariantRow::VariantNum).eq(source.variant_num))
                            .to_owned(),
                    ),
                )
                .add(
                    Expr::col(owner.clone()).not_in_subquery(
                        Query::select()
                            .column(TombstonedIdentifiables::EquipmentId)
                            .from(TombstonedIdentifiables::Table)
                            .and_where(
                                Expr::col(TombstonedIdentifiables::NetworkUuid)
                                    .eq(self.uuid_value(source_uuid)),
                            )
                            .and_where(
                                Expr::col(TombstonedIdentifiables::VariantNum)
                                    .eq(source.variant_num),
                            )
                            .to_owned(),
                    ),
                );
            if let VariantTable::External(kind) = table {
                hidden = hidden.add(
                    Expr::col(owner).not_in_subquery(
                        Query::select()
                            .column(TombstonedExternalAttributes::EquipmentId)
                            .from(TombstonedExternalAttributes::Table)
                            .and_where(
                                Expr::col(TombstonedExternalAttributes::NetworkUuid)
                                    .eq(self.uuid_value(source_uuid)),
                            )
                            .and_where(
                                Expr::col(TombstonedExternalAttributes::VariantNum)
                                    .eq(source.variant_num),
                            )
                            .and_where(
                                Expr::col(TombstonedExternalAttributes::AttributeKind)
                                    .eq(kind.as_str()),
                            )
                            .to_owned(),
                    ),
                );
            }
            copied += self
                .copy_variant_rows(conn, table, ancestor, to, Some(hidden))
                .await?;
        }

        let extensions: ExtensionRows = self
            .resolve_extensions(conn, source_uuid, source, None, None)
            .await?
            .into_iter()
            .filter(|(key, payload)| {
                payload.is_some() && !self.excluded_clone_extensions.contains(&key.name)
            })
            .collect();
        self.insert_extension_rows(conn, to.0, to.1, &extensions)
            .await?;
        Ok(copied + extensions.len() as u64)
    }

    async fn delete_variant_rows<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: Option<VariantNum>,
    ) -> NetstoreResult<()> {
        for table in VariantTable::all() {
            let mut delete = Query::delete();
            delete
                .from_table(table.alias())
                .and_where(Expr::col(VariantRow::NetworkUuid).eq(self.uuid_value(network_uuid)));
            if let Some(variant_num) = variant_num {
                delete.and_where(Expr::col(VariantRow::VariantNum).eq(variant_num));
            }
            exec(conn, &delete).await?;
        }
        let mut delete = Query::delete();
        delete
            .from_table(Network::Table)
            .and_where(Expr::col(Network::Uuid).eq(self.uuid_value(network_uuid)));
        if let Some(variant_num) = variant_num {
            delete.and_where(Expr::col(Network::VariantNum).eq(variant_num));
        }
        exec(conn, &delete).await?;
        Ok(())
    }

    async fn delete_variant_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
    ) -> NetstoreResult<()> {
        if variant_num == INITIAL_VARIANT_NUM {
            return Err(NetstoreError::invariant(
                "the initial variant cannot be deleted",
            ));
        }
        let scope = self.variant_scope(conn, network_uuid, variant_num).await?;
        if scope.is_full() {
            let dependants: Vec<VariantNum> = self
                .fetch_variants_infos(conn, network_uuid)
                .await?
                .into_iter()
                .filter(|infos| infos.num != variant_num && infos.full_variant_num == variant_num)
                .map(|infos| infos.num)
                .collect();
            if !dependants.is_empty() {
                return Err(NetstoreError::invariant(format!(
                    "full variant {variant_num} is the ancestor of variants {dependants:?}"
                )));
            }
        }
        self.delete_variant_rows(conn, network_uuid, Some(variant_num))
            .await?;
        log::info!("deleted variant {variant_num} of network {network_uuid}");
        Ok(())
    }

    async fn create_network_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        network: &Resource<NetworkAttributes>,
    ) -> NetstoreResult<()> {
        let network_uuid = network.attributes.uuid;
        let variant_num = network.variant_num;
        let full_variant_num = network.attributes.full_variant_num;
        let existing = self.fetch_variants_infos(conn, network_uuid).await?;
        if let Some(infos) = existing
            .iter()
            .find(|infos| infos.num == variant_num || infos.id == network.attributes.variant_id)
        {
            return Err(NetstoreError::invariant(format!(
                "variant {} ({}) already exists in network {network_uuid}",
                infos.num, infos.id
            )));
        }
        if variant_num == INITIAL_VARIANT_NUM && full_variant_num != variant_num {
            return Err(NetstoreError::invariant("the initial variant must be full"));
        }
        if full_variant_num != variant_num
            && !existing
                .iter()
                .any(|infos| infos.num == full_variant_num && infos.scope().is_full())
        {
            return Err(NetstoreError::invariant(format!(
                "ancestor {full_variant_num} of variant {variant_num} is not a full variant"
            )));
        }
        self.insert_network_row(conn, network).await
    }

    async fn update_network_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        mut network: Resource<NetworkAttributes>,
    ) -> NetstoreResult<()> {
        let network_uuid = network.attributes.uuid;
        let scope = self
            .variant_scope(conn, network_uuid, network.variant_num)
            .await?;
        network.attributes.full_variant_num = scope.full_variant_num;
        let mapping = NetworkAttributes::mapping();
        let mut values = vec![(Alias::new(col_name(Network::Id)), network.id.clone().into())];
        values.extend(
            mapping
                .column_names()
                .into_iter()
                .map(|name| Alias::new(name.to_string()))
                .zip(mapped_values(mapping, &network.attributes)?)
                .map(|(column, value)| (column, value.into())),
        );
        let update = Query::update()
            .table(Network::Table)
            .values(values)
            .and_where(Expr::col(Network::Uuid).eq(self.uuid_value(network_uuid)))
            .and_where(Expr::col(Network::VariantNum).eq(network.variant_num))
            .to_owned();
        exec(conn, &update).await?;
        Ok(())
    }

    async fn clone_variant_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        source_variant_num: VariantNum,
        target_variant_num: VariantNum,
        target_variant_id: &str,
        may_overwrite: bool,
    ) -> NetstoreResult<()> {
        let Some(source) = self
            .fetch_network_row(conn, network_uuid, source_variant_num)
            .await?
        else {
            return Err(NetstoreError::invariant(format!(
                "source variant {source_variant_num} of network {network_uuid} does not exist"
            )));
        };
        let source_scope =
            VariantScope::partial(source_variant_num, source.attributes.full_variant_num);

        let conflicts: Vec<VariantInfos> = self
            .fetch_variants_infos(conn, network_uuid)
            .await?
            .into_iter()
            .filter(|infos| infos.num == target_variant_num || infos.id == target_variant_id)
            .collect();
        for infos in &conflicts {
            if !may_overwrite || infos.num == source_variant_num {
                return Err(NetstoreError::invariant(format!(
                    "variant {} ({}) already exists in network {network_uuid}",
                    infos.num, infos.id
                )));
            }
            self.delete_variant_in(conn, network_uuid, infos.num).await?;
        }

        let mut target = source.clone();
        target.variant_num = target_variant_num;
        target.attributes.variant_id = target_variant_id.to_string();
        target.attributes.full_variant_num = source_scope.full_variant_num;
        self.insert_network_row(conn, &target).await?;

        let copied = if source_scope.is_full() {
            0
        } else {
            self.copy_variant_delta(
                conn,
                (network_uuid, source_variant_num),
                (network_uuid, target_variant_num),
                None,
            )
            .await?
        };
        self.maybe_failpoint(AFTER_CLONE_ROWS)?;
        log::info!(
            "cloned variant {source_variant_num} into {target_variant_num} ({target_variant_id}) \
             of network {network_uuid}, {copied} rows copied"
        );
        Ok(())
    }

    async fn clone_network_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        target_uuid: Uuid,
        source_uuid: Uuid,
        variant_ids: &[String],
    ) -> NetstoreResult<()> {
        if !self.fetch_variants_infos(conn, target_uuid).await?.is_empty() {
            return Err(NetstoreError::invariant(format!(
                "target network {target_uuid} already exists"
            )));
        }
        let source_variants = self.fetch_variants_infos(conn, source_uuid).await?;
        if source_variants.is_empty() {
            return Err(NetstoreError::invariant(format!(
                "source network {source_uuid} does not exist"
            )));
        }
        let mut selected = Vec::with_capacity(variant_ids.len());
        for variant_id in variant_ids {
            let infos = source_variants
                .iter()
                .find(|infos| &infos.id == variant_id)
                .ok_or_else(|| {
                    NetstoreError::invariant(format!(
                        "variant {variant_id} of network {source_uuid} does not exist"
                    ))
                })?;
            selected.push(infos.clone());
        }
        let renumbered: BTreeMap<VariantNum, VariantNum> = selected
            .iter()
            .enumerate()
            .map(|(index, infos)| (infos.num, index as VariantNum))
            .collect();

        let extension_filter = if self.excluded_clone_extensions.is_empty() {
            None
        } else {
            Some(Condition::all().add(
                Expr::col(Extensions::Name).is_not_in(self.excluded_clone_extensions.iter().cloned()),
            ))
        };

        for (index, infos) in selected.iter().enumerate() {
            let target_num = index as VariantNum;
            let scope = infos.scope();
            let from = (source_uuid, infos.num);
            let to = (target_uuid, target_num);
            let mapped_ancestor = renumbered
                .get(&scope.full_variant_num)
                .copied()
                .filter(|_| !scope.is_full() && target_num != INITIAL_VARIANT_NUM);
            let (full_variant_num, copied) = if scope.is_full() {
                let copied = self
                    .copy_variant_delta(conn, from, to, extension_filter.clone())
                    .await?;
                (target_num, copied)
            } else if let Some(ancestor) = mapped_ancestor {
                let copied = self
                    .copy_variant_delta(conn, from, to, extension_filter.clone())
                    .await?;
                (ancestor, copied)
            } else {
                let copied = self.materialize_variant(conn, source_uuid, scope, to).await?;
                (target_num, copied)
            };

            let Some(mut network) = self.fetch_network_row(conn, source_uuid, infos.num).await?
            else {
                return Err(NetstoreError::invariant(format!(
                    "variant {} of network {source_uuid} does not exist",
                    infos.num
                )));
            };
            network.variant_num = target_num;
            network.attributes.uuid = target_uuid;
            network.attributes.full_variant_num = full_variant_num;
            self.insert_network_row(conn, &network).await?;
            log::debug!(
                "variant {} ({}) cloned as {target_num} of network {target_uuid}, {copied} rows",
                infos.num,
                infos.id
            );
        }
        self.maybe_failpoint(AFTER_CLONE_ROWS)?;
        log::info!(
            "cloned {} variants of network {source_uuid} into {target_uuid}",
            selected.len()
        );
        Ok(())
    }
}

#[async_trait]
impl NetworkApi for NetworkStore {
    async fn get_networks(&self) -> NetstoreResult<Vec<NetworkInfos>> {
        let select = Query::select()
            .from(Network::Table)
            .columns([Network::Uuid, Network::Id])
            .and_where(Expr::col(Network::VariantNum).eq(INITIAL_VARIANT_NUM))
            .order_by(Network::Id, Order::Asc)
            .to_owned();
        query_all(&self.conn, &select)
            .await?
            .iter()
            .map(|row| {
                Ok(NetworkInfos {
                    uuid: read_uuid(row, &col_name(Network::Uuid))?,
                    id: row.try_get("", &col_name(Network::Id))?,
                })
            })
            .collect()
    }

    async fn create_network(&self, network: Resource<NetworkAttributes>) -> NetstoreResult<()> {
        if network.attributes.variant_id.is_empty() {
            return Err(NetstoreError::invalid("variant id must not be empty"));
        }
        let tx = begin(&self.conn).await?;
        let result = self.create_network_in(&tx, &network).await;
        let result = finish(tx, result).await;
        if result.is_ok() {
            log::info!(
                "created variant {} ({}) of network {}",
                network.variant_num,
                network.attributes.variant_id,
                network.attributes.uuid
            );
        }
        result
    }

    async fn get_network(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
    ) -> NetstoreResult<Option<Resource<NetworkAttributes>>> {
        self.fetch_network_row(&self.conn, network_uuid, variant_num)
            .await
    }

    async fn update_network(&self, network: Resource<NetworkAttributes>) -> NetstoreResult<()> {
        let tx = begin(&self.conn).await?;
        let result = self.update_network_in(&tx, network).await;
        finish(tx, result).await
    }

    async fn get_variants_infos(&self, network_uuid: Uuid) -> NetstoreResult<Vec<VariantInfos>> {
        self.fetch_variants_infos(&self.conn, network_uuid).await
    }

    async fn delete_network(&self, network_uuid: Uuid) -> NetstoreResult<()> {
        let tx = begin(&self.conn).await?;
        let result = self.delete_variant_rows(&tx, network_uuid, None).await;
        finish(tx, result).await?;
        log::info!("deleted network {network_uuid}");
        Ok(())
    }

    async fn delete_variant(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
    ) -> NetstoreResult<()> {
        let tx = begin(&self.conn).await?;
        let result = self.delete_variant_in(&tx, network_uuid, variant_num).await;
        finish(tx, result).await
    }

    async fn clone_variant(
        &self,
        network_uuid: Uuid,
        source_variant_num: VariantNum,
        target_variant_num: VariantNum,
        target_variant_id: &str,
        may_overwrite: bool,
    ) -> NetstoreResult<()> {
        if target_variant_id.is_empty() {
            return Err(NetstoreError::invalid("target variant id must not be empty"));
        }
        if source_variant_num == target_variant_num {
            return Err(NetstoreError::invariant(format!(
                "cannot clone variant {source_variant_num} onto itself"
            )));
        }
        let tx = begin(&self.conn).await?;
        let result = self
            .clone_variant_in(
                &tx,
                network_uuid,
                source_variant_num,
                target_variant_num,
                target_variant_id,
                may_overwrite,
            )
            .await;
        finish(tx, result).await
    }

    async fn clone_network(
        &self,
        target_network_uuid: Uuid,
        source_network_uuid: Uuid,
        variant_ids: &[String],
    ) -> NetstoreResult<()> {
        if variant_ids.is_empty() {
            return Err(NetstoreError::invalid("no variants to clone"));
        }
        let tx = begin(&self.conn).await?;
        let result = self
            .clone_network_in(&tx, target_network_uuid, source_network_uuid, variant_ids)
            .await;
        finish(tx, result).await
    }
}
