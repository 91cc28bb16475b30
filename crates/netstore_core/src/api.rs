use std::collections::BTreeMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    ExtensionResource, IdentifiableAttributes, IdentifiableResource, NetstoreResult,
    NetworkAttributes, NetworkInfos, Resource, VariantInfos, VariantNum,
};

#[async_trait]
pub trait NetworkApi {
    async fn get_networks(&self) -> NetstoreResult<Vec<NetworkInfos>>;

    /// Creates the network row of one variant; the first call creates variant 0.
    async fn create_network(&self, network: Resource<NetworkAttributes>) -> NetstoreResult<()>;

    async fn get_network(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
    ) -> NetstoreResult<Option<Resource<NetworkAttributes>>>;

    async fn update_network(&self, network: Resource<NetworkAttributes>) -> NetstoreResult<()>;

    async fn get_variants_infos(&self, network_uuid: Uuid) -> NetstoreResult<Vec<VariantInfos>>;

    async fn delete_network(&self, network_uuid: Uuid) -> NetstoreResult<()>;

    async fn delete_variant(&self, network_uuid: Uuid, variant_num: VariantNum)
    -> NetstoreResult<()>;

    /// Copy-on-write clone of `source` into the new variant `target`.
    async fn clone_variant(
        &self,
        network_uuid: Uuid,
        source_variant_num: VariantNum,
        target_variant_num: VariantNum,
        target_variant_id: &str,
        may_overwrite: bool,
    ) -> NetstoreResult<()>;

    /// Copies the named variants of `source` into the new network `target`,
    /// renumbered from 0 in the order given.
    async fn clone_network(
        &self,
        target_network_uuid: Uuid,
        source_network_uuid: Uuid,
        variant_ids: &[String],
    ) -> NetstoreResult<()>;
}

#[async_trait]
pub trait IdentifiableApi {
    async fn create_identifiables<T: IdentifiableAttributes>(
        &self,
        network_uuid: Uuid,
        resources: Vec<Resource<T>>,
    ) -> NetstoreResult<()>;

    async fn get_identifiable<T: IdentifiableAttributes>(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
        id: &str,
    ) -> NetstoreResult<Option<Resource<T>>>;

    async fn get_identifiables<T: IdentifiableAttributes>(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
    ) -> NetstoreResult<Vec<Resource<T>>>;

    /// Equipments whose container column (substation or voltage level) holds
    /// `container_id`.
    async fn get_container_identifiables<T: IdentifiableAttributes>(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
        container_id: &str,
    ) -> NetstoreResult<Vec<Resource<T>>>;

    async fn update_identifiables<T: IdentifiableAttributes>(
        &self,
        network_uuid: Uuid,
        resources: Vec<Resource<T>>,
    ) -> NetstoreResult<()>;

    async fn delete_identifiables<T: IdentifiableAttributes>(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
        ids: &[String],
    ) -> NetstoreResult<()>;

    async fn get_identifiable_by_id(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
        id: &str,
    ) -> NetstoreResult<Option<IdentifiableResource>>;

    async fn get_identifiables_ids(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
    ) -> NetstoreResult<Vec<String>>;
}

#[async_trait]
pub trait ExtensionApi {
    async fn upsert_extensions(
        &self,
        network_uuid: Uuid,
        extensions: Vec<ExtensionResource>,
    ) -> NetstoreResult<()>;

    async fn get_extension(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
        owner_id: &str,
        name: &str,
    ) -> NetstoreResult<Option<ExtensionResource>>;

    /// Extensions of one equipment keyed by name.
    async fn get_extensions(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
        owner_id: &str,
    ) -> NetstoreResult<BTreeMap<String, ExtensionResource>>;

    async fn remove_extension(
        &self,
        network_uuid: Uuid,
        variant_num: VariantNum,
        owner_id: &str,
        name: &str,
    ) -> NetstoreResult<()>;
}
