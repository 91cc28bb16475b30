use std::path::Path;

use netstore_store::{
    ExtensionApi, ExtensionResource, LoadAttributes, NetstoreConfig, NetstoreResult, NetworkApi,
    NetworkAttributes, NetworkStore, Resource, ResourceType,
};
use serde_json::{Value, json};
use tempfile::tempdir;
use uuid::Uuid;

async fn open(base: &Path) -> NetstoreResult<NetworkStore> {
    let config = NetstoreConfig::default_sqlite(base.join("grid.sqlite").to_string_lossy());
    NetworkStore::connect(&config, base).await
}

async fn network_with_load(store: &NetworkStore) -> NetstoreResult<Uuid> {
    let uuid = Uuid::new_v4();
    store
        .create_network(Resource {
            resource_type: ResourceType::Network,
            id: "grid".to_string(),
            variant_num: 0,
            attributes: NetworkAttributes::new(uuid),
        })
        .await?;
    store
        .create_loads(uuid, vec![Resource::new("LD1", 0, LoadAttributes::default())])
        .await?;
    Ok(uuid)
}

fn detail(variant_num: i32, fixed_active_power: f64) -> ExtensionResource {
    ExtensionResource::new(
        "LD1",
        ResourceType::Load,
        variant_num,
        "loadDetail",
        json!({"fixedActivePower": fixed_active_power, "variableActivePower": 0.0}),
    )
}

async fn payload(
    store: &NetworkStore,
    network: Uuid,
    variant_num: i32,
    name: &str,
) -> NetstoreResult<Option<Value>> {
    Ok(store
        .get_extension(network, variant_num, "LD1", name)
        .await?
        .map(|extension| extension.attributes))
}

#[tokio::test]
async fn extensions_follow_the_variant_chain() -> NetstoreResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let network = network_with_load(&store).await?;
    store
        .upsert_extensions(
            network,
            vec![
                detail(0, 4.0),
                ExtensionResource::new(
                    "LD1",
                    ResourceType::Load,
                    0,
                    "loadAsymmetrical",
                    json!({"deltaPA": 0.1}),
                ),
            ],
        )
        .await?;
    let stored = store
        .get_extension(network, 0, "LD1", "loadDetail")
        .await?
        .expect("loadDetail");
    assert_eq!(stored, detail(0, 4.0));

    store.clone_variant(network, 0, 1, "V1", false).await?;
    let inherited = store.get_extensions(network, 1, "LD1").await?;
    assert_eq!(
        inherited.keys().collect::<Vec<_>>(),
        vec!["loadAsymmetrical", "loadDetail"]
    );
    assert_eq!(inherited["loadDetail"].variant_num, 1);

    store
        .remove_extension(network, 1, "LD1", "loadDetail")
        .await?;
    assert_eq!(payload(&store, network, 1, "loadDetail").await?, None);
    assert_eq!(
        payload(&store, network, 0, "loadDetail").await?,
        Some(json!({"fixedActivePower": 4.0, "variableActivePower": 0.0}))
    );
    assert_eq!(store.get_extensions(network, 1, "LD1").await?.len(), 1);

    store.upsert_extensions(network, vec![detail(1, 9.0)]).await?;
    assert_eq!(
        payload(&store, network, 1, "loadDetail").await?,
        Some(json!({"fixedActivePower": 9.0, "variableActivePower": 0.0}))
    );
    assert_eq!(
        payload(&store, network, 0, "loadDetail").await?,
        Some(json!({"fixedActivePower": 4.0, "variableActivePower": 0.0}))
    );
    Ok(())
}

#[tokio::test]
async fn deleted_equipment_takes_its_extensions_along() -> NetstoreResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let network = network_with_load(&store).await?;
    store.upsert_extensions(network, vec![detail(0, 4.0)]).await?;
    store.clone_variant(network, 0, 1, "V1", false).await?;

    store.delete_loads(network, 1, &["LD1".to_string()]).await?;
    assert!(store.get_extensions(network, 1, "LD1").await?.is_empty());
    assert!(payload(&store, network, 0, "loadDetail").await?.is_some());

    store
        .create_loads(network, vec![Resource::new("LD1", 1, LoadAttributes::default())])
        .await?;
    assert!(store.get_load(network, 1, "LD1").await?.is_some());
    assert!(store.get_extensions(network, 1, "LD1").await?.is_empty());

    store.delete_loads(network, 0, &["LD1".to_string()]).await?;
    assert!(store.get_extensions(network, 0, "LD1").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn removal_in_a_full_variant_drops_the_row() -> NetstoreResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let network = network_with_load(&store).await?;
    store.upsert_extensions(network, vec![detail(0, 4.0)]).await?;
    store
        .remove_extension(network, 0, "LD1", "loadDetail")
        .await?;
    assert_eq!(payload(&store, network, 0, "loadDetail").await?, None);
    // Removing what is not there is a no-op.
    store
        .remove_extension(network, 0, "LD1", "loadDetail")
        .await?;
    assert!(store.get_extension(network, 0, "nope", "loadDetail").await?.is_none());
    Ok(())
}
