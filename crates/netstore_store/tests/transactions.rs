use std::path::Path;

use netstore_store::{
    GeneratorAttributes, NetstoreConfig, NetstoreResult, NetworkApi, NetworkAttributes,
    NetworkStore, ReactiveCapabilityCurveAttributes, ReactiveCapabilityCurvePointAttributes,
    ReactiveLimitsAttributes, Resource, ResourceType,
};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use tempfile::tempdir;
use uuid::Uuid;

async fn open_with_failpoint(base: &Path, failpoint: &str) -> NetstoreResult<NetworkStore> {
    let mut config = NetstoreConfig::default_sqlite(base.join("grid.sqlite").to_string_lossy());
    config.failpoints = Some(vec![failpoint.to_string()]);
    NetworkStore::connect(&config, base).await
}

async fn new_network(store: &NetworkStore) -> NetstoreResult<Uuid> {
    let uuid = Uuid::new_v4();
    store
        .create_network(Resource {
            resource_type: ResourceType::Network,
            id: "grid".to_string(),
            variant_num: 0,
            attributes: NetworkAttributes::new(uuid),
        })
        .await?;
    Ok(uuid)
}

fn curve_generator(id: &str) -> Resource<GeneratorAttributes> {
    Resource::new(
        id,
        0,
        GeneratorAttributes {
            voltage_level_id: "VL1".to_string(),
            reactive_limits: Some(ReactiveLimitsAttributes::Curve(
                ReactiveCapabilityCurveAttributes {
                    points: vec![ReactiveCapabilityCurvePointAttributes {
                        p: 0.0,
                        min_q: -1.0,
                        max_q: 1.0,
                    }],
                },
            )),
            ..GeneratorAttributes::default()
        },
    )
}

async fn count_rows(store: &NetworkStore, table: &str) -> NetstoreResult<i64> {
    let row = store
        .connection()
        .query_one_raw(Statement::from_string(
            DatabaseBackend::Sqlite,
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await?
        .expect("count row");
    Ok(row.try_get("", "n")?)
}

#[tokio::test]
async fn create_rolls_back_after_identifiables_insert() -> NetstoreResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_with_failpoint(dir.path(), "after_identifiables_insert").await?;
    let network = new_network(&store).await?;

    let result = store
        .create_generators(network, vec![curve_generator("G1")])
        .await;
    assert!(result.is_err());
    assert!(store.get_generators(network, 0).await?.is_empty());
    assert_eq!(count_rows(&store, "generator").await?, 0);
    Ok(())
}

#[tokio::test]
async fn create_rolls_back_after_external_attributes_insert() -> NetstoreResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_with_failpoint(dir.path(), "after_external_attributes_insert").await?;
    let network = new_network(&store).await?;

    let result = store
        .create_generators(network, vec![curve_generator("G1")])
        .await;
    assert!(result.is_err());
    assert!(store.get_generator(network, 0, "G1").await?.is_none());
    assert_eq!(count_rows(&store, "generator").await?, 0);
    assert_eq!(count_rows(&store, "reactive_capability_curve_points").await?, 0);
    Ok(())
}

#[tokio::test]
async fn clone_rolls_back_after_rows_are_copied() -> NetstoreResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open_with_failpoint(dir.path(), "after_clone_rows").await?;
    let network = new_network(&store).await?;
    store
        .create_generators(network, vec![curve_generator("G1")])
        .await?;

    let result = store.clone_variant(network, 0, 1, "V1", false).await;
    assert!(result.is_err());
    let variants = store.get_variants_infos(network).await?;
    assert_eq!(variants.len(), 1);
    assert!(store.get_network(network, 1).await?.is_none());

    let result = store
        .clone_network(Uuid::new_v4(), network, &["InitialState".to_string()])
        .await;
    assert!(result.is_err());
    assert_eq!(store.get_networks().await?.len(), 1);
    assert_eq!(count_rows(&store, "generator").await?, 1);
    Ok(())
}
