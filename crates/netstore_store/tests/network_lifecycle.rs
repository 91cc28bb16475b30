use std::path::Path;

use netstore_store::{
    ExtensionApi, ExtensionResource, ExtensionsConfig, GeneratorAttributes, NetstoreConfig,
    NetstoreError, NetstoreResult, NetworkApi, NetworkAttributes, NetworkStore, Resource,
    ResourceType, VariantInfos,
};
use serde_json::json;
use tempfile::tempdir;
use uuid::Uuid;

async fn open(base: &Path) -> NetstoreResult<NetworkStore> {
    let mut config = NetstoreConfig::default_sqlite(base.join("grid.sqlite").to_string_lossy());
    config.extensions = Some(ExtensionsConfig {
        excluded_from_network_clone: Some(vec!["cgmesMetadata".to_string()]),
    });
    NetworkStore::connect(&config, base).await
}

fn network_row(
    uuid: Uuid,
    id: &str,
    variant_num: i32,
    variant_id: &str,
    full_variant_num: i32,
) -> Resource<NetworkAttributes> {
    let mut attributes = NetworkAttributes::new(uuid);
    attributes.variant_id = variant_id.to_string();
    attributes.full_variant_num = full_variant_num;
    attributes.case_date = Some("2025-01-01T00:00:00Z".to_string());
    Resource {
        resource_type: ResourceType::Network,
        id: id.to_string(),
        variant_num,
        attributes,
    }
}

fn generator(id: &str, variant_num: i32, target_p: f64) -> Resource<GeneratorAttributes> {
    Resource::new(
        id,
        variant_num,
        GeneratorAttributes {
            voltage_level_id: "VL1".to_string(),
            target_p,
            ..GeneratorAttributes::default()
        },
    )
}

fn infos(id: &str, num: i32, full_variant_num: i32) -> VariantInfos {
    VariantInfos {
        id: id.to_string(),
        num,
        full_variant_num,
    }
}

#[tokio::test]
async fn networks_are_listed_with_their_variants() -> NetstoreResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let north = Uuid::new_v4();
    let south = Uuid::new_v4();
    store
        .create_network(network_row(south, "south", 0, "InitialState", 0))
        .await?;
    store
        .create_network(network_row(north, "north", 0, "InitialState", 0))
        .await?;
    store.clone_variant(north, 0, 1, "V1", false).await?;

    let networks = store.get_networks().await?;
    let ids: Vec<_> = networks.iter().map(|network| network.id.as_str()).collect();
    assert_eq!(ids, vec!["north", "south"]);
    assert_eq!(networks[0].uuid, north);

    assert_eq!(
        store.get_variants_infos(north).await?,
        vec![infos("InitialState", 0, 0), infos("V1", 1, 0)]
    );
    let cloned = store.get_network(north, 1).await?.expect("variant 1 row");
    assert_eq!(cloned.id, "north");
    assert_eq!(cloned.attributes.variant_id, "V1");
    assert_eq!(cloned.attributes.case_date.as_deref(), Some("2025-01-01T00:00:00Z"));

    let mut renamed = cloned.clone();
    renamed.attributes.name = Some("North grid".to_string());
    renamed.attributes.full_variant_num = 1;
    store.update_network(renamed).await?;
    let updated = store.get_network(north, 1).await?.expect("variant 1 row");
    assert_eq!(updated.attributes.name.as_deref(), Some("North grid"));
    assert_eq!(updated.attributes.full_variant_num, 0);

    store.delete_network(north).await?;
    assert!(store.get_variants_infos(north).await?.is_empty());
    assert_eq!(store.get_networks().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn create_network_checks_variant_rules() -> NetstoreResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let uuid = Uuid::new_v4();

    let err = store
        .create_network(network_row(uuid, "grid", 0, "", 0))
        .await
        .expect_err("empty variant id");
    assert!(matches!(err, NetstoreError::Validation { .. }));
    let err = store
        .create_network(network_row(uuid, "grid", 0, "InitialState", 3))
        .await
        .expect_err("partial initial variant");
    assert!(err.is_invariant());

    store
        .create_network(network_row(uuid, "grid", 0, "InitialState", 0))
        .await?;
    let err = store
        .create_network(network_row(uuid, "grid", 0, "Other", 0))
        .await
        .expect_err("duplicate variant number");
    assert!(err.is_invariant());
    let err = store
        .create_network(network_row(uuid, "grid", 2, "V2", 1))
        .await
        .expect_err("missing ancestor");
    assert!(err.is_invariant());
    store
        .create_network(network_row(uuid, "grid", 1, "V1", 1))
        .await?;
    store
        .create_network(network_row(uuid, "grid", 2, "V2", 1))
        .await?;
    assert_eq!(store.get_variants_infos(uuid).await?.len(), 3);
    Ok(())
}

#[tokio::test]
async fn variant_deletion_rules() -> NetstoreResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let uuid = Uuid::new_v4();
    store
        .create_network(network_row(uuid, "grid", 0, "InitialState", 0))
        .await?;
    store
        .create_network(network_row(uuid, "grid", 1, "Full", 1))
        .await?;
    store.create_generators(uuid, vec![generator("G1", 1, 10.0)]).await?;
    store.clone_variant(uuid, 1, 2, "Partial", false).await?;

    let err = store.delete_variant(uuid, 0).await.expect_err("variant 0");
    assert!(err.is_invariant());
    let err = store.delete_variant(uuid, 1).await.expect_err("has dependants");
    assert!(err.is_invariant());
    let err = store.delete_variant(uuid, 7).await.expect_err("unknown");
    assert!(matches!(err, NetstoreError::NotFound { .. }));

    store.delete_variant(uuid, 2).await?;
    store.delete_variant(uuid, 1).await?;
    assert_eq!(
        store.get_variants_infos(uuid).await?,
        vec![infos("InitialState", 0, 0)]
    );
    Ok(())
}

#[tokio::test]
async fn clone_variant_conflicts_need_overwrite() -> NetstoreResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let uuid = Uuid::new_v4();
    store
        .create_network(network_row(uuid, "grid", 0, "InitialState", 0))
        .await?;
    store.create_generators(uuid, vec![generator("G1", 0, 10.0)]).await?;
    store.clone_variant(uuid, 0, 1, "V1", false).await?;
    store
        .update_generators(uuid, vec![generator("G1", 1, 99.0)])
        .await?;

    let err = store
        .clone_variant(uuid, 0, 1, "V1", false)
        .await
        .expect_err("existing target");
    assert!(err.is_invariant());
    let err = store
        .clone_variant(uuid, 0, 2, "V1", false)
        .await
        .expect_err("existing name");
    assert!(err.is_invariant());
    let err = store
        .clone_variant(uuid, 0, 0, "Again", true)
        .await
        .expect_err("onto itself");
    assert!(err.is_invariant());
    let err = store
        .clone_variant(uuid, 1, 2, "InitialState", true)
        .await
        .expect_err("overwrite the initial variant");
    assert!(err.is_invariant());
    let err = store
        .clone_variant(uuid, 0, 2, "", false)
        .await
        .expect_err("empty name");
    assert!(matches!(err, NetstoreError::Validation { .. }));
    let err = store
        .clone_variant(uuid, 5, 2, "V2", false)
        .await
        .expect_err("unknown source");
    assert!(err.is_invariant());

    store.clone_variant(uuid, 0, 1, "V1", true).await?;
    let g1 = store.get_generator(uuid, 1, "G1").await?.expect("G1 in 1");
    assert_eq!(g1.attributes.target_p, 10.0);
    Ok(())
}

#[tokio::test]
async fn clone_network_materializes_orphan_partials() -> NetstoreResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path()).await?;
    let source = Uuid::new_v4();
    store
        .create_network(network_row(source, "grid", 0, "InitialState", 0))
        .await?;
    store
        .create_generators(
            source,
            vec![generator("G1", 0, 10.0), generator("G2", 0, 20.0), generator("G3", 0, 30.0)],
        )
        .await?;
    store
        .upsert_extensions(
            source,
            vec![
                ExtensionResource::new(
                    "G3",
                    ResourceType::Generator,
                    0,
                    "activePowerControl",
                    json!({"droop": 4.0, "participate": true}),
                ),
                ExtensionResource::new(
                    "G3",
                    ResourceType::Generator,
                    0,
                    "cgmesMetadata",
                    json!({"rdfId": "_abc"}),
                ),
            ],
        )
        .await?;
    store.clone_variant(source, 0, 1, "V1", false).await?;
    store
        .update_generators(source, vec![generator("G1", 1, 11.0)])
        .await?;
    store
        .delete_generators(source, 1, &["G2".to_string()])
        .await?;

    let only_partial = Uuid::new_v4();
    store
        .clone_network(only_partial, source, &["V1".to_string()])
        .await?;
    assert_eq!(
        store.get_variants_infos(only_partial).await?,
        vec![infos("V1", 0, 0)]
    );
    let generators = store.get_generators(only_partial, 0).await?;
    let summary: Vec<_> = generators
        .iter()
        .map(|generator| (generator.id.as_str(), generator.attributes.target_p))
        .collect();
    assert_eq!(summary, vec![("G1", 11.0), ("G3", 30.0)]);
    let extensions = store.get_extensions(only_partial, 0, "G3").await?;
    assert_eq!(extensions.keys().collect::<Vec<_>>(), vec!["activePowerControl"]);

    let both = Uuid::new_v4();
    store
        .clone_network(
            both,
            source,
            &["InitialState".to_string(), "V1".to_string()],
        )
        .await?;
    assert_eq!(
        store.get_variants_infos(both).await?,
        vec![infos("InitialState", 0, 0), infos("V1", 1, 0)]
    );
    assert_eq!(store.get_generators(both, 0).await?.len(), 3);
    assert!(store.get_generator(both, 1, "G2").await?.is_none());
    let g1 = store.get_generator(both, 1, "G1").await?.expect("G1");
    assert_eq!(g1.attributes.target_p, 11.0);
    assert!(store.get_extension(both, 1, "G3", "cgmesMetadata").await?.is_none());
    let network = store.get_network(both, 1).await?.expect("network row");
    assert_eq!(network.attributes.uuid, both);

    let err = store
        .clone_network(both, source, &["V1".to_string()])
        .await
        .expect_err("target exists");
    assert!(err.is_invariant());
    let err = store
        .clone_network(Uuid::new_v4(), source, &["Missing".to_string()])
        .await
        .expect_err("unknown variant");
    assert!(err.is_invariant());
    Ok(())
}
