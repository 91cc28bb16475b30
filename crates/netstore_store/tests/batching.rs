use std::path::Path;

use netstore_store::{
    BatchConfig, GeneratorAttributes, IdentifiableApi, NetstoreConfig, NetstoreResult, NetworkApi,
    NetworkAttributes, NetworkStore, ReactiveCapabilityCurveAttributes,
    ReactiveCapabilityCurvePointAttributes, ReactiveLimitsAttributes, Resource, ResourceType,
};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use tempfile::tempdir;
use uuid::Uuid;

// Two rows per insert and `IN` lists of four ids.
fn small_batches(base: &Path) -> NetstoreConfig {
    let mut config = NetstoreConfig::default_sqlite(base.join("grid.sqlite").to_string_lossy());
    config.batch = Some(BatchConfig {
        batch_size: Some(2),
        max_bind_params: Some(12),
    });
    config
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

fn curve_generator(index: usize, variant_num: i32, max_q: f64) -> Resource<GeneratorAttributes> {
    let point = |p: f64, min_q: f64, max_q: f64| ReactiveCapabilityCurvePointAttributes {
        p,
        min_q,
        max_q,
    };
    Resource::new(
        format!("G{index}"),
        variant_num,
        GeneratorAttributes {
            voltage_level_id: "VL1".to_string(),
            target_p: index as f64,
            reactive_limits: Some(ReactiveLimitsAttributes::Curve(
                ReactiveCapabilityCurveAttributes {
                    points: vec![point(0.0, -max_q, max_q), point(50.0, -max_q / 2.0, max_q)],
                },
            )),
            ..GeneratorAttributes::default()
        },
    )
}

fn ids(indices: impl IntoIterator<Item = usize>) -> Vec<String> {
    indices.into_iter().map(|index| format!("G{index}")).collect()
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
async fn writes_and_reads_span_several_chunks() -> NetstoreResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = NetworkStore::connect(&small_batches(dir.path()), dir.path()).await?;
    let network = new_network(&store).await?;
    let created: Vec<_> = (1..=9).map(|index| curve_generator(index, 0, 10.0)).collect();
    store.create_generators(network, created.clone()).await?;

    assert_eq!(store.get_generators(network, 0).await?.len(), 9);
    for generator in &created {
        let read = store
            .get_generator(network, 0, &generator.id)
            .await?
            .expect("generator");
        assert_eq!(&read, generator);
    }
    assert_eq!(count_rows(&store, "reactive_capability_curve_points").await?, 9);

    store.clone_variant(network, 0, 1, "V1", false).await?;
    store
        .update_generators(
            network,
            (1..=6).map(|index| curve_generator(index, 1, 20.0)).collect(),
        )
        .await?;
    store.delete_generators(network, 1, &ids(7..=9)).await?;

    let resolved = store.get_generators(network, 1).await?;
    assert_eq!(
        resolved.iter().map(|generator| generator.id.clone()).collect::<Vec<_>>(),
        ids(1..=6)
    );
    assert!(resolved.iter().all(|generator| generator.variant_num == 1));
    for index in 1..=6 {
        let read = store
            .get_generator(network, 1, &format!("G{index}"))
            .await?
            .expect("override");
        assert_eq!(read.attributes, curve_generator(index, 1, 20.0).attributes);
    }
    assert_eq!(store.get_identifiables_ids(network, 1).await?, ids(1..=6));
    assert_eq!(store.get_identifiables_ids(network, 0).await?.len(), 9);

    store
        .create_generators(
            network,
            (7..=9).map(|index| curve_generator(index, 1, 30.0)).collect(),
        )
        .await?;
    assert_eq!(store.get_generators(network, 1).await?.len(), 9);
    let revived = store.get_generator(network, 1, "G9").await?.expect("G9");
    assert_eq!(revived.attributes, curve_generator(9, 1, 30.0).attributes);
    Ok(())
}

#[tokio::test]
async fn chunked_create_rolls_back_as_a_whole() -> NetstoreResult<()> {
    let dir = tempdir().expect("tempdir");
    let mut config = small_batches(dir.path());
    config.failpoints = Some(vec!["after_external_attributes_insert".to_string()]);
    let store = NetworkStore::connect(&config, dir.path()).await?;
    let network = new_network(&store).await?;

    let result = store
        .create_generators(
            network,
            (1..=7).map(|index| curve_generator(index, 0, 10.0)).collect(),
        )
        .await;
    assert!(result.is_err());
    assert_eq!(count_rows(&store, "generator").await?, 0);
    assert_eq!(count_rows(&store, "reactive_capability_curve_points").await?, 0);
    assert!(store.get_generators(network, 0).await?.is_empty());
    Ok(())
}
