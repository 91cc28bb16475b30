//! Copy-on-write resolution of variant data.
//!
//! The functions here know nothing about tables: callers hand in fetch callbacks
//! that load the rows a given variant owns, and the engine combines the rows of a
//! partial variant with the rows inherited from its full ancestor.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;

use crate::{NetstoreResult, OwnerKeyed, Resource, VariantNum, VariantScope};

/// Items resolved by id whose variant stamp can be rewritten.
pub trait VariantKeyed {
    fn key(&self) -> &str;
    fn stamp(self, variant_num: VariantNum) -> Self;
}

impl<T> VariantKeyed for Resource<T> {
    fn key(&self) -> &str {
        &self.id
    }

    fn stamp(mut self, variant_num: VariantNum) -> Self {
        self.variant_num = variant_num;
        self
    }
}

impl VariantKeyed for String {
    fn key(&self) -> &str {
        self
    }

    fn stamp(self, _variant_num: VariantNum) -> Self {
        self
    }
}

/// Inherited items minus tombstoned ids minus ids the variant overrides, plus
/// the variant's own items, sorted by id.
pub fn merge_set<T: VariantKeyed>(
    variant_num: VariantNum,
    inherited: Vec<T>,
    own: Vec<T>,
    tombstoned: &BTreeSet<String>,
) -> Vec<T> {
    let own_ids: BTreeSet<String> = own.iter().map(|item| item.key().to_string()).collect();
    let mut merged: Vec<T> = inherited
        .into_iter()
        .filter(|item| !tombstoned.contains(item.key()) && !own_ids.contains(item.key()))
        .map(|item| item.stamp(variant_num))
        .collect();
    merged.extend(own);
    merged.sort_by(|a, b| a.key().cmp(b.key()));
    merged
}

/// Resolves every item visible in a variant.
///
/// `full_variant_rows` lets a caller that already loaded the rows of a full
/// variant skip the fetch.
pub async fn resolve_set<T, F, Fut, TF, TFut>(
    scope: VariantScope,
    full_variant_rows: Option<Vec<T>>,
    fetch: F,
    tombstoned_ids: TF,
) -> NetstoreResult<Vec<T>>
where
    T: VariantKeyed,
    F: Fn(VariantNum) -> Fut,
    Fut: Future<Output = NetstoreResult<Vec<T>>>,
    TF: FnOnce() -> TFut,
    TFut: Future<Output = NetstoreResult<BTreeSet<String>>>,
{
    if scope.is_full() {
        return match full_variant_rows {
            Some(rows) => Ok(rows),
            None => fetch(scope.variant_num).await,
        };
    }
    let inherited = fetch(scope.full_variant_num).await?;
    let own = fetch(scope.variant_num).await?;
    let tombstoned = tombstoned_ids().await?;
    Ok(merge_set(scope.variant_num, inherited, own, &tombstoned))
}

/// Resolves a single item; an override in the variant wins over a tombstone.
pub async fn resolve_one<T, F, Fut, TF, TFut>(
    scope: VariantScope,
    fetch: F,
    is_tombstoned: TF,
) -> NetstoreResult<Option<T>>
where
    T: VariantKeyed,
    F: Fn(VariantNum) -> Fut,
    Fut: Future<Output = NetstoreResult<Option<T>>>,
    TF: FnOnce() -> TFut,
    TFut: Future<Output = NetstoreResult<bool>>,
{
    if scope.is_full() {
        return fetch(scope.variant_num).await;
    }
    if let Some(own) = fetch(scope.variant_num).await? {
        return Ok(Some(own));
    }
    if is_tombstoned().await? {
        return Ok(None);
    }
    Ok(fetch(scope.full_variant_num)
        .await?
        .map(|item| item.stamp(scope.variant_num)))
}

/// Inherited entries whose owner is not excluded and whose shadow key the
/// variant does not override, restamped to the variant, plus the own entries.
pub fn merge_map<K: OwnerKeyed, V>(
    variant_num: VariantNum,
    inherited: BTreeMap<K, V>,
    own: BTreeMap<K, V>,
    excluded_owners: &BTreeSet<String>,
) -> BTreeMap<K, V> {
    let shadowed: BTreeSet<String> = own.keys().map(OwnerKeyed::shadow_key).collect();
    let mut merged: BTreeMap<K, V> = inherited
        .into_iter()
        .filter(|(key, _)| {
            !excluded_owners.contains(key.owner_id()) && !shadowed.contains(&key.shadow_key())
        })
        .map(|(key, value)| (key.with_variant(variant_num), value))
        .collect();
    merged.extend(own);
    merged
}

/// Resolves owner-keyed side-table entries.
///
/// Inherited entries disappear when their owner is tombstoned for this kind of
/// entry or tombstoned as a whole equipment.
pub async fn resolve_map<K, V, F, Fut, T1, T1Fut, T2, T2Fut>(
    scope: VariantScope,
    fetch: F,
    tombstoned_for_kind: T1,
    tombstoned_identifiables: T2,
) -> NetstoreResult<BTreeMap<K, V>>
where
    K: OwnerKeyed,
    F: Fn(VariantNum) -> Fut,
    Fut: Future<Output = NetstoreResult<BTreeMap<K, V>>>,
    T1: FnOnce() -> T1Fut,
    T1Fut: Future<Output = NetstoreResult<BTreeSet<String>>>,
    T2: FnOnce() -> T2Fut,
    T2Fut: Future<Output = NetstoreResult<BTreeSet<String>>>,
{
    if scope.is_full() {
        return fetch(scope.variant_num).await;
    }
    let inherited = fetch(scope.full_variant_num).await?;
    let own = fetch(scope.variant_num).await?;
    let mut excluded = tombstoned_for_kind().await?;
    excluded.extend(tombstoned_identifiables().await?);
    Ok(merge_map(scope.variant_num, inherited, own, &excluded))
}

/// Owners whose side-table entries become empty and must hide the entries they
/// inherit.
///
/// Full variants never need tombstones. In a partial variant a candidate is kept
/// only if the ancestor has entries for it and it is not tombstoned yet.
pub async fn owners_to_tombstone<F, Fut, TF, TFut>(
    scope: VariantScope,
    candidates: BTreeSet<String>,
    inherited_owners: F,
    already_tombstoned: TF,
) -> NetstoreResult<BTreeSet<String>>
where
    F: FnOnce(VariantNum, Vec<String>) -> Fut,
    Fut: Future<Output = NetstoreResult<BTreeSet<String>>>,
    TF: FnOnce() -> TFut,
    TFut: Future<Output = NetstoreResult<BTreeSet<String>>>,
{
    if scope.is_full() || candidates.is_empty() {
        return Ok(BTreeSet::new());
    }
    let inherited =
        inherited_owners(scope.full_variant_num, candidates.iter().cloned().collect()).await?;
    let tombstoned = already_tombstoned().await?;
    Ok(candidates
        .into_iter()
        .filter(|id| inherited.contains(id) && !tombstoned.contains(id))
        .collect())
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use proptest::prelude::*;
    use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};
    use uuid::Uuid;

    use super::{merge_map, merge_set, owners_to_tombstone, resolve_map, resolve_one, resolve_set};
    use crate::{
        ExtensionOwnerInfo, LoadAttributes, NetstoreResult, OwnerInfo, Resource, ResourceType,
        VariantNum, VariantScope,
    };

    fn load(id: &str, variant_num: VariantNum, p0: f64) -> Resource<LoadAttributes> {
        Resource::new(
            id,
            variant_num,
            LoadAttributes {
                p0,
                ..LoadAttributes::default()
            },
        )
    }

    fn ids(items: &[Resource<LoadAttributes>]) -> Vec<&str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[tokio::test]
    async fn full_variant_reads_only_itself() -> NetstoreResult<()> {
        let scope = VariantScope::full(0);
        let rows = resolve_set(
            scope,
            None,
            |variant| async move { Ok(vec![load("L1", variant, 1.0)]) },
            || async { panic!("full variants have no tombstones") },
        )
        .await?;
        assert_eq!(ids(&rows), vec!["L1"]);
        Ok(())
    }

    #[tokio::test]
    async fn shortcut_skips_fetch_for_full_variants() -> NetstoreResult<()> {
        let rows = resolve_set(
            VariantScope::full(2),
            Some(vec![load("L9", 2, 0.0)]),
            |_| async { panic!("shortcut must be used") },
            || async { Ok(BTreeSet::new()) },
        )
        .await?;
        assert_eq!(ids(&rows), vec!["L9"]);
        Ok(())
    }

    #[tokio::test]
    async fn partial_variant_overrides_and_hides_inherited_rows() -> NetstoreResult<()> {
        let scope = VariantScope::partial(1, 0);
        let rows = resolve_set(
            scope,
            None,
            |variant| async move {
                Ok(if variant == 0 {
                    vec![load("L1", 0, 1.0), load("L2", 0, 2.0), load("L3", 0, 3.0)]
                } else {
                    vec![load("L2", 1, 20.0), load("L4", 1, 4.0)]
                })
            },
            || async { Ok(set(&["L3"])) },
        )
        .await?;
        assert_eq!(ids(&rows), vec!["L1", "L2", "L4"]);
        assert!(rows.iter().all(|row| row.variant_num == 1));
        assert_eq!(rows[1].attributes.p0, 20.0);
        Ok(())
    }

    #[tokio::test]
    async fn resolve_one_prefers_own_then_tombstone_then_ancestor() -> NetstoreResult<()> {
        let scope = VariantScope::partial(3, 0);
        let inherited = resolve_one(
            scope,
            |variant| async move { Ok((variant == 0).then(|| load("L1", 0, 1.0))) },
            || async { Ok(false) },
        )
        .await?;
        assert_eq!(inherited.map(|row| row.variant_num), Some(3));

        let deleted = resolve_one(
            scope,
            |variant| async move { Ok((variant == 0).then(|| load("L1", 0, 1.0))) },
            || async { Ok(true) },
        )
        .await?;
        assert!(deleted.is_none());

        let recreated = resolve_one(
            scope,
            |variant| async move { Ok(Some(load("L1", variant, 5.0))) },
            || async { Ok(true) },
        )
        .await?;
        assert_eq!(recreated.map(|row| row.attributes.p0), Some(5.0));
        Ok(())
    }

    #[test]
    fn merge_set_tombstoning_twice_is_idempotent() {
        let inherited = vec![load("L1", 0, 1.0), load("L2", 0, 2.0)];
        let once = merge_set(1, inherited.clone(), Vec::new(), &set(&["L1"]));
        let twice = merge_set(1, once.clone(), Vec::new(), &set(&["L1", "L1"]));
        assert_eq!(ids(&once), ids(&twice));
    }

    fn owner(id: &str, variant_num: VariantNum) -> OwnerInfo {
        OwnerInfo::new(Uuid::nil(), variant_num, id, ResourceType::Line)
    }

    #[tokio::test]
    async fn resolve_map_drops_owners_tombstoned_either_way() -> NetstoreResult<()> {
        let scope = VariantScope::partial(1, 0);
        let resolved = resolve_map(
            scope,
            |variant| async move {
                Ok(if variant == 0 {
                    BTreeMap::from([
                        (owner("L1", 0), 1),
                        (owner("L2", 0), 2),
                        (owner("L3", 0), 3),
                        (owner("L4", 0), 4),
                    ])
                } else {
                    BTreeMap::from([(owner("L4", 1), 40)])
                })
            },
            || async { Ok(set(&["L2"])) },
            || async { Ok(set(&["L3"])) },
        )
        .await?;
        let entries: Vec<(String, VariantNum, i32)> = resolved
            .into_iter()
            .map(|(key, value)| (key.equipment_id, key.variant_num, value))
            .collect();
        assert_eq!(
            entries,
            vec![("L1".to_string(), 1, 1), ("L4".to_string(), 1, 40)]
        );
        Ok(())
    }

    #[test]
    fn merge_map_shadows_extensions_per_name() {
        let extension = |name: &str, variant_num| ExtensionOwnerInfo {
            owner: owner("G1", variant_num),
            name: name.to_string(),
        };
        let inherited = BTreeMap::from([(extension("a", 0), "a0"), (extension("b", 0), "b0")]);
        let own = BTreeMap::from([(extension("a", 2), "a2")]);
        let merged = merge_map(2, inherited, own, &BTreeSet::new());
        let values: Vec<&str> = merged.values().copied().collect();
        assert_eq!(values, vec!["a2", "b0"]);
    }

    #[tokio::test]
    async fn only_inherited_untombstoned_owners_need_tombstones() -> NetstoreResult<()> {
        let candidates = set(&["L1", "L2", "L3"]);
        let tombstones = owners_to_tombstone(
            VariantScope::partial(1, 0),
            candidates.clone(),
            |full, ids| async move {
                assert_eq!(full, 0);
                Ok(ids.into_iter().filter(|id| id != "L3").collect())
            },
            || async { Ok(set(&["L2"])) },
        )
        .await?;
        assert_eq!(tombstones, set(&["L1"]));

        let none = owners_to_tombstone(
            VariantScope::full(0),
            candidates,
            |_, _| async { panic!("full variants never tombstone") },
            || async { Ok(BTreeSet::new()) },
        )
        .await?;
        assert!(none.is_empty());
        Ok(())
    }

    #[test]
    fn partial_resolution_matches_set_algebra() {
        const SEED_BYTES: [u8; 32] = [
            0x17, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, 0, 0, 0,
        ];
        let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
        let mut runner = TestRunner::new_with_rng(PropConfig::default(), rng);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        let id_set = || prop::collection::btree_set(0u8..48, 0..24);

        runner
            .run(
                &(id_set(), id_set(), id_set()),
                |(ancestor, own, tombstoned)| {
                    let name = |n: &u8| format!("id{n:02}");
                    let ancestor_rows: Vec<_> =
                        ancestor.iter().map(|n| load(&name(n), 0, 0.0)).collect();
                    let own_rows: Vec<_> = own.iter().map(|n| load(&name(n), 5, 1.0)).collect();
                    let tombstoned_ids: BTreeSet<String> = tombstoned.iter().map(name).collect();

                    let resolved = runtime
                        .block_on(resolve_set(
                            VariantScope::partial(5, 0),
                            None,
                            |variant| {
                                let rows = if variant == 0 {
                                    ancestor_rows.clone()
                                } else {
                                    own_rows.clone()
                                };
                                async move { Ok(rows) }
                            },
                            || async { Ok(tombstoned_ids.clone()) },
                        ))
                        .expect("resolve");

                    let expected: BTreeSet<String> = ancestor
                        .iter()
                        .filter(|n| !tombstoned.contains(n) && !own.contains(n))
                        .chain(own.iter())
                        .map(name)
                        .collect();
                    let actual: BTreeSet<String> =
                        resolved.iter().map(|row| row.id.clone()).collect();
                    prop_assert_eq!(&actual, &expected);
                    prop_assert_eq!(resolved.len(), expected.len());
                    for row in &resolved {
                        prop_assert_eq!(row.variant_num, 5);
                        let from_own = own.iter().any(|n| name(n) == row.id);
                        prop_assert_eq!(row.attributes.p0, if from_own { 1.0 } else { 0.0 });
                    }
                    Ok(())
                },
            )
            .expect("property holds");
    }
}
