use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::{BTreeMap, HashMap, HashSet};

fn validate_store<V>(s: &KeyedStore<V>) {
    let lengths = s.bucket_lengths();
    assert_eq!(lengths.len(), s.capacity());
    assert_eq!(
        lengths.iter().sum::<usize>(),
        s.len(),
        "chain lengths must add up to KeyedStore::len"
    );
    assert_eq!(s.get_all_values().len(), s.len());
    for (key, value) in s.iter() {
        assert!(
            std::ptr::eq(s.search(key).expect("listed key must be searchable"), value),
            "search must find the listed entry for {key:?}"
        );
    }
}

// A narrow alphabet keeps keys colliding, both on equality and on buckets.
fn key_strategy() -> impl Strategy<Value = String> {
    "[A-C]{0,2}[0-9]{0,2}"
}

fn loan_id_strategy() -> impl Strategy<Value = i64> {
    -64i64..64
}

#[derive(Clone, Debug, Arbitrary)]
enum StoreOp {
    #[proptest(weight = 50)]
    Insert(#[proptest(strategy = "key_strategy()")] String, u32),
    #[proptest(weight = 25)]
    Delete(#[proptest(strategy = "key_strategy()")] String),
    #[proptest(weight = 24)]
    Search(#[proptest(strategy = "key_strategy()")] String),
    #[proptest(weight = 1)]
    Clear,
}

#[derive(Clone, Debug, Arbitrary)]
enum IndexOp {
    #[proptest(weight = 50)]
    Insert(#[proptest(strategy = "loan_id_strategy()")] i64, u32),
    #[proptest(weight = 25)]
    Delete(#[proptest(strategy = "loan_id_strategy()")] i64),
    #[proptest(weight = 25)]
    Search(#[proptest(strategy = "loan_id_strategy()")] i64),
}

fn run_index_ops(ops: Vec<IndexOp>, policy: DeletePolicy) -> Result<(), TestCaseError> {
    let mut t: OrderedIndex<i64, u32> = OrderedIndex::with_config(IndexConfig {
        delete_policy: policy,
    });
    let mut m: BTreeMap<i64, u32> = BTreeMap::new();
    let mut deleted_any = false;

    for op in ops {
        match op {
            IndexOp::Insert(key, value) => {
                prop_assert_eq!(t.insert(key, value), m.insert(key, value));
            }
            IndexOp::Delete(key) => {
                let old_t = t.delete(&key);
                deleted_any |= old_t.is_some();
                prop_assert_eq!(old_t, m.remove(&key));
            }
            IndexOp::Search(key) => {
                prop_assert_eq!(t.search(&key), m.get(&key));
            }
        }

        prop_assert_eq!(t.len(), m.len());
        t.check_structure().map_err(|e| TestCaseError::fail(e.to_string()))?;
        if policy == DeletePolicy::Rebalance || !deleted_any {
            t.check_invariants()
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
        }
    }

    let got: Vec<(i64, u32)> = t.iter().map(|(k, v)| (*k, *v)).collect();
    let expected: Vec<(i64, u32)> = m.into_iter().collect();
    prop_assert_eq!(got, expected);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_store_equivalence(
        capacity in 1usize..16,
        ops in prop::collection::vec(any::<StoreOp>(), 0..=1000),
    ) {
        let mut s: KeyedStore<u32> = KeyedStore::with_capacity(capacity).unwrap();
        let mut m: HashMap<String, u32> = HashMap::new();

        for op in ops {
            match op {
                StoreOp::Insert(key, value) => {
                    let old_m = m.insert(key.clone(), value);
                    prop_assert_eq!(s.insert(key, value), old_m);
                }
                StoreOp::Delete(key) => {
                    prop_assert_eq!(s.delete(&key), m.remove(&key));
                }
                StoreOp::Search(key) => {
                    prop_assert_eq!(s.search(&key), m.get(&key));
                }
                StoreOp::Clear => {
                    s.clear();
                    m.clear();
                }
            }

            prop_assert_eq!(s.len(), m.len());
        }

        validate_store(&s);
        prop_assert_eq!(s.capacity(), capacity);
    }

    #[test]
    fn prop_store_round_trip(keys in prop::collection::hash_set(key_strategy(), 0..200)) {
        let mut s: KeyedStore<String> = KeyedStore::new();
        for key in &keys {
            s.insert(key.as_str(), key.clone());
        }
        let values: HashSet<&String> = s.get_all_values().into_iter().collect();
        prop_assert_eq!(values.len(), keys.len());
        for key in &keys {
            prop_assert_eq!(s.search(key), Some(key));
        }
    }

    #[test]
    fn prop_index_insert_only_stays_avl(keys in prop::collection::vec(any::<i32>(), 0..500)) {
        let mut t: OrderedIndex<i32, usize> = OrderedIndex::new();
        for (i, k) in keys.iter().enumerate() {
            t.insert(*k, i);
            t.check_invariants().map_err(|e| TestCaseError::fail(e.to_string()))?;
        }
        let got = t.keys();
        prop_assert!(got.windows(2).all(|w| w[0] < w[1]), "in-order keys must ascend");
        let n = t.len() as f64;
        prop_assert!(t.height() as f64 <= 1.45 * (n + 2.0).log2());
    }

    #[test]
    fn prop_index_equivalence_height_only(ops in prop::collection::vec(any::<IndexOp>(), 0..=1000)) {
        run_index_ops(ops, DeletePolicy::HeightOnly)?;
    }

    #[test]
    fn prop_index_equivalence_rebalance(ops in prop::collection::vec(any::<IndexOp>(), 0..=1000)) {
        run_index_ops(ops, DeletePolicy::Rebalance)?;
    }

    #[test]
    fn prop_merge_sort_stable(data in prop::collection::vec(0u8..8, 0..300)) {
        let tagged: Vec<(u8, usize)> = data.iter().copied().zip(0..).collect();
        let sorted = merge_sort_by_key(&tagged, |p| p.0, SortOrder::Ascending);

        let mut expected = tagged.clone();
        expected.sort_by_key(|p| p.0);
        prop_assert_eq!(&sorted, &expected);

        // Idempotent.
        let again = merge_sort_by_key(&sorted, |p| p.0, SortOrder::Ascending);
        prop_assert_eq!(again, sorted);
    }

    #[test]
    fn prop_merge_sort_descending(data in prop::collection::vec(any::<i16>(), 0..300)) {
        let sorted = merge_sort(&data, SortOrder::Descending);
        let mut expected = data.clone();
        expected.sort_by(|a, b| b.cmp(a));
        prop_assert_eq!(sorted, expected);
    }

    #[test]
    fn prop_count_frequencies_by_matches_hashmap(data in prop::collection::vec(0u8..10, 0..300)) {
        let counts = count_frequencies_by(&data, |v| Some(*v));

        let mut expected: HashMap<u8, usize> = HashMap::new();
        for v in &data {
            *expected.entry(*v).or_default() += 1;
        }
        prop_assert_eq!(counts.len(), expected.len());
        for (value, count) in &counts {
            prop_assert_eq!(expected.get(value), Some(count));
        }

        let mut first_seen: Vec<u8> = Vec::new();
        for v in &data {
            if !first_seen.contains(v) {
                first_seen.push(*v);
            }
        }
        let order: Vec<u8> = counts.iter().map(|(v, _)| *v).collect();
        prop_assert_eq!(order, first_seen);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys: Vec<i64> = vec![10, 20, 25, 30, 40, 50, 60];

    for_each_permutation(&keys, |perm| {
        let mut t: OrderedIndex<i64, usize> = OrderedIndex::new();
        for (i, k) in perm.iter().enumerate() {
            assert_eq!(t.insert(*k, i), None);
            t.check_invariants().unwrap();
        }
        assert_eq!(t.keys(), keys);
        assert!(t.height() <= 4, "order {perm:?} gave height {}", t.height());
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let keys: Vec<i64> = vec![1, 2, 3, 4, 5, 6];

    for policy in [DeletePolicy::HeightOnly, DeletePolicy::Rebalance] {
        let mut base: OrderedIndex<i64, i64> =
            OrderedIndex::with_config(IndexConfig { delete_policy: policy });
        base.extend(keys.iter().map(|k| (*k, *k * 10)));

        for_each_permutation(&keys, |perm| {
            let mut t = base.clone();
            let mut m: BTreeMap<i64, i64> = keys.iter().map(|k| (*k, *k * 10)).collect();

            for k in perm {
                assert_eq!(t.delete(&k), m.remove(&k));
                assert_eq!(t.len(), m.len());
                t.check_structure().unwrap();
                if policy == DeletePolicy::Rebalance {
                    t.check_invariants().unwrap();
                }
                assert_eq!(t.keys(), m.keys().copied().collect::<Vec<_>>());
            }
            assert!(t.is_empty());
            assert_eq!(t.height(), 0);
        });
    }
}

#[test]
fn exhaustive_chain_delete_orders() {
    let keys = ["a", "b", "c", "d", "e"];

    for_each_permutation(&keys, |perm| {
        // Single bucket: every delete walks and relinks the same chain.
        let mut s: KeyedStore<usize> = KeyedStore::with_capacity(1).unwrap();
        for (i, k) in keys.iter().enumerate() {
            s.insert(*k, i);
        }
        let mut remaining: Vec<&str> = keys.iter().rev().copied().collect();
        for k in perm {
            assert!(s.delete(k).is_some());
            remaining.retain(|r| *r != k);
            let order: Vec<&str> = s.iter().map(|(key, _)| key).collect();
            assert_eq!(order, remaining);
        }
        assert!(s.is_empty());
    });
}

#[test]
fn shuffled_workload_matches_model() {
    use rand::seq::SliceRandom;
    use rand::{rngs::StdRng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut ids: Vec<i64> = (0..2_000).collect();
    ids.shuffle(&mut rng);

    let mut t: OrderedIndex<i64, i64> = OrderedIndex::new();
    let mut s: KeyedStore<i64> = KeyedStore::new();
    for id in &ids {
        t.insert(*id, *id);
        s.insert(format!("RD{id:05}"), *id);
    }
    t.check_invariants().unwrap();
    validate_store(&s);

    ids.shuffle(&mut rng);
    for id in ids.iter().take(1_000) {
        assert_eq!(t.delete(id), Some(*id));
        assert_eq!(s.delete(&format!("RD{id:05}")), Some(*id));
    }
    t.check_structure().unwrap();
    validate_store(&s);
    assert_eq!(t.len(), 1_000);
    assert_eq!(s.len(), 1_000);
}
