#![cfg(test)]

// Property tests for PrimeHashMap kept inside the crate so they can inspect
// bucket placement directly.

use crate::allocator::DefaultAllocator;
use crate::config::{Config, Ratio};
use crate::policy::{DefaultKeyFuncs, KeyFuncs, PanicOnFailure};
use crate::prime_hash_map::PrimeHashMap;
use crate::primes::{magic_number_rem, PRIMES};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Set(usize, i32),
    Remove(usize),
    RemoveEntry(usize),
    Lookup(usize),
    Mutate(usize, i32),
    RemoveAll,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,6}", 1..=48).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let op = prop_oneof![
            8 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Set(i, v)),
            3 => idx.clone().prop_map(OpI::Remove),
            1 => idx.clone().prop_map(OpI::RemoveEntry),
            3 => idx.clone().prop_map(OpI::Lookup),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            1 => Just(OpI::RemoveAll),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..200).prop_map(move |ops| (pool.clone(), ops))
    })
}

// Structural invariants that only the crate itself can see:
// - the bucket array length equals the current prime (or 0 when empty);
// - every node sits in the bucket its hash maps to;
// - the number of reachable nodes equals `count`, and `count <= max`.
fn check_structure<F>(m: &PrimeHashMap<String, i32, F>) -> Result<(), TestCaseError>
where
    F: KeyFuncs<String>,
{
    let prime = m.size_info.prime;
    prop_assert_eq!(m.buckets.len(), prime);
    prop_assert!(prime == 0 || PRIMES.iter().any(|p| p.prime == prime));
    prop_assert!(m.count <= m.max || prime == 0);

    let mut reachable = 0u32;
    for (index, head) in m.buckets.as_slice().iter().enumerate() {
        let mut cur = *head;
        while let Some(node) = cur {
            let n = unsafe { node.as_ref() };
            let hash = m.key_funcs.hash(&n.key);
            prop_assert_eq!(magic_number_rem(hash, &m.size_info) as usize, index);
            reachable += 1;
            cur = n.next;
        }
    }
    prop_assert_eq!(reachable, m.count);
    Ok(())
}

fn run<F>(
    mut sut: PrimeHashMap<String, i32, F>,
    pool: Vec<String>,
    ops: Vec<OpI>,
) -> Result<(), TestCaseError>
where
    F: KeyFuncs<String> + KeyFuncs<str>,
{
    let mut model: HashMap<String, i32> = HashMap::new();

    for op in ops {
        match op {
            OpI::Set(i, v) => {
                let k = pool[i].clone();
                let existed = sut.set(k.clone(), v);
                prop_assert_eq!(existed, model.insert(k, v).is_some());
            }
            OpI::Remove(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.remove(k.as_str()), model.remove(k).is_some());
                prop_assert!(sut.lookup(k.as_str()).is_none());
            }
            OpI::RemoveEntry(i) => {
                let k = &pool[i];
                let expected = model.remove_entry(k);
                prop_assert_eq!(sut.remove_entry(k.as_str()), expected);
            }
            OpI::Lookup(i) => {
                let k = &pool[i];
                prop_assert_eq!(sut.lookup(k.as_str()), model.get(k).copied());
                prop_assert_eq!(sut.contains_key(k.as_str()), model.contains_key(k));
            }
            OpI::Mutate(i, d) => {
                let k = &pool[i];
                match (sut.get_mut(k.as_str()), model.get_mut(k)) {
                    (Some(sv), Some(mv)) => {
                        *sv = sv.wrapping_add(d);
                        *mv = mv.wrapping_add(d);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "presence mismatch: {:?} vs {:?}", s, m),
                }
            }
            OpI::RemoveAll => {
                sut.remove_all();
                model.clear();
                prop_assert_eq!(sut.capacity(), 0);
                for k in &pool {
                    prop_assert!(sut.lookup(k.as_str()).is_none());
                }
            }
            OpI::Iterate => {
                let s_keys: Vec<&String> = sut.keys().collect();
                let unique: BTreeSet<&String> = s_keys.iter().copied().collect();
                prop_assert_eq!(unique.len(), s_keys.len(), "keys must not repeat");
                let m_keys: BTreeSet<&String> = model.keys().collect();
                prop_assert_eq!(unique, m_keys);
                for (k, v) in sut.iter() {
                    prop_assert_eq!(Some(v), model.get(k));
                }
            }
        }

        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        check_structure(&sut)?;
    }
    Ok(())
}

// Property: State-machine equivalence against std::collections::HashMap.
// Invariants exercised across random operation sequences:
// - `count` equals the number of distinct keys present.
// - `set` then `lookup` yields the value, across any number of growths.
// - `remove` makes the key absent; `remove_all` empties the table.
// - iteration yields each live key exactly once.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        run(PrimeHashMap::new(), pool, ops)?;
    }
}

/// Every key hashes to the same value, so all entries share one chain.
#[derive(Clone, Copy, Default)]
struct ConstKeyFuncs;

impl KeyFuncs<str> for ConstKeyFuncs {
    fn hash(&self, _key: &str) -> u32 {
        0
    }
    fn equals(&self, a: &str, b: &str) -> bool {
        a == b
    }
}

impl KeyFuncs<String> for ConstKeyFuncs {
    fn hash(&self, _key: &String) -> u32 {
        0
    }
    fn equals(&self, a: &String, b: &String) -> bool {
        a == b
    }
}

// Property: Same state-machine invariants as above, under worst-case
// collision behavior. This stresses chain splicing at every position.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let sut = PrimeHashMap::with_parts(
            Config::default(),
            ConstKeyFuncs,
            DefaultAllocator,
            PanicOnFailure,
        );
        run(sut, pool, ops)?;
    }
}

// Property: Same invariants under randomly chosen valid growth and density
// factors, so growth happens at many different thresholds.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_random_config(
        growth in (1u32..=8, 1u32..=8).prop_filter("growth > 1", |(n, d)| n > d),
        density in (1u32..=8, 1u32..=8).prop_filter("density < 1", |(n, d)| n < d),
        minimum in 0u32..=64,
        (pool, ops) in arb_scenario(),
    ) {
        let config = Config::new(
            Ratio::new(growth.0, growth.1),
            Ratio::new(density.0, density.1),
            minimum,
        ).expect("filtered to a valid config");
        let sut: PrimeHashMap<String, i32> = PrimeHashMap::with_parts(
            config,
            DefaultKeyFuncs::default(),
            DefaultAllocator,
            PanicOnFailure,
        );
        run(sut, pool, ops)?;
    }
}
