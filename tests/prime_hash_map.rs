// PrimeHashMap integration test suite.
//
// Each test documents what behavior is being verified and which
// invariants are assumed or asserted. The core invariants exercised:
// - Uniqueness: one entry per key; `set` on a present key updates in place.
// - Growth: capacities follow the prime table, every mapping survives growth.
// - Ownership: every node and bucket array goes back to the allocator.
// - Failure: a failed growth or allocation leaves the table as it was.
use primehash::{
    next_prime, Allocator, Behavior, Config, DefaultAllocator, Failure, IntKeyFuncs, KeyFuncs,
    PanicOnFailure, PrimeHashMap, Ratio, PRIMES,
};
use std::alloc::Layout;
use std::cell::Cell;
use std::collections::BTreeSet;

/// Allocator that tracks live allocations and refuses requests past a byte budget.
struct Budget {
    limit: Cell<usize>,
    bytes: Cell<usize>,
    live: Cell<usize>,
    refused: Cell<usize>,
}

impl Budget {
    fn new(limit: usize) -> Self {
        Self {
            limit: Cell::new(limit),
            bytes: Cell::new(0),
            live: Cell::new(0),
            refused: Cell::new(0),
        }
    }

    fn unlimited() -> Self {
        Self::new(usize::MAX)
    }
}

impl Allocator for Budget {
    unsafe fn allocate(&self, layout: Layout) -> *mut u8 {
        let wanted = self.bytes.get() + layout.size();
        if wanted > self.limit.get() {
            self.refused.set(self.refused.get() + 1);
            return std::ptr::null_mut();
        }
        self.bytes.set(wanted);
        self.live.set(self.live.get() + 1);
        unsafe { DefaultAllocator.allocate(layout) }
    }

    unsafe fn deallocate(&self, ptr: *mut u8, layout: Layout) {
        self.bytes.set(self.bytes.get() - layout.size());
        self.live.set(self.live.get() - 1);
        unsafe { DefaultAllocator.deallocate(ptr, layout) }
    }
}

type IntMap<'a, B = PanicOnFailure> = PrimeHashMap<u32, u64, IntKeyFuncs, &'a Budget, B>;

fn int_map(budget: &Budget) -> IntMap<'_> {
    PrimeHashMap::with_parts(Config::default(), IntKeyFuncs, budget, PanicOnFailure)
}

// Test: set-then-set on one key.
// Assumes: the first set inserts, the second replaces.
// Verifies: returns (false, true), the last value wins, count stays 1.
#[test]
fn set_same_key_twice() {
    let mut m: PrimeHashMap<u32, &str> = PrimeHashMap::new();
    let first = m.set(5, "a");
    let second = m.set(5, "b");
    assert_eq!((first, second), (false, true));
    assert_eq!(m.lookup(&5), Some("b"));
    assert_eq!(m.count(), 1);
}

// Test: growth sequence with growth 3/2, density 3/4, minimum allocation 7.
// Assumes: keys hash to themselves, so placement is deterministic.
// Verifies: each capacity is the first table prime at or above the computed
// target, and after every growth all keys keep their original values.
#[test]
fn growth_follows_prime_table() {
    let config = Config::new(Ratio::new(3, 2), Ratio::new(3, 4), 7).unwrap();
    let mut m: PrimeHashMap<u32, u64, IntKeyFuncs> =
        PrimeHashMap::with_parts(config, IntKeyFuncs, DefaultAllocator, PanicOnFailure);

    let mut capacities = Vec::new();
    for k in 1..=600u32 {
        let before = (m.count(), m.capacity());
        assert!(!m.set(k, k as u64 * 3));
        if m.capacity() != before.1 {
            let (count, old_capacity) = before;
            let target = (count * 3 / 2 * 4 / 3).max(7).max(old_capacity + 1);
            assert_eq!(m.size_info(), next_prime(target).unwrap());
            capacities.push(m.capacity());
            for j in 1..=k {
                assert_eq!(m.lookup(&j), Some(j as u64 * 3), "key {} lost in growth", j);
            }
        }
        assert!(m.count() <= m.growth_threshold());
    }
    assert_eq!(capacities, vec![11, 23, 59, 131, 239, 433, 761, 1399]);
    assert_eq!(m.count(), 600);
}

// Test: thresholds follow the density factor.
// Assumes: max = floor(prime * 3 / 4).
// Verifies: the table grows on the set after count reaches max, not before.
#[test]
fn growth_happens_at_threshold() {
    let mut m: PrimeHashMap<u32, ()> = PrimeHashMap::new();
    m.set(0, ());
    assert_eq!((m.capacity(), m.growth_threshold()), (11, 8));
    for k in 1..8 {
        m.set(k, ());
    }
    assert_eq!(m.capacity(), 11, "8 entries fit in 11 buckets");
    m.set(8, ());
    assert_eq!((m.capacity(), m.growth_threshold()), (23, 17));
}

// Test: removal never shrinks.
// Assumes: growth is one-way.
// Verifies: capacity is unchanged after removing every key.
#[test]
fn remove_never_shrinks() {
    let mut m: PrimeHashMap<u32, u32> = PrimeHashMap::new();
    for k in 0..100 {
        m.set(k, k);
    }
    let capacity = m.capacity();
    for k in 0..100 {
        assert!(m.remove(&k));
    }
    assert!(m.is_empty());
    assert_eq!(m.capacity(), capacity);
    assert!(!m.remove(&0));
}

// Test: remove_all.
// Assumes: every previously inserted key was present.
// Verifies: all lookups miss, count is 0, the table is reusable.
#[test]
fn remove_all_forgets_everything() {
    let mut m: PrimeHashMap<String, usize> = PrimeHashMap::new();
    let keys: Vec<String> = (0..50).map(|i| format!("k{}", i)).collect();
    for (i, k) in keys.iter().enumerate() {
        m.set(k.clone(), i);
    }
    m.remove_all();
    assert_eq!(m.count(), 0);
    for k in &keys {
        assert_eq!(m.lookup(k.as_str()), None);
    }
    m.set("again".to_string(), 1);
    assert_eq!(m.lookup("again"), Some(1));
}

// Test: iteration is lazy and restartable from current contents.
// Assumes: iteration is bucket-major.
// Verifies: a second `keys()` reflects mutations made between traversals,
// and with identity hashing keys come out in bucket order.
#[test]
fn keys_restart_from_current_contents() {
    let mut m: PrimeHashMap<u32, (), IntKeyFuncs> = PrimeHashMap::with_parts(
        Config::default(),
        IntKeyFuncs,
        DefaultAllocator,
        PanicOnFailure,
    );
    for k in [7u32, 3, 9, 1] {
        m.set(k, ());
    }
    let first: Vec<u32> = m.keys().copied().collect();
    assert_eq!(first, vec![1, 3, 7, 9]);

    m.remove(&3);
    m.set(5, ());
    // 16 lands in bucket 5 (16 % 11), ahead of key 5 because chains are LIFO.
    m.set(16, ());
    let second: Vec<u32> = m.keys().copied().collect();
    assert_eq!(second, vec![1, 16, 5, 7, 9]);
    assert_eq!(m.keys().len(), 5);
}

// Test: iterator adapters over references.
// Assumes: `&map` and `&mut map` implement IntoIterator.
// Verifies: for-loops see every entry; mutable loop writes persist.
#[test]
fn into_iterator_for_references() {
    let mut m: PrimeHashMap<String, i32> = PrimeHashMap::new();
    m.extend((0..20).map(|i| (format!("k{}", i), i)));
    for (_k, v) in &mut m {
        *v *= 2;
    }
    let mut total = 0;
    for (_k, v) in &m {
        total += *v;
    }
    assert_eq!(total, 2 * (0..20).sum::<i32>());
    let keys: BTreeSet<&String> = m.keys().collect();
    assert_eq!(keys.len(), 20);
}

// Test: allocator ownership.
// Assumes: one allocation per node plus one per bucket array.
// Verifies: growth frees the old array, removal frees the node, remove_all and
// drop return everything to the allocator.
#[test]
fn allocator_sees_every_node_and_array() {
    let budget = Budget::unlimited();
    {
        let mut m = int_map(&budget);
        for k in 0..100 {
            m.set(k, k as u64);
        }
        assert_eq!(budget.live.get(), 100 + 1);

        assert!(m.remove(&42));
        assert_eq!(budget.live.get(), 99 + 1);

        m.remove_all();
        assert_eq!(budget.live.get(), 0);
        assert_eq!(budget.bytes.get(), 0);

        m.set(1, 1);
        assert_eq!(budget.live.get(), 2);
    }
    assert_eq!(budget.live.get(), 0, "drop must release every allocation");
}

// Test: several tables sharing one host allocator.
// Assumes: `&A` is an allocator when `A` is.
// Verifies: accounting covers both tables and returns to zero.
#[test]
fn tables_share_one_allocator() {
    let budget = Budget::unlimited();
    let mut a = int_map(&budget);
    let mut b = int_map(&budget);
    a.set(1, 1);
    b.set(2, 2);
    b.set(3, 3);
    assert_eq!(budget.live.get(), 2 + 3);
    drop(a);
    assert_eq!(budget.live.get(), 3);
    drop(b);
    assert_eq!(budget.live.get(), 0);
}

// Test: failed growth.
// Assumes: the budget covers the 11-bucket array and 8 nodes, not the 23-bucket array.
// Verifies: try_set reports OutOfMemory and the table keeps its capacity and entries.
#[test]
fn failed_growth_leaves_table_unchanged() {
    let budget = Budget::unlimited();
    let mut m = int_map(&budget);
    for k in 0..8 {
        m.set(k, k as u64 + 100);
    }
    assert_eq!((m.count(), m.capacity()), (8, 11));

    budget.limit.set(budget.bytes.get());
    assert_eq!(m.try_set(8, 0), Err(Failure::OutOfMemory));
    assert_eq!(budget.refused.get(), 1);
    assert_eq!((m.count(), m.capacity(), m.growth_threshold()), (8, 11, 8));
    for k in 0..8 {
        assert_eq!(m.lookup(&k), Some(k as u64 + 100));
    }
    assert_eq!(m.lookup(&8), None);

    budget.limit.set(usize::MAX);
    assert_eq!(m.try_set(8, 0), Ok(false));
    assert_eq!(m.capacity(), 23);
}

// Test: failed node allocation.
// Assumes: the table has room, so only the node allocation is attempted.
// Verifies: try_set reports OutOfMemory, nothing is inserted, and updates of
// existing keys still succeed since they allocate nothing.
#[test]
fn failed_node_allocation_inserts_nothing() {
    let budget = Budget::unlimited();
    let mut m = int_map(&budget);
    m.set(1, 1);
    budget.limit.set(budget.bytes.get());

    assert_eq!(m.try_set(2, 2), Err(Failure::OutOfMemory));
    assert_eq!(m.count(), 1);
    assert!(!m.contains_key(&2));

    assert_eq!(m.try_set(1, 10), Ok(true));
    assert_eq!(m.lookup(&1), Some(10));
}

/// Records the failure it was handed, then unwinds.
#[derive(Default)]
struct Recording {
    seen: Cell<Option<Failure>>,
}

impl Behavior for Recording {
    fn no_memory(&self, failure: Failure) -> ! {
        self.seen.set(Some(failure));
        panic!("recorded {}", failure)
    }
}

// Test: the Behavior hook.
// Assumes: `set` routes failures to `no_memory`, which never returns.
// Verifies: the hook receives the failure and the table is still usable.
#[test]
fn set_routes_failure_to_behavior() {
    let budget = Budget::new(0);
    let mut m: IntMap<'_, Recording> =
        PrimeHashMap::with_parts(Config::default(), IntKeyFuncs, &budget, Recording::default());

    let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        m.set(1, 1);
    }));
    assert!(res.is_err());
    assert_eq!(m.behavior().seen.get(), Some(Failure::OutOfMemory));
    assert_eq!(m.capacity(), 0);

    budget.limit.set(usize::MAX);
    assert!(!m.set(1, 1));
    assert_eq!(m.lookup(&1), Some(1));
}

// Test: default behavior panics.
// Assumes: PanicOnFailure is the default hook.
// Verifies: `set` on an exhausted allocator panics with the failure message.
#[test]
#[should_panic(expected = "out of memory")]
fn default_behavior_panics() {
    let budget = Budget::new(0);
    let mut m = int_map(&budget);
    m.set(1, 1);
}

// Test: prime table exhaustion.
// Assumes: a minimum allocation past the largest prime cannot be satisfied.
// Verifies: the first growth fails with CapacityOverflow and allocates nothing.
#[test]
fn capacity_overflow_on_exhausted_prime_table() {
    let largest = PRIMES[PRIMES.len() - 1].prime;
    let config = Config::new(Ratio::new(3, 2), Ratio::new(3, 4), largest + 1).unwrap();
    let budget = Budget::unlimited();
    let mut m: IntMap<'_> =
        PrimeHashMap::with_parts(config, IntKeyFuncs, &budget, PanicOnFailure);
    assert_eq!(m.try_set(1, 1), Err(Failure::CapacityOverflow));
    assert_eq!(budget.live.get(), 0);
    assert_eq!(m.capacity(), 0);
}

// Test: growth arithmetic overflow.
// Assumes: growth factor u32::MAX makes count * growth overflow at the first regrowth.
// Verifies: SizeOverflow is reported, never clamped, and the table is untouched.
#[test]
fn size_overflow_is_reported() {
    let config = Config::new(Ratio::new(u32::MAX, 1), Ratio::new(3, 4), 7).unwrap();
    let mut m: PrimeHashMap<u32, u32, IntKeyFuncs> =
        PrimeHashMap::with_parts(config, IntKeyFuncs, DefaultAllocator, PanicOnFailure);
    for k in 0..8 {
        assert_eq!(m.try_set(k, k), Ok(false));
    }
    assert_eq!(m.try_set(8, 8), Err(Failure::SizeOverflow));
    assert_eq!((m.count(), m.capacity()), (8, 11));
}

// Test: custom KeyFuncs with a deliberately weak hash.
// Assumes: equal keys hash equally (the policy contract).
// Verifies: heavy collisions still resolve every key correctly across growth.
#[test]
fn weak_hash_still_resolves_keys() {
    #[derive(Default)]
    struct LowBits;
    impl KeyFuncs<u32> for LowBits {
        fn hash(&self, key: &u32) -> u32 {
            key & 0x3
        }
        fn equals(&self, a: &u32, b: &u32) -> bool {
            a == b
        }
    }

    let mut m: PrimeHashMap<u32, u32, LowBits> =
        PrimeHashMap::with_parts(Config::default(), LowBits, DefaultAllocator, PanicOnFailure);
    for k in 0..500 {
        m.set(k, k + 1);
    }
    for k in 0..500 {
        assert_eq!(m.lookup(&k), Some(k + 1));
    }
    assert_eq!(m.count(), 500);
}
