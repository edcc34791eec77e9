//! Per-instance policies: how keys hash and compare, and what happens when
//! the table cannot get memory.

use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

use crate::failure::Failure;

/// Hashing and equality for keys of type `Q`.
///
/// Implementations must uphold `equals(a, b) => hash(a) == hash(b)`. When a
/// table is queried with a borrowed form `Q` of its key type `K`, the hash of
/// a `Q` must also equal the hash of the `K` it was borrowed from.
pub trait KeyFuncs<Q: ?Sized> {
    fn hash(&self, key: &Q) -> u32;
    fn equals(&self, a: &Q, b: &Q) -> bool;
}

/// `Hash` + `Eq` keys, hashed through a `BuildHasher`.
#[derive(Clone, Debug, Default)]
pub struct DefaultKeyFuncs<S = DefaultHashBuilder> {
    hasher: S,
}

impl<S> DefaultKeyFuncs<S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self { hasher }
    }
}

impl<Q, S> KeyFuncs<Q> for DefaultKeyFuncs<S>
where
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &Q) -> u32 {
        let h = self.hasher.hash_one(key);
        (h ^ (h >> 32)) as u32
    }

    #[inline]
    fn equals(&self, a: &Q, b: &Q) -> bool {
        a == b
    }
}

/// Small integer keys hash to themselves (high and low halves folded for `u64`).
///
/// Cheap and deterministic, which suits dense identifier spaces such as
/// variable or block numbers.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntKeyFuncs;

impl<T> KeyFuncs<T> for IntKeyFuncs
where
    T: Copy + Eq + Into<u64>,
{
    #[inline]
    fn hash(&self, key: &T) -> u32 {
        let k: u64 = (*key).into();
        (k ^ (k >> 32)) as u32
    }

    #[inline]
    fn equals(&self, a: &T, b: &T) -> bool {
        a == b
    }
}

/// Reaction to a structural failure reached through a non-`try_` method.
pub trait Behavior {
    /// Called when growth overflows or the allocator refuses a request.
    /// Never returns; the operation in progress is abandoned.
    fn no_memory(&self, failure: Failure) -> !;
}

/// Panics with the failure. Unwinding leaves the table in its prior state.
#[derive(Clone, Copy, Debug, Default)]
pub struct PanicOnFailure;

impl Behavior for PanicOnFailure {
    #[cold]
    fn no_memory(&self, failure: Failure) -> ! {
        panic!("hash table failure: {}", failure)
    }
}

/// Aborts the process.
#[derive(Clone, Copy, Debug, Default)]
pub struct AbortOnFailure;

impl Behavior for AbortOnFailure {
    #[cold]
    fn no_memory(&self, _failure: Failure) -> ! {
        std::process::abort()
    }
}
