//! primehash: a single-threaded, chained hash table for hosts that supply
//! their own memory and cannot afford an integer division per lookup.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: fast lookup/insert/remove with growth that never copies entries,
//!   bucket indexing without a hardware divide, and every byte of memory
//!   obtained from a per-table allocator.
//! - Layers:
//!   - `primes`: the static table of prime bucket counts with their magic
//!     multipliers, and the multiply-shift remainder used for indexing.
//!   - `node` / `buckets`: chain nodes and the array of chain heads, both
//!     allocated and freed explicitly through the `Allocator`.
//!   - `growth`: admission check and reallocation; nodes are relinked into
//!     the new array, never moved or copied.
//!   - `PrimeHashMap<K, V, F, A, B>`: public API (`lookup`, `get_mut`,
//!     `set`, `remove`, `remove_all`, iteration) atop the above.
//!
//! Constraints
//! - Single-threaded: the table holds raw node pointers and is therefore
//!   `!Send`/`!Sync`. No operation blocks; all work is bounded by table size.
//! - The table only grows. Growth is checked once per `set`, before the key
//!   is searched, against the state at entry.
//! - Bucket counts are always primes from `PRIMES`; the smallest is 11.
//!
//! Policies
//! - `KeyFuncs<Q>`: hash (`u32`) and equality of keys. Must satisfy
//!   `equals(a, b) => hash(a) == hash(b)`.
//! - `Allocator`: per-instance memory source; null means out of memory.
//! - `Behavior`: the `no_memory` hook reached from non-`try_` methods when
//!   growth overflows or allocation fails. It never returns.
//! - `Config`: growth factor (> 1), density factor (< 1) and minimum
//!   allocation, validated once by `Config::new`.
//!
//! Failure semantics
//! - Growth builds the new bucket array completely before swapping it in, so
//!   a failed growth leaves the table exactly as it was.
//! - A missing key is not a failure: `lookup`/`get`/`remove` report absence.
//! - A `KeyFuncs` that breaks its contract cannot cause memory unsafety, but
//!   lookups may then miss entries.
//!
//! Reentrancy policy
//! - User code runs through `KeyFuncs` while chains are walked or relinked.
//!   A debug-only guard panics if that code re-enters the same table.
//! - If `KeyFuncs::hash` panics mid-rehash, the chains not yet moved are
//!   leaked rather than freed twice.
//!
//! Notes and non-goals
//! - No shrinking, no ordered iteration, no concurrent readers. Iteration is
//!   bucket-major, and within a bucket most recently inserted first.
//! - `get_mut` is the in-place mutation path; the borrow checker ensures no
//!   structural mutation happens while the reference is alive.

mod buckets;
mod growth;
mod node;
mod prime_hash_map_proptest;
mod walk;

pub mod allocator;
pub mod config;
pub mod failure;
pub mod iter;
pub mod policy;
pub mod prime_hash_map;
pub mod primes;

// Public surface
pub use allocator::{Allocator, DefaultAllocator};
pub use config::{Config, ConfigError, Ratio};
pub use failure::{Failure, Result};
pub use iter::{Iter, IterMut, Keys};
pub use policy::{AbortOnFailure, Behavior, DefaultKeyFuncs, IntKeyFuncs, KeyFuncs, PanicOnFailure};
pub use prime_hash_map::PrimeHashMap;
pub use primes::{magic_number_divide, magic_number_rem, next_prime, PrimeInfo, PRIMES};
