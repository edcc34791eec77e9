//! Growth: deciding when to reallocate, and moving every chain to the new
//! bucket array.
//!
//! A table only grows. Growth is considered once per `set`, before the key is
//! looked up, so a table at its threshold grows even if the key already
//! exists. Nodes are relinked into the new array, never copied; only the
//! array itself is reallocated.

use crate::allocator::Allocator;
use crate::buckets::Buckets;
use crate::failure::{Failure, Result};
use crate::policy::{Behavior, KeyFuncs};
use crate::prime_hash_map::PrimeHashMap;
use crate::primes::{magic_number_rem, next_prime};
use crate::walk::Walk;

impl<K, V, F, A, B> PrimeHashMap<K, V, F, A, B>
where
    F: KeyFuncs<K>,
    A: Allocator,
    B: Behavior,
{
    /// Grows the table if it holds as many entries as its threshold allows.
    pub(crate) fn check_growth(&mut self) -> Result<()> {
        if self.count >= self.max {
            self.grow()?;
        }
        Ok(())
    }

    fn grow(&mut self) -> Result<()> {
        let size = self
            .config
            .next_size(self.count)
            .ok_or(Failure::SizeOverflow)?;
        if size < self.count {
            return Err(Failure::SizeOverflow);
        }
        // Flooring may collapse `size` back onto the current prime; growth
        // must always make room for at least one more entry.
        self.reallocate(size.max(self.size_info.prime + 1))
    }

    /// Moves every node into a fresh array of at least `target` buckets.
    ///
    /// On failure the table is untouched: the new array is only swapped in
    /// once every chain has moved.
    fn reallocate(&mut self, target: u32) -> Result<()> {
        debug_assert!({
            let density = self.config.density();
            target as u64
                >= self.count as u64 * density.denominator as u64 / density.numerator as u64
        });

        let info = next_prime(target)?;
        let mut fresh: Buckets<K, V> = Buckets::allocate(&self.allocator, info.prime)?;

        {
            let _walk = self.walks.begin(Walk::Rehash);
            let heads = fresh.as_mut_slice();
            for old in self.buckets.as_mut_slice() {
                let mut cur = old.take();
                while let Some(node) = cur {
                    // Safety: `node` is on the chain taken from `old`, owned by this loop.
                    let n = unsafe { &mut *node.as_ptr() };
                    cur = n.next;
                    let hash = KeyFuncs::<K>::hash(&self.key_funcs, &n.key);
                    let index = magic_number_rem(hash, &info) as usize;
                    n.next = heads[index];
                    heads[index] = Some(node);
                }
            }
        }

        // Safety: allocated by `self.allocator`; all its chains moved to `fresh`.
        unsafe { self.buckets.release(&self.allocator) };
        self.buckets = fresh;
        self.size_info = info;
        self.max = self.config.threshold(info.prime);
        Ok(())
    }
}
