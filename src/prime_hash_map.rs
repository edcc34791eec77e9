//! PrimeHashMap: chained hash table with prime-sized bucket arrays.

use core::borrow::Borrow;
use core::fmt;
use core::hash::Hash;
use core::marker::PhantomData;

use crate::allocator::{Allocator, DefaultAllocator};
use crate::buckets::Buckets;
use crate::config::Config;
use crate::failure::Result;
use crate::iter::{Iter, IterMut, Keys};
use crate::node::{Link, Node};
use crate::policy::{Behavior, DefaultKeyFuncs, KeyFuncs, PanicOnFailure};
use crate::primes::{magic_number_rem, PrimeInfo};
use crate::walk::{ChainWalks, Walk};

/// A chained hash table.
///
/// - `F` hashes and compares keys (`KeyFuncs`).
/// - `A` provides memory for nodes and bucket arrays (`Allocator`).
/// - `B` decides what happens when memory runs out (`Behavior`).
///
/// The table starts with no buckets and allocates them on the first `set`.
/// It never shrinks; `remove_all` returns it to the initial empty state.
pub struct PrimeHashMap<
    K,
    V,
    F = DefaultKeyFuncs,
    A: Allocator = DefaultAllocator,
    B = PanicOnFailure,
> {
    pub(crate) buckets: Buckets<K, V>,
    pub(crate) size_info: PrimeInfo,
    pub(crate) count: u32,
    pub(crate) max: u32,
    pub(crate) config: Config,
    pub(crate) key_funcs: F,
    pub(crate) allocator: A,
    pub(crate) behavior: B,
    pub(crate) walks: ChainWalks,
    _owns: PhantomData<(K, V)>,
}

impl<K, V> PrimeHashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self::with_parts(
            config,
            DefaultKeyFuncs::default(),
            DefaultAllocator,
            PanicOnFailure,
        )
    }
}

impl<K, V> Default for PrimeHashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, F, A, B> PrimeHashMap<K, V, F, A, B>
where
    A: Allocator,
{
    /// Creates an empty table; no memory is requested until the first `set`.
    pub fn with_parts(config: Config, key_funcs: F, allocator: A, behavior: B) -> Self {
        Self {
            buckets: Buckets::empty(),
            size_info: PrimeInfo::EMPTY,
            count: 0,
            max: 0,
            config,
            key_funcs,
            allocator,
            behavior,
            walks: ChainWalks::new(),
            _owns: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.count as usize
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of buckets; 0 until the first `set`.
    pub fn capacity(&self) -> u32 {
        self.size_info.prime
    }

    /// Entry count at which the next `set` grows the table.
    pub fn growth_threshold(&self) -> u32 {
        self.max
    }

    pub fn size_info(&self) -> PrimeInfo {
        self.size_info
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn key_funcs(&self) -> &F {
        &self.key_funcs
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    /// Keys in bucket order. Starts over from the current contents on each call.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys::new(self.buckets.as_slice(), self.len())
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter::new(self.buckets.as_slice(), self.len())
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let len = self.len();
        IterMut::new(self.buckets.as_slice(), len)
    }

    /// Releases every entry and the bucket array, returning to the state of a
    /// freshly created table.
    pub fn remove_all(&mut self) {
        for head in self.buckets.as_mut_slice() {
            let chain = head.take();
            // Safety: the chain was allocated by `self.allocator` and is now detached.
            unsafe { Node::release_chain(&self.allocator, chain) };
        }
        // Safety: allocated by `self.allocator`; every chain was released above.
        unsafe { self.buckets.release(&self.allocator) };
        self.size_info = PrimeInfo::EMPTY;
        self.count = 0;
        self.max = 0;
    }
}

impl<K, V, F, A, B> PrimeHashMap<K, V, F, A, B>
where
    F: KeyFuncs<K>,
    A: Allocator,
    B: Behavior,
{
    #[inline]
    fn index_for<Q>(&self, key: &Q) -> usize
    where
        Q: ?Sized,
        F: KeyFuncs<Q>,
    {
        debug_assert_eq!(self.buckets.len(), self.size_info.prime);
        magic_number_rem(KeyFuncs::<Q>::hash(&self.key_funcs, key), &self.size_info) as usize
    }

    fn find_node<Q>(&self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        F: KeyFuncs<Q>,
    {
        if self.size_info.prime == 0 {
            return None;
        }
        let _walk = self.walks.begin(Walk::Lookup);
        let mut cur = self.buckets.as_slice()[self.index_for(key)];
        while let Some(node) = cur {
            // Safety: nodes reachable from the buckets are live while `self` is borrowed.
            let n = unsafe { node.as_ref() };
            if KeyFuncs::<Q>::equals(&self.key_funcs, key, n.key.borrow()) {
                return Some(node);
            }
            cur = n.next;
        }
        None
    }

    /// Returns a copy of the value stored for `key`.
    pub fn lookup<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        F: KeyFuncs<Q>,
        V: Clone,
    {
        self.get(key).cloned()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        F: KeyFuncs<Q>,
    {
        // Safety: the node lives at least as long as the borrow of `self`.
        self.find_node(key).map(|node| unsafe { &(*node.as_ptr()).value })
    }

    /// Returns the value stored for `key`, for in-place mutation.
    ///
    /// The borrow of the table rules out any insert, removal or growth while
    /// the reference is alive.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        F: KeyFuncs<Q>,
    {
        // Safety: the node lives at least as long as the exclusive borrow of `self`.
        self.find_node(key)
            .map(|node| unsafe { &mut (*node.as_ptr()).value })
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        F: KeyFuncs<Q>,
    {
        self.find_node(key).is_some()
    }

    /// Maps `key` to `value`.
    ///
    /// Returns `Ok(true)` if the key was present and its value replaced,
    /// `Ok(false)` if a new entry was inserted. On `Err` no entry was added,
    /// although the table may have grown.
    pub fn try_set(&mut self, key: K, value: V) -> Result<bool> {
        self.check_growth()?;
        debug_assert_ne!(self.size_info.prime, 0);

        let _walk = self.walks.begin(Walk::Set);
        let index = self.index_for::<K>(&key);
        let mut cur = self.buckets.as_slice()[index];
        while let Some(node) = cur {
            // Safety: reachable nodes are live and `&mut self` is exclusive.
            let n = unsafe { &mut *node.as_ptr() };
            if KeyFuncs::<K>::equals(&self.key_funcs, &key, &n.key) {
                n.value = value;
                return Ok(true);
            }
            cur = n.next;
        }

        let head = &mut self.buckets.as_mut_slice()[index];
        *head = Some(Node::allocate(&self.allocator, key, value, *head)?);
        self.count += 1;
        Ok(false)
    }

    /// Maps `key` to `value`, as `try_set`, handing failures to `Behavior::no_memory`.
    pub fn set(&mut self, key: K, value: V) -> bool {
        match self.try_set(key, value) {
            Ok(existed) => existed,
            Err(failure) => self.behavior.no_memory(failure),
        }
    }

    /// Unlinks the node for `key` from its chain and hands it to the caller.
    fn unlink<Q>(&mut self, key: &Q) -> Link<K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        F: KeyFuncs<Q>,
    {
        if self.size_info.prime == 0 {
            return None;
        }
        let _walk = self.walks.begin(Walk::Remove);
        let index = self.index_for(key);
        let mut link: *mut Link<K, V> = &mut self.buckets.as_mut_slice()[index];
        // Safety: `link` always points either to a bucket slot or to the `next` field of a
        // live node of this chain.
        unsafe {
            while let Some(node) = *link {
                let raw = node.as_ptr();
                if KeyFuncs::<Q>::equals(&self.key_funcs, key, (*raw).key.borrow()) {
                    *link = (*raw).next;
                    self.count -= 1;
                    return Some(node);
                }
                link = &mut (*raw).next;
            }
        }
        None
    }

    /// Removes the entry for `key`, returning whether it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        F: KeyFuncs<Q>,
    {
        match self.unlink(key) {
            Some(node) => {
                // Safety: unlinked above; nothing references the node any more.
                unsafe { Node::release(&self.allocator, node) };
                true
            }
            None => false,
        }
    }

    /// Removes the entry for `key` and returns it.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        F: KeyFuncs<Q>,
    {
        let node = self.unlink(key)?;
        // Safety: unlinked above; nothing references the node any more.
        Some(unsafe { Node::into_entry(&self.allocator, node) })
    }
}

impl<K, V, F, A: Allocator, B> Drop for PrimeHashMap<K, V, F, A, B> {
    fn drop(&mut self) {
        self.remove_all();
    }
}

impl<K, V, F, A, B> fmt::Debug for PrimeHashMap<K, V, F, A, B>
where
    K: fmt::Debug,
    V: fmt::Debug,
    A: Allocator,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, F, A, B> Extend<(K, V)> for PrimeHashMap<K, V, F, A, B>
where
    F: KeyFuncs<K>,
    A: Allocator,
    B: Behavior,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.set(k, v);
        }
    }
}

impl<'a, K, V, F, A: Allocator, B> IntoIterator for &'a PrimeHashMap<K, V, F, A, B> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, F, A: Allocator, B> IntoIterator for &'a mut PrimeHashMap<K, V, F, A, B> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
