//! The bucket array: one chain head per bucket, allocated through the table's
//! `Allocator`.
//!
//! `Buckets` does not free itself. The table releases the array explicitly,
//! after it has moved or released every chain the array owned.

use core::ptr::NonNull;
use core::slice;
use std::alloc::Layout;

use crate::allocator::Allocator;
use crate::failure::Result;
use crate::node::Link;

pub(crate) struct Buckets<K, V> {
    heads: NonNull<Link<K, V>>,
    len: u32,
    layout: Layout,
}

impl<K, V> Buckets<K, V> {
    /// The zero-capacity array of a table which never grew.
    pub(crate) const fn empty() -> Self {
        Self {
            heads: NonNull::dangling(),
            len: 0,
            layout: Layout::new::<()>(),
        }
    }

    /// Allocates `len` empty buckets.
    pub(crate) fn allocate<A: Allocator>(allocator: &A, len: u32) -> Result<Self> {
        let (ptr, layout) = allocator.array_allocate(len as usize, Layout::new::<Link<K, V>>())?;
        let heads = ptr.cast::<Link<K, V>>();
        for i in 0..len as usize {
            // Safety: `i` is within the `len` slots just allocated.
            unsafe { heads.as_ptr().add(i).write(None) };
        }
        Ok(Self { heads, len, layout })
    }

    pub(crate) fn len(&self) -> u32 {
        self.len
    }

    pub(crate) fn as_slice(&self) -> &[Link<K, V>] {
        // Safety: `heads` points to `len` initialized slots, or dangles with `len == 0`.
        unsafe { slice::from_raw_parts(self.heads.as_ptr(), self.len as usize) }
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Link<K, V>] {
        // Safety: as in `as_slice`; `&mut self` guarantees exclusivity.
        unsafe { slice::from_raw_parts_mut(self.heads.as_ptr(), self.len as usize) }
    }

    /// Returns the array's memory to `allocator`, leaving `self` empty.
    ///
    /// Chains still referenced by the array are not released.
    ///
    /// # Safety
    ///
    /// - The array was allocated by this same `allocator`.
    pub(crate) unsafe fn release<A: Allocator>(&mut self, allocator: &A) {
        if self.len != 0 {
            // Safety: allocated by `allocator` with `self.layout`, as per pre-condition.
            unsafe { allocator.deallocate(self.heads.as_ptr().cast::<u8>(), self.layout) };
        }
        *self = Self::empty();
    }
}
