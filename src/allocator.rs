//! Allocator.
//!
//! The host supplies memory per table instance. Nodes and bucket arrays are
//! carved out of it and handed back to it explicitly; nothing in this crate
//! goes through the global allocator unless `DefaultAllocator` is chosen.

use core::ptr::NonNull;
use std::alloc::{self, Layout};

use crate::failure::{Failure, Result};

/// Per-instance memory source.
pub trait Allocator {
    /// Allocates memory as per the size and alignment requirements.
    ///
    /// Returns a null pointer if the request cannot be satisfied.
    ///
    /// # Safety
    ///
    /// - `layout` must have a non-zero size.
    unsafe fn allocate(&self, layout: Layout) -> *mut u8;

    /// Returns memory to the allocator.
    ///
    /// # Safety
    ///
    /// - `ptr` was returned by `self.allocate` with this same `layout`.
    /// - `ptr` has not been deallocated already.
    unsafe fn deallocate(&self, ptr: *mut u8, layout: Layout);

    /// Allocates room for `count` consecutive values of `element`.
    ///
    /// Fails with `BytesOverflow` if the total size does not fit, and with
    /// `OutOfMemory` if `allocate` returns null. On success the layout of the
    /// whole array is returned alongside the pointer, for `deallocate`.
    fn array_allocate(&self, count: usize, element: Layout) -> Result<(NonNull<u8>, Layout)> {
        let element = element.pad_to_align();
        let bytes = element
            .size()
            .checked_mul(count)
            .ok_or(Failure::BytesOverflow)?;
        let layout =
            Layout::from_size_align(bytes, element.align()).map_err(|_| Failure::BytesOverflow)?;
        if layout.size() == 0 {
            return Ok((NonNull::dangling(), layout));
        }
        // Safety: the size was checked to be non-zero.
        let ptr = unsafe { self.allocate(layout) };
        NonNull::new(ptr)
            .map(|ptr| (ptr, layout))
            .ok_or(Failure::OutOfMemory)
    }
}

impl<A: Allocator + ?Sized> Allocator for &A {
    unsafe fn allocate(&self, layout: Layout) -> *mut u8 {
        // Safety: forwarding.
        unsafe { (**self).allocate(layout) }
    }

    unsafe fn deallocate(&self, ptr: *mut u8, layout: Layout) {
        // Safety: forwarding.
        unsafe { (**self).deallocate(ptr, layout) }
    }
}

/// Forwards to the global allocator.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DefaultAllocator;

impl Allocator for DefaultAllocator {
    unsafe fn allocate(&self, layout: Layout) -> *mut u8 {
        // Safety: size is non-zero, as per pre-condition.
        unsafe { alloc::alloc(layout) }
    }

    unsafe fn deallocate(&self, ptr: *mut u8, layout: Layout) {
        // Safety: `ptr` and `layout` come from `allocate`, as per pre-condition.
        unsafe { alloc::dealloc(ptr, layout) }
    }
}
