//! Chain nodes.
//!
//! A node is allocated through the table's `Allocator` when a key is first
//! inserted and freed through it when the key is removed or the table is torn
//! down. Growth relinks nodes in place; a node never moves once allocated.

use core::ptr::{self, NonNull};
use std::alloc::Layout;

use crate::allocator::Allocator;
use crate::failure::{Failure, Result};

/// Owning link to the next node of a chain, or the end of the chain.
pub(crate) type Link<K, V> = Option<NonNull<Node<K, V>>>;

pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) next: Link<K, V>,
}

impl<K, V> Node<K, V> {
    /// Allocates a node holding `key` and `value`, in front of `next`.
    pub(crate) fn allocate<A: Allocator>(
        allocator: &A,
        key: K,
        value: V,
        next: Link<K, V>,
    ) -> Result<NonNull<Self>> {
        let layout = Layout::new::<Self>();
        // Safety: a node always holds a link, so its size is non-zero.
        let raw = unsafe { allocator.allocate(layout) };
        let node = NonNull::new(raw.cast::<Self>()).ok_or(Failure::OutOfMemory)?;
        // Safety: `node` is freshly allocated with the layout of `Self`.
        unsafe { node.as_ptr().write(Node { key, value, next }) };
        Ok(node)
    }

    /// Drops the node's key and value and returns its memory.
    ///
    /// Returns the node's `next` link, which the caller now owns.
    ///
    /// # Safety
    ///
    /// - `node` was returned by `Node::allocate` with this same `allocator`.
    /// - No chain or reference still points to `node`.
    pub(crate) unsafe fn release<A: Allocator>(allocator: &A, node: NonNull<Self>) -> Link<K, V> {
        let raw = node.as_ptr();
        // Safety: `node` is live and exclusively owned, as per pre-condition.
        unsafe {
            let next = (*raw).next;
            ptr::drop_in_place(raw);
            allocator.deallocate(raw.cast::<u8>(), Layout::new::<Self>());
            next
        }
    }

    /// Moves the key and value out of the node and returns its memory.
    ///
    /// # Safety
    ///
    /// Same as `release`.
    pub(crate) unsafe fn into_entry<A: Allocator>(allocator: &A, node: NonNull<Self>) -> (K, V) {
        let raw = node.as_ptr();
        // Safety: `node` is live and exclusively owned; key and value are read exactly once
        // and the memory is not dropped in place afterwards.
        unsafe {
            let key = ptr::read(&(*raw).key);
            let value = ptr::read(&(*raw).value);
            allocator.deallocate(raw.cast::<u8>(), Layout::new::<Self>());
            (key, value)
        }
    }

    /// Releases `head` and every node after it.
    ///
    /// # Safety
    ///
    /// Same as `release`, for every node of the chain.
    pub(crate) unsafe fn release_chain<A: Allocator>(allocator: &A, mut head: Link<K, V>) {
        while let Some(node) = head {
            // Safety: forwarding; each node owns the rest of the chain.
            head = unsafe { Self::release(allocator, node) };
        }
    }
}
