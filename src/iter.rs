//! Iterators over a `PrimeHashMap`.
//!
//! Traversal is bucket-major: buckets left to right, each chain head to tail
//! (most recently inserted first). The borrow of the map keeps it from being
//! mutated while an iterator is alive.

use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::node::{Link, Node};

struct Cursor<'a, K, V> {
    heads: &'a [Link<K, V>],
    bucket: usize,
    node: Link<K, V>,
    remaining: usize,
}

impl<'a, K, V> Cursor<'a, K, V> {
    fn new(heads: &'a [Link<K, V>], remaining: usize) -> Self {
        Self {
            heads,
            bucket: 0,
            node: None,
            remaining,
        }
    }

    #[inline]
    fn advance(&mut self) -> Option<NonNull<Node<K, V>>> {
        loop {
            if let Some(node) = self.node {
                // Safety: nodes reachable from `heads` live as long as the map borrow `'a`.
                // Only the link field is read; values handed out earlier stay unaliased.
                self.node = unsafe { (*node.as_ptr()).next };
                self.remaining -= 1;
                return Some(node);
            }
            self.node = *self.heads.get(self.bucket)?;
            self.bucket += 1;
        }
    }
}

/// Iterator over the keys of a map.
pub struct Keys<'a, K, V> {
    cursor: Cursor<'a, K, V>,
}

impl<'a, K, V> Keys<'a, K, V> {
    pub(crate) fn new(heads: &'a [Link<K, V>], len: usize) -> Self {
        Self {
            cursor: Cursor::new(heads, len),
        }
    }
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cursor.advance()?;
        // Safety: see `Cursor::advance`.
        Some(unsafe { &(*node.as_ptr()).key })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.cursor.remaining, Some(self.cursor.remaining))
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Iterator over the entries of a map.
pub struct Iter<'a, K, V> {
    cursor: Cursor<'a, K, V>,
}

impl<'a, K, V> Iter<'a, K, V> {
    pub(crate) fn new(heads: &'a [Link<K, V>], len: usize) -> Self {
        Self {
            cursor: Cursor::new(heads, len),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cursor.advance()?;
        // Safety: see `Cursor::advance`.
        unsafe {
            let raw = node.as_ptr();
            Some((&(*raw).key, &(*raw).value))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.cursor.remaining, Some(self.cursor.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over the entries of a map, with mutable values.
pub struct IterMut<'a, K, V> {
    cursor: Cursor<'a, K, V>,
    _pd: PhantomData<&'a mut V>,
}

impl<'a, K, V> IterMut<'a, K, V> {
    /// `heads` must come from a map borrowed mutably for `'a`.
    pub(crate) fn new(heads: &'a [Link<K, V>], len: usize) -> Self {
        Self {
            cursor: Cursor::new(heads, len),
            _pd: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cursor.advance()?;
        // Safety: see `Cursor::advance`; each node is yielded once, so the `&mut V` is
        // unique. The map is mutably borrowed for `'a`, as per `IterMut::new`.
        unsafe {
            let raw = node.as_ptr();
            Some((&(*raw).key, &mut (*raw).value))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.cursor.remaining, Some(self.cursor.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}
