//! Debug-only check that key policies do not re-enter their table.
//!
//! `KeyFuncs` runs user code while a chain is being walked. During a rehash
//! the nodes are split between the old and the new bucket array and `count`
//! describes neither, so a lookup issued from inside `hash` would miss
//! entries or follow a half-built chain. Every chain walk is bracketed by
//! `ChainWalks::begin`; in debug builds a nested walk panics and names the
//! walk already in progress. Release builds track nothing.

#[cfg(debug_assertions)]
use core::cell::Cell;
use core::marker::PhantomData;

/// The kind of chain walk a table is performing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Walk {
    Lookup,
    Set,
    Remove,
    Rehash,
}

impl Walk {
    #[cfg(debug_assertions)]
    fn name(self) -> &'static str {
        match self {
            Walk::Lookup => "lookup",
            Walk::Set => "set",
            Walk::Remove => "remove",
            Walk::Rehash => "rehash",
        }
    }
}

pub(crate) struct ChainWalks {
    #[cfg(debug_assertions)]
    current: Cell<Option<Walk>>,
    _single_threaded: PhantomData<*mut ()>,
}

impl ChainWalks {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            current: Cell::new(None),
            _single_threaded: PhantomData,
        }
    }

    /// Records `walk` as in progress until the returned value drops.
    #[inline]
    pub(crate) fn begin(&self, walk: Walk) -> WalkInProgress<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.current.replace(Some(walk)) {
                // The outer walk still owns the slot and clears it on drop.
                self.current.set(Some(outer));
                panic!(
                    "hash table re-entered from KeyFuncs: {} started during {}",
                    walk.name(),
                    outer.name()
                );
            }
        }
        #[cfg(not(debug_assertions))]
        let _ = walk;
        WalkInProgress { walks: self }
    }

    #[cfg(all(test, debug_assertions))]
    fn current(&self) -> Option<Walk> {
        self.current.get()
    }
}

pub(crate) struct WalkInProgress<'a> {
    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    walks: &'a ChainWalks,
}

impl Drop for WalkInProgress<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.walks.current.set(None);
    }
}
