//! Failure and Result types.
//!
//! Structural operations may need memory. Each one exists in two versions:
//!
//! -   A fallible `try_xxx` version, returning `Result` with `Failure` as the error type.
//! -   A plain `xxx` version, which hands any `Failure` to the table's `Behavior::no_memory` hook.
//!     The hook never returns, so the operation does not complete.
//!
//! A missing key is never a failure; lookups and removals report absence as `None`/`false`.

use std::{error, fmt, result};

/// Why a structural operation could not complete.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum Failure {
    /// The requested bucket count is larger than the largest available prime.
    CapacityOverflow,
    /// The next table size cannot be computed without overflowing `u32`.
    SizeOverflow,
    /// The number of bytes to allocate cannot be computed without overflowing.
    BytesOverflow,
    /// The allocator could not satisfy the request.
    OutOfMemory,
}

impl error::Error for Failure {}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Failure::CapacityOverflow => "bucket count exceeds the prime table",
            Failure::SizeOverflow => "table size computation overflowed",
            Failure::BytesOverflow => "allocation size overflowed",
            Failure::OutOfMemory => "allocator is out of memory",
        };
        f.write_str(msg)
    }
}

pub type Result<T> = result::Result<T, Failure>;
