//! Prime bucket counts and division-free remainder.
//!
//! Bucket arrays are always sized to a prime from `PRIMES`. Each entry carries
//! a 32-bit magic multiplier and a shift such that, for every `u32` numerator
//! `n`, `(n * magic) >> (32 + shift) == n / prime` (Hacker's Delight, 10-9
//! "Unsigned Division by Divisors >= 1"). Primes were chosen roughly doubling
//! in size and only where the magic number fits in 32 bits, since the 33-bit
//! variant needs an extra add-and-shift on the hot path.
//!
//! The table is data: it was produced offline by searching, for each prime,
//! the smallest shift whose rounded-up magic number is exact over the whole
//! `u32` range. `PrimeInfo::is_exact` re-checks that criterion and the tests
//! run it against every entry.

use crate::failure::{Failure, Result};

/// A bucket count and the constants used to divide by it.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct PrimeInfo {
    pub prime: u32,
    pub magic: u32,
    pub shift: u32,
}

impl PrimeInfo {
    /// Descriptor of a table that has not allocated buckets yet.
    pub const EMPTY: PrimeInfo = PrimeInfo::new(0, 0, 0);

    pub const fn new(prime: u32, magic: u32, shift: u32) -> Self {
        Self {
            prime,
            magic,
            shift,
        }
    }

    /// Returns true if `magic`/`shift` give the exact quotient by `prime`
    /// for every `u32` numerator.
    ///
    /// With `m = (2^k + e) / p`, the computed quotient of `n = q*p + r` is
    /// `q + (r + n*e / 2^k) / p`, which stays below `q + 1` iff
    /// `r + n*e / 2^k < p`. That sum is largest either at the greatest `n`
    /// with `r == p - 1`, or at `u32::MAX` itself; checking both is enough.
    pub fn is_exact(&self) -> bool {
        if self.prime < 2 || self.shift >= 32 {
            return false;
        }
        let p = self.prime as u128;
        let k = 32 + self.shift;
        let two_k = 1u128 << k;
        let product = self.magic as u128 * p;
        if product < two_k {
            return false;
        }
        let e = product - two_k;

        let top = u32::MAX as u128;
        let top_rem = top % p;
        let worst = if top_rem == p - 1 {
            top
        } else {
            top - top_rem - 1
        };
        worst * e < two_k && top * e < (p - top_rem) * two_k
    }
}

/// Ascending bucket counts available to a table.
pub const PRIMES: [PrimeInfo; 27] = [
    PrimeInfo::new(11, 0xba2e8ba3, 3),
    PrimeInfo::new(23, 0xb21642c9, 4),
    PrimeInfo::new(59, 0x22b63cbf, 3),
    PrimeInfo::new(131, 0xfa232cf3, 7),
    PrimeInfo::new(239, 0x891ac73b, 7),
    PrimeInfo::new(433, 0x0975a751, 4),
    PrimeInfo::new(761, 0x561e46a5, 8),
    PrimeInfo::new(1399, 0xbb612aa3, 10),
    PrimeInfo::new(2473, 0x6a009f01, 10),
    PrimeInfo::new(4327, 0xf2555049, 12),
    PrimeInfo::new(7499, 0x45ea155f, 11),
    PrimeInfo::new(12973, 0x1434f6d3, 10),
    PrimeInfo::new(22433, 0x2ebe18db, 12),
    PrimeInfo::new(46559, 0xb42bebd5, 15),
    PrimeInfo::new(96581, 0xadb61b1b, 16),
    PrimeInfo::new(200341, 0x29df2461, 15),
    PrimeInfo::new(415517, 0xa181c46d, 18),
    PrimeInfo::new(861719, 0x4de0bde5, 18),
    PrimeInfo::new(1787021, 0x9636c46f, 20),
    PrimeInfo::new(3705617, 0x4870adc1, 20),
    PrimeInfo::new(7684087, 0x8bbc5b83, 22),
    PrimeInfo::new(15933877, 0x86c65361, 23),
    PrimeInfo::new(33040633, 0x40fec79b, 23),
    PrimeInfo::new(68513161, 0x7d605cd1, 25),
    PrimeInfo::new(142069021, 0xf1da390b, 27),
    PrimeInfo::new(294594427, 0x74a2507d, 27),
    PrimeInfo::new(733045421, 0x5dbec447, 28),
];

/// `numerator / info.prime`, by multiply and shift.
#[inline]
pub fn magic_number_divide(numerator: u32, info: &PrimeInfo) -> u32 {
    let product = (numerator as u64 * info.magic as u64) >> (32 + info.shift);
    product as u32
}

/// `numerator % info.prime`, by multiply and shift.
#[inline]
pub fn magic_number_rem(numerator: u32, info: &PrimeInfo) -> u32 {
    let quotient = magic_number_divide(numerator, info);
    let rem = numerator.wrapping_sub(quotient.wrapping_mul(info.prime));
    debug_assert_eq!(rem, numerator % info.prime);
    rem
}

/// Returns the smallest table entry whose prime is at least `number`.
pub fn next_prime(number: u32) -> Result<PrimeInfo> {
    PRIMES
        .iter()
        .copied()
        .find(|info| info.prime >= number)
        .ok_or(Failure::CapacityOverflow)
}
