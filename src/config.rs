//! Growth and density configuration, validated once at construction.

use std::{error, fmt};

/// A fraction `numerator / denominator`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Ratio {
    pub numerator: u32,
    pub denominator: u32,
}

impl Ratio {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }
}

/// Sizing parameters of a table.
///
/// - `growth`: factor applied to the entry count to size the next bucket
///   array; must be greater than one.
/// - `density`: target ratio of entries to buckets; must be below one.
/// - `minimum_allocation`: smallest bucket count requested on first growth
///   (rounded up to a prime like any other request).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Config {
    growth: Ratio,
    density: Ratio,
    minimum_allocation: u32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigError {
    ZeroDenominator,
    ZeroDensity,
    GrowthNotAboveOne,
    DensityNotBelowOne,
}

impl error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::ZeroDenominator => "ratio denominator is zero",
            ConfigError::ZeroDensity => "density numerator is zero",
            ConfigError::GrowthNotAboveOne => "growth factor must be greater than one",
            ConfigError::DensityNotBelowOne => "density factor must be less than one",
        };
        f.write_str(msg)
    }
}

impl Config {
    pub const fn new(
        growth: Ratio,
        density: Ratio,
        minimum_allocation: u32,
    ) -> Result<Self, ConfigError> {
        if growth.denominator == 0 || density.denominator == 0 {
            return Err(ConfigError::ZeroDenominator);
        }
        if density.numerator == 0 {
            return Err(ConfigError::ZeroDensity);
        }
        if growth.numerator <= growth.denominator {
            return Err(ConfigError::GrowthNotAboveOne);
        }
        if density.numerator >= density.denominator {
            return Err(ConfigError::DensityNotBelowOne);
        }
        Ok(Self {
            growth,
            density,
            minimum_allocation,
        })
    }

    pub fn growth(&self) -> Ratio {
        self.growth
    }

    pub fn density(&self) -> Ratio {
        self.density
    }

    pub fn minimum_allocation(&self) -> u32 {
        self.minimum_allocation
    }

    /// Entry count at which a table of `buckets` buckets must grow.
    pub(crate) fn threshold(&self, buckets: u32) -> u32 {
        let max = buckets as u64 * self.density.numerator as u64 / self.density.denominator as u64;
        // density < 1, so this never exceeds `buckets`.
        max as u32
    }

    /// Requested bucket count for a table currently holding `count` entries,
    /// before rounding up to a prime. `None` if the arithmetic overflows `u32`.
    pub(crate) fn next_size(&self, count: u32) -> Option<u32> {
        let size = count
            .checked_mul(self.growth.numerator)?
            / self.growth.denominator;
        let size = size.checked_mul(self.density.denominator)? / self.density.numerator;
        Some(size.max(self.minimum_allocation))
    }
}

impl Default for Config {
    /// Growth 3/2, density 3/4, minimum allocation 7.
    fn default() -> Self {
        Self {
            growth: Ratio::new(3, 2),
            density: Ratio::new(3, 4),
            minimum_allocation: 7,
        }
    }
}
