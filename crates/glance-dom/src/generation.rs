//! Generation counters
//!
//! A generation is bumped every time a slot is recycled or a refresher is
//! stopped. Holders of an old generation can tell their handle went stale
//! with a single comparison.

use std::fmt;

/// Wrapping counter; equality is the staleness test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Generation(u32);

impl Generation {
    pub const INITIAL: Self = Self(0);

    /// Successor, wrapping at `u32::MAX`
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Whether `self` was issued after `earlier`
    ///
    /// Counts within half the range are treated as forward steps, so the
    /// answer stays right across a wrap.
    #[inline]
    pub fn is_newer_than(self, earlier: Self) -> bool {
        (1..=i32::MAX as u32).contains(&self.0.wrapping_sub(earlier.0))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}
