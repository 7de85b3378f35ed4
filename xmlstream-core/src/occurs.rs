//! Occurrence policy: how many times a schema node may or must repeat
//! among its siblings.

use std::fmt;

/// Upper occurrence bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

impl From<u32> for MaxOccurs {
    fn from(n: u32) -> Self {
        MaxOccurs::Bounded(n)
    }
}

impl fmt::Display for MaxOccurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxOccurs::Bounded(n) => write!(f, "{}", n),
            MaxOccurs::Unbounded => f.write_str("*"),
        }
    }
}

/// Minimum and maximum repeat count for a schema node.
///
/// Not validated: a policy whose minimum exceeds its maximum is
/// representable and simply can never be satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurrence {
    pub min: u32,
    pub max: MaxOccurs,
}

impl Occurrence {
    /// `1..=1`, the element default.
    pub const fn exactly_one() -> Self {
        Occurrence { min: 1, max: MaxOccurs::Bounded(1) }
    }

    /// `0..=1`, the default for every other node kind.
    pub const fn optional() -> Self {
        Occurrence { min: 0, max: MaxOccurs::Bounded(1) }
    }

    pub fn is_unbounded(&self) -> bool {
        self.max == MaxOccurs::Unbounded
    }

    /// True when `count` meets the minimum.
    pub fn is_satisfied_by(&self, count: u32) -> bool {
        count >= self.min
    }

    /// True when `count` does not exceed the maximum.
    pub fn admits(&self, count: u32) -> bool {
        match self.max {
            MaxOccurs::Bounded(max) => count <= max,
            MaxOccurs::Unbounded => true,
        }
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}
