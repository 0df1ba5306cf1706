//! Half-point score arithmetic.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A non-negative score with 0.5 granularity, stored as a count of half
/// points so arithmetic stays exact. Serializes as a JSON number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score {
    half_points: u32,
}

impl Score {
    /// Zero points.
    pub const ZERO: Self = Self { half_points: 0 };

    /// Largest single award a scorer may hand out.
    const MAX_INCREMENT_HALVES: u32 = 6;

    /// Builds a score from a number of half points.
    #[must_use]
    pub const fn from_half_points(half_points: u32) -> Self {
        Self { half_points }
    }

    /// Parses a point value. Only finite, non-negative multiples of 0.5 are
    /// accepted.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_points(points: f64) -> Option<Self> {
        if !points.is_finite() || points < 0.0 {
            return None;
        }
        let doubled = points * 2.0;
        if doubled.fract() != 0.0 || doubled > f64::from(u32::MAX) {
            return None;
        }
        Some(Self {
            half_points: doubled as u32,
        })
    }

    /// Number of half points.
    #[must_use]
    pub const fn half_points(self) -> u32 {
        self.half_points
    }

    /// Value in points.
    #[must_use]
    pub fn as_points(self) -> f64 {
        f64::from(self.half_points) / 2.0
    }

    /// Adds two scores, clamping at the maximum.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self {
            half_points: self.half_points.saturating_add(other.half_points),
        }
    }

    /// Whether a scorer may award this amount in one go: 0 to 3 points in
    /// half-point steps.
    #[must_use]
    pub const fn is_allowed_increment(self) -> bool {
        self.half_points <= Self::MAX_INCREMENT_HALVES
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.half_points / 2;
        if self.half_points % 2 == 0 {
            write!(f, "{whole}")
        } else {
            write!(f, "{whole}.5")
        }
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_points())
    }
}

impl<'de> Deserialize<'de> for Score {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let points = f64::deserialize(deserializer)?;
        Self::from_points(points).ok_or_else(|| {
            D::Error::custom(format!(
                "score must be a non-negative multiple of 0.5, got {points}"
            ))
        })
    }
}
