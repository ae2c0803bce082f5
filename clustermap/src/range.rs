//! Chunk ranges: half-open `[min, max)` key intervals.

use crate::key::Key;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open shard-key interval. `min` is inclusive, `max` is exclusive;
/// across a collection's chunks every point in the keyspace belongs to
/// exactly one range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ChunkRange {
    pub min: Key,
    pub max: Key,
}

impl ChunkRange {
    /// Builds a range, rejecting `min >= max` since that can never hold a
    /// point under the half-open convention.
    pub fn new(min: Key, max: Key) -> Result<Self, InvalidRangeError> {
        if min >= max {
            return Err(InvalidRangeError { min, max });
        }
        Ok(Self { min, max })
    }

    /// The whole keyspace, `[MinKey, MaxKey)`.
    pub fn whole() -> Self {
        Self {
            min: Key::MinKey,
            max: Key::MaxKey,
        }
    }

    pub fn contains(&self, key: &Key) -> bool {
        &self.min <= key && key < &self.max
    }

    /// True when `self` and `other` share no points.
    pub fn is_disjoint_from(&self, other: &Self) -> bool {
        self.max <= other.min || other.max <= self.min
    }

    /// True when `self.max == other.min` or `other.max == self.min`, i.e.
    /// they could be merged into one contiguous range.
    pub fn is_adjacent_to(&self, other: &Self) -> bool {
        self.max == other.min || other.max == self.min
    }

    /// Split this range at `at`, which must lie strictly inside it.
    pub fn split_at(&self, at: Key) -> Result<(Self, Self), SplitPointError> {
        if at <= self.min || at >= self.max {
            return Err(SplitPointError {
                at,
                min: self.min.clone(),
                max: self.max.clone(),
            });
        }
        Ok((
            Self {
                min: self.min.clone(),
                max: at.clone(),
            },
            Self {
                min: at,
                max: self.max.clone(),
            },
        ))
    }

    /// Merge two adjacent ranges into their union. Callers are responsible
    /// for ordering `self`/`other` or calling either order; the result is
    /// the same either way.
    pub fn merge_with(&self, other: &Self) -> Result<Self, MergeRangeError> {
        if self.max == other.min {
            return Ok(Self {
                min: self.min.clone(),
                max: other.max.clone(),
            });
        }
        if other.max == self.min {
            return Ok(Self {
                min: other.min.clone(),
                max: self.max.clone(),
            });
        }
        Err(MergeRangeError {
            a: self.clone(),
            b: other.clone(),
        })
    }
}

impl fmt::Display for ChunkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}, {:?})", self.min, self.max)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid chunk range: min {min:?} must be strictly less than max {max:?}")]
pub struct InvalidRangeError {
    pub min: Key,
    pub max: Key,
}

#[derive(Debug, thiserror::Error)]
#[error("split point {at:?} is not strictly inside [{min:?}, {max:?})")]
pub struct SplitPointError {
    pub at: Key,
    pub min: Key,
    pub max: Key,
}

#[derive(Debug, thiserror::Error)]
#[error("ranges are not adjacent: {a} and {b}")]
pub struct MergeRangeError {
    pub a: ChunkRange,
    pub b: ChunkRange,
}
