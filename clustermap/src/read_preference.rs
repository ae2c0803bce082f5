//! Read preferences: mode, tag sets, max-staleness and min-op-time.
//!
//! This module only defines the preference itself; the filter chain that
//! applies it against a live node set lives in `monitor::select`, since it
//! needs the monitor's node bookkeeping to evaluate.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Which member role(s) are eligible, mirroring the five canonical modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    PrimaryOnly,
    PrimaryPreferred,
    SecondaryOnly,
    SecondaryPreferred,
    Nearest,
}

/// One tag-set entry: every key must match the node's tags exactly.
pub type TagSet = BTreeMap<String, String>;

/// An opaque, monotonically comparable operation timestamp, standing in for
/// a replication optime. Higher means "more caught up".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OpTime(pub u64);

impl OpTime {
    pub const ZERO: OpTime = OpTime(0);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadPreference {
    pub mode: Mode,
    /// Evaluated in order; a node matches if it matches any one tag-set, or
    /// if this list is empty.
    pub tag_sets: Vec<TagSet>,
    pub max_staleness: Duration,
    pub min_op_time: OpTime,
}

impl ReadPreference {
    pub fn primary() -> Self {
        Self {
            mode: Mode::PrimaryOnly,
            tag_sets: Vec::new(),
            max_staleness: Duration::ZERO,
            min_op_time: OpTime::ZERO,
        }
    }

    pub fn nearest() -> Self {
        Self {
            mode: Mode::Nearest,
            tag_sets: Vec::new(),
            max_staleness: Duration::ZERO,
            min_op_time: OpTime::ZERO,
        }
    }

    pub fn with_tag_sets(mut self, tag_sets: Vec<TagSet>) -> Self {
        self.tag_sets = tag_sets;
        self
    }

    pub fn with_max_staleness(mut self, max_staleness: Duration) -> Self {
        self.max_staleness = max_staleness;
        self
    }

    pub fn with_min_op_time(mut self, min_op_time: OpTime) -> Self {
        self.min_op_time = min_op_time;
        self
    }

    /// Whether the min-op-time filter should stay strict (never dropped)
    /// for this mode if it would otherwise leave zero candidates.
    pub fn min_op_time_filter_is_strict(&self) -> bool {
        matches!(self.mode, Mode::SecondaryOnly)
    }

    pub fn tags_match(&self, node_tags: &TagSet) -> bool {
        if self.tag_sets.is_empty() {
            return true;
        }
        self.tag_sets.iter().any(|wanted| {
            wanted
                .iter()
                .all(|(k, v)| node_tags.get(k).is_some_and(|nv| nv == v))
        })
    }
}
