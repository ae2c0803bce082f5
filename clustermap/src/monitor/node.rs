//! A single replica-set member as known to the monitor.

use crate::host::Host;
use crate::read_preference::{OpTime, TagSet};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone)]
pub struct Node {
    pub host: Host,
    pub up: bool,
    pub primary: bool,
    pub hidden: bool,
    pub passive: bool,
    pub tags: TagSet,
    pub last_write_date: Option<SystemTime>,
    pub op_time: OpTime,
    pub rtt: Option<Duration>,
}

impl Node {
    /// A freshly seeded node: unknown state until the first reply arrives.
    pub fn seed(host: Host) -> Self {
        Self {
            host,
            up: false,
            primary: false,
            hidden: false,
            passive: false,
            tags: TagSet::new(),
            last_write_date: None,
            op_time: OpTime::ZERO,
            rtt: None,
        }
    }

    pub fn mark_down(&mut self) {
        self.up = false;
        self.primary = false;
    }
}
