//! The identity-probe reply shape consumed by `receivedIsMaster`.

use crate::host::Host;
use crate::oid::OpaqueId;
use crate::read_preference::{OpTime, TagSet};
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Mirrors the wire reply to an `ismaster`/`hello`-style identity probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsMasterReply {
    pub set_name: String,
    pub is_master: bool,
    pub secondary: bool,
    /// Who the replier believes is primary, independent of `hosts` — lets a
    /// secondary point the scan at a primary it hasn't itself probed yet.
    pub primary_hint: Option<Host>,
    pub hosts: Vec<Host>,
    pub passives: Vec<Host>,
    pub tags: TagSet,
    pub config_version: u64,
    pub election_id: OpaqueId,
    #[serde(skip)]
    pub last_write_date: Option<SystemTime>,
    pub op_time: OpTime,
    pub hidden: bool,
    pub passive: bool,
}

impl IsMasterReply {
    pub fn primary(set_name: impl Into<String>, hosts: Vec<Host>) -> Self {
        Self {
            set_name: set_name.into(),
            is_master: true,
            secondary: false,
            primary_hint: None,
            hosts,
            passives: Vec::new(),
            tags: TagSet::new(),
            config_version: 1,
            election_id: OpaqueId::ZERO,
            last_write_date: None,
            op_time: OpTime::ZERO,
            hidden: false,
            passive: false,
        }
    }

    pub fn secondary(set_name: impl Into<String>, hosts: Vec<Host>) -> Self {
        Self {
            set_name: set_name.into(),
            is_master: false,
            secondary: true,
            primary_hint: None,
            hosts,
            passives: Vec::new(),
            tags: TagSet::new(),
            config_version: 1,
            election_id: OpaqueId::ZERO,
            last_write_date: None,
            op_time: OpTime::ZERO,
            hidden: false,
            passive: false,
        }
    }

    pub fn with_election(mut self, config_version: u64, election_id: OpaqueId) -> Self {
        self.config_version = config_version;
        self.election_id = election_id;
        self
    }

    pub fn with_op_time(mut self, op_time: OpTime) -> Self {
        self.op_time = op_time;
        self
    }

    pub fn with_last_write_date(mut self, when: SystemTime) -> Self {
        self.last_write_date = Some(when);
        self
    }

    pub fn with_primary_hint(mut self, host: Host) -> Self {
        self.primary_hint = Some(host);
        self
    }

    pub fn all_members(&self) -> impl Iterator<Item = &Host> {
        self.hosts.iter().chain(self.passives.iter())
    }
}
