//! Replica-set monitor: client-side membership and primary tracking,
//! driving a scan protocol and answering `selectHost`.

pub mod error;
pub mod node;
pub mod reply;
pub mod scan;
pub mod select;

use crate::host::Host;
use crate::oid::OpaqueId;
use crate::read_preference::ReadPreference;
use node::Node;
use reply::IsMasterReply;
use scan::{Scan, Step};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, trace, warn};

pub use error::Error;

pub struct ReplicaSetMonitor {
    set_name: String,
    seeds: Vec<Host>,
    nodes: HashMap<Host, Node>,
    primary: Option<Host>,
    max_election_id: OpaqueId,
    config_version: u64,
    scan: Option<Scan>,
}

impl ReplicaSetMonitor {
    pub fn new(set_name: impl Into<String>, seeds: Vec<Host>) -> Self {
        let nodes = seeds
            .iter()
            .cloned()
            .map(|h| (h.clone(), Node::seed(h)))
            .collect();

        Self {
            set_name: set_name.into(),
            seeds,
            nodes,
            primary: None,
            max_election_id: OpaqueId::ZERO,
            config_version: 0,
            scan: None,
        }
    }

    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    /// (Re)start a scan over the currently known seed list, ordering hosts
    /// last-seen primary first, then up hosts, then the rest.
    pub fn start_scan(&mut self) {
        let up_hosts: Vec<Host> = self
            .nodes
            .values()
            .filter(|n| n.up)
            .map(|n| n.host.clone())
            .collect();
        self.scan = Some(Scan::start(&self.seeds, self.primary.as_ref(), &up_hosts));
    }

    pub fn next_step(&mut self) -> Step {
        match &mut self.scan {
            Some(scan) => scan.next_step(),
            None => {
                self.start_scan();
                self.scan.as_mut().unwrap().next_step()
            }
        }
    }

    /// Apply an identity-probe reply.
    pub fn received_is_master(&mut self, host: Host, rtt: Duration, reply: IsMasterReply) {
        if reply.set_name != self.set_name {
            warn!(%host, reply_set = %reply.set_name, expected = %self.set_name, "discarding host: set name mismatch");
            if let Some(scan) = &mut self.scan {
                scan.on_reply(&host);
            }
            self.nodes.remove(&host);
            return;
        }

        if reply.is_master {
            self.handle_primary_reply(&host, rtt, &reply);
        } else if reply.secondary {
            self.handle_secondary_reply(&host, rtt, &reply);
        } else {
            // Neither primary nor secondary: arbiter or unknown state, up
            // but not a read/write target.
            let node = self.nodes.entry(host.clone()).or_insert_with(|| Node::seed(host.clone()));
            node.up = true;
            node.primary = false;
            node.rtt = Some(rtt);
        }

        if let Some(hint) = &reply.primary_hint {
            let already_known = self.primary.as_ref() == Some(hint);
            if !already_known {
                if let Some(scan) = &mut self.scan {
                    scan.discover_host(hint.clone(), true);
                }
            }
        }

        if let Some(scan) = &mut self.scan {
            scan.on_reply(&host);
        }
    }

    fn handle_primary_reply(&mut self, host: &Host, rtt: Duration, reply: &IsMasterReply) {
        let incoming = (reply.config_version, reply.election_id);
        let current = (self.config_version, self.max_election_id);

        if incoming < current {
            trace!(%host, "stale primary reply rejected");
            if let Some(node) = self.nodes.get_mut(host) {
                node.up = true;
                node.primary = false;
                node.rtt = Some(rtt);
            }
            return;
        }

        info!(%host, config_version = reply.config_version, "adopting primary");
        self.config_version = reply.config_version;
        self.max_election_id = reply.election_id;
        self.primary = Some(host.clone());

        let members: Vec<Host> = reply.all_members().cloned().collect();
        let mut replaced = HashMap::with_capacity(members.len());
        for member in &members {
            let mut node = self.nodes.remove(member).unwrap_or_else(|| Node::seed(member.clone()));
            if member == host {
                node.up = true;
                node.primary = true;
                node.rtt = Some(rtt);
            } else {
                node.primary = false;
            }
            replaced.insert(member.clone(), node);
        }
        self.nodes = replaced;

        for member in &members {
            if let Some(scan) = &mut self.scan {
                scan.discover_host(member.clone(), false);
            }
        }
    }

    fn handle_secondary_reply(&mut self, host: &Host, rtt: Duration, reply: &IsMasterReply) {
        let node = self.nodes.entry(host.clone()).or_insert_with(|| Node::seed(host.clone()));
        node.up = true;
        node.primary = false;
        node.hidden = reply.hidden;
        node.passive = reply.passive;
        node.tags = reply.tags.clone();
        node.last_write_date = reply.last_write_date;
        node.op_time = reply.op_time;
        node.rtt = Some(rtt);

        if self.primary.is_none() {
            for member in reply.all_members() {
                if let Some(scan) = &mut self.scan {
                    scan.discover_host(member.clone(), false);
                }
            }
        }
    }

    /// Out-of-band failure report: mark down immediately regardless of scan
    /// state; a future scan re-probes the host.
    pub fn failed_host(&mut self, host: &Host) {
        if let Some(node) = self.nodes.get_mut(host) {
            node.mark_down();
        }
        if self.primary.as_ref() == Some(host) {
            self.primary = None;
        }
    }

    pub fn select_host(&self, pref: &ReadPreference) -> Option<Host> {
        select::select_host(&self.nodes, self.primary.as_ref(), pref)
    }

    pub fn primary(&self) -> Option<&Host> {
        self.primary.as_ref()
    }

    pub fn max_election_id(&self) -> OpaqueId {
        self.max_election_id
    }

    pub fn config_version(&self) -> u64 {
        self.config_version
    }

    pub fn up_node_count(&self) -> usize {
        self.nodes.values().filter(|n| n.up).count()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::read_preference::OpTime;

    fn h(label: &str) -> Host {
        Host::new_test(label)
    }

    #[test]
    fn test_primary_discovered_via_secondary_hint() {
        let mut monitor = ReplicaSetMonitor::new("rs0", vec![h("a"), h("b"), h("c")]);
        monitor.start_scan();

        for expected in [h("a"), h("b"), h("c")] {
            assert_eq!(monitor.next_step(), Step::ContactHost(expected));
            let reply = IsMasterReply::secondary("rs0", vec![h("a"), h("b"), h("c"), h("d")])
                .with_primary_hint(h("d"));
            monitor.received_is_master(expected, Duration::from_millis(1), reply);
        }

        assert_eq!(monitor.next_step(), Step::ContactHost(h("d")));
        let primary_reply = IsMasterReply::primary("rs0", vec![h("a"), h("b"), h("c"), h("d")])
            .with_election(1, OpaqueId::new());
        monitor.received_is_master(h("d"), Duration::from_millis(1), primary_reply);

        assert_eq!(monitor.next_step(), Step::Done);
        assert_eq!(monitor.primary(), Some(&h("d")));
        assert_eq!(monitor.up_node_count(), 4);
    }

    #[test]
    fn test_stale_primary_rejected() {
        let mut monitor = ReplicaSetMonitor::new("rs0", vec![h("a"), h("b"), h("c")]);
        monitor.start_scan();

        let e1 = OpaqueId::from_bytes([1; 12]);
        let e2 = OpaqueId::from_bytes([2; 12]);

        assert_eq!(monitor.next_step(), Step::ContactHost(h("a")));
        monitor.received_is_master(
            h("a"),
            Duration::from_millis(1),
            IsMasterReply::primary("rs0", vec![h("a"), h("b"), h("c")]).with_election(2, e2),
        );

        assert_eq!(monitor.next_step(), Step::ContactHost(h("b")));
        monitor.received_is_master(
            h("b"),
            Duration::from_millis(1),
            IsMasterReply::primary("rs0", vec![h("a"), h("b"), h("c")]).with_election(1, e1),
        );

        assert_eq!(monitor.primary(), Some(&h("a")));
        assert_eq!(monitor.max_election_id(), e2);
        assert_eq!(monitor.config_version(), 2);
    }

    #[test]
    fn test_set_name_mismatch_discards_host() {
        let mut monitor = ReplicaSetMonitor::new("rs0", vec![h("a")]);
        monitor.start_scan();
        assert_eq!(monitor.next_step(), Step::ContactHost(h("a")));
        monitor.received_is_master(
            h("a"),
            Duration::from_millis(1),
            IsMasterReply::primary("other-set", vec![h("a")]),
        );
        assert_eq!(monitor.up_node_count(), 0);
        assert_eq!(monitor.next_step(), Step::Done);
    }

    #[test]
    fn test_out_of_band_failure_clears_primary() {
        let mut monitor = ReplicaSetMonitor::new("rs0", vec![h("a")]);
        monitor.start_scan();
        monitor.next_step();
        monitor.received_is_master(
            h("a"),
            Duration::from_millis(1),
            IsMasterReply::primary("rs0", vec![h("a")]).with_election(1, OpaqueId::new()),
        );
        assert_eq!(monitor.primary(), Some(&h("a")));

        monitor.failed_host(&h("a"));
        assert_eq!(monitor.primary(), None);
        assert_eq!(monitor.select_host(&ReadPreference::primary()), None);
    }

    #[test]
    fn test_secondary_election_id_is_ignored() {
        let mut monitor = ReplicaSetMonitor::new("rs0", vec![h("a")]);
        monitor.start_scan();
        monitor.next_step();
        let reply = IsMasterReply::secondary("rs0", vec![h("a")]).with_election(99, OpaqueId::new());
        monitor.received_is_master(h("a"), Duration::from_millis(1), reply);
        assert_eq!(monitor.config_version(), 0);
        assert_eq!(monitor.max_election_id(), OpaqueId::ZERO);
    }

    #[test]
    fn test_secondary_op_time_is_recorded() {
        let mut monitor = ReplicaSetMonitor::new("rs0", vec![h("a")]);
        monitor.start_scan();
        monitor.next_step();
        let reply = IsMasterReply::secondary("rs0", vec![h("a")]).with_op_time(OpTime(42));
        monitor.received_is_master(h("a"), Duration::from_millis(1), reply);
        let pref = ReadPreference {
            mode: crate::read_preference::Mode::SecondaryOnly,
            ..ReadPreference::nearest()
        };
        assert_eq!(monitor.select_host(&pref), Some(h("a")));
    }
}
