//! `selectHost(readPref) → host` filter chain.

use crate::host::Host;
use crate::monitor::node::Node;
use crate::read_preference::{Mode, ReadPreference};
use rand::Rng;
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

/// Pick a host satisfying `pref` out of the monitor's current node table.
/// `primary` is the currently adopted primary, if any.
pub fn select_host(
    nodes: &HashMap<Host, Node>,
    primary: Option<&Host>,
    pref: &ReadPreference,
) -> Option<Host> {
    let mut candidates = mode_candidates(nodes, primary, pref.mode);
    if candidates.is_empty() {
        return None;
    }

    candidates.retain(|n| pref.tags_match(&n.tags));
    if candidates.is_empty() {
        return None;
    }

    let filtered = apply_max_staleness(nodes, primary, &candidates, pref.max_staleness);
    if !filtered.is_empty() {
        candidates = filtered;
    } else if pref.max_staleness > Duration::ZERO {
        // No candidate is fresh enough; max-staleness has no "drop" escape
        // hatch — surface an empty result.
        return None;
    }

    let with_op_time: Vec<&Node> = candidates
        .iter()
        .copied()
        .filter(|n| n.op_time >= pref.min_op_time)
        .collect();
    if !with_op_time.is_empty() {
        candidates = with_op_time;
    } else if pref.min_op_time_filter_is_strict() {
        return None;
    }
    // else: drop the filter, keep the pre-filter candidate set (Nearest /
    // PrimaryPreferred rule).

    nearest(&candidates)
}

fn mode_candidates<'a>(
    nodes: &'a HashMap<Host, Node>,
    primary: Option<&Host>,
    mode: Mode,
) -> Vec<&'a Node> {
    let up = |host: &Host| nodes.get(host).filter(|n| n.up);
    let secondaries = || nodes.values().filter(|n| n.up && !n.primary);

    match mode {
        Mode::PrimaryOnly => primary.and_then(up).into_iter().collect(),
        Mode::PrimaryPreferred => {
            if let Some(p) = primary.and_then(up) {
                vec![p]
            } else {
                secondaries().collect()
            }
        }
        Mode::SecondaryOnly => secondaries().collect(),
        Mode::SecondaryPreferred => {
            let secs: Vec<&Node> = secondaries().collect();
            if !secs.is_empty() {
                secs
            } else {
                primary.and_then(up).into_iter().collect()
            }
        }
        Mode::Nearest => nodes.values().filter(|n| n.up).collect(),
    }
}

fn apply_max_staleness<'a>(
    nodes: &'a HashMap<Host, Node>,
    primary: Option<&Host>,
    candidates: &[&'a Node],
    max_staleness: Duration,
) -> Vec<&'a Node> {
    if max_staleness == Duration::ZERO {
        return candidates.to_vec();
    }
    let reference = primary
        .and_then(|p| nodes.get(p))
        .and_then(|p| p.last_write_date)
        .unwrap_or_else(|| SystemTime::now());

    candidates
        .iter()
        .copied()
        .filter(|n| match n.last_write_date {
            Some(last_write) => {
                reference
                    .duration_since(last_write)
                    .unwrap_or(Duration::ZERO)
                    <= max_staleness
            }
            None => false,
        })
        .collect()
}

/// Return the lowest-latency candidate, breaking ties randomly over the
/// nodes within `LATENCY_WINDOW` of the best RTT.
fn nearest<'a>(candidates: &[&'a Node]) -> Option<Host> {
    const LATENCY_WINDOW: Duration = Duration::from_millis(15);

    let best_rtt = candidates.iter().filter_map(|n| n.rtt).min()?;
    let window: Vec<&&Node> = candidates
        .iter()
        .filter(|n| n.rtt.is_some_and(|rtt| rtt <= best_rtt + LATENCY_WINDOW))
        .collect();

    if window.is_empty() {
        return candidates.first().map(|n| n.host.clone());
    }
    let idx = rand::rng().random_range(0..window.len());
    Some(window[idx].host.clone())
}
