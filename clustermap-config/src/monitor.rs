use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the client-side replica-set monitor (scan cadence, timeouts,
/// default read-preference tuning).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Monitor {
    /// How often a background scan is triggered even if nothing asked for one.
    ///
    /// _Default:_ `10000` (10s)
    #[serde(default = "Monitor::scan_interval_ms")]
    pub scan_interval_ms: u64,

    /// How long to wait for a single host's identity probe before marking it down.
    ///
    /// _Default:_ `5000`
    #[serde(default = "Monitor::probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Deadline for `selectHost` to find a matching host before giving up.
    ///
    /// _Default:_ `15000`
    #[serde(default = "Monitor::select_timeout_ms")]
    pub select_timeout_ms: u64,

    /// Default read-preference max staleness, applied when the caller doesn't
    /// specify one. `0` disables the filter.
    ///
    /// _Default:_ `0`
    #[serde(default)]
    pub default_max_staleness_ms: u64,

    /// Number of top-latency candidates considered for random tie-breaking
    /// in `selectHost`'s nearest-by-latency pick.
    ///
    /// _Default:_ `2`
    #[serde(default = "Monitor::latency_window")]
    pub latency_window: usize,
}

impl Monitor {
    fn scan_interval_ms() -> u64 {
        10_000
    }

    fn probe_timeout_ms() -> u64 {
        5_000
    }

    fn select_timeout_ms() -> u64 {
        15_000
    }

    fn latency_window() -> usize {
        2
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn select_timeout(&self) -> Duration {
        Duration::from_millis(self.select_timeout_ms)
    }

    pub fn default_max_staleness(&self) -> Duration {
        Duration::from_millis(self.default_max_staleness_ms)
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self {
            scan_interval_ms: Self::scan_interval_ms(),
            probe_timeout_ms: Self::probe_timeout_ms(),
            select_timeout_ms: Self::select_timeout_ms(),
            default_max_staleness_ms: 0,
            latency_window: Self::latency_window(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_roundtrip_toml() {
        let monitor = Monitor::default();
        let s = toml::to_string(&monitor).unwrap();
        let back: Monitor = toml::from_str(&s).unwrap();
        assert_eq!(monitor, back);
    }

    #[test]
    fn test_durations() {
        let monitor = Monitor::default();
        assert_eq!(monitor.scan_interval(), Duration::from_secs(10));
        assert_eq!(monitor.probe_timeout(), Duration::from_secs(5));
    }
}
