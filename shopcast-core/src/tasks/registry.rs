// src/tasks/registry.rs
//
// Runtime state of the periodic sweepers: enablement, interval, run count
// and the last summary each one produced.

use std::collections::BTreeMap;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use shopcast_common::models::{SweeperKind, SweeperStatus};
use crate::config::EngineConfig;

pub struct SweeperRegistry {
    entries: RwLock<BTreeMap<SweeperKind, SweeperStatus>>,
}

impl SweeperRegistry {
    pub fn new(config: &EngineConfig) -> Self {
        let entries = SweeperKind::ALL
            .iter()
            .map(|kind| {
                (
                    *kind,
                    SweeperStatus {
                        kind: *kind,
                        enabled: config.sweeper_enabled(*kind),
                        interval_secs: config.sweeper_interval_secs(*kind),
                        runs: 0,
                        last_run_at: None,
                        last_summary: None,
                    },
                )
            })
            .collect();
        Self { entries: RwLock::new(entries) }
    }

    pub fn is_enabled(&self, kind: SweeperKind) -> bool {
        self.entries.read().get(&kind).map_or(false, |s| s.enabled)
    }

    pub fn set_enabled(&self, kind: SweeperKind, enabled: bool) {
        if let Some(entry) = self.entries.write().get_mut(&kind) {
            entry.enabled = enabled;
        }
    }

    pub fn interval_secs(&self, kind: SweeperKind) -> u64 {
        self.entries.read().get(&kind).map_or(60, |s| s.interval_secs)
    }

    pub fn record_run(&self, kind: SweeperKind, at: DateTime<Utc>, summary: serde_json::Value) {
        if let Some(entry) = self.entries.write().get_mut(&kind) {
            entry.runs += 1;
            entry.last_run_at = Some(at);
            entry.last_summary = Some(summary);
        }
    }

    pub fn snapshot(&self) -> Vec<SweeperStatus> {
        self.entries.read().values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_enablement_and_runs() {
        let registry = SweeperRegistry::new(&EngineConfig::default());
        assert!(registry.is_enabled(SweeperKind::Sanctions));
        assert_eq!(registry.interval_secs(SweeperKind::StreamsLifecycle), 60);

        registry.set_enabled(SweeperKind::Sanctions, false);
        assert!(!registry.is_enabled(SweeperKind::Sanctions));

        let at = Utc::now();
        registry.record_run(SweeperKind::ReelExpiry, at, serde_json::json!({"expired": 2}));
        let status = registry
            .snapshot()
            .into_iter()
            .find(|s| s.kind == SweeperKind::ReelExpiry)
            .unwrap();
        assert_eq!(status.runs, 1);
        assert_eq!(status.last_run_at, Some(at));
        assert_eq!(status.last_summary, Some(serde_json::json!({"expired": 2})));
    }
}
