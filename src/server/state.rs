//! State shared by the request handlers of one panel server instance.
//!
//! A fresh `AppState` is built on every (re)start, so the instance id and the
//! request counters describe the current instance only.

use crate::store::PanelSettings;
use crate::supervisor::SupervisorHandle;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use uuid::Uuid;

/// Shared application state.
pub struct AppState {
    /// Identifier of the owning instance.
    pub instance_id: Uuid,
    /// Settings the instance was started with.
    pub settings: PanelSettings,
    /// Channel to the lifecycle supervisor.
    pub supervisor: SupervisorHandle,
    /// Request counters.
    pub stats: RequestStats,
    started: Instant,
}

impl AppState {
    /// Creates state for a newly started instance.
    pub fn new(settings: PanelSettings, supervisor: SupervisorHandle) -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            settings,
            supervisor,
            stats: RequestStats::default(),
            started: Instant::now(),
        }
    }

    /// Seconds since the instance started.
    pub fn uptime_seconds(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

/// Lock-free request counters.
#[derive(Debug, Default)]
pub struct RequestStats {
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl RequestStats {
    /// Records one handled request.
    pub fn record(&self, success: bool) {
        let counter = if success {
            &self.succeeded
        } else {
            &self.failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Reads the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        let succeeded = self.succeeded.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        StatsSnapshot {
            requests_total: succeeded + failed,
            requests_success: succeeded,
            requests_failed: failed,
        }
    }
}

/// Point-in-time copy of [`RequestStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub requests_total: u64,
    pub requests_success: u64,
    pub requests_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::channel;

    #[test]
    fn test_new_state_starts_fresh() {
        let (handle, _rx) = channel();
        let state = AppState::new(PanelSettings::default(), handle);

        assert_eq!(state.settings.port, crate::store::DEFAULT_PORT);
        assert!(state.uptime_seconds() < 1);
        assert_eq!(state.stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn test_each_instance_gets_its_own_id() {
        let (handle, _rx) = channel();
        let a = AppState::new(PanelSettings::default(), handle.clone());
        let b = AppState::new(PanelSettings::default(), handle);

        assert_ne!(a.instance_id, b.instance_id);
    }

    #[test]
    fn test_record_counts_outcomes() {
        let stats = RequestStats::default();

        stats.record(true);
        stats.record(true);
        stats.record(false);

        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                requests_total: 3,
                requests_success: 2,
                requests_failed: 1,
            }
        );
    }
}
