//! Expiry sweeping.
//!
//! There is no background timer: the registry sweeps at the start of every
//! list, create and update, so a stale record survives at most until the next
//! request.

use std::time::Duration;

use tracing::info;

use crate::store::{Experiment, RecordStore};

#[derive(Debug, Clone, Copy)]
pub struct ExpirySweeper {
    max_age: Duration,
}

impl ExpirySweeper {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    pub fn is_expired(&self, experiment: &Experiment, now: i64) -> bool {
        let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        experiment.age(now) > max_age
    }

    /// Drop every record older than the threshold. Returns the removed records
    /// so the caller can decide whether to persist.
    pub fn sweep(&self, store: &mut RecordStore, now: i64) -> Vec<Experiment> {
        let removed = store.remove_where(|exp| self.is_expired(exp, now));
        for exp in &removed {
            info!(
                "Expired experiment {} (last updated {}s ago)",
                exp.id().unwrap_or("<unknown>"),
                exp.age(now)
            );
        }
        removed
    }
}
