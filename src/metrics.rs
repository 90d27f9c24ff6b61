//! Lifecycle counters exposed for external metrics emission

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of a pool's counters.
///
/// The pool only maintains these numbers; shipping them to a metrics backend
/// is the caller's concern.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoolMetrics {
    /// Objects created by the factory over the pool's lifetime.
    pub created: u64,

    /// Objects destroyed over the pool's lifetime, for any reason.
    pub destroyed: u64,

    /// Successful borrows.
    pub borrowed: u64,

    /// Objects handed back (explicitly or by guard drop).
    pub returned: u64,

    /// Objects destroyed by the background evictor.
    pub evicted: u64,

    /// Validation checks that came back invalid.
    pub validation_failures: u64,

    /// Objects currently out with borrowers.
    pub active: usize,

    /// Objects currently in the idle store.
    pub idle: usize,

    /// Configured cap on total objects.
    pub max_total: usize,
}

/// Internal counter set, updated by the engine and evictor.
#[derive(Debug, Default)]
pub(crate) struct MetricsTracker {
    pub created: AtomicU64,
    pub destroyed: AtomicU64,
    pub borrowed: AtomicU64,
    pub returned: AtomicU64,
    pub evicted: AtomicU64,
    pub validation_failures: AtomicU64,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, active: usize, idle: usize, max_total: usize) -> PoolMetrics {
        PoolMetrics {
            created: self.created.load(Ordering::Relaxed),
            destroyed: self.destroyed.load(Ordering::Relaxed),
            borrowed: self.borrowed.load(Ordering::Relaxed),
            returned: self.returned.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            active,
            idle,
            max_total,
        }
    }
}

pub(crate) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counters() {
        let tracker = MetricsTracker::new();
        bump(&tracker.created);
        bump(&tracker.created);
        bump(&tracker.borrowed);
        bump(&tracker.destroyed);

        let snap = tracker.snapshot(1, 1, 8);
        assert_eq!(snap.created, 2);
        assert_eq!(snap.borrowed, 1);
        assert_eq!(snap.destroyed, 1);
        assert_eq!(snap.returned, 0);
        assert_eq!(snap.active, 1);
        assert_eq!(snap.idle, 1);
        assert_eq!(snap.max_total, 8);
    }
}
