//! Per-object lifecycle record and bookkeeping

use std::time::Instant;

/// Where an object currently is in its pooled lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Owned by the pool, available to borrowers.
    Idle,
    /// Owned by a borrower.
    Allocated,
    /// Being destroyed; will not re-enter the pool.
    Invalid,
    /// Detected stale while allocated; pending reclamation.
    Abandoned,
}

/// Bookkeeping attached to one pooled instance.
///
/// The record travels with the object: it sits in the idle store while the
/// object is idle and in the active set while the object is out with a
/// borrower. It is never in both.
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    pub(crate) id: u64,
    pub(crate) state: LifecycleState,
    created_at: Instant,
    last_borrowed_at: Instant,
    last_returned_at: Instant,
    last_used_at: Instant,
    borrow_count: u64,
}

impl ObjectRecord {
    pub(crate) fn new(id: u64) -> Self {
        let now = Instant::now();
        Self {
            id,
            state: LifecycleState::Idle,
            created_at: now,
            last_borrowed_at: now,
            last_returned_at: now,
            last_used_at: now,
            borrow_count: 0,
        }
    }

    pub(crate) fn mark_borrowed(&mut self) {
        let now = Instant::now();
        self.state = LifecycleState::Allocated;
        self.last_borrowed_at = now;
        self.last_used_at = now;
        self.borrow_count += 1;
    }

    pub(crate) fn mark_returned(&mut self) {
        let now = Instant::now();
        self.state = LifecycleState::Idle;
        self.last_returned_at = now;
        self.last_used_at = now;
    }

    /// Stable identifier of this instance within its pool.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// When the factory created this instance.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// When this instance was last handed to a borrower.
    pub fn last_borrowed_at(&self) -> Instant {
        self.last_borrowed_at
    }

    /// When this instance last re-entered the idle store.
    pub fn last_returned_at(&self) -> Instant {
        self.last_returned_at
    }

    /// When this instance was last touched by any lifecycle transition.
    pub fn last_used_at(&self) -> Instant {
        self.last_used_at
    }

    /// How many times this instance has been borrowed.
    pub fn borrow_count(&self) -> u64 {
        self.borrow_count
    }

    /// How long this instance has sat in the idle store.
    pub fn idle_duration(&self) -> std::time::Duration {
        self.last_returned_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrow_and_return_update_bookkeeping() {
        let mut record = ObjectRecord::new(7);
        assert_eq!(record.state(), LifecycleState::Idle);
        assert_eq!(record.borrow_count(), 0);

        record.mark_borrowed();
        assert_eq!(record.state(), LifecycleState::Allocated);
        assert_eq!(record.borrow_count(), 1);

        record.mark_returned();
        assert_eq!(record.state(), LifecycleState::Idle);
        assert!(record.last_returned_at() >= record.last_borrowed_at());

        record.mark_borrowed();
        assert_eq!(record.borrow_count(), 2);
    }
}
