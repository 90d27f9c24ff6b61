//! Optional usage-tracking callback

/// Observer notified when objects are handed out and released.
///
/// Implementations can layer abandoned-object detection or proxy-based
/// auto-return on top of the pool; the pool's own obligation ends at these
/// notifications plus the guard's drop-based return. The `id` is the stable
/// per-object identifier from [`ObjectRecord::id`](crate::ObjectRecord::id).
pub trait UsageTracker: Send + Sync {
    /// An object was handed to a borrower.
    fn on_borrow(&self, id: u64);

    /// An object left a borrower, by return, invalidation or detach.
    fn on_release(&self, id: u64);
}
