//! Pool configuration options

use std::time::Duration;

/// Removal discipline of the idle store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdleOrder {
    /// Most-recently-idled first.
    #[default]
    Lifo,
    /// Oldest-idled first.
    Fifo,
}

/// Tunables consumed by the pool engine and the evictor.
///
/// # Examples
///
/// ```
/// use corral::{IdleOrder, PoolConfig};
/// use std::time::Duration;
///
/// let config = PoolConfig::new()
///     .with_max_total(16)
///     .with_max_wait(Duration::from_secs(5))
///     .with_order(IdleOrder::Fifo)
///     .with_test_on_borrow(true);
///
/// assert_eq!(config.max_total, 16);
/// assert_eq!(config.order, IdleOrder::Fifo);
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Cap on objects that may exist at once (idle + active + being created).
    pub max_total: usize,

    /// Cap on the idle store; returns beyond it destroy the object instead.
    pub max_idle: usize,

    /// Floor the evictor maintains and will not evict below.
    pub min_idle: usize,

    /// Maximum time a borrower blocks when the pool is exhausted.
    /// `None` blocks indefinitely.
    pub max_wait: Option<Duration>,

    /// Removal discipline of the idle store.
    pub order: IdleOrder,

    /// Validate freshly created objects before first use.
    pub test_on_create: bool,

    /// Validate idle objects during borrow.
    pub test_on_borrow: bool,

    /// Validate objects on return before re-idling them.
    pub test_on_return: bool,

    /// Revalidate idle objects during eviction runs.
    pub test_while_idle: bool,

    /// Interval between evictor runs. `None` disables the evictor.
    pub time_between_eviction_runs: Option<Duration>,

    /// Idle time after which an object is evictable, subject to the
    /// `min_idle` floor.
    pub min_evictable_idle: Duration,

    /// Softer idle threshold honored only while `min_idle` is preserved.
    pub soft_min_evictable_idle: Option<Duration>,

    /// Upper bound on idle objects examined per eviction run.
    pub num_tests_per_eviction_run: usize,

    /// Whether a failed `test_while_idle` validation destroys the object
    /// (`true`) or re-queues it (`false`).
    pub destroy_on_failed_idle_validation: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_total: 8,
            max_idle: 8,
            min_idle: 0,
            max_wait: None,
            order: IdleOrder::Lifo,
            test_on_create: false,
            test_on_borrow: false,
            test_on_return: false,
            test_while_idle: false,
            time_between_eviction_runs: None,
            min_evictable_idle: Duration::from_secs(30 * 60),
            soft_min_evictable_idle: None,
            num_tests_per_eviction_run: 3,
            destroy_on_failed_idle_validation: true,
        }
    }
}

impl PoolConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cap on total objects.
    pub fn with_max_total(mut self, max: usize) -> Self {
        self.max_total = max;
        self
    }

    /// Set the cap on the idle store.
    pub fn with_max_idle(mut self, max: usize) -> Self {
        self.max_idle = max;
        self
    }

    /// Set the idle floor maintained by the evictor.
    pub fn with_min_idle(mut self, min: usize) -> Self {
        self.min_idle = min;
        self
    }

    /// Bound the time a borrower blocks when the pool is exhausted.
    pub fn with_max_wait(mut self, wait: Duration) -> Self {
        self.max_wait = Some(wait);
        self
    }

    /// Set the idle-store removal discipline.
    pub fn with_order(mut self, order: IdleOrder) -> Self {
        self.order = order;
        self
    }

    /// Validate freshly created objects before first use.
    pub fn with_test_on_create(mut self, enabled: bool) -> Self {
        self.test_on_create = enabled;
        self
    }

    /// Validate idle objects during borrow.
    pub fn with_test_on_borrow(mut self, enabled: bool) -> Self {
        self.test_on_borrow = enabled;
        self
    }

    /// Validate objects on return.
    pub fn with_test_on_return(mut self, enabled: bool) -> Self {
        self.test_on_return = enabled;
        self
    }

    /// Revalidate idle objects during eviction runs.
    pub fn with_test_while_idle(mut self, enabled: bool) -> Self {
        self.test_while_idle = enabled;
        self
    }

    /// Enable the background evictor with the given run interval.
    pub fn with_eviction_interval(mut self, interval: Duration) -> Self {
        self.time_between_eviction_runs = Some(interval);
        self
    }

    /// Idle time after which an object is evictable, subject to the
    /// `min_idle` floor.
    pub fn with_min_evictable_idle(mut self, idle: Duration) -> Self {
        self.min_evictable_idle = idle;
        self
    }

    /// Softer idle threshold honored only while `min_idle` is preserved.
    pub fn with_soft_min_evictable_idle(mut self, idle: Duration) -> Self {
        self.soft_min_evictable_idle = Some(idle);
        self
    }

    /// Bound the number of idle objects examined per eviction run.
    pub fn with_num_tests_per_eviction_run(mut self, count: usize) -> Self {
        self.num_tests_per_eviction_run = count;
        self
    }

    /// Choose whether failed idle validation destroys or re-queues.
    pub fn with_destroy_on_failed_idle_validation(mut self, destroy: bool) -> Self {
        self.destroy_on_failed_idle_validation = destroy;
        self
    }
}
