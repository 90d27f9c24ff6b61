//! # corral
//!
//! Thread-safe generic object pool for expensive-to-create, reusable
//! resources: connections, buffers, worker handles.
//!
//! ## Features
//!
//! - Factory lifecycle contract: create, activate, passivate, validate,
//!   destroy
//! - Exclusive ownership enforced under concurrency; automatic return via
//!   RAII (Drop trait)
//! - Capacity limits with bounded blocking waits and waiter wakeup
//! - LIFO/FIFO idle ordering
//! - Background eviction by idle time, with min-idle floor and optional
//!   idle revalidation
//! - Closeable shutdown that neither strands nor leaks objects
//! - Lifecycle counters for external metrics emission
//! - Async borrow with timeout
//!
//! ## Quick Start
//!
//! ```rust
//! use corral::{GenericPool, ObjectFactory, ObjectPool, PoolConfig};
//! use std::convert::Infallible;
//!
//! struct ScratchFactory;
//!
//! impl ObjectFactory for ScratchFactory {
//!     type Object = String;
//!     type Error = Infallible;
//!
//!     fn create(&self) -> Result<String, Infallible> {
//!         Ok(String::with_capacity(64))
//!     }
//!
//!     fn passivate(&self, s: &mut String) -> Result<(), Infallible> {
//!         s.clear();
//!         Ok(())
//!     }
//! }
//!
//! let pool = GenericPool::new(ScratchFactory, PoolConfig::new().with_max_total(4));
//! {
//!     let mut s = pool.borrow_object().unwrap();
//!     s.push_str("hello");
//! } // returned to the pool when `s` goes out of scope
//! assert_eq!(pool.num_idle(), 1);
//! ```

mod config;
mod errors;
mod eviction;
mod factory;
mod metrics;
mod object;
mod pool;
mod usage;

#[cfg(test)]
mod test_support;

pub use config::{IdleOrder, PoolConfig};
pub use errors::{Hook, PoolError, PoolResult};
pub use factory::ObjectFactory;
pub use metrics::PoolMetrics;
pub use object::{LifecycleState, ObjectRecord};
pub use pool::{GenericPool, ObjectPool, Pooled};
pub use usage::UsageTracker;
