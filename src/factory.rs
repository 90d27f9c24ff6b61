//! The factory lifecycle contract supplied by pool users

/// Supplies and retires the objects managed by a pool.
///
/// The pool never touches a resource directly; every lifecycle transition goes
/// through one of these hooks. All hooks except [`create`](Self::create) have
/// no-op defaults so simple factories only implement construction.
///
/// Failure semantics are decided by the pool, per call site: `create` failures
/// always propagate to the caller that triggered growth, `activate`/`validate`
/// failures during borrow discard the candidate and retry, and `destroy`
/// failures are swallowed everywhere except an explicit
/// [`invalidate_object`](crate::ObjectPool::invalidate_object).
///
/// # Examples
///
/// ```
/// use corral::ObjectFactory;
/// use std::convert::Infallible;
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// #[derive(Default)]
/// struct CounterFactory(AtomicU64);
///
/// impl ObjectFactory for CounterFactory {
///     type Object = u64;
///     type Error = Infallible;
///
///     fn create(&self) -> Result<u64, Infallible> {
///         Ok(self.0.fetch_add(1, Ordering::Relaxed))
///     }
/// }
/// ```
pub trait ObjectFactory: Send + Sync {
    /// The pooled resource type.
    type Object: Send;

    /// The error type raised by hooks.
    type Error: std::error::Error + Send;

    /// Construct a new instance. Called when the pool decides to grow.
    fn create(&self) -> Result<Self::Object, Self::Error>;

    /// Prepare an idle instance for handout to a borrower.
    fn activate(&self, obj: &mut Self::Object) -> Result<(), Self::Error> {
        let _ = obj;
        Ok(())
    }

    /// Reset an instance to a reusable state before it re-enters the idle
    /// store.
    fn passivate(&self, obj: &mut Self::Object) -> Result<(), Self::Error> {
        let _ = obj;
        Ok(())
    }

    /// Check whether an instance is still usable. `Ok(false)` and `Err(_)`
    /// are both treated as "invalid" by the pool.
    fn validate(&self, obj: &mut Self::Object) -> Result<bool, Self::Error> {
        let _ = obj;
        Ok(true)
    }

    /// Retire an instance. The pool never reuses an object across a destroy
    /// boundary.
    fn destroy(&self, obj: Self::Object) -> Result<(), Self::Error> {
        drop(obj);
        Ok(())
    }
}
