//! Core pool engine: capability trait, generic implementation, RAII guard

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::config::{IdleOrder, PoolConfig};
use crate::errors::{Hook, PoolError, PoolResult};
use crate::eviction::Evictor;
use crate::factory::ObjectFactory;
use crate::metrics::{bump, MetricsTracker, PoolMetrics};
use crate::object::{LifecycleState, ObjectRecord};
use crate::usage::UsageTracker;

/// The pool capability surface.
///
/// Each implementation is an independent state machine composed with an
/// [`ObjectFactory`]; there is no shared base behavior beyond these defaults.
/// Variants that cannot track counts report `-1` from the count accessors,
/// and variants without pre-population reject `add_object` with
/// [`PoolError::UnsupportedOperation`].
pub trait ObjectPool: Send + Sync {
    /// The pooled resource type.
    type Object: Send;

    /// Error type of the injected factory.
    type FactoryError: std::error::Error + Send;

    /// Exclusive handle to a borrowed object.
    type Guard: DerefMut<Target = Self::Object>;

    /// Obtain exclusive, temporary ownership of a pooled object.
    fn borrow_object(&self) -> PoolResult<Self::Guard, Self::FactoryError>;

    /// Hand a borrowed object back. Never fails; cleanup problems are
    /// swallowed.
    fn return_object(&self, obj: Self::Guard);

    /// Discard a borrowed object known to be bad. The object is destroyed and
    /// never re-idled; a destroy failure propagates on this path.
    fn invalidate_object(&self, obj: Self::Guard) -> PoolResult<(), Self::FactoryError>;

    /// Create and passivate one object straight into the idle store.
    fn add_object(&self) -> PoolResult<(), Self::FactoryError> {
        Err(PoolError::UnsupportedOperation("add_object"))
    }

    /// [`add_object`](Self::add_object), `count` times.
    fn add_objects(&self, count: usize) -> PoolResult<(), Self::FactoryError> {
        for _ in 0..count {
            self.add_object()?;
        }
        Ok(())
    }

    /// Destroy every idle object. Active objects are untouched.
    fn clear(&self) -> PoolResult<(), Self::FactoryError> {
        Err(PoolError::UnsupportedOperation("clear"))
    }

    /// Close the pool: reject further borrows/adds, destroy idle objects,
    /// wake blocked borrowers. Idempotent.
    fn close(&self);

    /// Idle object count, or a negative sentinel when unsupported.
    fn num_idle(&self) -> isize {
        -1
    }

    /// Active object count, or a negative sentinel when unsupported.
    fn num_active(&self) -> isize {
        -1
    }
}

pub(crate) struct IdleSlot<T> {
    pub(crate) obj: T,
    pub(crate) record: ObjectRecord,
}

pub(crate) struct PoolState<T> {
    pub(crate) idle: VecDeque<IdleSlot<T>>,
    pub(crate) active: HashMap<u64, ObjectRecord>,
    /// Objects reserved outside both containers: mid-create, claimed for
    /// activation, or claimed by the evictor. Counts toward `max_total`.
    pub(crate) pending: usize,
    pub(crate) next_id: u64,
    pub(crate) closed: bool,
}

impl<T> PoolState<T> {
    fn new() -> Self {
        Self {
            idle: VecDeque::new(),
            active: HashMap::new(),
            pending: 0,
            next_id: 0,
            closed: false,
        }
    }

    pub(crate) fn total(&self) -> usize {
        self.idle.len() + self.active.len() + self.pending
    }

    fn pop_idle(&mut self, order: IdleOrder) -> Option<IdleSlot<T>> {
        match order {
            IdleOrder::Lifo => self.idle.pop_back(),
            IdleOrder::Fifo => self.idle.pop_front(),
        }
    }

    pub(crate) fn reserve_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Shared engine state; the mutex is the single consistency domain for
/// idle-store membership, active-set membership and count bookkeeping.
/// Factory hooks always run outside it.
pub(crate) struct PoolCore<F: ObjectFactory> {
    pub(crate) factory: F,
    pub(crate) config: PoolConfig,
    pub(crate) state: Mutex<PoolState<F::Object>>,
    pub(crate) available: Condvar,
    pub(crate) metrics: MetricsTracker,
    tracker: Option<Box<dyn UsageTracker>>,
}

impl<F: ObjectFactory> PoolCore<F> {
    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Destroy on every opportunistic path: failures are logged, never
    /// propagated.
    pub(crate) fn destroy_quietly(&self, obj: F::Object) {
        if let Err(err) = self.factory.destroy(obj) {
            tracing::warn!(error = %err, "swallowed factory destroy failure");
        }
        bump(&self.metrics.destroyed);
    }

    pub(crate) fn unreserve(&self) {
        let mut state = self.state.lock();
        state.pending -= 1;
        drop(state);
        self.available.notify_one();
    }

    fn discard_candidate(&self, obj: F::Object) {
        self.destroy_quietly(obj);
        self.unreserve();
    }

    fn notify_release(&self, id: u64) {
        if let Some(tracker) = &self.tracker {
            tracker.on_release(id);
        }
    }

    fn borrow(core: &Arc<Self>, max_wait: Option<Duration>) -> PoolResult<Pooled<F>, F::Error> {
        let start = Instant::now();
        let deadline = max_wait.map(|wait| start + wait);

        loop {
            let mut state = core.state.lock();
            if state.closed {
                return Err(PoolError::Closed);
            }

            let (mut obj, mut record, from_idle) =
                if let Some(slot) = state.pop_idle(core.config.order) {
                    state.pending += 1;
                    drop(state);
                    (slot.obj, slot.record, true)
                } else if state.total() < core.config.max_total {
                    state.pending += 1;
                    let id = state.reserve_id();
                    drop(state);
                    match core.factory.create() {
                        Ok(obj) => {
                            bump(&core.metrics.created);
                            (obj, ObjectRecord::new(id), false)
                        }
                        Err(err) => {
                            core.unreserve();
                            return Err(PoolError::factory(Hook::Create, err));
                        }
                    }
                } else {
                    let timed_out = match deadline {
                        Some(deadline) => {
                            core.available.wait_until(&mut state, deadline).timed_out()
                        }
                        None => {
                            core.available.wait(&mut state);
                            false
                        }
                    };
                    if state.closed || timed_out {
                        return Err(PoolError::Exhausted {
                            waited: start.elapsed(),
                        });
                    }
                    continue;
                };

            // Hooks run without the lock; the candidate is accounted as
            // pending meanwhile.
            if let Err(err) = core.factory.activate(&mut obj) {
                tracing::debug!(error = %err, id = record.id, "activate failed, discarding candidate");
                core.discard_candidate(obj);
                if from_idle {
                    continue;
                }
                // A freshly created object that cannot be activated means the
                // factory has nothing usable to offer; give up.
                return Err(PoolError::Exhausted {
                    waited: start.elapsed(),
                });
            }

            let must_validate =
                core.config.test_on_borrow || (!from_idle && core.config.test_on_create);
            if must_validate {
                let valid = matches!(core.factory.validate(&mut obj), Ok(true));
                if !valid {
                    bump(&core.metrics.validation_failures);
                    core.discard_candidate(obj);
                    if from_idle {
                        continue;
                    }
                    return Err(PoolError::Exhausted {
                        waited: start.elapsed(),
                    });
                }
            }

            let mut state = core.state.lock();
            state.pending -= 1;
            if state.closed {
                drop(state);
                core.destroy_quietly(obj);
                core.available.notify_all();
                return Err(PoolError::Closed);
            }
            record.mark_borrowed();
            let id = record.id;
            state.active.insert(id, record);
            drop(state);

            bump(&core.metrics.borrowed);
            if let Some(tracker) = &core.tracker {
                tracker.on_borrow(id);
            }
            return Ok(Pooled {
                obj: Some(obj),
                id,
                core: Arc::clone(core),
            });
        }
    }

    /// Return path shared by explicit return and guard drop. Never raises.
    fn return_object_inner(&self, id: u64, mut obj: F::Object) {
        self.notify_release(id);
        bump(&self.metrics.returned);

        if self.is_closed() {
            self.state.lock().active.remove(&id);
            self.destroy_quietly(obj);
            self.available.notify_all();
            return;
        }

        // The record stays in the active set while the hooks run, so the
        // object remains accounted either way.
        if let Err(err) = self.factory.passivate(&mut obj) {
            tracing::warn!(error = %err, id, "passivate failed on return, discarding object");
            self.state.lock().active.remove(&id);
            self.destroy_quietly(obj);
            self.available.notify_one();
            return;
        }

        if self.config.test_on_return && !matches!(self.factory.validate(&mut obj), Ok(true)) {
            bump(&self.metrics.validation_failures);
            self.state.lock().active.remove(&id);
            self.destroy_quietly(obj);
            self.available.notify_one();
            return;
        }

        let mut state = self.state.lock();
        match state.active.remove(&id) {
            Some(mut record) => {
                if state.closed || state.idle.len() >= self.config.max_idle {
                    drop(state);
                    self.destroy_quietly(obj);
                } else {
                    record.mark_returned();
                    state.idle.push_back(IdleSlot { obj, record });
                    drop(state);
                }
            }
            None => {
                // Unknown to the active set; nothing to account, just make
                // sure the instance is not leaked.
                drop(state);
                self.destroy_quietly(obj);
            }
        }
        self.available.notify_one();
    }

    fn invalidate_inner(&self, id: u64, obj: F::Object) -> PoolResult<(), F::Error> {
        self.notify_release(id);
        {
            let mut state = self.state.lock();
            if let Some(mut record) = state.active.remove(&id) {
                record.state = LifecycleState::Invalid;
            }
        }
        let result = self.factory.destroy(obj);
        bump(&self.metrics.destroyed);
        // Capacity was freed whether or not destroy succeeded.
        self.available.notify_one();
        result.map_err(|err| PoolError::factory(Hook::Destroy, err))
    }

    fn detach_inner(&self, id: u64) {
        self.notify_release(id);
        self.state.lock().active.remove(&id);
        self.available.notify_one();
    }

    fn add_one(&self) -> PoolResult<(), F::Error> {
        let id = {
            let mut state = self.state.lock();
            if state.closed {
                return Err(PoolError::Closed);
            }
            if state.total() >= self.config.max_total {
                return Err(PoolError::Exhausted {
                    waited: Duration::ZERO,
                });
            }
            state.pending += 1;
            state.reserve_id()
        };

        let mut obj = match self.factory.create() {
            Ok(obj) => {
                bump(&self.metrics.created);
                obj
            }
            Err(err) => {
                self.unreserve();
                return Err(PoolError::factory(Hook::Create, err));
            }
        };

        if let Err(err) = self.factory.passivate(&mut obj) {
            self.discard_candidate(obj);
            return Err(PoolError::factory(Hook::Passivate, err));
        }

        if self.config.test_on_create {
            match self.factory.validate(&mut obj) {
                Ok(true) => {}
                Ok(false) => {
                    // Invalid but not an error: the instance is discarded
                    // without surfacing anything to the caller.
                    bump(&self.metrics.validation_failures);
                    self.discard_candidate(obj);
                    return Ok(());
                }
                Err(err) => {
                    bump(&self.metrics.validation_failures);
                    self.discard_candidate(obj);
                    return Err(PoolError::factory(Hook::Validate, err));
                }
            }
        }

        let mut state = self.state.lock();
        state.pending -= 1;
        if state.closed {
            drop(state);
            self.destroy_quietly(obj);
            return Err(PoolError::Closed);
        }
        state.idle.push_back(IdleSlot {
            obj,
            record: ObjectRecord::new(id),
        });
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    pub(crate) fn clear_idle(&self) {
        let drained: Vec<IdleSlot<F::Object>> = {
            let mut state = self.state.lock();
            state.idle.drain(..).collect()
        };
        for slot in drained {
            self.destroy_quietly(slot.obj);
        }
        self.available.notify_all();
    }

    fn close_inner(&self) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
        }
        self.available.notify_all();
        self.clear_idle();
    }

    pub(crate) fn counts(&self) -> (usize, usize) {
        let state = self.state.lock();
        (state.active.len(), state.idle.len())
    }
}

/// Thread-safe generic object pool.
///
/// Objects are created, prepared and retired exclusively through the injected
/// [`ObjectFactory`]. Borrowers receive a [`Pooled`] guard that returns the
/// object on drop; the idle store hands objects out LIFO or FIFO per
/// configuration, `borrow_object` blocks up to `max_wait` when the pool is at
/// capacity, and a background evictor retires stale idle objects when an
/// eviction interval is configured.
///
/// # Examples
///
/// ```
/// use corral::{GenericPool, ObjectFactory, ObjectPool, PoolConfig};
/// use std::convert::Infallible;
///
/// struct BufferFactory;
///
/// impl ObjectFactory for BufferFactory {
///     type Object = Vec<u8>;
///     type Error = Infallible;
///
///     fn create(&self) -> Result<Vec<u8>, Infallible> {
///         Ok(Vec::with_capacity(4096))
///     }
///
///     fn passivate(&self, buf: &mut Vec<u8>) -> Result<(), Infallible> {
///         buf.clear();
///         Ok(())
///     }
/// }
///
/// let pool = GenericPool::new(BufferFactory, PoolConfig::new().with_max_total(4));
/// {
///     let mut buf = pool.borrow_object().unwrap();
///     buf.extend_from_slice(b"scratch");
/// } // returned on drop
/// assert_eq!(pool.num_idle(), 1);
/// ```
pub struct GenericPool<F: ObjectFactory> {
    core: Arc<PoolCore<F>>,
    evictor: Mutex<Option<Evictor>>,
}

impl<F: ObjectFactory + 'static> GenericPool<F> {
    /// Create a pool around `factory`.
    pub fn new(factory: F, config: PoolConfig) -> Self {
        Self::build(factory, config, None)
    }

    /// Create a pool that notifies `tracker` on every handout and release.
    pub fn with_usage_tracker(
        factory: F,
        config: PoolConfig,
        tracker: Box<dyn UsageTracker>,
    ) -> Self {
        Self::build(factory, config, Some(tracker))
    }

    fn build(factory: F, config: PoolConfig, tracker: Option<Box<dyn UsageTracker>>) -> Self {
        let interval = config.time_between_eviction_runs;
        let core = Arc::new(PoolCore {
            factory,
            config,
            state: Mutex::new(PoolState::new()),
            available: Condvar::new(),
            metrics: MetricsTracker::new(),
            tracker,
        });
        let evictor = interval.map(|every| Evictor::spawn(Arc::clone(&core), every));
        Self {
            core,
            evictor: Mutex::new(evictor),
        }
    }
}

impl<F: ObjectFactory> GenericPool<F> {
    /// Borrow, blocking up to the configured `max_wait`. Wakeups are not
    /// fair: a borrower arriving while a waiter is being woken may claim
    /// the freed object or capacity first.
    pub fn borrow_object(&self) -> PoolResult<Pooled<F>, F::Error> {
        PoolCore::borrow(&self.core, self.core.config.max_wait)
    }

    /// Borrow without waiting; fails with `Exhausted` when nothing is
    /// immediately available and the pool is at capacity.
    pub fn try_borrow_object(&self) -> PoolResult<Pooled<F>, F::Error> {
        PoolCore::borrow(&self.core, Some(Duration::ZERO))
    }

    /// Async borrow: polls [`try_borrow_object`](Self::try_borrow_object)
    /// under a tokio timeout so the caller's task is never blocked. Unlike
    /// the blocking path, an unset `max_wait` is capped at 30 seconds here
    /// instead of waiting indefinitely.
    pub async fn borrow_object_async(&self) -> PoolResult<Pooled<F>, F::Error> {
        let budget = self
            .core
            .config
            .max_wait
            .unwrap_or(Duration::from_secs(30));
        let start = Instant::now();
        tokio::time::timeout(budget, async {
            loop {
                match self.try_borrow_object() {
                    Ok(obj) => return Ok(obj),
                    Err(PoolError::Exhausted { .. }) => {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                    Err(err) => return Err(err),
                }
            }
        })
        .await
        .map_err(|_| PoolError::Exhausted {
            waited: start.elapsed(),
        })?
    }

    /// Explicitly hand an object back; equivalent to dropping the guard.
    pub fn return_object(&self, obj: Pooled<F>) {
        drop(obj);
    }

    /// Destroy a borrowed object known to be bad. Destroy failure propagates,
    /// but the object leaves the active set regardless.
    pub fn invalidate_object(&self, mut obj: Pooled<F>) -> PoolResult<(), F::Error> {
        let id = obj.id;
        match obj.obj.take() {
            Some(resource) => obj.core.invalidate_inner(id, resource),
            None => Ok(()),
        }
    }

    /// Create and passivate one object straight into the idle store.
    pub fn add_object(&self) -> PoolResult<(), F::Error> {
        self.core.add_one()
    }

    /// [`add_object`](Self::add_object), `count` times.
    pub fn add_objects(&self, count: usize) -> PoolResult<(), F::Error> {
        for _ in 0..count {
            self.add_object()?;
        }
        Ok(())
    }

    /// Destroy every idle object, swallowing destroy failures. Active
    /// objects are untouched and stay counted.
    pub fn clear(&self) {
        self.core.clear_idle();
    }

    /// Close the pool. Idempotent; wakes all blocked borrowers, destroys the
    /// idle store and stops the evictor. Outstanding guards can still be
    /// returned or invalidated.
    pub fn close(&self) {
        self.core.close_inner();
        if let Some(evictor) = self.evictor.lock().take() {
            evictor.stop();
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.core.is_closed()
    }

    /// Objects currently in the idle store.
    pub fn idle_count(&self) -> usize {
        self.core.counts().1
    }

    /// Objects currently out with borrowers.
    pub fn active_count(&self) -> usize {
        self.core.counts().0
    }

    /// Snapshot of the lifecycle counters.
    pub fn metrics(&self) -> PoolMetrics {
        let (active, idle) = self.core.counts();
        self.core.metrics.snapshot(active, idle, self.core.config.max_total)
    }
}

impl<F: ObjectFactory> ObjectPool for GenericPool<F> {
    type Object = F::Object;
    type FactoryError = F::Error;
    type Guard = Pooled<F>;

    fn borrow_object(&self) -> PoolResult<Pooled<F>, F::Error> {
        GenericPool::borrow_object(self)
    }

    fn return_object(&self, obj: Pooled<F>) {
        GenericPool::return_object(self, obj)
    }

    fn invalidate_object(&self, obj: Pooled<F>) -> PoolResult<(), F::Error> {
        GenericPool::invalidate_object(self, obj)
    }

    fn add_object(&self) -> PoolResult<(), F::Error> {
        GenericPool::add_object(self)
    }

    fn clear(&self) -> PoolResult<(), F::Error> {
        GenericPool::clear(self);
        Ok(())
    }

    fn close(&self) {
        GenericPool::close(self)
    }

    fn num_idle(&self) -> isize {
        self.idle_count() as isize
    }

    fn num_active(&self) -> isize {
        self.active_count() as isize
    }
}

impl<F: ObjectFactory> Drop for GenericPool<F> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<F: ObjectFactory> fmt::Debug for GenericPool<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.core.state.lock();
        f.debug_struct("GenericPool")
            .field("idle", &state.idle.len())
            .field("active", &state.active.len())
            .field("pending", &state.pending)
            .field("closed", &state.closed)
            .finish()
    }
}

/// Exclusive handle to a borrowed object; returns it to the pool on drop.
pub struct Pooled<F: ObjectFactory> {
    obj: Option<F::Object>,
    id: u64,
    core: Arc<PoolCore<F>>,
}

impl<F: ObjectFactory> Pooled<F> {
    /// Stable identifier of the underlying pooled instance.
    pub fn record_id(&self) -> u64 {
        self.id
    }

    /// Remove the object from pool management entirely and take ownership.
    /// The pool's total count drops and a waiter is woken.
    pub fn detach(mut self) -> F::Object {
        let obj = self.obj.take().expect("object already released");
        self.core.detach_inner(self.id);
        obj
    }
}

impl<F: ObjectFactory> Deref for Pooled<F> {
    type Target = F::Object;

    fn deref(&self) -> &F::Object {
        self.obj.as_ref().expect("object already released")
    }
}

impl<F: ObjectFactory> DerefMut for Pooled<F> {
    fn deref_mut(&mut self) -> &mut F::Object {
        self.obj.as_mut().expect("object already released")
    }
}

impl<F: ObjectFactory> Drop for Pooled<F> {
    fn drop(&mut self) {
        if let Some(obj) = self.obj.take() {
            self.core.return_object_inner(self.id, obj);
        }
    }
}

impl<F: ObjectFactory> fmt::Debug for Pooled<F>
where
    F::Object: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pooled")
            .field("id", &self.id)
            .field("obj", &self.obj)
            .finish()
    }
}
