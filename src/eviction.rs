//! Background eviction of stale idle objects

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::factory::ObjectFactory;
use crate::metrics::bump;
use crate::object::ObjectRecord;
use crate::pool::{IdleSlot, PoolCore};

/// Handle to the background eviction thread. The thread sleeps on a shutdown
/// channel so `close` can interrupt a pending interval immediately.
pub(crate) struct Evictor {
    shutdown: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl Evictor {
    pub(crate) fn spawn<F>(core: Arc<PoolCore<F>>, interval: Duration) -> Self
    where
        F: ObjectFactory + 'static,
    {
        let (shutdown, signal) = bounded(1);
        let thread = thread::Builder::new()
            .name("corral-evictor".into())
            .spawn(move || run(core, interval, signal))
            .expect("failed to spawn evictor thread");
        Self {
            shutdown,
            thread: Some(thread),
        }
    }

    pub(crate) fn stop(mut self) {
        let _ = self.shutdown.send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run<F: ObjectFactory>(core: Arc<PoolCore<F>>, interval: Duration, shutdown: Receiver<()>) {
    loop {
        match shutdown.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                if core.is_closed() {
                    break;
                }
                core.evict_once();
                core.ensure_min_idle();
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::debug!("evictor stopped");
}

impl<F: ObjectFactory> PoolCore<F> {
    /// One eviction pass: examine up to `num_tests_per_eviction_run` idle
    /// objects, oldest first. Each candidate is claimed under the lock
    /// (remove-then-evaluate), so an object taken by a concurrent borrow is
    /// simply not seen, and a claimed object can never be borrowed while it
    /// is being evaluated.
    pub(crate) fn evict_once(&self) {
        let config = &self.config;
        let mut retained: Vec<IdleSlot<F::Object>> = Vec::new();

        for _ in 0..config.num_tests_per_eviction_run {
            let mut slot = {
                let mut state = self.state.lock();
                if state.closed {
                    break;
                }
                match state.idle.pop_front() {
                    Some(slot) => {
                        state.pending += 1;
                        slot
                    }
                    None => break,
                }
            };

            let idle_for = slot.record.idle_duration();
            // Idle objects that would remain if this one is destroyed.
            let remaining = self.state.lock().idle.len() + retained.len();
            let over_hard = idle_for >= config.min_evictable_idle;
            let over_soft = config
                .soft_min_evictable_idle
                .is_some_and(|soft| idle_for >= soft);
            let floor_ok = remaining >= config.min_idle;

            let mut evict = (over_hard || over_soft) && floor_ok;

            if !evict && config.test_while_idle {
                match self.factory.validate(&mut slot.obj) {
                    Ok(true) => {}
                    Ok(false) | Err(_) => {
                        bump(&self.metrics.validation_failures);
                        // An object that fails revalidation is broken, not
                        // merely stale; the idle floor does not protect it.
                        if config.destroy_on_failed_idle_validation {
                            evict = true;
                        }
                    }
                }
            }

            if evict {
                bump(&self.metrics.evicted);
                self.state.lock().pending -= 1;
                self.destroy_quietly(slot.obj);
                self.available.notify_one();
            } else {
                retained.push(slot);
            }
        }

        if !retained.is_empty() {
            let mut state = self.state.lock();
            state.pending -= retained.len();
            if state.closed {
                drop(state);
                for slot in retained {
                    self.destroy_quietly(slot.obj);
                }
            } else {
                // Survivors go back at the oldest end in their original
                // relative order.
                while let Some(slot) = retained.pop() {
                    state.idle.push_front(slot);
                }
            }
        }
    }

    /// Top the idle store back up to `min_idle`. Failures are logged and end
    /// the attempt; the next evictor run tries again.
    pub(crate) fn ensure_min_idle(&self) {
        if self.config.min_idle == 0 {
            return;
        }
        loop {
            let id = {
                let mut state = self.state.lock();
                if state.closed
                    || state.idle.len() >= self.config.min_idle
                    || state.total() >= self.config.max_total
                {
                    return;
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
                    tracing::warn!(error = %err, "create failed while replenishing min idle");
                    self.unreserve();
                    return;
                }
            };
            if let Err(err) = self.factory.passivate(&mut obj) {
                tracing::warn!(error = %err, "passivate failed while replenishing min idle");
                self.destroy_quietly(obj);
                self.unreserve();
                return;
            }

            let mut state = self.state.lock();
            state.pending -= 1;
            if state.closed {
                drop(state);
                self.destroy_quietly(obj);
                return;
            }
            state.idle.push_back(IdleSlot {
                obj,
                record: ObjectRecord::new(id),
            });
            drop(state);
            self.available.notify_one();
        }
    }
}
