//! Counting factory shared by the unit tests

use std::sync::atomic::Ordering::SeqCst;
use std::sync::atomic::{AtomicBool, AtomicUsize};
use std::sync::Arc;

use thiserror::Error;

use crate::factory::ObjectFactory;

#[derive(Error, Debug)]
#[error("{0} hook failed")]
pub(crate) struct HookFailure(pub(crate) &'static str);

/// Factory producing `obj-0`, `obj-1`, ... while counting every hook call.
/// Each hook can be switched to fail, mirroring the failure-injection style
/// of the pool's contract tests.
#[derive(Default)]
pub(crate) struct TestFactory {
    seq: AtomicUsize,
    pub(crate) create_calls: AtomicUsize,
    pub(crate) activate_calls: AtomicUsize,
    pub(crate) passivate_calls: AtomicUsize,
    pub(crate) validate_calls: AtomicUsize,
    pub(crate) destroy_calls: AtomicUsize,
    pub(crate) fail_create: AtomicBool,
    pub(crate) fail_activate: AtomicBool,
    pub(crate) fail_passivate: AtomicBool,
    pub(crate) fail_validate: AtomicBool,
    pub(crate) reject_validate: AtomicBool,
    pub(crate) fail_destroy: AtomicBool,
}

impl ObjectFactory for Arc<TestFactory> {
    type Object = String;
    type Error = HookFailure;

    fn create(&self) -> Result<String, HookFailure> {
        self.create_calls.fetch_add(1, SeqCst);
        if self.fail_create.load(SeqCst) {
            return Err(HookFailure("create"));
        }
        Ok(format!("obj-{}", self.seq.fetch_add(1, SeqCst)))
    }

    fn activate(&self, _obj: &mut String) -> Result<(), HookFailure> {
        self.activate_calls.fetch_add(1, SeqCst);
        if self.fail_activate.load(SeqCst) {
            return Err(HookFailure("activate"));
        }
        Ok(())
    }

    fn passivate(&self, _obj: &mut String) -> Result<(), HookFailure> {
        self.passivate_calls.fetch_add(1, SeqCst);
        if self.fail_passivate.load(SeqCst) {
            return Err(HookFailure("passivate"));
        }
        Ok(())
    }

    fn validate(&self, _obj: &mut String) -> Result<bool, HookFailure> {
        self.validate_calls.fetch_add(1, SeqCst);
        if self.fail_validate.load(SeqCst) {
            return Err(HookFailure("validate"));
        }
        Ok(!self.reject_validate.load(SeqCst))
    }

    fn destroy(&self, _obj: String) -> Result<(), HookFailure> {
        self.destroy_calls.fetch_add(1, SeqCst);
        if self.fail_destroy.load(SeqCst) {
            return Err(HookFailure("destroy"));
        }
        Ok(())
    }
}
