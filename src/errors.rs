//! Error types for pool operations

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// The factory hook that produced a [`PoolError::Factory`] error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Create,
    Activate,
    Passivate,
    Validate,
    Destroy,
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Hook::Create => "create",
            Hook::Activate => "activate",
            Hook::Passivate => "passivate",
            Hook::Validate => "validate",
            Hook::Destroy => "destroy",
        };
        f.write_str(name)
    }
}

/// Errors returned by pool operations, generic over the factory's error type.
#[derive(Error, Debug)]
pub enum PoolError<E>
where
    E: std::error::Error,
{
    /// The pool has been closed; mutating operations are rejected.
    #[error("pool is closed")]
    Closed,

    /// No object could be obtained within the wait budget.
    #[error("no object available (waited {waited:?})")]
    Exhausted {
        /// How long the caller waited before giving up.
        waited: Duration,
    },

    /// A factory hook failed, tagged with which hook it was.
    #[error("factory {hook} hook failed")]
    Factory {
        hook: Hook,
        #[source]
        source: E,
    },

    /// The pool variant does not support this operation.
    #[error("operation not supported by this pool: {0}")]
    UnsupportedOperation(&'static str),
}

impl<E> PoolError<E>
where
    E: std::error::Error,
{
    pub(crate) fn factory(hook: Hook, source: E) -> Self {
        PoolError::Factory { hook, source }
    }
}

pub type PoolResult<T, E> = Result<T, PoolError<E>>;
