use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

/// A cloneable, type-erased error.
///
/// Subjects hand the same failure to every waiter, so their error type has
/// to be `Clone`. `SharedError` is the default error type of
/// [`SingleValueSubject`](crate::SingleValueSubject) for producers that do
/// not have a concrete error type of their own.
pub type SharedError = Arc<dyn Error + Send + Sync + 'static>;

/// Errors returned by [`SingleValueSubject`](crate::SingleValueSubject).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubjectError {
    /// The subject was already resolved by an earlier `send`.
    ///
    /// This is a coordination bug on the producer side: the stored result
    /// is left untouched and the call should not be retried.
    #[error("subject already completed")]
    AlreadyCompleted,
}

/// Error produced by the [`timeout`](crate::UnitOfWork::timeout) combinator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeoutError<E> {
    /// The wrapped unit of work did not finish within the given duration.
    #[error("unit of work timed out after {0:?}")]
    Elapsed(Duration),

    /// The wrapped unit of work failed before the deadline.
    #[error("{0}")]
    Failed(E),
}

impl<E> TimeoutError<E> {
    /// Returns `true` if the deadline was reached.
    pub fn is_elapsed(&self) -> bool {
        matches!(self, TimeoutError::Elapsed(_))
    }

    /// Returns the inner failure, if the unit of work failed on its own.
    pub fn into_failure(self) -> Option<E> {
        match self {
            TimeoutError::Elapsed(_) => None,
            TimeoutError::Failed(error) => Some(error),
        }
    }
}
