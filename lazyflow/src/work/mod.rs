//! Lazy units of asynchronous work.
//!
//! A [`UnitOfWork`] describes a computation without running it. Nothing
//! happens until [`start`](UnitOfWork::start) is awaited or
//! [`run`](UnitOfWork::run) spawns it, and every start re-executes the whole
//! chain from its leaf: results are never cached between starts.
//!
//! Chains are built by wrapping. Each combinator consumes its receiver and
//! returns a new wrapper that owns the predecessor:
//!
//! - [`map`](UnitOfWork::map), [`try_map`](UnitOfWork::try_map) and
//!   [`map_err`](UnitOfWork::map_err) transform the outcome,
//! - [`materialize`](UnitOfWork::materialize) turns failures into values,
//! - [`flat_map`](UnitOfWork::flat_map) and [`catch`](UnitOfWork::catch)
//!   sequence a follow-up unit of work on success or on failure,
//! - [`retry`](UnitOfWork::retry), [`timeout`](UnitOfWork::timeout) and
//!   [`delay`](UnitOfWork::delay) add recovery and timing,
//! - [`to_sequence`](UnitOfWork::to_sequence) exposes the result as a
//!   one-element stream.
//!
//! # Examples
//!
//! ```rust,ignore
//! use lazyflow::{UnitOfWork, deferred};
//!
//! let work = deferred(|| async { Ok::<_, std::io::Error>(20) })
//!     .map(|n| n + 1)
//!     .map(|n| n * 2);
//!
//! assert_eq!(work.start().await?, 42);
//! ```

mod chain;
mod deferred;
mod delay;
mod map;
mod materialize;
mod retry;
mod timeout;

pub use chain::{Catch, FlatMap};
pub use deferred::{DeferredTask, deferred};
pub use delay::Delay;
pub use map::{Map, MapErr, TryMap};
pub use materialize::Materialize;
pub use retry::Retry;
pub use timeout::Timeout;

use crate::run::Runner;
use crate::sequence::WorkSequence;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// A lazy, re-runnable asynchronous computation.
///
/// Implementors only provide [`start`](Self::start); every combinator is a
/// provided method returning a wrapper type from this module.
///
/// Units of work are shared across tasks, so they are `Send + Sync` and the
/// futures they return are `Send`.
pub trait UnitOfWork: Send + Sync {
    /// The value produced on success.
    type Output: Send;

    /// The failure produced when the computation fails.
    type Error: Send;

    /// Executes the chain once and resolves to its outcome.
    ///
    /// Each call is an independent execution: side effects of the wrapped
    /// closures repeat. Dropping the returned future cancels that execution.
    fn start(&self) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;

    /// Executes the chain on a new tokio task without waiting for it.
    ///
    /// Failures are logged through `tracing` and never reach the caller.
    /// Use a [`Runner`] to pick another runtime or error sink.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    fn run(self) -> JoinHandle<()>
    where
        Self: Sized + 'static,
        Self::Error: fmt::Debug,
    {
        Runner::new().run(self)
    }

    /// Transforms the success value.
    ///
    /// `transform` only runs once the chain is started and the predecessor
    /// succeeded; failures pass through untouched.
    fn map<U, F>(self, transform: F) -> Map<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> U + Send + Sync,
        U: Send,
    {
        Map::new(self, transform)
    }

    /// Transforms the success value with a fallible function.
    ///
    /// A failure of `transform` is converted into the chain's error type and
    /// is indistinguishable downstream from a failure of the predecessor.
    fn try_map<U, E, F>(self, transform: F) -> TryMap<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> Result<U, E> + Send + Sync,
        E: Into<Self::Error>,
        U: Send,
    {
        TryMap::new(self, transform)
    }

    /// Transforms the failure.
    fn map_err<E, F>(self, transform: F) -> MapErr<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Error) -> E + Send + Sync,
        E: Send,
    {
        MapErr::new(self, transform)
    }

    /// Turns the outcome into a value that never fails.
    ///
    /// Downstream stages receive `Ok(value)` or `Err(error)` as their input
    /// instead of being short-circuited.
    fn materialize(self) -> Materialize<Self>
    where
        Self: Sized,
    {
        Materialize::new(self)
    }

    /// Runs the unit of work built by `next` from the success value.
    fn flat_map<N, F>(self, next: F) -> FlatMap<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Output) -> N + Send + Sync,
        N: UnitOfWork<Error = Self::Error>,
    {
        FlatMap::new(self, next)
    }

    /// Recovers from a failure with the unit of work built by `handler`.
    fn catch<R, F>(self, handler: F) -> Catch<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Error) -> R + Send + Sync,
        R: UnitOfWork<Output = Self::Output>,
    {
        Catch::new(self, handler)
    }

    /// Restarts the chain up to `times` more times while it fails.
    ///
    /// The last failure is returned once the attempts are exhausted.
    fn retry(self, times: usize) -> Retry<Self>
    where
        Self: Sized,
    {
        Retry::new(self, times)
    }

    /// Fails with [`TimeoutError::Elapsed`](crate::TimeoutError::Elapsed) if the chain does not finish
    /// within `duration`.
    fn timeout(self, duration: Duration) -> Timeout<Self>
    where
        Self: Sized,
    {
        Timeout::new(self, duration)
    }

    /// Holds a successful result back for `duration` before yielding it.
    ///
    /// Failures are yielded as soon as they happen.
    fn delay(self, duration: Duration) -> Delay<Self>
    where
        Self: Sized,
    {
        Delay::new(self, duration)
    }

    /// Presents the unit of work as a stream of at most one element.
    ///
    /// The chain starts on the first poll. Cloning the sequence yields a
    /// fresh iteration that starts the chain again.
    fn to_sequence(self) -> WorkSequence<Self>
    where
        Self: Sized + 'static,
    {
        WorkSequence::new(self)
    }
}

/// Every unit of work behind a shared reference is a unit of work too, so a
/// chain can be started without giving up ownership of it.
impl<W: UnitOfWork> UnitOfWork for &W {
    type Output = W::Output;
    type Error = W::Error;

    fn start(&self) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send {
        (**self).start()
    }
}

impl<W: UnitOfWork> UnitOfWork for Arc<W> {
    type Output = W::Output;
    type Error = W::Error;

    fn start(&self) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send {
        (**self).start()
    }
}
