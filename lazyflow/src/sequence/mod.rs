//! Asynchronous sequence adapters.
//!
//! Sequences are fallible streams (`Stream<Item = Result<T, E>>`). This
//! module provides:
//! - [`WorkSequence`]: a unit of work seen as a one-element sequence,
//!   built with [`UnitOfWork::to_sequence`](crate::UnitOfWork::to_sequence),
//! - [`SequenceExt::delay`]: per-element deferral,
//! - [`SequenceExt::handle_events`]: side-effect hooks on the lifecycle of a
//!   sequence.
//!
//! Both operators are transparent: values, errors and their order are left
//! untouched.

mod delay;
mod handle_events;
mod work;

pub use delay::DelaySequence;
pub use handle_events::{EventHooks, HandleEventsSequence};
pub use work::WorkSequence;

use std::time::Duration;

use futures_core::TryStream;

/// Operators available on every fallible stream.
pub trait SequenceExt: TryStream {
    /// Delays every `Ok` element by `duration`, measured from the instant
    /// that element was received.
    ///
    /// Errors and completion are not delayed. Upstream is drained by a
    /// tokio task spawned on the first poll, which is why the sequence and
    /// its elements have to be `Send + 'static`.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let mut delayed = events.delay(Duration::from_millis(10));
    ///
    /// while let Some(event) = delayed.try_next().await? {
    ///     // at least 10ms after `event` was produced
    /// }
    /// ```
    fn delay(self, duration: Duration) -> DelaySequence<Self>
    where
        Self: Sized + Send + 'static,
        Self::Ok: Send + 'static,
        Self::Error: Send + 'static,
    {
        DelaySequence::new(self, duration)
    }

    /// Reports the lifecycle of the sequence to `hooks` without altering it.
    fn handle_events(self, hooks: EventHooks<Self::Ok, Self::Error>) -> HandleEventsSequence<Self>
    where
        Self: Sized,
    {
        HandleEventsSequence::new(self, hooks)
    }
}

impl<S: TryStream + ?Sized> SequenceExt for S {}
