use crate::work::UnitOfWork;

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};

use futures_core::future::BoxFuture;
use futures_core::{FusedStream, Stream};

/// Stream for the [`to_sequence`](UnitOfWork::to_sequence) method.
///
/// Yields exactly one `Ok` element when the unit of work succeeds, or a
/// single `Err` element when it fails, then ends. The unit of work starts on
/// the first poll, not when the sequence is created.
///
/// A clone is a fresh iteration: it shares the unit of work but starts it
/// again when polled.
#[must_use = "streams do nothing unless polled"]
pub struct WorkSequence<W: UnitOfWork> {
    work: Arc<W>,
    attempt: Attempt<W::Output, W::Error>,
}

enum Attempt<T, E> {
    Idle,
    Running(BoxFuture<'static, Result<T, E>>),
    Finished,
}

impl<W: UnitOfWork> WorkSequence<W> {
    pub(crate) fn new(work: W) -> Self {
        Self {
            work: Arc::new(work),
            attempt: Attempt::Idle,
        }
    }
}

impl<W> Stream for WorkSequence<W>
where
    W: UnitOfWork + 'static,
{
    type Item = Result<W::Output, W::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            match &mut this.attempt {
                Attempt::Idle => {
                    tracing::trace!("sequence started its unit of work");

                    let work = Arc::clone(&this.work);
                    this.attempt = Attempt::Running(Box::pin(async move { work.start().await }));
                }
                Attempt::Running(future) => {
                    let result = ready!(future.as_mut().poll(cx));
                    this.attempt = Attempt::Finished;

                    return Poll::Ready(Some(result));
                }
                Attempt::Finished => return Poll::Ready(None),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.attempt {
            Attempt::Finished => (0, Some(0)),
            _ => (1, Some(1)),
        }
    }
}

impl<W> FusedStream for WorkSequence<W>
where
    W: UnitOfWork + 'static,
{
    fn is_terminated(&self) -> bool {
        matches!(self.attempt, Attempt::Finished)
    }
}

impl<W: UnitOfWork> Clone for WorkSequence<W> {
    fn clone(&self) -> Self {
        Self {
            work: Arc::clone(&self.work),
            attempt: Attempt::Idle,
        }
    }
}

impl<W: UnitOfWork> fmt::Debug for WorkSequence<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let attempt = match self.attempt {
            Attempt::Idle => "idle",
            Attempt::Running(_) => "running",
            Attempt::Finished => "finished",
        };

        f.debug_struct("WorkSequence")
            .field("attempt", &attempt)
            .finish_non_exhaustive()
    }
}
