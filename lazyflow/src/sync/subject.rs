use crate::error::{SharedError, SubjectError};
use crate::state::ResultState;
use crate::utils::Slab;
use crate::work::UnitOfWork;

use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};

/// A one-shot resolution gate.
///
/// A `SingleValueSubject` bridges a producer driven from the outside (a
/// callback, a delegate, a network completion) and any number of
/// asynchronous consumers. The producer resolves it at most once with
/// [`send`](Self::send), [`send_error`](Self::send_error) or
/// [`resolve`](Self::resolve); consumers [`wait`](Self::wait) for the
/// result, whether they arrive before or after resolution.
///
/// The subject is a cheap handle: clones share the same state, and the state
/// lives as long as any clone, including clones captured by unit-of-work
/// chains.
///
/// It implements [`UnitOfWork`], starting it waits for the result, so it
/// composes with every combinator:
///
/// ```rust,ignore
/// let subject = SingleValueSubject::<u32>::new();
/// let doubled = subject.clone().map(|n| n * 2);
///
/// callback_api(move |n| {
///     let _ = subject.send(n);
/// });
///
/// let value = doubled.start().await?;
/// ```
pub struct SingleValueSubject<T, E = SharedError> {
    /// Resolution state and registered waiters.
    ///
    /// Every transition and every waiter registration happens under this
    /// lock, so a `send` racing with `wait` can neither lose a waiter nor
    /// resolve twice.
    inner: Arc<Mutex<State<T, E>>>,
}

enum State<T, E> {
    /// Wakers of the tasks currently suspended in [`Wait`].
    Unresolved(Slab<Waker>),

    /// Terminal state.
    Resolved(Result<T, E>),
}

impl<T, E> SingleValueSubject<T, E> {
    /// Creates an unresolved subject with no waiters.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(State::Unresolved(Slab::new()))),
        }
    }

    /// Resolves the subject with a value.
    ///
    /// # Errors
    ///
    /// Returns [`SubjectError::AlreadyCompleted`] if the subject was already
    /// resolved. The stored result is left unchanged.
    pub fn send(&self, value: T) -> Result<(), SubjectError> {
        self.resolve(Ok(value))
    }

    /// Resolves the subject with a failure.
    ///
    /// # Errors
    ///
    /// Returns [`SubjectError::AlreadyCompleted`] if the subject was already
    /// resolved. The stored result is left unchanged.
    pub fn send_error(&self, error: E) -> Result<(), SubjectError> {
        self.resolve(Err(error))
    }

    /// Resolves the subject and wakes every waiter.
    ///
    /// Only the first call succeeds. Waiters are woken after the lock is
    /// released.
    ///
    /// # Errors
    ///
    /// Returns [`SubjectError::AlreadyCompleted`] if the subject was already
    /// resolved. The stored result is left unchanged.
    pub fn resolve(&self, result: Result<T, E>) -> Result<(), SubjectError> {
        let is_ok = result.is_ok();

        let waiters: Vec<Waker> = {
            let mut state = self.lock();

            match &mut *state {
                State::Resolved(_) => {
                    tracing::debug!("rejected a second resolution of a completed subject");
                    return Err(SubjectError::AlreadyCompleted);
                }
                State::Unresolved(waiters) => {
                    let waiters = waiters.drain().collect();
                    *state = State::Resolved(result);
                    waiters
                }
            }
        };

        tracing::trace!(ok = is_ok, waiters = waiters.len(), "subject resolved");

        for waiter in waiters {
            waiter.wake();
        }

        Ok(())
    }

    /// Returns `true` once the subject has been resolved.
    pub fn is_resolved(&self) -> bool {
        matches!(*self.lock(), State::Resolved(_))
    }

    /// Number of consumers currently suspended on the subject.
    ///
    /// Always `0` once resolved.
    pub fn waiter_count(&self) -> usize {
        match &*self.lock() {
            State::Unresolved(waiters) => waiters.len(),
            State::Resolved(_) => 0,
        }
    }

    /// Waits for the result of the subject.
    ///
    /// Resolves immediately when the subject is already resolved. Dropping
    /// the returned future before resolution unregisters the waiter.
    pub fn wait(&self) -> Wait<'_, T, E> {
        Wait {
            subject: self,
            key: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, State<T, E>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone, E: Clone> SingleValueSubject<T, E> {
    /// Returns a snapshot of the current state without waiting.
    pub fn state(&self) -> ResultState<T, E> {
        match &*self.lock() {
            State::Unresolved(_) => ResultState::Pending,
            State::Resolved(result) => result.clone().into(),
        }
    }
}

impl<T, E> Clone for SingleValueSubject<T, E> {
    /// Returns another handle to the same subject.
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, E> Default for SingleValueSubject<T, E> {
    /// Creates an unresolved [`SingleValueSubject`].
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for SingleValueSubject<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("SingleValueSubject");

        match &*self.lock() {
            State::Unresolved(waiters) => debug.field("waiters", &waiters.len()),
            State::Resolved(result) => debug.field("resolved", &result.is_ok()),
        };

        debug.finish()
    }
}

impl<T, E> UnitOfWork for SingleValueSubject<T, E>
where
    T: Clone + Send + Sync,
    E: Clone + Send + Sync,
{
    type Output = T;
    type Error = E;

    fn start(&self) -> impl Future<Output = Result<T, E>> + Send {
        self.wait()
    }
}

/// Future returned by [`SingleValueSubject::wait`].
///
/// Resolves to a clone of the stored result.
#[must_use = "futures do nothing unless polled"]
pub struct Wait<'a, T, E> {
    subject: &'a SingleValueSubject<T, E>,

    /// Slot of this waiter's waker while the subject is unresolved.
    key: Option<usize>,
}

impl<T: Clone, E: Clone> Future for Wait<'_, T, E> {
    type Output = Result<T, E>;

    /// Polls the subject.
    ///
    /// If the subject is resolved, the stored result is cloned out.
    /// Otherwise the waker is registered (or refreshed if this waiter was
    /// polled before) and the future returns `Poll::Pending`. The check and
    /// the registration happen under the same lock as `resolve`.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        let mut state = this.subject.lock();

        let waiters = match &mut *state {
            State::Resolved(result) => {
                this.key = None;
                return Poll::Ready(result.clone());
            }
            State::Unresolved(waiters) => waiters,
        };

        let registered = match this.key {
            Some(key) => waiters.get_mut(key),
            None => None,
        };

        match registered {
            Some(waker) => {
                if !waker.will_wake(cx.waker()) {
                    *waker = cx.waker().clone();
                }
            }
            None => this.key = Some(waiters.insert(cx.waker().clone())),
        }

        Poll::Pending
    }
}

impl<T, E> Drop for Wait<'_, T, E> {
    /// Unregisters the waiter if it is dropped before resolution.
    ///
    /// A cancelled waiter is therefore never woken by a later `send`.
    fn drop(&mut self) {
        let Some(key) = self.key.take() else {
            return;
        };

        if let State::Unresolved(waiters) = &mut *self.subject.lock() {
            waiters.remove(key);
        }
    }
}
