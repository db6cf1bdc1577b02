use super::UnitOfWork;

use std::fmt;

/// Creates a [`DeferredTask`] from an asynchronous operation.
///
/// `operation` is called once per start and must return a fresh future
/// each time.
///
/// # Examples
///
/// ```rust,ignore
/// let task = deferred(|| async { Ok::<_, std::io::Error>(42) });
///
/// // Nothing has run yet.
/// assert_eq!(task.start().await?, 42);
/// ```
pub fn deferred<F, Fut, T, E>(operation: F) -> DeferredTask<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
{
    DeferredTask::new(operation)
}

/// The leaf of a unit-of-work chain.
///
/// A `DeferredTask` owns an operation producing a future and does nothing
/// until it is started. Starting it twice runs the operation twice.
#[must_use = "deferred tasks do nothing unless started"]
pub struct DeferredTask<F> {
    /// Factory of the future executed on every start.
    operation: F,
}

impl<F> DeferredTask<F> {
    /// Wraps `operation` without calling it.
    pub fn new(operation: F) -> Self {
        Self { operation }
    }
}

impl<F, Fut, T, E> UnitOfWork for DeferredTask<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send,
    T: Send,
    E: Send,
{
    type Output = T;
    type Error = E;

    fn start(&self) -> impl Future<Output = Result<T, E>> + Send {
        (self.operation)()
    }
}

impl<F> fmt::Debug for DeferredTask<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredTask").finish_non_exhaustive()
    }
}
