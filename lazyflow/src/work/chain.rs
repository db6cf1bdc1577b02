use super::UnitOfWork;

/// Unit of work for the [`flat_map`](UnitOfWork::flat_map) method.
///
/// On success the value is handed to `next`, and the unit of work it returns
/// is started in turn. A failure of either stage ends the chain.
#[must_use = "units of work do nothing unless started"]
pub struct FlatMap<W, F> {
    upstream: W,
    next: F,
}

impl<W, F> FlatMap<W, F> {
    pub(crate) fn new(upstream: W, next: F) -> Self {
        Self { upstream, next }
    }
}

impl<W, F, N> UnitOfWork for FlatMap<W, F>
where
    W: UnitOfWork,
    F: Fn(W::Output) -> N + Send + Sync,
    N: UnitOfWork<Error = W::Error>,
{
    type Output = N::Output;
    type Error = W::Error;

    fn start(&self) -> impl Future<Output = Result<N::Output, W::Error>> + Send {
        async move {
            let value = self.upstream.start().await?;
            let next = (self.next)(value);

            next.start().await
        }
    }
}

/// Unit of work for the [`catch`](UnitOfWork::catch) method.
///
/// On failure the error is handed to `handler`, and the unit of work it
/// returns replaces the failed one. Successes pass through untouched.
#[must_use = "units of work do nothing unless started"]
pub struct Catch<W, F> {
    upstream: W,
    handler: F,
}

impl<W, F> Catch<W, F> {
    pub(crate) fn new(upstream: W, handler: F) -> Self {
        Self { upstream, handler }
    }
}

impl<W, F, R> UnitOfWork for Catch<W, F>
where
    W: UnitOfWork,
    F: Fn(W::Error) -> R + Send + Sync,
    R: UnitOfWork<Output = W::Output>,
{
    type Output = W::Output;
    type Error = R::Error;

    fn start(&self) -> impl Future<Output = Result<W::Output, R::Error>> + Send {
        async move {
            match self.upstream.start().await {
                Ok(value) => Ok(value),
                Err(error) => {
                    tracing::debug!("recovering from a failed unit of work");

                    let recovery = (self.handler)(error);
                    recovery.start().await
                }
            }
        }
    }
}
