use super::UnitOfWork;

/// Unit of work for the [`map`](UnitOfWork::map) method.
#[must_use = "units of work do nothing unless started"]
pub struct Map<W, F> {
    upstream: W,
    transform: F,
}

impl<W, F> Map<W, F> {
    pub(crate) fn new(upstream: W, transform: F) -> Self {
        Self {
            upstream,
            transform,
        }
    }
}

impl<W, F, U> UnitOfWork for Map<W, F>
where
    W: UnitOfWork,
    F: Fn(W::Output) -> U + Send + Sync,
    U: Send,
{
    type Output = U;
    type Error = W::Error;

    fn start(&self) -> impl Future<Output = Result<U, W::Error>> + Send {
        async move { self.upstream.start().await.map(&self.transform) }
    }
}

/// Unit of work for the [`try_map`](UnitOfWork::try_map) method.
#[must_use = "units of work do nothing unless started"]
pub struct TryMap<W, F> {
    upstream: W,
    transform: F,
}

impl<W, F> TryMap<W, F> {
    pub(crate) fn new(upstream: W, transform: F) -> Self {
        Self {
            upstream,
            transform,
        }
    }
}

impl<W, F, U, E> UnitOfWork for TryMap<W, F>
where
    W: UnitOfWork,
    F: Fn(W::Output) -> Result<U, E> + Send + Sync,
    E: Into<W::Error>,
    U: Send,
{
    type Output = U;
    type Error = W::Error;

    fn start(&self) -> impl Future<Output = Result<U, W::Error>> + Send {
        async move {
            let value = self.upstream.start().await?;
            (self.transform)(value).map_err(Into::into)
        }
    }
}

/// Unit of work for the [`map_err`](UnitOfWork::map_err) method.
#[must_use = "units of work do nothing unless started"]
pub struct MapErr<W, F> {
    upstream: W,
    transform: F,
}

impl<W, F> MapErr<W, F> {
    pub(crate) fn new(upstream: W, transform: F) -> Self {
        Self {
            upstream,
            transform,
        }
    }
}

impl<W, F, E> UnitOfWork for MapErr<W, F>
where
    W: UnitOfWork,
    F: Fn(W::Error) -> E + Send + Sync,
    E: Send,
{
    type Output = W::Output;
    type Error = E;

    fn start(&self) -> impl Future<Output = Result<W::Output, E>> + Send {
        async move { self.upstream.start().await.map_err(&self.transform) }
    }
}
