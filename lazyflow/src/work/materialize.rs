use super::UnitOfWork;

use std::convert::Infallible;

/// Unit of work for the [`materialize`](UnitOfWork::materialize) method.
///
/// The predecessor's outcome becomes the success value, so starting a
/// `Materialize` never fails.
#[must_use = "units of work do nothing unless started"]
pub struct Materialize<W> {
    upstream: W,
}

impl<W> Materialize<W> {
    pub(crate) fn new(upstream: W) -> Self {
        Self { upstream }
    }
}

impl<W: UnitOfWork> UnitOfWork for Materialize<W> {
    type Output = Result<W::Output, W::Error>;
    type Error = Infallible;

    fn start(&self) -> impl Future<Output = Result<Self::Output, Infallible>> + Send {
        async move { Ok(self.upstream.start().await) }
    }
}
