use super::UnitOfWork;

use std::time::Duration;

use tokio::time::sleep;

/// Unit of work for the [`delay`](UnitOfWork::delay) method.
///
/// The pause starts once the predecessor succeeded, so the total time of a
/// start is the predecessor's own time plus `duration`.
#[must_use = "units of work do nothing unless started"]
pub struct Delay<W> {
    upstream: W,
    duration: Duration,
}

impl<W> Delay<W> {
    pub(crate) fn new(upstream: W, duration: Duration) -> Self {
        Self { upstream, duration }
    }
}

impl<W: UnitOfWork> UnitOfWork for Delay<W> {
    type Output = W::Output;
    type Error = W::Error;

    fn start(&self) -> impl Future<Output = Result<W::Output, W::Error>> + Send {
        async move {
            let value = self.upstream.start().await?;
            sleep(self.duration).await;

            Ok(value)
        }
    }
}
