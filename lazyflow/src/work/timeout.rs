use super::UnitOfWork;
use crate::error::TimeoutError;

use std::time::Duration;

/// Unit of work for the [`timeout`](UnitOfWork::timeout) method.
///
/// The deadline is measured from each start. When it is reached first, the
/// running attempt is dropped, which cancels it.
#[must_use = "units of work do nothing unless started"]
pub struct Timeout<W> {
    upstream: W,
    duration: Duration,
}

impl<W> Timeout<W> {
    pub(crate) fn new(upstream: W, duration: Duration) -> Self {
        Timeout { upstream, duration }
    }
}

impl<W: UnitOfWork> UnitOfWork for Timeout<W> {
    type Output = W::Output;
    type Error = TimeoutError<W::Error>;

    fn start(&self) -> impl Future<Output = Result<W::Output, TimeoutError<W::Error>>> + Send {
        async move {
            match tokio::time::timeout(self.duration, self.upstream.start()).await {
                Ok(result) => result.map_err(TimeoutError::Failed),
                Err(_) => {
                    tracing::debug!(duration = ?self.duration, "unit of work timed out");
                    Err(TimeoutError::Elapsed(self.duration))
                }
            }
        }
    }
}
