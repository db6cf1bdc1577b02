use super::UnitOfWork;

use std::time::Duration;

use tokio::time::sleep;

/// Unit of work for the [`retry`](UnitOfWork::retry) method.
///
/// Every attempt restarts the predecessor from its leaf. When all attempts
/// fail, the failure of the last one is returned.
///
/// # Examples
///
/// ```rust,ignore
/// let result = fetch_config()
///     .retry(3)
///     .interval(Duration::from_millis(50))
///     .start()
///     .await;
/// ```
#[must_use = "units of work do nothing unless started"]
pub struct Retry<W> {
    upstream: W,

    /// Additional attempts allowed after the first failure.
    times: usize,

    /// Pause between a failure and the next attempt.
    interval: Duration,
}

impl<W> Retry<W> {
    pub(crate) fn new(upstream: W, times: usize) -> Self {
        Self {
            upstream,
            times,
            interval: Duration::ZERO,
        }
    }

    /// Sets the pause between a failed attempt and the next one.
    ///
    /// Defaults to no pause.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl<W: UnitOfWork> UnitOfWork for Retry<W> {
    type Output = W::Output;
    type Error = W::Error;

    fn start(&self) -> impl Future<Output = Result<W::Output, W::Error>> + Send {
        async move {
            let mut remaining = self.times;

            loop {
                match self.upstream.start().await {
                    Ok(value) => return Ok(value),
                    Err(error) if remaining == 0 => return Err(error),
                    Err(_) => {
                        remaining -= 1;
                        tracing::debug!(remaining, "unit of work failed, retrying");

                        if !self.interval.is_zero() {
                            sleep(self.interval).await;
                        }
                    }
                }
            }
        }
    }
}
