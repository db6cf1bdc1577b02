use crate::work::UnitOfWork;

use std::borrow::Cow;
use std::fmt;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::Instrument;

/// Fire-and-forget execution of units of work.
///
/// `Runner` spawns a unit of work onto a tokio runtime and routes its
/// failure to an error sink instead of the caller. It is configured the
/// builder way: every setter consumes and returns the runner.
///
/// # Examples
///
/// ```rust,ignore
/// let handle = Runner::new()
///     .label("refresh-token")
///     .handle(runtime.handle().clone())
///     .run(refresh);
/// ```
#[derive(Debug, Clone)]
pub struct Runner {
    /// Name recorded on the `unit_of_work` span of spawned tasks.
    label: Cow<'static, str>,

    /// Runtime to spawn on, or the ambient one when `None`.
    handle: Option<Handle>,
}

impl Runner {
    /// Creates a runner spawning on the ambient runtime with the label
    /// `"anonymous"`.
    pub fn new() -> Self {
        Self {
            label: Cow::Borrowed("anonymous"),
            handle: None,
        }
    }

    /// Sets the label attached to the tracing span of spawned tasks.
    pub fn label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.label = label.into();
        self
    }

    /// Spawns onto `handle` instead of the runtime of the caller.
    pub fn handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Spawns `work` and logs its failure at `warn` level.
    ///
    /// # Panics
    ///
    /// Panics if no handle was configured and this is called outside of a
    /// tokio runtime.
    pub fn run<W>(&self, work: W) -> JoinHandle<()>
    where
        W: UnitOfWork + 'static,
        W::Error: fmt::Debug,
    {
        self.run_with_sink(work, |error| {
            tracing::warn!(?error, "unit of work failed");
        })
    }

    /// Spawns `work` and hands its failure to `sink`.
    ///
    /// The success value is discarded. Aborting the returned handle cancels
    /// the execution; `sink` is not called in that case.
    ///
    /// # Panics
    ///
    /// Panics if no handle was configured and this is called outside of a
    /// tokio runtime.
    pub fn run_with_sink<W, S>(&self, work: W, sink: S) -> JoinHandle<()>
    where
        W: UnitOfWork + 'static,
        S: FnOnce(W::Error) + Send + 'static,
    {
        let span = tracing::debug_span!("unit_of_work", label = %self.label);

        let future = async move {
            tracing::trace!("unit of work started");

            match work.start().await {
                Ok(_) => tracing::trace!("unit of work finished"),
                Err(error) => sink(error),
            }
        }
        .instrument(span);

        match &self.handle {
            Some(handle) => handle.spawn(future),
            None => tokio::spawn(future),
        }
    }
}

impl Default for Runner {
    /// Creates a default [`Runner`].
    fn default() -> Self {
        Self::new()
    }
}
