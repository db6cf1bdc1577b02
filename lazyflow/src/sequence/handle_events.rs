use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::future::BoxFuture;
use futures_core::{FusedStream, Stream, TryStream};
use pin_project_lite::pin_project;

type OutputHook<T> = Box<dyn FnMut(&T) -> BoxFuture<'static, ()> + Send>;
type ErrorHook<E> = Box<dyn FnMut(&E) -> BoxFuture<'static, ()> + Send>;
type CompleteHook = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;
type CancelHook = Box<dyn FnOnce() + Send>;

/// Side-effect hooks for [`handle_events`](super::SequenceExt::handle_events).
///
/// Every hook is optional. Output, error and completion hooks return a
/// future that is awaited before the observed event is forwarded
/// downstream, so they can do asynchronous bookkeeping, but they only see
/// the event by reference and cannot change it.
///
/// The cancel hook is synchronous: it runs while the stream is being
/// dropped, so asynchronous cleanup has to be spawned from it.
///
/// # Examples
///
/// ```rust,ignore
/// let hooks = EventHooks::new()
///     .receive_output(|value: &u32| {
///         let value = *value;
///         async move { metrics.record(value).await }
///     })
///     .receive_cancel(|| tracing::info!("request abandoned"));
///
/// let observed = work.to_sequence().handle_events(hooks);
/// ```
pub struct EventHooks<T, E> {
    output: Option<OutputHook<T>>,
    error: Option<ErrorHook<E>>,
    complete: Option<CompleteHook>,
    cancel: Option<CancelHook>,
}

impl<T, E> EventHooks<T, E> {
    /// Creates a set of hooks where nothing is observed.
    pub fn new() -> Self {
        Self {
            output: None,
            error: None,
            complete: None,
            cancel: None,
        }
    }

    /// Called with every `Ok` element, before it is yielded.
    pub fn receive_output<F, Fut>(mut self, mut hook: F) -> Self
    where
        F: FnMut(&T) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.output = Some(Box::new(move |value: &T| -> BoxFuture<'static, ()> {
            Box::pin(hook(value))
        }));
        self
    }

    /// Called with every `Err` element, before it is yielded.
    pub fn receive_error<F, Fut>(mut self, mut hook: F) -> Self
    where
        F: FnMut(&E) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.error = Some(Box::new(move |error: &E| -> BoxFuture<'static, ()> {
            Box::pin(hook(error))
        }));
        self
    }

    /// Called once when the stream ends without having yielded an error.
    pub fn receive_complete<F, Fut>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.complete = Some(Box::new(move || -> BoxFuture<'static, ()> {
            Box::pin(hook())
        }));
        self
    }

    /// Called once if the stream is dropped while its consumer is waiting
    /// for the next event.
    ///
    /// Dropping the stream between two elements, after the consumer got
    /// what it needed, is not a cancellation.
    ///
    /// The hook runs inside `Drop` and cannot be awaited. Asynchronous
    /// cleanup has to be spawned from it, e.g. with `tokio::spawn`.
    pub fn receive_cancel<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel = Some(Box::new(hook));
        self
    }
}

impl<T, E> Default for EventHooks<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> fmt::Debug for EventHooks<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHooks")
            .field("output", &self.output.is_some())
            .field("error", &self.error.is_some())
            .field("complete", &self.complete.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

/// Fires the cancel hook when dropped while armed.
///
/// The guard is armed whenever the stream returns `Poll::Pending`, and
/// disarmed whenever it yields.
struct CancelGuard {
    hook: Option<CancelHook>,
    armed: bool,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        if let Some(hook) = self.hook.take() {
            tracing::trace!("sequence cancelled while awaiting an event");
            hook();
        }
    }
}

/// A hook future that has to finish before `event` is forwarded.
///
/// `event` is `None` when the hook observes the end of the stream.
struct InFlight<T, E> {
    hook: BoxFuture<'static, ()>,
    event: Option<Result<T, E>>,
}

pin_project! {
    /// Stream for the [`handle_events`](super::SequenceExt::handle_events)
    /// method.
    ///
    /// Elements, errors and the end of the stream are forwarded unchanged
    /// and in order; each one is reported to its hook exactly once.
    #[must_use = "streams do nothing unless polled"]
    pub struct HandleEventsSequence<S: TryStream> {
        // Declared first so the cancel hook runs before upstream is torn down.
        cancel: CancelGuard,
        #[pin]
        stream: S,
        output: Option<OutputHook<S::Ok>>,
        error: Option<ErrorHook<S::Error>>,
        complete: Option<CompleteHook>,
        in_flight: Option<InFlight<S::Ok, S::Error>>,
        failed: bool,
        finished: bool,
    }
}

impl<S: TryStream> HandleEventsSequence<S> {
    pub(crate) fn new(stream: S, hooks: EventHooks<S::Ok, S::Error>) -> Self {
        Self {
            cancel: CancelGuard {
                hook: hooks.cancel,
                armed: false,
            },
            stream,
            output: hooks.output,
            error: hooks.error,
            complete: hooks.complete,
            in_flight: None,
            failed: false,
            finished: false,
        }
    }
}

impl<S: TryStream> Stream for HandleEventsSequence<S> {
    type Item = Result<S::Ok, S::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        let poll = loop {
            if let Some(in_flight) = this.in_flight.as_mut() {
                if in_flight.hook.as_mut().poll(cx).is_pending() {
                    break Poll::Pending;
                }

                let event = this.in_flight.take().and_then(|in_flight| in_flight.event);
                if event.is_none() {
                    *this.finished = true;
                }

                break Poll::Ready(event);
            }

            if *this.finished {
                break Poll::Ready(None);
            }

            match this.stream.as_mut().try_poll_next(cx) {
                Poll::Pending => break Poll::Pending,
                Poll::Ready(Some(Ok(value))) => match this.output.as_mut() {
                    Some(hook) => {
                        *this.in_flight = Some(InFlight {
                            hook: hook(&value),
                            event: Some(Ok(value)),
                        });
                    }
                    None => break Poll::Ready(Some(Ok(value))),
                },
                Poll::Ready(Some(Err(error))) => {
                    *this.failed = true;

                    match this.error.as_mut() {
                        Some(hook) => {
                            *this.in_flight = Some(InFlight {
                                hook: hook(&error),
                                event: Some(Err(error)),
                            });
                        }
                        None => break Poll::Ready(Some(Err(error))),
                    }
                }
                Poll::Ready(None) => match this.complete.take().filter(|_| !*this.failed) {
                    Some(hook) => {
                        *this.in_flight = Some(InFlight {
                            hook: hook(),
                            event: None,
                        });
                    }
                    None => {
                        *this.finished = true;
                        break Poll::Ready(None);
                    }
                },
            }
        };

        this.cancel.armed = poll.is_pending();
        poll
    }
}

impl<S: TryStream> FusedStream for HandleEventsSequence<S> {
    fn is_terminated(&self) -> bool {
        self.finished
    }
}
