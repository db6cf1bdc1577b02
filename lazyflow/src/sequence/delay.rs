use std::pin::Pin;
use std::task::{Context, Poll, ready};
use std::time::Duration;

use futures_core::{FusedStream, Stream, TryStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Sleep, sleep_until};

/// Upper bound on elements pulled ahead of the consumer.
const MAX_BUFFERED: usize = 64;

/// Stand-in for deadlines that do not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

type Stamped<S> = (Instant, Result<<S as TryStream>::Ok, <S as TryStream>::Error>);

/// Stream for the [`delay`](super::SequenceExt::delay) method.
///
/// Every `Ok` element is held back until `duration` has passed since the
/// instant upstream produced it. On the first poll, upstream is moved to a
/// forwarding task that drains it on its own and stamps each element as it
/// becomes available, so a slow consumer does not postpone the clock of
/// elements produced in the meantime. Elements that arrive together are
/// released together, and elements spaced further apart than `duration` are
/// each delayed by the full `duration`.
///
/// `Err` elements and the end of the stream are forwarded without any extra
/// pause, once the elements before them have been yielded.
///
/// Dropping the stream drops the pending timer and aborts the forwarding
/// task, which drops upstream.
///
/// # Panics
///
/// Polling panics outside of a tokio runtime with the time driver enabled.
#[must_use = "streams do nothing unless polled"]
pub struct DelaySequence<S: TryStream> {
    /// Upstream until the first poll hands it to the forwarder.
    upstream: Option<Pin<Box<S>>>,
    duration: Duration,
    receiver: Option<mpsc::Receiver<Stamped<S>>>,
    forwarder: Option<Forwarder>,
    /// Element received from the forwarder but not yet released.
    pending: Option<Stamped<S>>,
    sleep: Option<Pin<Box<Sleep>>>,
    finished: bool,
}

/// Aborts the forwarding task when the sequence goes away.
struct Forwarder(JoinHandle<()>);

impl Drop for Forwarder {
    fn drop(&mut self) {
        self.0.abort();
    }
}

// No field is structurally pinned: upstream is boxed.
impl<S: TryStream> Unpin for DelaySequence<S> {}

impl<S: TryStream> DelaySequence<S> {
    pub(crate) fn new(stream: S, duration: Duration) -> Self {
        Self {
            upstream: Some(Box::pin(stream)),
            duration,
            receiver: None,
            forwarder: None,
            pending: None,
            sleep: None,
            finished: false,
        }
    }

    /// The delay applied to each element.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl<S> DelaySequence<S>
where
    S: TryStream + Send + 'static,
    S::Ok: Send + 'static,
    S::Error: Send + 'static,
{
    fn spawn_forwarder(&mut self, mut upstream: Pin<Box<S>>) {
        let (sender, receiver) = mpsc::channel(MAX_BUFFERED);

        let task = tokio::spawn(async move {
            loop {
                let next = std::future::poll_fn(|cx| upstream.as_mut().try_poll_next(cx));

                let Some(item) = next.await else {
                    break;
                };

                if sender.send((Instant::now(), item)).await.is_err() {
                    break;
                }
            }
        });

        tracing::trace!("delay forwarder started");

        self.receiver = Some(receiver);
        self.forwarder = Some(Forwarder(task));
    }
}

impl<S> Stream for DelaySequence<S>
where
    S: TryStream + Send + 'static,
    S::Ok: Send + 'static,
    S::Error: Send + 'static,
{
    type Item = Result<S::Ok, S::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.finished {
            return Poll::Ready(None);
        }

        if let Some(upstream) = this.upstream.take() {
            this.spawn_forwarder(upstream);
        }

        if this.pending.is_none() {
            let received = match this.receiver.as_mut() {
                Some(receiver) => ready!(receiver.poll_recv(cx)),
                None => None,
            };

            match received {
                Some(stamped) => this.pending = Some(stamped),
                None => {
                    this.finished = true;
                    this.forwarder = None;
                    return Poll::Ready(None);
                }
            }
        }

        let deadline = match &this.pending {
            Some((arrival, Ok(_))) => Some(
                arrival
                    .checked_add(this.duration)
                    .unwrap_or_else(|| *arrival + FAR_FUTURE),
            ),
            _ => None,
        };

        if let Some(deadline) = deadline.filter(|deadline| Instant::now() < *deadline) {
            let sleep = this
                .sleep
                .get_or_insert_with(|| Box::pin(sleep_until(deadline)));

            if sleep.deadline() != deadline {
                sleep.as_mut().reset(deadline);
            }

            tracing::trace!(?deadline, "holding element back");
            ready!(sleep.as_mut().poll(cx));
        }

        Poll::Ready(this.pending.take().map(|(_, item)| item))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            return (0, Some(0));
        }

        let pending = usize::from(self.pending.is_some());

        match &self.upstream {
            Some(upstream) => {
                let (lower, upper) = upstream.size_hint();
                (
                    lower.saturating_add(pending),
                    upper.and_then(|upper| upper.checked_add(pending)),
                )
            }
            None => (pending, None),
        }
    }
}

impl<S> FusedStream for DelaySequence<S>
where
    S: TryStream + Send + 'static,
    S::Ok: Send + 'static,
    S::Error: Send + 'static,
{
    fn is_terminated(&self) -> bool {
        self.finished
    }
}
