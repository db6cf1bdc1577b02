mod common;

use futures_util::{StreamExt, stream};
use lazyflow::{SequenceExt, UnitOfWork, deferred};
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task;
use tokio::time::{Instant, sleep, timeout};

const DELAY: Duration = Duration::from_millis(10);

#[tokio::test(start_paused = true)]
async fn test_delay_holds_element_back() {
    common::init_tracing();

    let start = Instant::now();
    let mut delayed = stream::iter(vec![Ok::<_, &str>(1)]).delay(DELAY);

    assert_eq!(delayed.duration(), DELAY);
    assert_eq!(delayed.next().await, Some(Ok(1)));
    assert!(start.elapsed() >= DELAY, "element yielded too early");

    assert_eq!(delayed.next().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_delay_does_not_accumulate() {
    let start = Instant::now();
    let delayed = stream::iter((0..5).map(Ok::<_, &str>)).delay(DELAY);

    let items: Vec<_> = delayed.collect().await;

    assert_eq!(items, vec![Ok(0), Ok(1), Ok(2), Ok(3), Ok(4)]);
    assert!(
        start.elapsed() < DELAY * 2,
        "elements available together should be released together, took {:?}",
        start.elapsed()
    );
}

#[tokio::test(start_paused = true)]
async fn test_delay_measures_from_arrival() {
    let spaced = stream::unfold(0, |n| async move {
        if n == 2 {
            return None;
        }

        if n > 0 {
            sleep(Duration::from_millis(15)).await;
        }

        Some((Ok::<_, ()>(n), n + 1))
    });

    let start = Instant::now();
    let mut delayed = pin!(spaced.delay(DELAY));

    assert_eq!(delayed.next().await, Some(Ok(0)));
    let first = start.elapsed();

    assert_eq!(delayed.next().await, Some(Ok(1)));
    let second = start.elapsed();

    assert!(first >= DELAY, "first element too early: {first:?}");
    assert!(
        second >= Duration::from_millis(25),
        "second element too early: {second:?}"
    );
    assert!(
        second < Duration::from_millis(35),
        "second element delayed twice: {second:?}"
    );

    assert_eq!(delayed.next().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_delay_forwards_errors_immediately() {
    let start = Instant::now();
    let mut delayed = stream::iter(vec![Err::<u8, _>("boom")]).delay(Duration::from_secs(1));

    assert_eq!(delayed.next().await, Some(Err("boom")));
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(delayed.next().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_delay_preserves_order() {
    let start = Instant::now();
    let delayed = stream::iter(vec![Ok(1), Err("late"), Ok(2)]).delay(DELAY);

    let items: Vec<_> = delayed.collect().await;

    assert_eq!(items, vec![Ok(1), Err("late"), Ok(2)]);
    assert!(start.elapsed() >= DELAY);
}

#[tokio::test(start_paused = true)]
async fn test_delay_of_empty_sequence_completes() {
    let start = Instant::now();
    let mut delayed = stream::iter(Vec::<Result<u8, ()>>::new()).delay(DELAY);

    assert_eq!(delayed.next().await, None);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_delayed_work_sequence() {
    let start = Instant::now();
    let mut delayed = deferred(|| async { Ok::<_, ()>("late") })
        .to_sequence()
        .delay(DELAY);

    assert_eq!(delayed.next().await, Some(Ok("late")));
    assert!(start.elapsed() >= DELAY);
}

#[tokio::test(start_paused = true)]
async fn test_delayed_unit_of_work() {
    let start = Instant::now();

    let value = deferred(|| async { Ok::<_, ()>(3) })
        .delay(DELAY)
        .start()
        .await;

    assert_eq!(value, Ok(3));
    assert!(start.elapsed() >= DELAY);

    let start = Instant::now();

    let failure = deferred(|| async { Err::<u8, _>("fast") })
        .delay(Duration::from_secs(1))
        .start()
        .await;

    assert_eq!(failure, Err("fast"));
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_slow_consumer_does_not_postpone_arrival() {
    let (sender, receiver) = mpsc::channel(8);

    task::spawn(async move {
        sender.send(1).await.unwrap();
        sleep(Duration::from_millis(12)).await;
        sender.send(2).await.unwrap();
    });

    let upstream = stream::unfold(receiver, |mut receiver| async move {
        let value = receiver.recv().await?;
        Some((Ok::<_, ()>(value), receiver))
    });

    let start = Instant::now();
    let mut delayed = pin!(upstream.delay(DELAY));

    assert_eq!(delayed.next().await, Some(Ok(1)));
    assert!(start.elapsed() >= DELAY);

    // The second element becomes available at 12ms and is due at 22ms.
    sleep(Duration::from_millis(30)).await;
    let resumed = start.elapsed();

    assert_eq!(delayed.next().await, Some(Ok(2)));
    assert_eq!(
        start.elapsed(),
        resumed,
        "an element already due must be yielded without a new delay"
    );

    assert_eq!(delayed.next().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_delay_with_maximum_duration() {
    let start = Instant::now();
    let mut delayed = stream::iter(vec![Ok::<_, ()>(1)]).delay(Duration::MAX);

    let expired = timeout(Duration::from_secs(1), delayed.next()).await;

    assert!(expired.is_err(), "element must never be released");
    assert!(start.elapsed() >= Duration::from_secs(1));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_delay_cancels_the_wait() {
    let token = Arc::new(());

    let upstream = stream::unfold((0, token.clone()), |(n, token)| async move {
        if n > 0 {
            sleep(Duration::from_secs(60)).await;
        }

        Some((Ok::<_, ()>(n), (n + 1, token)))
    });

    let start = Instant::now();
    let mut delayed = upstream.delay(Duration::from_secs(60));

    let expired = timeout(Duration::from_millis(5), delayed.next()).await;

    assert!(expired.is_err());
    assert!(
        start.elapsed() < Duration::from_millis(10),
        "waiting must stop at the drop point, took {:?}",
        start.elapsed()
    );

    drop(delayed);

    for _ in 0..3 {
        task::yield_now().await;
    }

    assert_eq!(
        Arc::strong_count(&token),
        1,
        "upstream must be dropped with the sequence"
    );
}
