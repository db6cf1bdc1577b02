mod common;

use lazyflow::{
    DeferredTask, ResultState, SharedError, SingleValueSubject, SubjectError, UnitOfWork,
};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task;
use tokio::time::{sleep, timeout};

#[derive(Debug, Clone, PartialEq, Eq)]
enum TestError {
    E1,
}

#[tokio::test]
async fn test_send_then_wait() {
    common::init_tracing();

    let subject = SingleValueSubject::<i32, TestError>::new();

    subject.send(42).unwrap();

    assert_eq!(subject.wait().await, Ok(42));
    assert_eq!(subject.send(43), Err(SubjectError::AlreadyCompleted));
    assert_eq!(subject.state(), ResultState::Succeeded(42));
    assert_eq!(subject.wait().await, Ok(42));
}

#[tokio::test]
async fn test_value_sent_before_chain_runs() {
    let calls = Arc::new(AtomicUsize::new(0));
    let subject = SingleValueSubject::<u32, TestError>::new();

    let unit_of_work = subject.clone().map({
        let calls = calls.clone();
        move |value| {
            calls.fetch_add(1, Ordering::SeqCst);
            value
        }
    });

    subject.send(7).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0, "map must not run before start");
    assert_eq!(unit_of_work.start().await, Ok(7));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_value_sent_after_chain_runs() {
    let subject = SingleValueSubject::<u32, TestError>::new();
    let seen = Arc::new(AtomicUsize::new(0));

    let handle = subject
        .clone()
        .map({
            let seen = seen.clone();
            move |value| seen.store(value as usize, Ordering::SeqCst)
        })
        .run();

    task::yield_now().await;
    assert_eq!(subject.waiter_count(), 1, "the running chain should be suspended");

    subject.send(99).unwrap();
    handle.await.unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 99);
    assert_eq!(subject.waiter_count(), 0);
}

#[tokio::test]
async fn test_error_sent_before_wait() {
    let subject = SingleValueSubject::<u32, TestError>::new();

    subject.send_error(TestError::E1).unwrap();

    assert_eq!(subject.wait().await, Err(TestError::E1));
    assert_eq!(subject.state(), ResultState::Failed(TestError::E1));
}

#[tokio::test(start_paused = true)]
async fn test_error_sent_after_wait_is_materialized() {
    let subject = SingleValueSubject::<u32, TestError>::new();
    let unit_of_work = subject.clone().materialize().map(|result| result);

    task::spawn({
        let subject = subject.clone();
        async move {
            sleep(Duration::from_millis(10)).await;
            subject.send_error(TestError::E1).unwrap();
        }
    });

    let outcome = unit_of_work.start().await;

    assert_eq!(outcome, Ok(Err(TestError::E1)));
}

#[tokio::test(start_paused = true)]
async fn test_error_is_only_sent_once() {
    let subject = SingleValueSubject::<u32, TestError>::new();

    let producer = task::spawn({
        let subject = subject.clone();
        async move {
            sleep(Duration::from_millis(10)).await;
            subject.send_error(TestError::E1).unwrap();
            subject.send_error(TestError::E1)
        }
    });

    assert_eq!(subject.clone().materialize().start().await, Ok(Err(TestError::E1)));
    assert_eq!(producer.await.unwrap(), Err(SubjectError::AlreadyCompleted));
}

#[tokio::test]
async fn test_value_then_error_is_rejected() {
    let subject = SingleValueSubject::<u32, TestError>::new();

    subject.send(1).unwrap();

    assert_eq!(
        subject.send_error(TestError::E1),
        Err(SubjectError::AlreadyCompleted)
    );
    assert_eq!(subject.state(), ResultState::Succeeded(1));
}

#[tokio::test]
async fn test_unit_subject() {
    let subject = SingleValueSubject::<()>::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let unit_of_work = subject.clone().map({
        let calls = calls.clone();
        move |()| {
            calls.fetch_add(1, Ordering::SeqCst);
        }
    });

    let handle = task::spawn(async move { unit_of_work.start().await.is_ok() });

    subject.send(()).unwrap();

    assert!(handle.await.unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_shared_error_is_delivered_to_every_waiter() {
    let subject = SingleValueSubject::<u32, SharedError>::new();

    let waiters: Vec<_> = (0..3)
        .map(|_| {
            let subject = subject.clone();
            task::spawn(async move { subject.start().await })
        })
        .collect();

    task::yield_now().await;
    subject
        .send_error(Arc::new(io::Error::other("connection reset")))
        .unwrap();

    for waiter in waiters {
        let error = waiter.await.unwrap().unwrap_err();
        assert_eq!(error.to_string(), "connection reset");
    }
}

#[tokio::test]
async fn test_send_concurrently_with_start() {
    let subject = SingleValueSubject::<u32, TestError>::new();
    let unit_of_work = subject.clone().map(|value| value + 1);

    let sender = DeferredTask::new({
        let subject = subject.clone();
        move || {
            let subject = subject.clone();
            async move { subject.send(41) }
        }
    });

    let (outcome, sent) = tokio::join!(unit_of_work.start(), async { sender.run().await });

    assert_eq!(outcome, Ok(42));
    assert!(sent.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_waiter_receives_the_value() {
    let subject = SingleValueSubject::<usize, TestError>::new();

    let waiters: Vec<_> = (0..64)
        .map(|_| {
            let subject = subject.clone();
            task::spawn(async move { subject.wait().await })
        })
        .collect();

    let producer = task::spawn({
        let subject = subject.clone();
        async move { subject.send(1234) }
    });

    producer.await.unwrap().unwrap();

    for waiter in waiters {
        assert_eq!(waiter.await.unwrap(), Ok(1234));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_exactly_one_concurrent_send_wins() {
    let subject = SingleValueSubject::<usize, TestError>::new();

    let senders: Vec<_> = (0..32)
        .map(|i| {
            let subject = subject.clone();
            task::spawn(async move { subject.send(i).map(|()| i) })
        })
        .collect();

    let mut winners = Vec::new();
    for sender in senders {
        match sender.await.unwrap() {
            Ok(i) => winners.push(i),
            Err(error) => assert_eq!(error, SubjectError::AlreadyCompleted),
        }
    }

    assert_eq!(winners.len(), 1, "exactly one send must succeed");
    assert_eq!(subject.state(), ResultState::Succeeded(winners[0]));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_waiter_is_unregistered() {
    let subject = SingleValueSubject::<u32, TestError>::new();

    let expired = timeout(Duration::from_millis(5), subject.wait()).await;

    assert!(expired.is_err());
    assert_eq!(subject.waiter_count(), 0);
    assert!(!subject.is_resolved(), "cancellation must not resolve the subject");

    let waiter = task::spawn({
        let subject = subject.clone();
        async move { subject.wait().await }
    });

    task::yield_now().await;
    assert_eq!(subject.waiter_count(), 1);

    waiter.abort();
    assert!(waiter.await.unwrap_err().is_cancelled());
    assert_eq!(subject.waiter_count(), 0);

    subject.send(5).unwrap();
    assert_eq!(subject.wait().await, Ok(5));
}

#[tokio::test]
async fn test_subject_result_is_cached_across_starts() {
    let subject = SingleValueSubject::<String, TestError>::new();

    subject.send("ready".to_string()).unwrap();

    assert_eq!(subject.start().await.as_deref(), Ok("ready"));
    assert_eq!(subject.start().await.as_deref(), Ok("ready"));
}

#[test]
fn test_state_is_pending_until_resolved() {
    let subject = SingleValueSubject::<u8, TestError>::default();

    assert_eq!(subject.state(), ResultState::Pending);
    assert!(!subject.is_resolved());

    subject.send(3).unwrap();

    assert!(subject.is_resolved());
    assert_eq!(format!("{subject:?}"), "SingleValueSubject { resolved: true }");
}
