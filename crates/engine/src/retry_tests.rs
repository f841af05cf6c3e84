// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::VecDeque;

fn policy() -> RetryPolicy {
    RetryPolicy::from_config(&EngineConfig::default())
}

/// Op that answers from a script, then succeeds with `done`.
fn scripted(
    script: Vec<Result<&'static str, RemoteError>>,
) -> (Arc<Mutex<usize>>, impl FnMut() -> std::future::Ready<Result<&'static str, RemoteError>>) {
    let calls = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&calls);
    let mut script: VecDeque<_> = script.into();
    let op = move || {
        *counter.lock() += 1;
        std::future::ready(script.pop_front().unwrap_or(Ok("done")))
    };
    (calls, op)
}

#[tokio::test(start_paused = true)]
async fn rate_limited_waits_without_spending_attempts() {
    let stop = CancellationToken::new();
    let failures = FailureCounter::new(5, stop.clone());
    let (calls, op) = scripted(vec![Err(RemoteError::RateLimited); 4]);
    let mut events = Vec::new();

    let started = tokio::time::Instant::now();
    let outcome = policy()
        .call(&stop, &failures, op, |e| events.push(matches!(e, RetryEvent::RateLimited { .. })))
        .await;

    assert_eq!(outcome, CallOutcome::Ok("done"));
    assert_eq!(*calls.lock(), 5);
    assert_eq!(events, vec![true; 4]);
    assert_eq!(failures.consecutive(), 0);
    assert!(started.elapsed() >= Duration::from_secs(20));
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_attempts() {
    let stop = CancellationToken::new();
    let failures = FailureCounter::new(10, stop.clone());
    let (calls, op) = scripted(vec![Err(RemoteError::Http(500)); 3]);

    let outcome = policy().call(&stop, &failures, op, |_| {}).await;

    assert_eq!(outcome, CallOutcome::Failed(RemoteError::Http(500)));
    assert_eq!(*calls.lock(), 3);
    assert_eq!(failures.consecutive(), 3);
    assert!(!stop.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn success_resets_counter() {
    let stop = CancellationToken::new();
    let failures = FailureCounter::new(5, stop.clone());
    let (_, op) = scripted(vec![Err(RemoteError::Timeout), Err(RemoteError::Timeout)]);

    let outcome = policy().call(&stop, &failures, op, |_| {}).await;

    assert_eq!(outcome, CallOutcome::Ok("done"));
    assert_eq!(failures.consecutive(), 0);
}

#[test]
fn threshold_minus_one_stays_closed() {
    let stop = CancellationToken::new();
    let failures = FailureCounter::new(5, stop.clone());
    for _ in 0..4 {
        assert!(!failures.record_failure(&RemoteError::Timeout));
    }
    assert!(!stop.is_cancelled());
    assert!(failures.trip_reason().is_none());

    assert!(failures.record_failure(&RemoteError::Http(502)));
    assert!(stop.is_cancelled());
    let reason = failures.trip_reason().unwrap();
    assert!(reason.contains("5 consecutive failures"), "{reason}");
    assert!(reason.contains("http_error:502"), "{reason}");
}

#[test]
fn tripped_circuit_ignores_success() {
    let failures = FailureCounter::new(1, CancellationToken::new());
    failures.record_failure(&RemoteError::Timeout);
    failures.record_success();
    assert!(failures.is_tripped());
    assert_eq!(failures.consecutive(), 1);
}

#[tokio::test(start_paused = true)]
async fn tripping_mid_call_stops() {
    let stop = CancellationToken::new();
    let failures = FailureCounter::new(2, stop.clone());
    let (calls, op) = scripted(vec![Err(RemoteError::Timeout); 3]);

    let outcome = policy().call(&stop, &failures, op, |_| {}).await;

    assert_eq!(outcome, CallOutcome::Stopped);
    assert_eq!(*calls.lock(), 2);
}

#[tokio::test(start_paused = true)]
async fn stop_interrupts_rate_limit_delay() {
    let stop = CancellationToken::new();
    let failures = FailureCounter::new(5, stop.clone());
    let (calls, op) = scripted(vec![Err(RemoteError::RateLimited); 10]);

    let canceller = stop.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(7)).await;
        canceller.cancel();
    });
    let outcome = policy().call(&stop, &failures, op, |_| {}).await;

    assert_eq!(outcome, CallOutcome::Stopped);
    assert_eq!(*calls.lock(), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_call_times_out() {
    let stop = CancellationToken::new();
    let failures = FailureCounter::new(5, stop.clone());
    let policy = RetryPolicy { max_attempts: 1, ..policy() };

    let outcome: CallOutcome<()> = policy
        .call(
            &stop,
            &failures,
            || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            },
            |_| {},
        )
        .await;

    assert_eq!(outcome, CallOutcome::Failed(RemoteError::Timeout));
}

#[tokio::test]
async fn already_stopped_makes_no_call() {
    let stop = CancellationToken::new();
    stop.cancel();
    let failures = FailureCounter::new(5, stop.clone());
    let (calls, op) = scripted(vec![]);

    assert_eq!(policy().call(&stop, &failures, op, |_| {}).await, CallOutcome::Stopped);
    assert_eq!(*calls.lock(), 0);
}
