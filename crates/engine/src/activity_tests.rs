// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use hv_core::{ActivityAction, Phase};
use std::time::Duration;

fn event(worker: usize) -> ActivityEvent {
    ActivityEvent::new(worker, Phase::Source, ActivityAction::Fetching, 1_000)
}

#[test]
fn push_past_capacity_evicts_oldest() {
    let stream = ActivityStream::new(100);
    for worker in 0..101 {
        stream.push(event(worker));
    }

    assert_eq!(stream.len(), 100);
    assert_eq!(stream.dropped(), 1);
    let events = stream.drain();
    assert_eq!(events.first().map(|e| (e.id, e.worker)), Some((2, 1)));
    assert_eq!(events.last().map(|e| (e.id, e.worker)), Some((101, 100)));
    assert!(stream.is_empty());
}

#[test]
fn ids_increase_per_stream() {
    let hub = ActivityHub::new(10);
    let a = RunId::new();
    let b = RunId::new();
    assert_eq!(hub.push(&a, event(0)), 1);
    assert_eq!(hub.push(&a, event(0)), 2);
    assert_eq!(hub.push(&b, event(0)), 1);
    assert_eq!(hub.stream(&a).try_next().map(|e| e.id), Some(1));
}

#[test]
fn concurrent_first_access_shares_one_stream() {
    let hub = ActivityHub::new(1_000);
    let run = RunId::new();
    std::thread::scope(|s| {
        for worker in 0..8 {
            let hub = hub.clone();
            let run = run.clone();
            s.spawn(move || {
                for _ in 0..50 {
                    hub.push(&run, event(worker));
                }
            });
        }
    });
    assert_eq!(hub.stream(&run).len(), 400);
}

#[tokio::test]
async fn next_waits_for_push() {
    let stream = ActivityStream::new(4);
    let reader = stream.clone();
    let pending = tokio::spawn(async move { reader.next().await });

    tokio::task::yield_now().await;
    stream.push(event(3));

    let got = tokio::time::timeout(Duration::from_secs(1), pending).await.unwrap().unwrap();
    assert_eq!(got.map(|e| e.worker), Some(3));
}

#[tokio::test]
async fn remove_wakes_blocked_reader() {
    let hub = ActivityHub::new(4);
    let run = RunId::new();
    let reader = hub.stream(&run);
    let pending = tokio::spawn(async move { reader.next().await });

    tokio::task::yield_now().await;
    assert!(hub.remove(&run));
    assert!(!hub.contains(&run));

    let got = tokio::time::timeout(Duration::from_secs(1), pending).await.unwrap().unwrap();
    assert!(got.is_none());
    assert!(!hub.remove(&run));
}
