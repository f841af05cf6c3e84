// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded per-run activity streams.
//!
//! Workers push; a UI or log tailer pulls. When a stream is full the oldest
//! event is dropped, so a slow or absent reader never blocks a worker.

use hv_core::{ActivityEvent, RunId};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::Notify;

struct StreamState {
    events: VecDeque<ActivityEvent>,
    next_id: u64,
    dropped: u64,
    closed: bool,
}

struct StreamInner {
    state: Mutex<StreamState>,
    notify: Notify,
    capacity: usize,
}

/// One run's buffered events. Clones share the same buffer.
#[derive(Clone)]
pub struct ActivityStream {
    inner: Arc<StreamInner>,
}

impl ActivityStream {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner: Arc::new(StreamInner {
                state: Mutex::new(StreamState {
                    events: VecDeque::with_capacity(capacity),
                    next_id: 1,
                    dropped: 0,
                    closed: false,
                }),
                notify: Notify::new(),
                capacity,
            }),
        }
    }

    /// Stamp `event` with the next id and buffer it, evicting the oldest
    /// event when full. Returns the assigned id.
    pub fn push(&self, mut event: ActivityEvent) -> u64 {
        let id = {
            let mut state = self.inner.state.lock();
            event.id = state.next_id;
            state.next_id += 1;
            if state.events.len() == self.inner.capacity {
                state.events.pop_front();
                state.dropped += 1;
            }
            state.events.push_back(event);
            state.next_id - 1
        };
        self.inner.notify.notify_one();
        id
    }

    /// Take every buffered event.
    pub fn drain(&self) -> Vec<ActivityEvent> {
        self.inner.state.lock().events.drain(..).collect()
    }

    pub fn try_next(&self) -> Option<ActivityEvent> {
        self.inner.state.lock().events.pop_front()
    }

    /// Wait for the next event. Returns `None` once the stream is removed
    /// and its buffer is empty.
    pub async fn next(&self) -> Option<ActivityEvent> {
        loop {
            {
                let mut state = self.inner.state.lock();
                if let Some(event) = state.events.pop_front() {
                    return Some(event);
                }
                if state.closed {
                    return None;
                }
            }
            self.inner.notify.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events evicted because the buffer was full.
    pub fn dropped(&self) -> u64 {
        self.inner.state.lock().dropped
    }

    fn close(&self) {
        self.inner.state.lock().closed = true;
        self.inner.notify.notify_waiters();
        self.inner.notify.notify_one();
    }
}

/// Owner of every run's activity stream.
#[derive(Clone)]
pub struct ActivityHub {
    streams: Arc<Mutex<HashMap<RunId, ActivityStream>>>,
    capacity: usize,
}

impl ActivityHub {
    pub fn new(capacity: usize) -> Self {
        Self { streams: Arc::default(), capacity }
    }

    /// The run's stream, created on first access.
    pub fn stream(&self, run: &RunId) -> ActivityStream {
        self.streams
            .lock()
            .entry(run.clone())
            .or_insert_with(|| ActivityStream::new(self.capacity))
            .clone()
    }

    pub fn push(&self, run: &RunId, event: ActivityEvent) -> u64 {
        self.stream(run).push(event)
    }

    /// Delete the run's stream, waking any reader blocked in `next`.
    pub fn remove(&self, run: &RunId) -> bool {
        let removed = self.streams.lock().remove(run);
        match removed {
            Some(stream) => {
                stream.close();
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, run: &RunId) -> bool {
        self.streams.lock().contains_key(run)
    }
}

#[cfg(test)]
#[path = "activity_tests.rs"]
mod tests;
