// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory pause/cancel signals, one per run.
//!
//! The persisted run status is authoritative for operators; the signal is
//! what workers poll to decide whether to stop. Workers hold a [`RunToken`]
//! and never touch the registry lock.

use hv_core::RunId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Signal {
    Pause,
    Cancel,
}

hv_core::simple_display! {
    Signal {
        Pause => "pause",
        Cancel => "cancel",
    }
}

const NO_SIGNAL: u8 = 0;
const PAUSE: u8 = 1;
const CANCEL: u8 = 2;

impl Signal {
    fn encode(self) -> u8 {
        match self {
            Signal::Pause => PAUSE,
            Signal::Cancel => CANCEL,
        }
    }

    fn decode(raw: u8) -> Option<Signal> {
        match raw {
            PAUSE => Some(Signal::Pause),
            CANCEL => Some(Signal::Cancel),
            _ => None,
        }
    }
}

struct TokenInner {
    signal: AtomicU8,
    stop: CancellationToken,
}

/// Per-run stop handle shared by every worker of a run.
#[derive(Clone)]
pub struct RunToken {
    inner: Arc<TokenInner>,
}

impl RunToken {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TokenInner {
                signal: AtomicU8::new(NO_SIGNAL),
                stop: CancellationToken::new(),
            }),
        }
    }

    /// Current signal, without locking.
    pub fn signal(&self) -> Option<Signal> {
        Signal::decode(self.inner.signal.load(Ordering::Acquire))
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stop.is_cancelled()
    }

    /// Resolves once a signal is raised.
    pub async fn stopped(&self) {
        self.inner.stop.cancelled().await
    }

    /// Token cancelled with this run, which can also be cancelled on its own.
    pub fn child(&self) -> CancellationToken {
        self.inner.stop.child_token()
    }

    /// Raise `signal`. Cancel wins over pause; a pause never downgrades it.
    fn raise(&self, signal: Signal) {
        self.inner.signal.fetch_max(signal.encode(), Ordering::AcqRel);
        self.inner.stop.cancel();
    }
}

impl Default for RunToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Map of run id to its current token.
#[derive(Clone, Default)]
pub struct SignalRegistry {
    tokens: Arc<Mutex<HashMap<RunId, RunToken>>>,
}

impl SignalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The run's token, created on first access.
    pub fn token(&self, run: &RunId) -> RunToken {
        self.tokens.lock().entry(run.clone()).or_default().clone()
    }

    pub fn pause(&self, run: &RunId) {
        self.raise(run, Signal::Pause);
    }

    /// Cancel is final, so the run is forgotten once its holders are told.
    pub fn cancel(&self, run: &RunId) {
        let token = self.tokens.lock().remove(run).unwrap_or_default();
        token.raise(Signal::Cancel);
        tracing::debug!(run_id = %run, signal = %Signal::Cancel, "signal raised");
    }

    fn raise(&self, run: &RunId, signal: Signal) {
        let token = self.token(run);
        token.raise(signal);
        tracing::debug!(run_id = %run, %signal, "signal raised");
    }

    pub fn signal(&self, run: &RunId) -> Option<Signal> {
        self.tokens.lock().get(run).and_then(RunToken::signal)
    }

    /// Forget the run's token. The next [`token`](Self::token) starts clean;
    /// holders of the old token still see its signal.
    pub fn clear(&self, run: &RunId) {
        self.tokens.lock().remove(run);
    }

    pub fn contains(&self, run: &RunId) -> bool {
        self.tokens.lock().contains_key(run)
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.lock().is_empty()
    }
}
