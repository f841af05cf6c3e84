// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry policy and consecutive-failure circuit around remote calls.
//!
//! - `rate_limited`: wait a fixed delay and retry the same call. Costs no
//!   attempt and leaves the failure counter alone.
//! - any other error: one attempt used, failure counter bumped.
//! - success: failure counter reset.
//!
//! Reaching the failure threshold trips the circuit, which cancels the
//! phase's stop token so every worker unwinds.

use crate::config::EngineConfig;
use hv_adapters::RemoteError;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Result of one logical remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome<T> {
    Ok(T),
    /// Every attempt failed; carries the last error
    Failed(RemoteError),
    /// The stop token fired (signal or open circuit) before the call settled
    Stopped,
}

/// Observable retry steps, for activity reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryEvent<'a> {
    RateLimited { delay: Duration },
    Failed { error: &'a RemoteError, attempt: u32, max_attempts: u32 },
}

#[derive(Debug, Default)]
struct CircuitState {
    consecutive: u32,
    tripped: bool,
    last_error: Option<String>,
}

/// Consecutive-failure counter shared by every worker of a phase.
#[derive(Clone)]
pub struct FailureCounter {
    state: Arc<Mutex<CircuitState>>,
    threshold: u32,
    stop: CancellationToken,
}

impl FailureCounter {
    /// Counter that cancels `stop` when `threshold` failures happen in a row.
    pub fn new(threshold: u32, stop: CancellationToken) -> Self {
        Self { state: Arc::default(), threshold: threshold.max(1), stop }
    }

    /// Count one failure. Returns true if the circuit is (now) open.
    pub fn record_failure(&self, error: &RemoteError) -> bool {
        let mut state = self.state.lock();
        state.consecutive += 1;
        state.last_error = Some(error.to_string());
        if !state.tripped && state.consecutive >= self.threshold {
            state.tripped = true;
            tracing::warn!(
                consecutive = state.consecutive,
                error = %error,
                "circuit open, stopping workers"
            );
            self.stop.cancel();
        }
        state.tripped
    }

    pub fn record_success(&self) {
        let mut state = self.state.lock();
        if !state.tripped {
            state.consecutive = 0;
        }
    }

    pub fn consecutive(&self) -> u32 {
        self.state.lock().consecutive
    }

    pub fn is_tripped(&self) -> bool {
        self.state.lock().tripped
    }

    /// Human-readable reason once tripped.
    pub fn trip_reason(&self) -> Option<String> {
        let state = self.state.lock();
        state.tripped.then(|| {
            format!(
                "circuit open after {} consecutive failures (last error: {})",
                state.consecutive,
                state.last_error.as_deref().unwrap_or("unknown")
            )
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub rate_limit_delay: Duration,
    pub call_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            rate_limit_delay: config.rate_limit_delay(),
            call_timeout: config.call_timeout(),
        }
    }

    /// Drive `op` to a settled outcome.
    ///
    /// `stop` is checked before every attempt and interrupts the rate-limit
    /// delay. An attempt already in flight always runs to completion or to
    /// its timeout.
    pub async fn call<T, F, Fut>(
        &self,
        stop: &CancellationToken,
        failures: &FailureCounter,
        mut op: F,
        mut on_event: impl FnMut(RetryEvent<'_>),
    ) -> CallOutcome<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let mut attempt = 0;
        loop {
            if stop.is_cancelled() {
                return CallOutcome::Stopped;
            }
            let result = match tokio::time::timeout(self.call_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(RemoteError::Timeout),
            };
            let error = match result {
                Ok(value) => {
                    failures.record_success();
                    return CallOutcome::Ok(value);
                }
                Err(error) => error,
            };

            if error.is_rate_limited() {
                tracing::warn!(delay_ms = self.rate_limit_delay.as_millis() as u64, "rate limited");
                on_event(RetryEvent::RateLimited { delay: self.rate_limit_delay });
                tokio::select! {
                    _ = tokio::time::sleep(self.rate_limit_delay) => continue,
                    _ = stop.cancelled() => return CallOutcome::Stopped,
                }
            }

            attempt += 1;
            tracing::warn!(attempt, max_attempts = self.max_attempts, error = %error, "remote call failed");
            on_event(RetryEvent::Failed { error: &error, attempt, max_attempts: self.max_attempts });
            if failures.record_failure(&error) {
                return CallOutcome::Stopped;
            }
            if attempt >= self.max_attempts {
                return CallOutcome::Failed(error);
            }
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
