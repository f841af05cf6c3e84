// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded worker pool draining a shared FIFO of indexed tasks.
//!
//! Workers exit when the queue is empty or the stop token fires. Each
//! finished task is reported over a channel as it completes, so the caller
//! can persist progress sequentially while workers keep going.

use crate::error::EngineError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// One finished task.
#[derive(Debug)]
pub struct Completion<R> {
    /// Index of the task in the phase's ordered task list
    pub index: usize,
    pub worker: usize,
    pub result: R,
}

#[derive(Debug, Clone, Copy)]
pub struct ParallelRunner {
    worker_count: usize,
}

impl ParallelRunner {
    pub fn new(worker_count: usize) -> Self {
        Self { worker_count: worker_count.max(1) }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Start workers over `tasks` and return a handle streaming completions.
    ///
    /// `process` receives `(worker, index, task)`.
    pub fn spawn<T, R, F, Fut>(
        &self,
        tasks: Vec<(usize, T)>,
        stop: CancellationToken,
        process: F,
    ) -> PoolHandle<R>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(usize, usize, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let workers = self.worker_count.min(tasks.len()).max(1);
        let queue = Arc::new(Mutex::new(VecDeque::from(tasks)));
        let process = Arc::new(process);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut join = JoinSet::new();

        for worker in 0..workers {
            let queue = Arc::clone(&queue);
            let process = Arc::clone(&process);
            let stop = stop.clone();
            let tx = tx.clone();
            join.spawn(async move {
                loop {
                    if stop.is_cancelled() {
                        tracing::debug!(worker, "stop requested, worker exiting");
                        break;
                    }
                    let Some((index, task)) = queue.lock().pop_front() else {
                        break;
                    };
                    let result = process(worker, index, task).await;
                    if tx.send(Completion { index, worker, result }).is_err() {
                        break;
                    }
                }
            });
        }

        PoolHandle { rx, join }
    }

    /// Run every task and collect the completions, in completion order.
    ///
    /// When `stop` fires, workers finish their current task and stop taking
    /// new ones; whatever completed is still returned.
    pub async fn run<T, R, F, Fut>(
        &self,
        tasks: Vec<(usize, T)>,
        stop: CancellationToken,
        process: F,
    ) -> Result<Vec<Completion<R>>, EngineError>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(usize, usize, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let mut handle = self.spawn(tasks, stop, process);
        let mut completions = Vec::new();
        while let Some(completion) = handle.next().await {
            completions.push(completion);
        }
        handle.join().await?;
        Ok(completions)
    }
}

/// Live pool: a completion stream plus the workers behind it.
pub struct PoolHandle<R> {
    rx: mpsc::UnboundedReceiver<Completion<R>>,
    join: JoinSet<()>,
}

impl<R> PoolHandle<R> {
    /// Next completion, or `None` once every worker has exited.
    pub async fn next(&mut self) -> Option<Completion<R>> {
        self.rx.recv().await
    }

    /// Wait for every worker. A panicked worker is reported as an error
    /// after the rest have finished.
    pub async fn join(mut self) -> Result<(), EngineError> {
        self.rx.close();
        let mut panicked = 0;
        while let Some(joined) = self.join.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "worker did not finish cleanly");
                panicked += 1;
            }
        }
        if panicked > 0 {
            return Err(EngineError::Worker(format!("{panicked} worker(s) panicked")));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
