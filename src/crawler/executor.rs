//! Retry/throttle executor for fan-out network work
//!
//! This module handles:
//! - Running independent tasks in batches of at most `concurrency` in flight
//! - Pausing between batches so upstream targets are not hammered
//! - Exponential-backoff retry for individual tasks
//! - Collecting a per-task outcome so one failure never sinks its siblings
//!
//! The executor holds no state between invocations.

use crate::config::ExecutorConfig;
use futures::future::join_all;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Outcome of a single task submitted to the [`Executor`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<T, E> {
    /// The task produced a value
    Fulfilled(T),

    /// The task failed; carries its last error
    Rejected(E),
}

impl<T, E> TaskOutcome<T, E> {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled(_))
    }

    /// Returns the value of a fulfilled task
    pub fn fulfilled(self) -> Option<T> {
        match self {
            Self::Fulfilled(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }
}

impl<T, E> From<Result<T, E>> for TaskOutcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Fulfilled(value),
            Err(err) => Self::Rejected(err),
        }
    }
}

/// Exponential-backoff retry policy
///
/// A task is invoked up to `max_attempts` times. After the n-th failure
/// (counting from zero) the policy sleeps `base_delay * 2^n` before trying
/// again; the final failure is returned without sleeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self::new(config.max_attempts, config.retry_base_delay())
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff slept after the given zero-based failed attempt
    pub fn delay_for(&self, failed_attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(failed_attempt);
        self.base_delay.saturating_mul(factor)
    }

    /// Runs `task` until it succeeds or attempts are exhausted
    ///
    /// # Returns
    ///
    /// * `Ok(T)` - The first successful result
    /// * `Err(E)` - The error from the final attempt
    pub async fn run<F, Fut, T, E>(&self, mut task: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 0;

        loop {
            match task().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt >= self.max_attempts {
                        return Err(err);
                    }

                    let delay = self.delay_for(attempt - 1);
                    tracing::debug!(
                        "Retry {}/{} after {:?}: {}",
                        attempt,
                        self.max_attempts,
                        delay,
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ExecutorConfig::default())
    }
}

/// Bounded-concurrency batch runner
///
/// Tasks are taken in submission order, `concurrency` at a time. A batch runs
/// to completion (successes and failures alike) before the next begins, and a
/// fixed pause separates consecutive batches.
#[derive(Debug, Clone, Copy)]
pub struct Executor {
    concurrency: usize,
    batch_pause: Duration,
}

impl Executor {
    pub fn new(concurrency: usize, batch_pause: Duration) -> Self {
        Self {
            concurrency: concurrency.max(1),
            batch_pause,
        }
    }

    pub fn from_config(config: &ExecutorConfig) -> Self {
        Self::new(config.concurrency, config.batch_pause())
    }

    /// Returns a copy of this executor with a different concurrency limit
    pub fn with_concurrency(&self, concurrency: usize) -> Self {
        Self::new(concurrency, self.batch_pause)
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs every task and returns one outcome per task, in submission order
    ///
    /// # Arguments
    ///
    /// * `tasks` - Independently invocable tasks; wrap a task body in
    ///   [`RetryPolicy::run`] to retry it
    pub async fn run_all<I, F, Fut, T, E>(&self, tasks: I) -> Vec<TaskOutcome<T, E>>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut pending = tasks.into_iter().peekable();
        let mut outcomes = Vec::new();
        let mut batch_number = 0usize;

        while pending.peek().is_some() {
            batch_number += 1;
            let batch: Vec<Fut> = pending
                .by_ref()
                .take(self.concurrency)
                .map(|task| task())
                .collect();

            tracing::trace!("Running batch {} ({} tasks)", batch_number, batch.len());
            let results = join_all(batch).await;
            outcomes.extend(results.into_iter().map(TaskOutcome::from));

            if pending.peek().is_some() && !self.batch_pause.is_zero() {
                tokio::time::sleep(self.batch_pause).await;
            }
        }

        outcomes
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::from_config(&ExecutorConfig::default())
    }
}
