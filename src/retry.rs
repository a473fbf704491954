// src/retry.rs
use std::{thread, time::Duration};

use tracing::warn;

/// Anything that can report whether it worked.
pub trait Outcome {
    fn succeeded(&self) -> bool;
}

/// Linear back-off: attempt `n` (0-based) waits `n * attempt_delta` first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    attempt_delta: Duration,
    max_attempts: u32,
}

impl RetryPolicy {
    /// `max_attempts` below one is treated as one.
    pub fn new(attempt_delta: Duration, max_attempts: u32) -> Self {
        Self { attempt_delta, max_attempts: max_attempts.max(1) }
    }

    /// Run once, never wait.
    pub fn once() -> Self { Self::new(Duration::ZERO, 1) }

    pub fn max_attempts(&self) -> u32 { self.max_attempts }

    pub fn delay_for(&self, attempt: u32) -> Duration { self.attempt_delta * attempt }

    pub fn run<T: Outcome>(&self, op: impl FnMut() -> T) -> T {
        self.run_with_sleep(op, thread::sleep)
    }

    /// Like [`run`](Self::run) with the sleep swapped out (tests).
    pub fn run_with_sleep<T: Outcome>(&self, mut op: impl FnMut() -> T, mut sleep: impl FnMut(Duration)) -> T {
        let mut attempt = 0;
        loop {
            let delay = self.delay_for(attempt);
            if !delay.is_zero() { sleep(delay); }

            let result = op();
            if result.succeeded() { return result; }

            attempt += 1;
            if attempt >= self.max_attempts { return result; }
            warn!(attempt, max = self.max_attempts, "attempt failed, retrying in {:?}", self.delay_for(attempt));
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        use crate::config::consts::{RETRY_ATTEMPTS, RETRY_DELTA_SECS};
        Self::new(Duration::from_secs(RETRY_DELTA_SECS), RETRY_ATTEMPTS)
    }
}
