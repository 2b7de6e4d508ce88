//! Bounded failure tolerance around one guarded call per frame.
//!
//! A [`CrashGuard`] runs its target inside a panic boundary. Failures are logged
//! and counted against a [`Countdown`]; a success refills it. When the countdown
//! runs out the guard reports [`GuardOutcome::Exhausted`] and the caller takes the
//! fatal-exit path. There is no backoff: the next frame is the retry.

use std::panic::{self, AssertUnwindSafe};

use event_bus::panic_message;
use log::error;
use thiserror::Error;

use crate::countdown::Countdown;

/// One failed guarded call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    /// The target returned an error.
    #[error("{0}")]
    Failed(String),

    /// The target panicked.
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Result of running a target through a [`CrashGuard`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The target succeeded; the budget was refilled.
    Succeeded,
    /// The target failed but the budget still allows recovery.
    Recovered {
        /// Failures left before exhaustion.
        remaining: u32,
        /// The failure.
        error: GuardError,
    },
    /// The target failed and the budget is spent.
    Exhausted {
        /// The failure that spent the budget.
        error: GuardError,
    },
}

/// Countdown-backed wrapper around a per-frame call.
#[derive(Debug, Clone)]
pub struct CrashGuard {
    label: &'static str,
    countdown: Countdown,
    total_failures: u64,
}

impl CrashGuard {
    /// Creates a guard tolerating `threshold` consecutive failures (at least one).
    pub fn new(label: &'static str, threshold: u32) -> Self {
        Self {
            label,
            countdown: Countdown::new(threshold.max(1)),
            total_failures: 0,
        }
    }

    /// Guard name used in logs.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Failures left before the guard is exhausted.
    pub fn remaining(&self) -> u32 {
        self.countdown.current()
    }

    /// Consecutive failures tolerated.
    pub fn threshold(&self) -> u32 {
        self.countdown.max()
    }

    /// Failures observed over the guard's lifetime.
    pub fn total_failures(&self) -> u64 {
        self.total_failures
    }

    /// Runs `target` once and updates the failure budget.
    pub fn run<F>(&mut self, target: F) -> GuardOutcome
    where
        F: FnOnce() -> anyhow::Result<()>,
    {
        let error = match panic::catch_unwind(AssertUnwindSafe(target)) {
            Ok(Ok(())) => {
                self.countdown.reset();
                return GuardOutcome::Succeeded;
            }
            Ok(Err(err)) => GuardError::Failed(format!("{err:#}")),
            Err(payload) => GuardError::Panicked(panic_message(payload.as_ref())),
        };

        self.total_failures = self.total_failures.saturating_add(1);
        error!("an error occurred in the {} loop: {error}", self.label);

        if self.countdown.decrement() {
            GuardOutcome::Exhausted { error }
        } else {
            GuardOutcome::Recovered {
                remaining: self.countdown.current(),
                error,
            }
        }
    }
}
