//! Bounded decrement/reset counter.
//!
//! Used both as a crash-recovery budget (consecutive failures before giving up)
//! and as a short tick-counted delay (grace period after a save loads).

/// Counter that runs from `max` down to zero and can be reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    max: u32,
    current: u32,
}

impl Countdown {
    /// Creates a full countdown.
    pub fn new(max: u32) -> Self {
        Self { max, current: max }
    }

    /// Value the countdown resets to.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Remaining value.
    pub fn current(&self) -> u32 {
        self.current
    }

    /// True once the countdown reached zero.
    pub fn is_exhausted(&self) -> bool {
        self.current == 0
    }

    /// Counts down one step, saturating at zero.
    ///
    /// Returns `true` when the countdown is exhausted after this step.
    pub fn decrement(&mut self) -> bool {
        self.current = self.current.saturating_sub(1);
        self.is_exhausted()
    }

    /// Restores the countdown to `max`.
    pub fn reset(&mut self) {
        self.current = self.max;
    }
}
