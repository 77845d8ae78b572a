//! Time budget of a transmit opportunity.
//!
//! A budget is either unlimited or a remaining duration. Charging never
//! takes it below zero: a charge that does not fit leaves the budget
//! untouched and reports failure.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeBudget {
    remaining: Option<Duration>,
}

impl TimeBudget {
    pub const fn unlimited() -> Self {
        Self { remaining: None }
    }

    pub const fn limited(remaining: Duration) -> Self {
        Self {
            remaining: Some(remaining),
        }
    }

    pub const fn is_unlimited(&self) -> bool {
        self.remaining.is_none()
    }

    /// `None` when unlimited.
    pub const fn remaining(&self) -> Option<Duration> {
        self.remaining
    }

    /// Whether `duration` fits in what is left.
    pub fn fits(&self, duration: Duration) -> bool {
        self.remaining.map_or(true, |left| duration <= left)
    }

    /// Whether `duration` fits with time to spare.
    pub fn fits_strictly(&self, duration: Duration) -> bool {
        self.remaining.map_or(true, |left| duration < left)
    }

    /// Consumes `step` followed by `gap`. Returns `false`, leaving the
    /// budget unchanged, if the sum does not fit.
    pub fn charge(&mut self, step: Duration, gap: Duration) -> bool {
        let Some(left) = self.remaining else {
            return true;
        };
        match step.checked_add(gap).and_then(|cost| left.checked_sub(cost)) {
            Some(rest) => {
                self.remaining = Some(rest);
                true
            }
            None => false,
        }
    }

    /// Whether any time at all is left.
    pub fn has_time_left(&self) -> bool {
        self.remaining.map_or(true, |left| !left.is_zero())
    }
}
