//! Per-device transmit and compute timers.
//!
//! Each device carries its own [`Schedule`], resolved once at construction
//! from the configured [`TimerPolicy`]. A phase is due for a device when the
//! engine clock has reached the device's next time for that phase; after the
//! phase runs the timer is re-evaluated against the current engine time, so
//! devices drift independently of the global step size.

use crate::error::{Result, SimError};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Configured timer for one phase.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimerPolicy {
    /// Runs every `period` time units.
    Fixed { period: f64 },
    /// Each device draws its own period uniformly from
    /// `[period - variance, period + variance]`, clamped at zero.
    Jittered { period: f64, variance: f64 },
}

impl TimerPolicy {
    #[must_use]
    pub fn nominal_period(&self) -> f64 {
        match *self {
            TimerPolicy::Fixed { period } | TimerPolicy::Jittered { period, .. } => period,
        }
    }

    pub fn validate(&self, phase: &str) -> Result<()> {
        let (period, variance) = match *self {
            TimerPolicy::Fixed { period } => (period, 0.0),
            TimerPolicy::Jittered { period, variance } => (period, variance),
        };
        if !period.is_finite() || period < 0.0 {
            return Err(SimError::invalid_config(format!(
                "{phase} period must be finite and non-negative, got {period}"
            )));
        }
        if !variance.is_finite() || variance < 0.0 {
            return Err(SimError::invalid_config(format!(
                "{phase} variance must be finite and non-negative, got {variance}"
            )));
        }
        if !(period + variance).is_finite() {
            return Err(SimError::invalid_config(format!(
                "{phase} period range {period} +/- {variance} overflows"
            )));
        }
        Ok(())
    }

    /// Resolves the policy into the concrete timer one device will use.
    pub fn resolve<R: Rng>(&self, rng: &mut R) -> Timer {
        match *self {
            TimerPolicy::Fixed { period } => Timer::Interval(period),
            TimerPolicy::Jittered { period, variance } => {
                if variance == 0.0 {
                    Timer::Interval(period)
                } else {
                    let drawn = rng.gen_range((period - variance)..=(period + variance));
                    Timer::Interval(drawn.max(0.0))
                }
            }
        }
    }
}

/// Concrete timer held by a device.
#[derive(Debug, Clone, Copy)]
pub enum Timer {
    Interval(f64),
    /// Pure function from the current engine time to the next due time.
    Custom(fn(f64) -> f64),
}

impl Timer {
    /// Next due time after running at `now`.
    ///
    /// Never returns a time earlier than `now`; a custom function that yields a
    /// non-finite or earlier value makes the phase due again on the next tick.
    #[must_use]
    pub fn next(&self, now: f64) -> f64 {
        let next = match *self {
            Timer::Interval(period) => now + period,
            Timer::Custom(f) => f(now),
        };
        if next.is_finite() && next >= now {
            next
        } else {
            now
        }
    }

    #[must_use]
    pub fn period(&self) -> Option<f64> {
        match *self {
            Timer::Interval(period) => Some(period),
            Timer::Custom(_) => None,
        }
    }
}

/// The pair of timers that drive one device.
#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    pub transmit: Timer,
    pub compute: Timer,
}

impl Default for Schedule {
    fn default() -> Self {
        Self::fixed(0.5, 1.0)
    }
}

impl Schedule {
    #[must_use]
    pub fn fixed(transmit_period: f64, compute_period: f64) -> Self {
        Self {
            transmit: Timer::Interval(transmit_period),
            compute: Timer::Interval(compute_period),
        }
    }

    #[must_use]
    pub fn custom(transmit: fn(f64) -> f64, compute: fn(f64) -> f64) -> Self {
        Self {
            transmit: Timer::Custom(transmit),
            compute: Timer::Custom(compute),
        }
    }
}
