//! Per-entity decision scheduling.
//!
//! Every AI-driven entity owns one [`Schedule`]. The simulation's tick loop
//! is the only thing that fires it, so a unit's decisions are strictly
//! serialized: at most one call can be pending, asking for another while one
//! is pending does nothing, and the guard clears exactly when the pending
//! call fires.

use serde::{Deserialize, Serialize};

/// Scheduling state of one decision loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Schedule {
    /// Nothing pending. A unit left here is AFK until the watchdog kicks it.
    #[default]
    Idle,
    /// A decision will run at tick `due`.
    Pending {
        /// Tick at which the decision fires.
        due: u64,
    },
}

impl Schedule {
    /// Request a decision `delay` ticks after `now`.
    ///
    /// Returns `false` (and changes nothing) when a call is already pending.
    pub fn delayed_call(&mut self, now: u64, delay: u64) -> bool {
        match self {
            Self::Pending { .. } => false,
            Self::Idle => {
                *self = Self::Pending {
                    due: now + delay.max(1),
                };
                true
            }
        }
    }

    /// Consume the pending call if it is due at `now`.
    ///
    /// Clears the guard and returns `true` exactly once per scheduled call.
    pub fn fire(&mut self, now: u64) -> bool {
        match *self {
            Self::Pending { due } if due <= now => {
                *self = Self::Idle;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending call.
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    /// True when a call is pending.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// True when nothing is pending.
    #[must_use]
    pub const fn is_afk(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Tick of the pending call, if any.
    #[must_use]
    pub const fn due(&self) -> Option<u64> {
        match self {
            Self::Pending { due } => Some(*due),
            Self::Idle => None,
        }
    }
}

/// Fixed-period timer used for the watchdog, the economy tick and the team AI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    period: u64,
    next: u64,
}

impl Interval {
    /// Timer that first fires `period` ticks after `start`.
    #[must_use]
    pub fn new(period: u64, start: u64) -> Self {
        let period = period.max(1);
        Self {
            period,
            next: start + period,
        }
    }

    /// Returns `true` once per elapsed period.
    pub fn tick(&mut self, now: u64) -> bool {
        if now >= self.next {
            self.next = now + self.period;
            true
        } else {
            false
        }
    }
}
