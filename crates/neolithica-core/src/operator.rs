//! Run control shared between the tick loop and whoever drives it.
//!
//! The loop reads these atomics every tick; anything holding the `Arc`
//! (a signal handler, a test) can request a stop or retune the pacing
//! without locks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::config::SimulationBoundsConfig;

/// Reason why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Every construction site finished.
    AllSitesFinished,
    /// A stop was requested.
    OperatorStop,
}

/// Shared run control state.
#[derive(Debug)]
pub struct RunControl {
    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Current tick interval in milliseconds (runtime-adjustable).
    tick_interval_ms: AtomicU64,

    /// Maximum number of ticks (0 = unlimited).
    max_ticks: u64,
}

impl RunControl {
    /// Create run control from configuration.
    pub const fn new(tick_interval_ms: u64, bounds: &SimulationBoundsConfig) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            max_ticks: bounds.max_ticks,
        }
    }

    /// Request a clean stop before the next tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Get the current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Set the tick interval in milliseconds, returning the previous one.
    pub fn set_tick_interval_ms(&self, ms: u64) -> u64 {
        self.tick_interval_ms.swap(ms, Ordering::AcqRel)
    }

    /// Returns `true` if `max_ticks > 0` and `current_tick >= max_ticks`.
    pub const fn tick_limit_reached(&self, current_tick: u64) -> bool {
        self.max_ticks > 0 && current_tick >= self.max_ticks
    }

    /// Get the configured max ticks.
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(max_ticks: u64) -> SimulationBoundsConfig {
        SimulationBoundsConfig { max_ticks }
    }

    #[test]
    fn tick_limit() {
        let control = RunControl::new(0, &bounds(5));
        assert!(!control.tick_limit_reached(4));
        assert!(control.tick_limit_reached(5));
        assert!(!RunControl::new(0, &bounds(0)).tick_limit_reached(u64::MAX));
    }

    #[test]
    fn stop_and_speed() {
        let control = RunControl::new(100, &bounds(0));
        assert!(!control.is_stop_requested());
        control.request_stop();
        assert!(control.is_stop_requested());
        assert_eq!(control.set_tick_interval_ms(10), 100);
        assert_eq!(control.tick_interval_ms(), 10);
    }
}
