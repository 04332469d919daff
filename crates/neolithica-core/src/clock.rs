//! World clock for the Neolithica simulation.
//!
//! The tick counter is the single source of truth for simulated time.
//! Elapsed seconds are derived from it and the fixed timestep, never
//! accumulated independently.

use rust_decimal::Decimal;

use crate::config::TimeConfig;

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid time configuration (e.g. a zero timestep).
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Tick counter plus the fixed simulated timestep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldClock {
    /// Current tick number (0 before the first tick runs).
    tick: u64,

    /// Simulated seconds per tick.
    fixed_delta: Decimal,
}

impl WorldClock {
    /// Create a clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] unless `fixed_delta_seconds`
    /// is positive.
    pub fn new(config: &TimeConfig) -> Result<Self, ClockError> {
        Self::from_parts(0, config.fixed_delta_seconds)
    }

    /// Create a clock from explicit parameters (useful for testing and
    /// state restoration).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] unless `fixed_delta` is
    /// positive.
    pub fn from_parts(tick: u64, fixed_delta: Decimal) -> Result<Self, ClockError> {
        if fixed_delta <= Decimal::ZERO {
            return Err(ClockError::InvalidConfig {
                reason: format!("fixed_delta_seconds must be positive, got {fixed_delta}"),
            });
        }
        Ok(Self { tick, fixed_delta })
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Return the simulated seconds per tick.
    pub const fn fixed_delta(&self) -> Decimal {
        self.fixed_delta
    }

    /// Simulated seconds elapsed since tick 0.
    pub fn elapsed_seconds(&self) -> Decimal {
        Decimal::from(self.tick).saturating_mul(self.fixed_delta)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn starts_at_zero_and_advances() {
        let mut clock = WorldClock::new(&TimeConfig::default()).ok();
        assert_eq!(clock.as_ref().map(WorldClock::tick), Some(0));
        let next = clock.as_mut().map(WorldClock::advance);
        assert_eq!(next.and_then(Result::ok), Some(1));
    }

    #[test]
    fn elapsed_follows_ticks() {
        let clock = WorldClock::from_parts(50, dec!(0.02));
        assert_eq!(clock.map(|c| c.elapsed_seconds()).ok(), Some(dec!(1.00)));
    }

    #[test]
    fn rejects_non_positive_timestep() {
        assert!(matches!(
            WorldClock::from_parts(0, dec!(0)),
            Err(ClockError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn overflow_is_an_error() {
        let clock = WorldClock::from_parts(u64::MAX, dec!(1));
        let result = clock.ok().map(|mut c| c.advance());
        assert_eq!(result, Some(Err(ClockError::TickOverflow)));
    }
}
