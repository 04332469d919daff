//! Terrain facts the construction subsystem depends on.
//!
//! Terrain generation is someone else's job; placement only needs to know
//! where the water is.

use neolithica_types::Position;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default water level in world units.
pub const DEFAULT_WATER_LEVEL: Decimal = Decimal::TEN;

/// The ground a building stands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ground {
    /// Height of the water surface.
    pub water_level: Decimal,
}

impl Ground {
    /// Create ground with the given water level.
    pub const fn new(water_level: Decimal) -> Self {
        Self { water_level }
    }

    /// `true` iff `position` is strictly above the water surface.
    pub fn is_above_water(&self, position: &Position) -> bool {
        position.y > self.water_level
    }
}

impl Default for Ground {
    fn default() -> Self {
        Self::new(DEFAULT_WATER_LEVEL)
    }
}
