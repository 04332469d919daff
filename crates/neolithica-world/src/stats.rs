//! Named simulation statistics (spirit, harvest counts, population, ...).
//!
//! Stat requirements on buildings are checked against a [`StatSource`].
//! [`StatBook`] is the mutable store orders write into.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Name of the stat fed by meditation.
pub const SPIRIT_STAT: &str = "spirit";

/// Reports the current value of a named stat.
pub trait StatSource {
    /// Current value of `stat`. Unknown stats read as zero.
    fn current_value(&self, stat: &str) -> Decimal;
}

/// In-memory stat values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBook {
    values: BTreeMap<String, Decimal>,
}

impl StatBook {
    /// Create an empty stat book.
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Overwrite the value of `stat`.
    pub fn set(&mut self, stat: impl Into<String>, value: Decimal) {
        self.values.insert(stat.into(), value);
    }

    /// Add `delta` to `stat` and return the new value.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ArithmeticOverflow`] if the sum overflows.
    pub fn add(&mut self, stat: &str, delta: Decimal) -> Result<Decimal, WorldError> {
        let entry = self.values.entry(stat.to_owned()).or_insert(Decimal::ZERO);
        *entry = entry.checked_add(delta).ok_or(WorldError::ArithmeticOverflow)?;
        Ok(*entry)
    }
}

impl StatSource for StatBook {
    fn current_value(&self, stat: &str) -> Decimal {
        self.values.get(stat).copied().unwrap_or(Decimal::ZERO)
    }
}
