//! Core value types: resource kinds, requirements, and positions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The target action a building exposes while it is under construction.
pub const CONSTRUCT_ACTION: &str = "Construct";

// ---------------------------------------------------------------------------
// Resource kinds
// ---------------------------------------------------------------------------

/// A kind of resource held in warehouses (e.g. `wood`, `stone`, `fish`).
///
/// Kinds are open-ended tags defined by building definitions and warehouse
/// stock, so this is a string newtype rather than a closed enum. Ordering is
/// lexical, which makes it the registry's natural enumeration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKind(String);

impl ResourceKind {
    /// Create a resource kind from its tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Return the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceKind {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

// ---------------------------------------------------------------------------
// Requirements
// ---------------------------------------------------------------------------

/// An amount of one resource kind a building needs to be completed.
///
/// On a building definition this is an immutable template. A construction
/// site clones the template into its mutable "unfulfilled" ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingRequirement {
    /// The resource kind required.
    pub resource: ResourceKind,
    /// The amount still needed (or the full amount, on a template).
    pub amount: Decimal,
}

impl BuildingRequirement {
    /// Create a requirement for `amount` of `resource`.
    pub fn new(resource: impl Into<ResourceKind>, amount: Decimal) -> Self {
        Self {
            resource: resource.into(),
            amount,
        }
    }
}

/// A minimum value a named statistic must reach before a building may be
/// placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRequirement {
    /// Name of the stat (e.g. `vegetables-harvested`).
    pub stat: String,
    /// The value the stat must reach.
    pub threshold: Decimal,
}

impl StatRequirement {
    /// Create a stat requirement.
    pub fn new(stat: impl Into<String>, threshold: Decimal) -> Self {
        Self {
            stat: stat.into(),
            threshold,
        }
    }
}

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// A point in world space. `y` is height above the world origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// East-west coordinate.
    pub x: Decimal,
    /// Height.
    pub y: Decimal,
    /// North-south coordinate.
    pub z: Decimal,
}

impl Position {
    /// Create a position from its three coordinates.
    pub const fn new(x: Decimal, y: Decimal, z: Decimal) -> Self {
        Self { x, y, z }
    }
}
