//! Shared type definitions for the Neolithica construction simulation.
//!
//! This crate is the single source of truth for the value types that flow
//! between the world collaborators, the construction subsystem, and the
//! order runtime.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Lifecycle states, capabilities, and order status
//! - [`structs`] -- Resource kinds, requirements, and positions

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Capability, GhostTint, OrderStatus, ReservationState, SiteState};
pub use ids::{HerdId, ReservationId, SiteId, WarehouseId, WorkerId};
pub use structs::{BuildingRequirement, CONSTRUCT_ACTION, Position, ResourceKind, StatRequirement};
