//! World collaborators for the Neolithica construction simulation.
//!
//! Construction sites consult these through narrow interfaces and never
//! through global state. Each trait has a plain in-memory implementation
//! used by the simulation driver and by tests.
//!
//! # Modules
//!
//! - [`error`] -- Error types for registry and stat operations.
//! - [`ground`] -- Water level checks for placement.
//! - [`herd`] -- [`Herd`] and the finite [`AnimalHerd`].
//! - [`registry`] -- [`ResourceRegistry`] and the pooled [`WarehouseRegistry`],
//!   plus the all-or-nothing [`withdraw_all`].
//! - [`stats`] -- [`StatSource`] and the mutable [`StatBook`].
//! - [`tech`] -- [`TechGate`] and the set-backed [`TechTree`].

pub mod error;
pub mod ground;
pub mod herd;
pub mod registry;
pub mod stats;
pub mod tech;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use ground::Ground;
pub use herd::{AnimalHerd, Herd};
pub use registry::{ResourceRegistry, Warehouse, WarehouseRegistry, Withdrawal, withdraw_all};
pub use stats::{SPIRIT_STAT, StatBook, StatSource};
pub use tech::{TechGate, TechTree};
