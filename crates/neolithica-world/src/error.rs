//! Error types for the `neolithica-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type.

use neolithica_types::{ResourceKind, WarehouseId};
use rust_decimal::Decimal;

/// Errors that can occur while querying or mutating world collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The registry does not hold enough of a resource to satisfy a
    /// withdrawal. Nothing was withdrawn.
    #[error("insufficient {kind}: requested {requested}, available {available}")]
    InsufficientResource {
        /// The resource kind requested.
        kind: ResourceKind,
        /// The amount requested.
        requested: Decimal,
        /// The amount the registry could supply.
        available: Decimal,
    },

    /// A withdrawal or deposit amount was zero or negative.
    #[error("resource amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// The rejected amount.
        amount: Decimal,
    },

    /// A deposit was attempted with no enabled warehouse to receive it.
    #[error("no enabled warehouse can accept {kind}")]
    NoWarehouse {
        /// The resource kind being deposited.
        kind: ResourceKind,
    },

    /// A warehouse id was not found in the registry.
    #[error("warehouse not found: {0}")]
    WarehouseNotFound(WarehouseId),

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,
}
