//! Error types for the `neolithica-orders` crate.

use neolithica_construction::ConstructionError;
use neolithica_types::{HerdId, SiteId};
use neolithica_world::WorldError;

/// Errors that abort an order step.
///
/// Expected outcomes (nothing to reserve, a shortfall at pickup, a
/// reservation cancelled underneath the worker) are not errors: they end
/// the order with a non-completed [`OrderStatus`](neolithica_types::OrderStatus).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    /// A construction site rejected a call the order believed valid.
    #[error("construction error: {0}")]
    Construction(#[from] ConstructionError),

    /// The registry or stat book rejected an update.
    #[error("world error: {0}")]
    World(#[from] WorldError),

    /// The order targets a site that no longer exists.
    #[error("construction site {0} not found")]
    SiteNotFound(SiteId),

    /// The order targets a herd that no longer exists.
    #[error("herd {0} not found")]
    HerdNotFound(HerdId),
}
