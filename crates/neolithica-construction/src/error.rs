//! Error types for the `neolithica-construction` crate.
//!
//! Three classes of failure reach callers:
//!
//! - **Precondition violations** ([`ReservationNotOwned`],
//!   [`StaleReservation`], [`InvalidTransition`]) are bugs in the caller.
//!   They are never retried and never swallowed.
//! - **Resource shortfall** ([`CouldNotStart`]) is recoverable: the
//!   instabuild withdrawal was rolled back and the caller may retry later.
//!
//! "No reservation available" is not an error at all; allocation returns
//! `None` for it.
//!
//! [`ReservationNotOwned`]: ConstructionError::ReservationNotOwned
//! [`StaleReservation`]: ConstructionError::StaleReservation
//! [`InvalidTransition`]: ConstructionError::InvalidTransition
//! [`CouldNotStart`]: ConstructionError::CouldNotStart

use neolithica_types::{ReservationId, ReservationState, ResourceKind, SiteId, SiteState};
use neolithica_world::WorldError;

/// Errors raised by construction site operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConstructionError {
    /// The reservation is not in this site's active set.
    #[error("reservation {reservation} does not belong to construction site {site}")]
    ReservationNotOwned {
        /// The site asked to fulfill the reservation.
        site: SiteId,
        /// The unknown reservation.
        reservation: ReservationId,
    },

    /// The reservation was already released or cancelled.
    #[error("reservation {reservation} is {state:?}, not active")]
    StaleReservation {
        /// The stale reservation.
        reservation: ReservationId,
        /// Its terminal state.
        state: ReservationState,
    },

    /// The operation is not allowed in the site's current state.
    #[error("cannot {operation} construction site {site} while {from:?}")]
    InvalidTransition {
        /// The site.
        site: SiteId,
        /// The state the site was in.
        from: SiteState,
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// Instabuild could not withdraw its bill of materials. Nothing was
    /// withdrawn and the site is unchanged.
    #[error("construction site {site} could not start: {source}")]
    CouldNotStart {
        /// The site.
        site: SiteId,
        /// The registry failure that aborted the withdrawal.
        source: WorldError,
    },

    /// No unfulfilled requirement matches the reservation's resource kind.
    #[error("construction site {site} has no requirement for {kind}")]
    NoSuchRequirement {
        /// The site.
        site: SiteId,
        /// The resource kind that was delivered.
        kind: ResourceKind,
    },
}

impl ConstructionError {
    /// Return `true` for errors that indicate a bug in the calling code.
    pub const fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            Self::ReservationNotOwned { .. }
                | Self::StaleReservation { .. }
                | Self::InvalidTransition { .. }
                | Self::NoSuchRequirement { .. }
        )
    }
}
