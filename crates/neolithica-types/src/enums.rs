//! Enumeration types for the construction subsystem.
//!
//! Lifecycle states for construction sites and reservations, the capability
//! kinds a building can have suspended while it is being placed, and the
//! status every order reports after a step.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Construction site lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of a construction site.
///
/// Transitions only move forward:
///
/// ```text
/// Planning -> Ghosted -> UnderConstruction -> Finished
///                  \______________________/
///                         (instabuild)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SiteState {
    /// The site exists but placement has not started.
    Planning,
    /// The building is being placed; it is visible but not functional.
    Ghosted,
    /// Workers may deliver resources against the site's ledger.
    UnderConstruction,
    /// Construction completed; the building is a normal entity. Terminal.
    Finished,
}

impl SiteState {
    /// Return `true` if the state is terminal.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished)
    }
}

// ---------------------------------------------------------------------------
// Reservation lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle state of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReservationState {
    /// The claim is live and suppresses outstanding need.
    Active,
    /// The claim was consumed by a fulfillment. Terminal.
    Released,
    /// The claim was abandoned without consuming anything. Terminal.
    Cancelled,
}

impl ReservationState {
    /// Return `true` for [`Released`](Self::Released) and
    /// [`Cancelled`](Self::Cancelled).
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Released | Self::Cancelled)
    }
}

// ---------------------------------------------------------------------------
// Building capabilities
// ---------------------------------------------------------------------------

/// A passive behavior a building exposes once it is functional.
///
/// These are the capability kinds suspended while a building is being
/// placed, so that a half-placed storehouse can never act as a warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// The building produces resources.
    Production,
    /// The building stores resources and acts as a warehouse.
    Storage,
}

impl Capability {
    /// Every capability kind that placement suspends.
    pub const SUSPENDED_DURING_PLACEMENT: [Self; 2] = [Self::Production, Self::Storage];
}

/// Placement-preview tint carried by a building while it is a ghost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GhostTint {
    /// The current placement is valid.
    Good,
    /// The current placement is invalid.
    Bad,
    /// Placement is confirmed and the building awaits deliveries.
    Building,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Status reported by an order after each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// The order needs more steps.
    Running,
    /// The order achieved its goal.
    Completed,
    /// The order could not proceed; the worker should look for other work.
    Failed,
    /// The order was abandoned by its worker.
    Cancelled,
}

impl OrderStatus {
    /// Return `true` once the order must not be stepped again.
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_finished_site_is_terminal() {
        assert!(!SiteState::Planning.is_terminal());
        assert!(!SiteState::Ghosted.is_terminal());
        assert!(!SiteState::UnderConstruction.is_terminal());
        assert!(SiteState::Finished.is_terminal());
    }

    #[test]
    fn site_states_order_along_the_lifecycle() {
        assert!(SiteState::Planning < SiteState::Ghosted);
        assert!(SiteState::Ghosted < SiteState::UnderConstruction);
        assert!(SiteState::UnderConstruction < SiteState::Finished);
    }

    #[test]
    fn reservation_terminal_states() {
        assert!(!ReservationState::Active.is_terminal());
        assert!(ReservationState::Released.is_terminal());
        assert!(ReservationState::Cancelled.is_terminal());
    }

    #[test]
    fn order_status_finished() {
        assert!(!OrderStatus::Running.is_finished());
        assert!(OrderStatus::Completed.is_finished());
        assert!(OrderStatus::Failed.is_finished());
        assert!(OrderStatus::Cancelled.is_finished());
    }
}
