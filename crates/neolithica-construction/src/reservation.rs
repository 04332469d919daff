//! Reservations: one worker's claim on one unit of one resource kind.
//!
//! A [`Reservation`] is owned exclusively by the construction site that
//! minted it and lives in that site's [`ReservationSet`]. Workers only ever
//! hold a [`ReservationTicket`], a detached copy of the reservation's
//! identity. The site may invalidate a reservation at any time, so a ticket
//! must always be resolved through the site before use.
//!
//! # Lifecycle
//!
//! ```text
//! Active --fill--> Released   (ledger decremented)
//!   \----cancel--> Cancelled  (ledger untouched)
//! ```
//!
//! Marking a reservation terminal and removing it from the set are separate
//! steps. Removal happens only in [`ReservationSet::prune`], once per tick,
//! so a terminal state stays observable until the next housekeeping pass.

use neolithica_types::{ReservationId, ReservationState, ResourceKind, SiteId, WorkerId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A claim held against a construction site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique reservation id.
    pub id: ReservationId,
    /// The site holding the reservation.
    pub site: SiteId,
    /// The resource kind claimed.
    pub resource: ResourceKind,
    /// The amount claimed.
    pub amount: Decimal,
    /// The worker the reservation was issued to.
    pub owner: WorkerId,
    state: ReservationState,
}

impl Reservation {
    /// Mint a new active reservation.
    pub(crate) fn new(
        site: SiteId,
        resource: ResourceKind,
        amount: Decimal,
        owner: WorkerId,
    ) -> Self {
        Self {
            id: ReservationId::new(),
            site,
            resource,
            amount,
            owner,
            state: ReservationState::Active,
        }
    }

    /// Current lifecycle state.
    pub const fn state(&self) -> ReservationState {
        self.state
    }

    /// `true` while the claim still suppresses outstanding need.
    pub const fn is_active(&self) -> bool {
        matches!(self.state, ReservationState::Active)
    }

    /// Mark the reservation consumed. Only fulfillment may do this.
    pub(crate) const fn release(&mut self) {
        self.state = ReservationState::Released;
    }

    /// Abandon the reservation. No-op once terminal; returns whether the
    /// state changed.
    pub(crate) const fn cancel(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = ReservationState::Cancelled;
        true
    }

    /// Detached handle for the owning worker.
    pub fn ticket(&self) -> ReservationTicket {
        ReservationTicket {
            site: self.site,
            reservation: self.id,
            resource: self.resource.clone(),
            amount: self.amount,
            owner: self.owner,
        }
    }
}

/// What a worker's order keeps after a successful allocation.
///
/// This is a lookup key, not ownership: the reservation it names may be
/// cancelled, released, or pruned without the ticket knowing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationTicket {
    /// The site that issued the reservation.
    pub site: SiteId,
    /// The reservation id to quote back to the site.
    pub reservation: ReservationId,
    /// The resource kind to collect.
    pub resource: ResourceKind,
    /// The amount to collect.
    pub amount: Decimal,
    /// The worker the reservation was issued to.
    pub owner: WorkerId,
}

// ---------------------------------------------------------------------------
// ReservationSet
// ---------------------------------------------------------------------------

/// The reservations a site has issued and not yet pruned, in issue order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationSet {
    reservations: Vec<Reservation>,
}

impl ReservationSet {
    /// Create an empty set.
    pub const fn new() -> Self {
        Self {
            reservations: Vec::new(),
        }
    }

    /// Append a freshly minted reservation.
    pub(crate) fn push(&mut self, reservation: Reservation) {
        self.reservations.push(reservation);
    }

    /// Look up a reservation by id, whatever its state.
    pub fn get(&self, id: ReservationId) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: ReservationId) -> Option<&mut Reservation> {
        self.reservations.iter_mut().find(|r| r.id == id)
    }

    /// Sum of amounts across active reservations for `kind`.
    pub fn active_amount(&self, kind: &ResourceKind) -> Decimal {
        self.reservations
            .iter()
            .filter(|r| r.is_active() && &r.resource == kind)
            .map(|r| r.amount)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Iterate over all unpruned reservations.
    pub fn iter(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.iter()
    }

    /// Iterate over active reservations only.
    pub fn active(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.iter().filter(|r| r.is_active())
    }

    /// Number of unpruned reservations.
    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    /// Return whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    /// Remove every released or cancelled reservation. Returns how many
    /// were removed.
    pub fn prune(&mut self) -> usize {
        let before = self.reservations.len();
        self.reservations.retain(Reservation::is_active);
        before.saturating_sub(self.reservations.len())
    }

    /// Cancel every active reservation, returning how many were cancelled.
    pub(crate) fn cancel_all(&mut self) -> usize {
        self.reservations
            .iter_mut()
            .map(Reservation::cancel)
            .filter(|&changed| changed)
            .count()
    }
}
