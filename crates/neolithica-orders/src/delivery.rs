//! Delivering one reserved unit of material to a construction site.
//!
//! # Phases
//!
//! ```text
//! Reserving --ticket--> Collecting --withdrawn--> Transporting --filled--> Done
//!     |                     |                          |
//!     +-- nothing needed    +-- shortfall              +-- reservation gone
//!         (Failed)              (cancel, Failed)           (deposit back, Cancelled)
//! ```
//!
//! The worker only ever holds a [`ReservationTicket`]. Before touching the
//! registry or the ledger the order re-checks that the reservation is still
//! active at the site, so a reservation cancelled or invalidated underneath
//! the worker ends the order quietly instead of corrupting the ledger.

use neolithica_construction::{ConstructionSite, Reservation, ReservationTicket};
use neolithica_types::{OrderStatus, SiteId, WorkerId};
use neolithica_world::Withdrawal;
use tracing::{debug, info, warn};

use crate::error::OrderError;
use crate::order::{Order, OrderContext};

/// Where a delivery currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Reserving,
    Collecting { ticket: ReservationTicket, waited: u32 },
    Transporting {
        ticket: ReservationTicket,
        load: Withdrawal,
        waited: u32,
    },
    Done,
}

/// Reserve, collect, carry and hand in one unit for a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOrder {
    worker: WorkerId,
    site: SiteId,
    pickup_ticks: u32,
    transport_ticks: u32,
    phase: Phase,
    status: OrderStatus,
}

impl DeliveryOrder {
    /// Create a delivery for `worker` to `site`.
    ///
    /// `pickup_ticks` and `transport_ticks` are how many steps the worker
    /// spends walking to the warehouse and to the site respectively.
    pub const fn new(worker: WorkerId, site: SiteId, pickup_ticks: u32, transport_ticks: u32) -> Self {
        Self {
            worker,
            site,
            pickup_ticks,
            transport_ticks,
            phase: Phase::Reserving,
            status: OrderStatus::Running,
        }
    }

    /// The target site.
    pub const fn site(&self) -> SiteId {
        self.site
    }

    /// The reservation currently held, if any.
    pub const fn ticket(&self) -> Option<&ReservationTicket> {
        match &self.phase {
            Phase::Collecting { ticket, .. } | Phase::Transporting { ticket, .. } => Some(ticket),
            Phase::Reserving | Phase::Done => None,
        }
    }

    /// `true` while the worker has material in hand.
    pub const fn is_carrying(&self) -> bool {
        matches!(self.phase, Phase::Transporting { .. })
    }

    fn end(&mut self, status: OrderStatus) -> OrderStatus {
        self.phase = Phase::Done;
        self.status = status;
        status
    }

    fn site_mut<'s>(
        &self,
        ctx: &'s mut OrderContext<'_>,
    ) -> Result<&'s mut ConstructionSite, OrderError> {
        ctx.sites
            .get_mut(&self.site)
            .ok_or(OrderError::SiteNotFound(self.site))
    }

    fn reserve(&mut self, ctx: &mut OrderContext<'_>) -> Result<OrderStatus, OrderError> {
        let worker = self.worker;
        let site = ctx
            .sites
            .get_mut(&self.site)
            .ok_or(OrderError::SiteNotFound(self.site))?;
        match site.try_reserve(worker, &*ctx.registry) {
            Some(ticket) => {
                self.phase = Phase::Collecting { ticket, waited: 0 };
                Ok(OrderStatus::Running)
            }
            None => {
                debug!(worker = %worker, site = %self.site, "nothing to deliver");
                Ok(self.end(OrderStatus::Failed))
            }
        }
    }

    fn collect(
        &mut self,
        ctx: &mut OrderContext<'_>,
        ticket: ReservationTicket,
        waited: u32,
    ) -> Result<OrderStatus, OrderError> {
        if waited < self.pickup_ticks {
            self.phase = Phase::Collecting {
                ticket,
                waited: waited.saturating_add(1),
            };
            return Ok(OrderStatus::Running);
        }

        if !still_active(self.site_mut(ctx)?, &ticket) {
            info!(worker = %self.worker, reservation = %ticket.reservation, "reservation withdrawn before pickup");
            return Ok(self.end(OrderStatus::Cancelled));
        }

        let load = match ctx.registry.withdraw(&ticket.resource, ticket.amount) {
            Ok(load) => load,
            Err(e) => {
                warn!(
                    worker = %self.worker,
                    kind = %ticket.resource,
                    error = %e,
                    "pickup failed, giving up reservation"
                );
                self.site_mut(ctx)?.cancel_reservation(ticket.reservation);
                return Ok(self.end(OrderStatus::Failed));
            }
        };

        debug!(worker = %self.worker, kind = %ticket.resource, amount = %ticket.amount, "picked up");
        self.phase = Phase::Transporting {
            ticket,
            load,
            waited: 0,
        };
        Ok(OrderStatus::Running)
    }

    fn hand_in(
        &mut self,
        ctx: &mut OrderContext<'_>,
        ticket: ReservationTicket,
        load: Withdrawal,
        waited: u32,
    ) -> Result<OrderStatus, OrderError> {
        if waited < self.transport_ticks {
            self.phase = Phase::Transporting {
                ticket,
                load,
                waited: waited.saturating_add(1),
            };
            return Ok(OrderStatus::Running);
        }

        let site = self.site_mut(ctx)?;
        if !still_active(site, &ticket) {
            info!(worker = %self.worker, reservation = %ticket.reservation, "reservation withdrawn in transit, returning load");
            ctx.registry.restore(&load)?;
            return Ok(self.end(OrderStatus::Cancelled));
        }

        match site.fill_reservation(ticket.reservation) {
            Ok(outcome) => {
                debug!(
                    worker = %self.worker,
                    site = %self.site,
                    applied = %outcome.applied,
                    finished = outcome.finished,
                    "delivered"
                );
                Ok(self.end(OrderStatus::Completed))
            }
            Err(e) => {
                self.end(OrderStatus::Failed);
                Err(e.into())
            }
        }
    }
}

fn still_active(site: &ConstructionSite, ticket: &ReservationTicket) -> bool {
    site.reservation(ticket.reservation)
        .is_some_and(Reservation::is_active)
}

impl Order for DeliveryOrder {
    fn worker(&self) -> WorkerId {
        self.worker
    }

    fn label(&self) -> &'static str {
        "Deliver"
    }

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn step(&mut self, ctx: &mut OrderContext<'_>) -> Result<OrderStatus, OrderError> {
        if self.status.is_finished() {
            return Ok(self.status);
        }
        let phase = std::mem::replace(&mut self.phase, Phase::Done);
        let result = match phase {
            Phase::Reserving => self.reserve(ctx),
            Phase::Collecting { ticket, waited } => self.collect(ctx, ticket, waited),
            Phase::Transporting {
                ticket,
                load,
                waited,
            } => self.hand_in(ctx, ticket, load, waited),
            Phase::Done => Ok(self.status),
        };
        if result.is_err() {
            self.end(OrderStatus::Failed);
        }
        result
    }

    fn abandon(&mut self, ctx: &mut OrderContext<'_>) -> Result<(), OrderError> {
        if self.status.is_finished() {
            return Ok(());
        }
        let phase = std::mem::replace(&mut self.phase, Phase::Done);
        self.status = OrderStatus::Cancelled;
        let (ticket, load) = match phase {
            Phase::Collecting { ticket, .. } => (ticket, None),
            Phase::Transporting { ticket, load, .. } => (ticket, Some(load)),
            Phase::Reserving | Phase::Done => return Ok(()),
        };
        if let Some(site) = ctx.sites.get_mut(&ticket.site) {
            site.cancel_reservation(ticket.reservation);
        }
        if let Some(load) = &load {
            ctx.registry.restore(load)?;
        }
        info!(
            worker = %self.worker,
            reservation = %ticket.reservation,
            carrying = load.is_some(),
            "delivery abandoned"
        );
        Ok(())
    }
}
