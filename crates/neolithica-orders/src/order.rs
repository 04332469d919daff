//! The order contract shared by every kind of worker task.
//!
//! An order is stepped once per tick by the simulation driver until its
//! status is finished. Orders never hold references into the world between
//! steps; each step receives an [`OrderContext`] borrowing everything it
//! may touch for the duration of that call.

use std::collections::BTreeMap;
use std::fmt;

use neolithica_construction::ConstructionSite;
use neolithica_types::{HerdId, OrderStatus, SiteId, WorkerId};
use neolithica_world::{Herd, ResourceRegistry, StatBook};
use rust_decimal::Decimal;

use crate::error::OrderError;

/// Everything an order may read or mutate during one step.
pub struct OrderContext<'a> {
    /// The tick being executed.
    pub tick: u64,
    /// Simulated seconds per tick.
    pub fixed_delta: Decimal,
    /// All construction sites, by id.
    pub sites: &'a mut BTreeMap<SiteId, ConstructionSite>,
    /// Huntable herds, by id.
    pub herds: &'a mut BTreeMap<HerdId, Box<dyn Herd>>,
    /// Pooled warehouse stock.
    pub registry: &'a mut dyn ResourceRegistry,
    /// Named simulation stats.
    pub stats: &'a mut StatBook,
}

impl fmt::Debug for OrderContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderContext")
            .field("tick", &self.tick)
            .field("fixed_delta", &self.fixed_delta)
            .field("sites", &self.sites.len())
            .field("herds", &self.herds.len())
            .finish_non_exhaustive()
    }
}

/// A unit of work assigned to a single worker.
pub trait Order: fmt::Debug + Send {
    /// The worker carrying out this order.
    fn worker(&self) -> WorkerId;

    /// Short human-readable name, used in logs.
    fn label(&self) -> &'static str;

    /// Current status. Once [`OrderStatus::is_finished`] the order is
    /// never stepped again.
    fn status(&self) -> OrderStatus;

    /// Advance the order by one tick and return its new status.
    ///
    /// Stepping a finished order is a no-op returning the final status.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError`] when a collaborator rejects a call the order
    /// had every reason to expect to succeed. The order is marked failed.
    fn step(&mut self, ctx: &mut OrderContext<'_>) -> Result<OrderStatus, OrderError>;

    /// Stop the order early, releasing anything it holds.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError`] if carried resources could not be returned.
    fn abandon(&mut self, ctx: &mut OrderContext<'_>) -> Result<(), OrderError>;
}
