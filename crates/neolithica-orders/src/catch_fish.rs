//! Fishing: a worker waits at the water until a fish bites.

use neolithica_types::{OrderStatus, ResourceKind, WorkerId};
use neolithica_world::WorldError;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::OrderError;
use crate::order::{Order, OrderContext};

/// Simulated seconds of fishing per catch.
pub const SECONDS_PER_CATCH: Decimal = Decimal::from_parts(125, 0, 0, false, 2);

/// Resource kind produced by fishing.
pub const FISH: &str = "fish";

/// Accumulates simulated time and deposits one fish once enough has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatchFishOrder {
    worker: WorkerId,
    progress: Decimal,
    status: OrderStatus,
}

impl CatchFishOrder {
    /// Start fishing.
    pub const fn new(worker: WorkerId) -> Self {
        Self {
            worker,
            progress: Decimal::ZERO,
            status: OrderStatus::Running,
        }
    }

    /// Seconds spent fishing so far.
    pub const fn progress(&self) -> Decimal {
        self.progress
    }
}

impl Order for CatchFishOrder {
    fn worker(&self) -> WorkerId {
        self.worker
    }

    fn label(&self) -> &'static str {
        "CatchFish"
    }

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn step(&mut self, ctx: &mut OrderContext<'_>) -> Result<OrderStatus, OrderError> {
        if self.status.is_finished() {
            return Ok(self.status);
        }
        self.progress = self
            .progress
            .checked_add(ctx.fixed_delta)
            .ok_or(WorldError::ArithmeticOverflow)?;
        if self.progress < SECONDS_PER_CATCH {
            return Ok(self.status);
        }

        if let Err(e) = ctx.registry.deposit(&ResourceKind::new(FISH), Decimal::ONE) {
            self.status = OrderStatus::Failed;
            return Err(e.into());
        }
        info!(worker = %self.worker, tick = ctx.tick, "caught a fish");
        self.status = OrderStatus::Completed;
        Ok(self.status)
    }

    fn abandon(&mut self, _ctx: &mut OrderContext<'_>) -> Result<(), OrderError> {
        if !self.status.is_finished() {
            self.status = OrderStatus::Cancelled;
        }
        Ok(())
    }
}
