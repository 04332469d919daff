//! Hunting: a worker slaughters an animal from a herd.
//!
//! The hunter works for [`SECONDS_PER_KILL`] of simulated time and then
//! tries to kill. A failed attempt halves the progress made so far and the
//! hunter keeps trying; a successful one deposits a single unit of the
//! herd's resource and completes.

use neolithica_types::{HerdId, OrderStatus, WorkerId};
use neolithica_world::WorldError;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::OrderError;
use crate::order::{Order, OrderContext};

/// Simulated seconds of work before each kill attempt.
pub const SECONDS_PER_KILL: Decimal = Decimal::from_parts(125, 0, 0, false, 2);

/// Hunt one animal from a herd.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlaughterOrder {
    worker: WorkerId,
    herd: HerdId,
    progress: Decimal,
    status: OrderStatus,
}

impl SlaughterOrder {
    /// Start hunting `herd`.
    pub const fn new(worker: WorkerId, herd: HerdId) -> Self {
        Self {
            worker,
            herd,
            progress: Decimal::ZERO,
            status: OrderStatus::Running,
        }
    }

    /// The target herd.
    pub const fn herd(&self) -> HerdId {
        self.herd
    }

    /// Seconds of progress towards the next attempt.
    pub const fn progress(&self) -> Decimal {
        self.progress
    }

    fn attempt(&mut self, ctx: &mut OrderContext<'_>) -> Result<OrderStatus, OrderError> {
        self.progress = self
            .progress
            .checked_add(ctx.fixed_delta)
            .ok_or(WorldError::ArithmeticOverflow)?;
        if self.progress <= SECONDS_PER_KILL {
            return Ok(OrderStatus::Running);
        }

        let herd = ctx
            .herds
            .get_mut(&self.herd)
            .ok_or(OrderError::HerdNotFound(self.herd))?;
        if !herd.kill_animal() {
            self.progress = self
                .progress
                .checked_div(Decimal::TWO)
                .ok_or(WorldError::ArithmeticOverflow)?;
            debug!(worker = %self.worker, herd = %self.herd, progress = %self.progress, "kill failed");
            return Ok(OrderStatus::Running);
        }

        let kind = herd.resource_kind().clone();
        ctx.registry.deposit(&kind, Decimal::ONE)?;
        info!(worker = %self.worker, herd = %self.herd, kind = %kind, tick = ctx.tick, "animal slaughtered");
        Ok(OrderStatus::Completed)
    }
}

impl Order for SlaughterOrder {
    fn worker(&self) -> WorkerId {
        self.worker
    }

    fn label(&self) -> &'static str {
        "Slaughter"
    }

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn step(&mut self, ctx: &mut OrderContext<'_>) -> Result<OrderStatus, OrderError> {
        if self.status.is_finished() {
            return Ok(self.status);
        }
        match self.attempt(ctx) {
            Ok(status) => {
                self.status = status;
                Ok(status)
            }
            Err(e) => {
                self.status = OrderStatus::Failed;
                Err(e)
            }
        }
    }

    fn abandon(&mut self, _ctx: &mut OrderContext<'_>) -> Result<(), OrderError> {
        if !self.status.is_finished() {
            self.status = OrderStatus::Cancelled;
        }
        Ok(())
    }
}
