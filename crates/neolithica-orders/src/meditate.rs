//! Meditation: a worker sits still and feeds the spirit stat.

use neolithica_types::{OrderStatus, WorkerId};
use neolithica_world::SPIRIT_STAT;
use rust_decimal::Decimal;
use tracing::trace;

use crate::error::OrderError;
use crate::order::{Order, OrderContext};

/// Spirit gained per step.
pub const SPIRIT_PER_STEP: Decimal = Decimal::from_parts(3, 0, 0, false, 2);

/// Adds [`SPIRIT_PER_STEP`] to the spirit stat every step until abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeditateOrder {
    worker: WorkerId,
    status: OrderStatus,
}

impl MeditateOrder {
    /// Start meditating.
    pub const fn new(worker: WorkerId) -> Self {
        Self {
            worker,
            status: OrderStatus::Running,
        }
    }
}

impl Order for MeditateOrder {
    fn worker(&self) -> WorkerId {
        self.worker
    }

    fn label(&self) -> &'static str {
        "Meditate"
    }

    fn status(&self) -> OrderStatus {
        self.status
    }

    fn step(&mut self, ctx: &mut OrderContext<'_>) -> Result<OrderStatus, OrderError> {
        if self.status.is_finished() {
            return Ok(self.status);
        }
        let spirit = ctx.stats.add(SPIRIT_STAT, SPIRIT_PER_STEP).inspect_err(|_| {
            self.status = OrderStatus::Failed;
        })?;
        trace!(worker = %self.worker, spirit = %spirit, "meditating");
        Ok(self.status)
    }

    fn abandon(&mut self, _ctx: &mut OrderContext<'_>) -> Result<(), OrderError> {
        if !self.status.is_finished() {
            self.status = OrderStatus::Cancelled;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use neolithica_world::{StatBook, StatSource, WarehouseRegistry};
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn each_step_adds_spirit_and_keeps_running() {
        let mut sites = BTreeMap::new();
        let mut herds = BTreeMap::new();
        let mut registry = WarehouseRegistry::new();
        let mut stats = StatBook::new();
        let mut order = MeditateOrder::new(WorkerId::new());

        for _ in 0..10 {
            let mut ctx = OrderContext {
                tick: 0,
                fixed_delta: dec!(0.02),
                sites: &mut sites,
                herds: &mut herds,
                registry: &mut registry,
                stats: &mut stats,
            };
            assert_eq!(order.step(&mut ctx).unwrap(), OrderStatus::Running);
        }
        assert_eq!(stats.current_value(SPIRIT_STAT), dec!(0.30));
    }

    #[test]
    fn abandoned_meditation_stops_adding() {
        let mut sites = BTreeMap::new();
        let mut herds = BTreeMap::new();
        let mut registry = WarehouseRegistry::new();
        let mut stats = StatBook::new();
        let mut order = MeditateOrder::new(WorkerId::new());
        let mut ctx = OrderContext {
            tick: 0,
            fixed_delta: dec!(0.02),
            sites: &mut sites,
            herds: &mut herds,
            registry: &mut registry,
            stats: &mut stats,
        };
        order.step(&mut ctx).unwrap();
        order.abandon(&mut ctx).unwrap();
        assert_eq!(order.step(&mut ctx).unwrap(), OrderStatus::Cancelled);
        assert_eq!(stats.current_value(SPIRIT_STAT), dec!(0.03));
    }
}
