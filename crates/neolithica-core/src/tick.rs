//! The per-tick driver.
//!
//! Everything in the simulation happens on this single thread, one tick at
//! a time. [`run_tick`] performs these phases in order:
//!
//! 1. **Advance**: increment the world clock.
//! 2. **Unlock**: place every queued building whose tech and stat
//!    requirements are now met, and start its construction.
//! 3. **Assign**: give every idle worker a [`DeliveryOrder`] for the first
//!    site accepting the construct action that still needs something the
//!    registry holds. Sites waiting on missing materials are passed over.
//! 4. **Step**: step every running order once, in worker spawn order.
//! 5. **Settle**: free the workers whose orders finished.
//! 6. **Housekeep**: prune released and cancelled reservations on every site.
//! 7. **Commission**: turn each newly finished storage building into a
//!    warehouse.
//!
//! Within a tick, allocation is therefore sequential and in a fixed order,
//! and a reservation cancelled during the tick is pruned by the end of it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use neolithica_construction::{Building, ConstructionError, ConstructionPlan, ConstructionSite};
use neolithica_orders::{DeliveryOrder, Order, OrderContext, OrderError};
use neolithica_types::{Capability, HerdId, Position, SiteId, WorkerId};
use neolithica_world::{
    AnimalHerd, Ground, Herd, StatBook, TechTree, Warehouse, WarehouseRegistry,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{ClockError, WorldClock};
use crate::config::{ConstructionConfig, SimulationConfig};

/// Errors that can occur while driving the simulation.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// An order hit a hard error.
    #[error("order of worker {worker} failed: {source}")]
    Order {
        /// The worker whose order failed.
        worker: WorkerId,
        /// The underlying order error.
        source: OrderError,
    },

    /// A construction site rejected a placement call.
    #[error("construction error: {source}")]
    Construction {
        /// The underlying construction error.
        #[from]
        source: ConstructionError,
    },

    /// The building's tech or stat requirements are not met.
    #[error("{building} is not eligible to be built yet")]
    NotEligible {
        /// The building name.
        building: String,
    },

    /// The building cannot be placed at the requested position.
    #[error("{building} cannot be placed at ({x}, {y}, {z})")]
    NotBuildable {
        /// The building name.
        building: String,
        /// Requested x.
        x: Decimal,
        /// Requested y.
        y: Decimal,
        /// Requested z.
        z: Decimal,
    },

    /// No site with this id.
    #[error("construction site {0} not found")]
    SiteNotFound(SiteId),

    /// No worker with this id.
    #[error("worker {0} not found")]
    WorkerNotFound(WorkerId),
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// A worker and the order it is currently carrying out.
pub struct Worker {
    /// The worker id.
    pub id: WorkerId,
    /// Current order; `None` while idle.
    pub order: Option<Box<dyn Order>>,
}

impl Worker {
    /// Whether the worker has nothing to do.
    pub const fn is_idle(&self) -> bool {
        self.order.is_none()
    }
}

impl fmt::Debug for Worker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("id", &self.id)
            .field("order", &self.order.as_ref().map(|o| o.label()))
            .finish()
    }
}

/// A building waiting for its tech or stat requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSite {
    /// The building to place.
    pub building: Building,
    /// Its construction template.
    pub plan: ConstructionPlan,
    /// Where it will stand.
    pub position: Position,
}

/// The complete mutable state of a running simulation.
#[derive(Debug)]
pub struct SimulationState {
    /// World clock.
    pub clock: WorldClock,
    /// Pooled warehouse stock.
    pub registry: WarehouseRegistry,
    /// Researched technologies.
    pub tech: TechTree,
    /// Named stats.
    pub stats: StatBook,
    /// Terrain.
    pub ground: Ground,
    /// Every placed site, by id.
    pub sites: BTreeMap<SiteId, ConstructionSite>,
    /// Buildings queued until they become eligible, in submission order.
    pub pending: Vec<PendingSite>,
    /// Huntable herds, by id.
    pub herds: BTreeMap<HerdId, Box<dyn Herd>>,
    /// Workers in spawn order.
    pub workers: Vec<Worker>,
    /// Delivery pacing.
    pub construction: ConstructionConfig,
}

impl SimulationState {
    /// Create an empty world from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::Clock`] if the time configuration is invalid.
    pub fn new(config: &SimulationConfig) -> Result<Self, TickError> {
        Ok(Self {
            clock: WorldClock::new(&config.time)?,
            registry: WarehouseRegistry::new(),
            tech: TechTree::new(),
            stats: StatBook::new(),
            ground: Ground::new(config.world.water_level),
            sites: BTreeMap::new(),
            pending: Vec::new(),
            herds: BTreeMap::new(),
            workers: Vec::new(),
            construction: config.construction.clone(),
        })
    }

    // -----------------------------------------------------------------------
    // Workers
    // -----------------------------------------------------------------------

    /// Add an idle worker.
    pub fn spawn_worker(&mut self) -> WorkerId {
        let id = WorkerId::new();
        self.workers.push(Worker { id, order: None });
        debug!(worker = %id, "worker spawned");
        id
    }

    /// Look up a worker.
    pub fn worker(&self, id: WorkerId) -> Option<&Worker> {
        self.workers.iter().find(|w| w.id == id)
    }

    /// Number of workers without an order.
    pub fn idle_workers(&self) -> usize {
        self.workers.iter().filter(|w| w.is_idle()).count()
    }

    /// Give `order` to its worker, abandoning whatever it was doing.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::WorkerNotFound`] for an unknown worker, or
    /// [`TickError::Order`] if the previous order could not be abandoned.
    pub fn assign_order(&mut self, order: Box<dyn Order>) -> Result<(), TickError> {
        let id = order.worker();
        let previous = self
            .workers
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or(TickError::WorkerNotFound(id))?
            .order
            .replace(order);
        if let Some(mut previous) = previous {
            info!(worker = %id, order = previous.label(), "order replaced");
            self.abandon(&mut *previous)?;
        }
        Ok(())
    }

    /// Destroy a worker, abandoning its order first.
    ///
    /// Any reservation it held is cancelled and any material it carried is
    /// returned to stock. The freed claim is pruned by the next tick's
    /// housekeeping.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::WorkerNotFound`] for an unknown worker, or
    /// [`TickError::Order`] if carried material could not be returned.
    pub fn remove_worker(&mut self, id: WorkerId) -> Result<(), TickError> {
        let index = self
            .workers
            .iter()
            .position(|w| w.id == id)
            .ok_or(TickError::WorkerNotFound(id))?;
        let worker = self.workers.remove(index);
        if let Some(mut order) = worker.order {
            self.abandon(&mut *order)?;
        }
        info!(worker = %id, "worker removed");
        Ok(())
    }

    fn abandon(&mut self, order: &mut dyn Order) -> Result<(), TickError> {
        let worker = order.worker();
        let mut ctx = OrderContext {
            tick: self.clock.tick(),
            fixed_delta: self.clock.fixed_delta(),
            sites: &mut self.sites,
            herds: &mut self.herds,
            registry: &mut self.registry,
            stats: &mut self.stats,
        };
        order
            .abandon(&mut ctx)
            .map_err(|source| TickError::Order { worker, source })
    }

    /// Add a herd that hunters can be sent to.
    pub fn add_herd(&mut self, herd: AnimalHerd) -> HerdId {
        let id = herd.id;
        debug!(herd = %id, name = %herd.name, population = herd.population, "herd added");
        self.herds.insert(id, Box::new(herd));
        id
    }

    // -----------------------------------------------------------------------
    // Sites
    // -----------------------------------------------------------------------

    /// Check eligibility, then place `building` as a ghost at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::NotEligible`] or [`TickError::NotBuildable`]
    /// if the checks fail. No site is created in that case.
    pub fn place_site(
        &mut self,
        building: Building,
        plan: ConstructionPlan,
        position: Position,
    ) -> Result<SiteId, TickError> {
        let mut site = ConstructionSite::new(building, plan, position);
        let name = site.building().name.clone();
        if !site.is_eligible_to_build(&self.tech, &self.stats) {
            return Err(TickError::NotEligible { building: name });
        }
        site.start_placement()?;
        if !site.preview_placement(position, &self.ground, &self.registry)? {
            return Err(TickError::NotBuildable {
                building: name,
                x: position.x,
                y: position.y,
                z: position.z,
            });
        }
        let id = site.id();
        self.sites.insert(id, site);
        Ok(id)
    }

    /// Confirm placement of a ghosted site and start construction.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::SiteNotFound`] for an unknown id, or
    /// [`TickError::Construction`] if the site refused to start. An
    /// instabuild shortfall leaves the site ghosted so it can be retried.
    pub fn confirm_site(&mut self, id: SiteId) -> Result<(), TickError> {
        let site = self.sites.get_mut(&id).ok_or(TickError::SiteNotFound(id))?;
        site.start_construction(&mut self.registry)?;
        if site.is_finished() {
            commission(&mut self.registry, site);
        }
        Ok(())
    }

    /// Place `building` now if its requirements are met, otherwise queue
    /// it until they are. Returns the new site's id when placed.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::NotBuildable`] if an eligible building cannot
    /// stand at `position`.
    pub fn submit_site(
        &mut self,
        building: Building,
        plan: ConstructionPlan,
        position: Position,
    ) -> Result<Option<SiteId>, TickError> {
        if plan.is_eligible(&self.tech, &self.stats) {
            return self.place_site(building, plan, position).map(Some);
        }
        info!(building = %building.name, "requirements not met, building queued");
        self.pending.push(PendingSite {
            building,
            plan,
            position,
        });
        Ok(None)
    }

    /// Number of buildings not yet finished, queued ones included.
    pub fn sites_remaining(&self) -> usize {
        self.sites
            .values()
            .filter(|s| !s.is_finished())
            .count()
            .saturating_add(self.pending.len())
    }

    /// Place and start every queued building that has become eligible.
    ///
    /// A building that turns out to stand in water is dropped; an
    /// instabuild that cannot be paid for stays ghosted.
    fn unlock_pending(&mut self) -> Vec<SiteId> {
        let (ready, waiting): (Vec<PendingSite>, Vec<PendingSite>) =
            std::mem::take(&mut self.pending)
                .into_iter()
                .partition(|p| p.plan.is_eligible(&self.tech, &self.stats));
        self.pending = waiting;

        let mut placed = Vec::with_capacity(ready.len());
        for PendingSite {
            building,
            plan,
            position,
        } in ready
        {
            let name = building.name.clone();
            let id = match self.place_site(building, plan, position) {
                Ok(id) => id,
                Err(e) => {
                    warn!(building = %name, reason = %e, "unlocked building dropped");
                    continue;
                }
            };
            if let Some(site) = self.sites.get_mut(&id) {
                if let Err(e) = site.start_construction(&mut self.registry) {
                    warn!(site = %id, building = %name, reason = %e, "unlocked building left as a ghost");
                }
            }
            info!(site = %id, building = %name, "requirements met, building placed");
            placed.push(id);
        }
        placed
    }
}

/// Register a finished storage building as a warehouse.
fn commission(registry: &mut WarehouseRegistry, site: &ConstructionSite) {
    let building = site.building();
    if building.has_capability(Capability::Storage) {
        let warehouse = registry.add_warehouse(Warehouse::new(building.name.clone()));
        info!(site = %site.id(), warehouse = %warehouse, "storage building commissioned");
    }
}

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickSummary {
    /// The tick that just ran.
    pub tick: u64,
    /// Orders stepped this tick.
    pub orders_stepped: usize,
    /// Reservations removed by housekeeping.
    pub reservations_pruned: usize,
    /// Queued buildings placed this tick.
    pub sites_placed: Vec<SiteId>,
    /// Sites that finished during this tick.
    pub sites_finished: Vec<SiteId>,
    /// Buildings still unfinished after this tick, queued ones included.
    pub sites_remaining: usize,
    /// Workers without an order after this tick.
    pub idle_workers: usize,
}

/// Execute one tick.
///
/// # Errors
///
/// Returns [`TickError::Clock`] if the clock overflows, or
/// [`TickError::Order`] if an order hits a hard error. In the latter case
/// the tick is abandoned part-way; the failing order is dropped.
pub fn run_tick(state: &mut SimulationState) -> Result<TickSummary, TickError> {
    let tick = state.clock.advance()?;
    let fixed_delta = state.clock.fixed_delta();

    let finished_before: BTreeSet<SiteId> = state
        .sites
        .values()
        .filter(|s| s.is_finished())
        .map(ConstructionSite::id)
        .collect();

    // --- Unlock ---
    let sites_placed = state.unlock_pending();

    // --- Assign ---
    let target = state
        .sites
        .values()
        .find(|s| s.building().accepts_construct() && s.has_reservable_need(&state.registry))
        .map(ConstructionSite::id);
    if let Some(site) = target {
        let ConstructionConfig {
            pickup_ticks,
            transport_ticks,
            ..
        } = state.construction;
        for worker in state.workers.iter_mut().filter(|w| w.is_idle()) {
            worker.order = Some(Box::new(DeliveryOrder::new(
                worker.id,
                site,
                pickup_ticks,
                transport_ticks,
            )));
        }
    }

    // --- Step and settle ---
    let mut orders_stepped: usize = 0;
    {
        let mut ctx = OrderContext {
            tick,
            fixed_delta,
            sites: &mut state.sites,
            herds: &mut state.herds,
            registry: &mut state.registry,
            stats: &mut state.stats,
        };
        for worker in &mut state.workers {
            let Some(order) = worker.order.as_mut() else {
                continue;
            };
            let result = order.step(&mut ctx);
            orders_stepped = orders_stepped.saturating_add(1);
            match result {
                Ok(status) if status.is_finished() => {
                    debug!(worker = %worker.id, order = order.label(), status = ?status, "order finished");
                    worker.order = None;
                }
                Ok(_) => {}
                Err(source) => {
                    warn!(worker = %worker.id, order = order.label(), error = %source, "order failed hard");
                    worker.order = None;
                    return Err(TickError::Order {
                        worker: worker.id,
                        source,
                    });
                }
            }
        }
    }

    // --- Housekeep ---
    let reservations_pruned = state
        .sites
        .values_mut()
        .map(ConstructionSite::housekeep)
        .fold(0_usize, usize::saturating_add);

    // --- Commission ---
    let sites_finished: Vec<SiteId> = state
        .sites
        .values()
        .filter(|s| s.is_finished() && !finished_before.contains(&s.id()))
        .map(ConstructionSite::id)
        .collect();
    for id in &sites_finished {
        if let Some(site) = state.sites.get(id) {
            commission(&mut state.registry, site);
        }
    }

    let summary = TickSummary {
        tick,
        orders_stepped,
        reservations_pruned,
        sites_placed,
        sites_finished,
        sites_remaining: state.sites_remaining(),
        idle_workers: state.idle_workers(),
    };
    debug!(
        tick,
        orders_stepped,
        reservations_pruned,
        finished = summary.sites_finished.len(),
        remaining = summary.sites_remaining,
        "tick complete"
    );
    Ok(summary)
}
