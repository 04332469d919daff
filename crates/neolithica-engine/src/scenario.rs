//! Builds the starting world from the `scenario` section of the config.
//!
//! Buildings are placed in file order. A building that is not yet eligible
//! is queued and placed by the tick loop once its requirements are met. One
//! that would stand in water is skipped with a warning, and an instabuild
//! that cannot be paid for stays ghosted. None of these stop the run.

use neolithica_construction::{Building, ConstructionError};
use neolithica_core::config::{BuildingConfig, ConstructionConfig, SimulationConfig};
use neolithica_core::tick::{SimulationState, TickError};
use neolithica_orders::{CatchFishOrder, MeditateOrder, SlaughterOrder};
use neolithica_world::{AnimalHerd, Warehouse};
use tracing::{info, warn};

use crate::error::EngineError;

/// Create the simulation state described by `config`.
///
/// # Errors
///
/// Returns [`EngineError::Setup`] if the time configuration is invalid or a
/// building fails in a way other than the expected skips.
pub fn build_world(config: &SimulationConfig) -> Result<SimulationState, EngineError> {
    let scenario = &config.scenario;
    let mut state = SimulationState::new(config)?;

    for entry in &scenario.warehouses {
        let warehouse = entry
            .stock
            .iter()
            .fold(Warehouse::new(entry.name.clone()), |w, (kind, amount)| {
                w.with_stock(kind.as_str(), *amount)
            });
        state.registry.add_warehouse(warehouse);
    }
    for tech in &scenario.researched {
        state.tech.research(tech.clone());
    }
    for (stat, value) in &scenario.stats {
        state.stats.set(stat.clone(), *value);
    }
    let herds: Vec<_> = scenario
        .herds
        .iter()
        .map(|h| {
            let herd = AnimalHerd::new(h.name.clone(), h.resource.as_str(), h.population);
            (state.add_herd(herd), h.hunters)
        })
        .collect();

    let mut placed: usize = 0;
    for building in &scenario.buildings {
        if place(&mut state, building, &config.construction)? {
            placed = placed.saturating_add(1);
        }
    }

    for _ in 0..scenario.workers {
        state.spawn_worker();
    }
    for _ in 0..scenario.meditators {
        let worker = state.spawn_worker();
        state.assign_order(Box::new(MeditateOrder::new(worker)))?;
    }
    for _ in 0..scenario.fishers {
        let worker = state.spawn_worker();
        state.assign_order(Box::new(CatchFishOrder::new(worker)))?;
    }
    for &(herd, hunters) in &herds {
        for _ in 0..hunters {
            let worker = state.spawn_worker();
            state.assign_order(Box::new(SlaughterOrder::new(worker, herd)))?;
        }
    }

    info!(
        warehouses = state.registry.len(),
        buildings = placed,
        queued = state.pending.len(),
        skipped = scenario
            .buildings
            .len()
            .saturating_sub(placed)
            .saturating_sub(state.pending.len()),
        herds = state.herds.len(),
        workers = state.workers.len(),
        "Scenario loaded"
    );
    Ok(state)
}

/// Place and confirm one building. Returns `false` if it was skipped or
/// queued.
fn place(
    state: &mut SimulationState,
    entry: &BuildingConfig,
    construction: &ConstructionConfig,
) -> Result<bool, TickError> {
    let building = entry
        .actions
        .iter()
        .fold(Building::new(entry.name.clone()), |b, a| b.with_action(a.clone()));
    let building = entry
        .capabilities
        .iter()
        .fold(building, |b, &c| b.with_capability(c));
    let mut plan = entry.plan.clone();
    plan.reservation_unit = construction.reservation_unit;

    let id = match state.submit_site(building, plan, entry.position) {
        Ok(Some(id)) => id,
        Ok(None) => return Ok(false),
        Err(e @ TickError::NotBuildable { .. }) => {
            warn!(building = %entry.name, reason = %e, "building skipped");
            return Ok(false);
        }
        Err(e) => return Err(e),
    };

    match state.confirm_site(id) {
        Ok(()) => Ok(true),
        Err(TickError::Construction {
            source: source @ ConstructionError::CouldNotStart { .. },
        }) => {
            warn!(building = %entry.name, site = %id, reason = %source, "left as a ghost");
            Ok(true)
        }
        Err(e) => Err(e),
    }
}
