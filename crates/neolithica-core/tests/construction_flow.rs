//! End-to-end construction scenarios driven through the tick loop.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::collections::{BTreeMap, BTreeSet};

use neolithica_construction::{Building, ConstructionError, ConstructionPlan, ConstructionSite};
use neolithica_core::config::SimulationConfig;
use neolithica_core::tick::{SimulationState, TickError, run_tick};
use neolithica_types::{
    BuildingRequirement, Capability, Position, ReservationState, ResourceKind, SiteId, SiteState,
};
use neolithica_world::{ResourceRegistry, Warehouse};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// =============================================================================
// Helpers
// =============================================================================

fn world(stock: &[(&str, Decimal)]) -> SimulationState {
    let mut config = SimulationConfig::default();
    config.construction.pickup_ticks = 0;
    config.construction.transport_ticks = 0;
    let mut state = SimulationState::new(&config).expect("valid default config");
    let mut warehouse = Warehouse::new("Stockpile");
    for &(tag, amount) in stock {
        warehouse = warehouse.with_stock(tag, amount);
    }
    state.registry.add_warehouse(warehouse);
    state
}

fn plan(reqs: &[(&str, Decimal)]) -> ConstructionPlan {
    ConstructionPlan {
        resource_requirements: reqs
            .iter()
            .map(|&(tag, amount)| BuildingRequirement::new(tag, amount))
            .collect(),
        ..ConstructionPlan::default()
    }
}

fn dry() -> Position {
    Position::new(dec!(4), dec!(15), dec!(4))
}

fn build(state: &mut SimulationState, name: &str, reqs: &[(&str, Decimal)]) -> SiteId {
    let id = state.place_site(Building::new(name), plan(reqs), dry()).unwrap();
    state.confirm_site(id).unwrap();
    id
}

fn site(state: &SimulationState, id: SiteId) -> &ConstructionSite {
    state.sites.get(&id).expect("site exists")
}

fn kind(tag: &str) -> ResourceKind {
    ResourceKind::new(tag)
}

fn stock(state: &SimulationState, tag: &str) -> Decimal {
    state.registry.available_amount(&kind(tag))
}

/// Active reservation totals never exceed what the ledger still needs.
fn assert_not_over_allocated(site: &ConstructionSite) {
    let mut reserved: BTreeMap<ResourceKind, Decimal> = BTreeMap::new();
    for r in site.active_reservations() {
        *reserved.entry(r.resource.clone()).or_default() += r.amount;
    }
    for (k, amount) in reserved {
        let needed: Decimal = site
            .unfulfilled()
            .iter()
            .filter(|e| e.resource == k)
            .map(|e| e.amount)
            .sum();
        assert!(amount <= needed, "{k}: reserved {amount} > needed {needed}");
        assert!(site.needed_resource(&k) >= Decimal::ZERO);
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn three_workers_finish_on_the_third_fill() {
    let mut state = world(&[("wood", dec!(10))]);
    let hut = build(&mut state, "Hut", &[("wood", dec!(3))]);
    for _ in 0..3 {
        state.spawn_worker();
    }

    // Tick 1: every worker reserves one unit; nothing is left unclaimed.
    let summary = run_tick(&mut state).unwrap();
    assert_eq!(summary.orders_stepped, 3);
    assert_eq!(site(&state, hut).active_reservations().count(), 3);
    assert_eq!(site(&state, hut).needed_resource(&kind("wood")), dec!(0));
    assert_eq!(site(&state, hut).outstanding_total(), dec!(3));

    // Tick 2: pickup.
    run_tick(&mut state).unwrap();
    assert_eq!(stock(&state, "wood"), dec!(7));
    assert_eq!(site(&state, hut).state(), SiteState::UnderConstruction);

    // Tick 3: three fills; the site finishes on the last one.
    let summary = run_tick(&mut state).unwrap();
    assert_eq!(summary.sites_finished, vec![hut]);
    assert!(site(&state, hut).is_finished());
    assert_eq!(summary.idle_workers, 3);
}

#[test]
fn staggered_workers_fill_one_tick_apart() {
    let mut state = world(&[("wood", dec!(10))]);
    let hut = build(&mut state, "Hut", &[("wood", dec!(3))]);
    state.spawn_worker();
    run_tick(&mut state).unwrap();
    state.spawn_worker();
    run_tick(&mut state).unwrap();
    state.spawn_worker();

    // Tick 3: the first worker fills; two units are still on the way.
    let summary = run_tick(&mut state).unwrap();
    assert!(summary.sites_finished.is_empty());
    assert_eq!(site(&state, hut).outstanding_total(), dec!(2));
    assert_eq!(site(&state, hut).state(), SiteState::UnderConstruction);
    assert_not_over_allocated(site(&state, hut));

    // Tick 4: the second fill still leaves one unit outstanding.
    let summary = run_tick(&mut state).unwrap();
    assert!(summary.sites_finished.is_empty());
    assert_eq!(site(&state, hut).outstanding_total(), dec!(1));
    assert_eq!(site(&state, hut).state(), SiteState::UnderConstruction);

    // Tick 5: the last fill finishes it.
    let summary = run_tick(&mut state).unwrap();
    assert_eq!(summary.sites_finished, vec![hut]);
    assert_eq!(stock(&state, "wood"), dec!(7));
}

#[test]
fn unsupplied_site_does_not_block_later_ones() {
    let mut state = world(&[("wood", dec!(5))]);
    let kiln = build(&mut state, "Kiln", &[("clay", dec!(2))]);
    let hut = build(&mut state, "Hut", &[("wood", dec!(2))]);
    state.spawn_worker();

    let mut hut_done = false;
    for _ in 0..20 {
        let summary = run_tick(&mut state).unwrap();
        hut_done |= summary.sites_finished.contains(&hut);
    }

    assert!(hut_done);
    assert!(site(&state, hut).is_finished());
    assert_eq!(site(&state, kiln).state(), SiteState::UnderConstruction);
    assert_eq!(site(&state, kiln).outstanding_total(), dec!(2));
    assert_eq!(stock(&state, "wood"), dec!(3));
    assert_eq!(state.idle_workers(), 1);
}

#[test]
fn queued_site_is_placed_once_researched() {
    let mut state = world(&[("wood", dec!(5))]);
    let gated = ConstructionPlan {
        tech_requirements: BTreeSet::from(["carpentry".to_owned()]),
        ..plan(&[("wood", dec!(1))])
    };
    let queued = state.submit_site(Building::new("Hut"), gated, dry()).unwrap();
    assert_eq!(queued, None);
    assert_eq!(state.sites_remaining(), 1);
    state.spawn_worker();

    let summary = run_tick(&mut state).unwrap();
    assert!(summary.sites_placed.is_empty());
    assert_eq!(state.pending.len(), 1);

    state.tech.research("carpentry");
    let summary = run_tick(&mut state).unwrap();
    assert_eq!(summary.sites_placed.len(), 1);
    assert!(state.pending.is_empty());
    let hut = summary.sites_placed[0];
    assert_eq!(site(&state, hut).state(), SiteState::UnderConstruction);

    let mut finished = false;
    for _ in 0..5 {
        finished |= run_tick(&mut state).unwrap().sites_finished.contains(&hut);
    }
    assert!(finished);
    assert_eq!(state.sites_remaining(), 0);
}

#[test]
fn single_worker_never_finishes_early() {
    let mut state = world(&[("wood", dec!(10))]);
    let hut = build(&mut state, "Hut", &[("wood", dec!(3))]);
    state.spawn_worker();

    let mut outstanding = Vec::new();
    let mut finished_at = None;
    for _ in 0..12 {
        let summary = run_tick(&mut state).unwrap();
        outstanding.push(site(&state, hut).outstanding_total());
        if !summary.sites_finished.is_empty() {
            finished_at = Some(summary.tick);
            break;
        }
    }

    // reserve, pickup, fill: three ticks per delivery.
    assert_eq!(finished_at, Some(9));
    assert_eq!(outstanding[2], dec!(2));
    assert_eq!(outstanding[5], dec!(1));
    assert_eq!(outstanding[7], dec!(1));
    assert_eq!(stock(&state, "wood"), dec!(7));
}

#[test]
fn destroyed_worker_frees_its_claim() {
    let mut state = world(&[("stone", dec!(5))]);
    let wall = build(&mut state, "Wall", &[("stone", dec!(2))]);
    let mason = state.spawn_worker();

    run_tick(&mut state).unwrap();
    assert_eq!(site(&state, wall).needed_resource(&kind("stone")), dec!(1));

    state.remove_worker(mason).unwrap();
    assert_eq!(site(&state, wall).needed_resource(&kind("stone")), dec!(2));
    assert_eq!(site(&state, wall).outstanding_total(), dec!(2));
    let states: Vec<ReservationState> =
        site(&state, wall).reservations().map(|r| r.state()).collect();
    assert_eq!(states, vec![ReservationState::Cancelled]);

    let summary = run_tick(&mut state).unwrap();
    assert_eq!(summary.reservations_pruned, 1);
    assert_eq!(site(&state, wall).reservations().count(), 0);
    assert_eq!(stock(&state, "stone"), dec!(5));
}

#[test]
fn destroyed_carrier_returns_the_load() {
    let mut state = world(&[("stone", dec!(5))]);
    let wall = build(&mut state, "Wall", &[("stone", dec!(2))]);
    let mason = state.spawn_worker();

    run_tick(&mut state).unwrap();
    run_tick(&mut state).unwrap();
    assert_eq!(stock(&state, "stone"), dec!(4));

    state.remove_worker(mason).unwrap();
    assert_eq!(stock(&state, "stone"), dec!(5));
    assert_eq!(site(&state, wall).outstanding_total(), dec!(2));

    // A replacement worker picks the job straight back up.
    state.spawn_worker();
    for _ in 0..6 {
        run_tick(&mut state).unwrap();
    }
    assert!(site(&state, wall).is_finished());
    assert_eq!(stock(&state, "stone"), dec!(3));
}

#[test]
fn instabuild_shortfall_rolls_back() {
    let mut state = world(&[("wood", dec!(5)), ("stone", dec!(4))]);
    let mut bill = plan(&[("wood", dec!(3)), ("stone", dec!(4))]);
    bill.instabuild = true;
    let id = state
        .place_site(Building::new("Shrine"), bill, dry())
        .unwrap();

    // Someone else takes stone between placement and confirmation.
    state.registry.withdraw(&kind("stone"), dec!(2)).unwrap();
    let before = state.registry.available_resources();

    let result = state.confirm_site(id);
    assert!(matches!(
        result,
        Err(TickError::Construction {
            source: ConstructionError::CouldNotStart { .. }
        })
    ));
    assert_eq!(state.registry.available_resources(), before);
    assert_eq!(site(&state, id).state(), SiteState::Ghosted);

    // Once stock is back, the same site can be confirmed.
    state.registry.deposit(&kind("stone"), dec!(2)).unwrap();
    state.confirm_site(id).unwrap();
    assert!(site(&state, id).is_finished());
    assert_eq!(stock(&state, "wood"), dec!(2));
    assert_eq!(stock(&state, "stone"), dec!(0));
}

#[test]
fn crowd_of_workers_never_over_allocates() {
    let mut state = world(&[("wood", dec!(20)), ("stone", dec!(20))]);
    let lodge = build(&mut state, "Lodge", &[("wood", dec!(2)), ("stone", dec!(1))]);
    for _ in 0..8 {
        state.spawn_worker();
    }

    let summary = run_tick(&mut state).unwrap();
    assert_eq!(site(&state, lodge).active_reservations().count(), 3);
    assert_eq!(summary.idle_workers, 5);
    assert_not_over_allocated(site(&state, lodge));

    for _ in 0..10 {
        run_tick(&mut state).unwrap();
        if site(&state, lodge).is_finished() {
            break;
        }
        assert_not_over_allocated(site(&state, lodge));
    }
    assert!(site(&state, lodge).is_finished());
    assert_eq!(stock(&state, "wood"), dec!(18));
    assert_eq!(stock(&state, "stone"), dec!(19));
}

#[test]
fn storehouse_joins_the_registry_when_done() {
    let mut state = world(&[("wood", dec!(1))]);
    let building = Building::new("Storehouse").with_capability(Capability::Storage);
    let id = state.place_site(building, plan(&[("wood", dec!(1))]), dry()).unwrap();
    assert!(!site(&state, id).building().has_capability(Capability::Storage));
    state.confirm_site(id).unwrap();
    state.spawn_worker();

    for _ in 0..3 {
        run_tick(&mut state).unwrap();
    }
    assert!(site(&state, id).building().has_capability(Capability::Storage));
    assert_eq!(state.registry.len(), 2);
}
