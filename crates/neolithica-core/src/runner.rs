//! Simulation loop runner.
//!
//! [`run_simulation`] drives [`run_tick`] until one of:
//!
//! - **Tick limit**: `max_ticks` ticks have run
//! - **Completion**: every placed construction site has finished
//! - **Stop request**: [`RunControl::request_stop`] was called
//!
//! Between ticks it sleeps for the (runtime-adjustable) tick interval.
//!
//! [`run_tick`]: crate::tick::run_tick

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::operator::{RunControl, SimulationEndReason};
use crate::tick::{self, SimulationState, TickError, TickSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Result of the simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState);
}

/// A no-op tick callback.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {}
}

/// Run the simulation loop until a termination condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick execution fails unrecoverably.
pub async fn run_simulation(
    state: &mut SimulationState,
    control: &Arc<RunControl>,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = control.max_ticks(),
        tick_interval_ms = control.tick_interval_ms(),
        sites = state.sites.len(),
        pending = state.pending.len(),
        workers = state.workers.len(),
        "Simulation starting"
    );

    loop {
        // --- Check stop request (before tick) ---
        if control.is_stop_requested() {
            info!("Stop requested");
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::OperatorStop,
                final_summary: last_summary,
                total_ticks,
            });
        }

        // --- Execute tick ---
        let summary = tick::run_tick(state)?;
        total_ticks = total_ticks.saturating_add(1);

        callback.on_tick(&summary, state);

        for site in &summary.sites_finished {
            info!(tick = summary.tick, site = %site, "Construction site finished");
        }

        // --- Check completion ---
        if !state.sites.is_empty() && summary.sites_remaining == 0 {
            info!(tick = summary.tick, "All construction sites finished");
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::AllSitesFinished,
                final_summary: Some(summary),
                total_ticks,
            });
        }

        // --- Check tick limit (after tick) ---
        if control.tick_limit_reached(summary.tick) {
            info!(
                tick = summary.tick,
                max_ticks = control.max_ticks(),
                "Tick limit reached"
            );
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::MaxTicksReached,
                final_summary: Some(summary),
                total_ticks,
            });
        }

        last_summary = Some(summary);

        // --- Sleep for tick interval ---
        let interval_ms = control.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    }
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Simulation ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            sites_remaining = summary.sites_remaining,
            idle_workers = summary.idle_workers,
            "Final tick summary"
        );
    } else {
        warn!("Simulation ended with no ticks executed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use neolithica_construction::{Building, ConstructionPlan};
    use neolithica_types::{BuildingRequirement, Position};
    use neolithica_world::Warehouse;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::config::{SimulationBoundsConfig, SimulationConfig};

    fn make_state(with_site: bool) -> SimulationState {
        let mut config = SimulationConfig::default();
        config.construction.pickup_ticks = 1;
        config.construction.transport_ticks = 1;
        let mut state = SimulationState::new(&config).unwrap();
        state
            .registry
            .add_warehouse(Warehouse::new("Stockpile").with_stock("wood", dec!(10)));
        state.spawn_worker();
        if with_site {
            let plan = ConstructionPlan {
                resource_requirements: vec![BuildingRequirement::new("wood", dec!(2))],
                ..ConstructionPlan::default()
            };
            let site = state
                .place_site(
                    Building::new("Hut"),
                    plan,
                    Position::new(dec!(0), dec!(20), dec!(0)),
                )
                .unwrap();
            state.confirm_site(site).unwrap();
        }
        state
    }

    fn control(max_ticks: u64) -> Arc<RunControl> {
        Arc::new(RunControl::new(0, &SimulationBoundsConfig { max_ticks }))
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut state = make_state(false);
        let mut cb = NoOpCallback;
        let result = run_simulation(&mut state, &control(5), &mut cb).await.unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
    }

    #[tokio::test]
    async fn stop_before_first_tick() {
        let mut state = make_state(true);
        let control = control(0);
        control.request_stop();
        let mut cb = NoOpCallback;
        let result = run_simulation(&mut state, &control, &mut cb).await.unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
    }

    #[tokio::test]
    async fn ends_when_all_sites_finish() {
        let mut state = make_state(true);
        let mut cb = NoOpCallback;
        let result = run_simulation(&mut state, &control(100), &mut cb).await.unwrap();
        assert_eq!(result.end_reason, SimulationEndReason::AllSitesFinished);
        // One worker, two deliveries of reserve + 2 pickup + 2 transport steps.
        assert_eq!(result.total_ticks, 10);
        assert_eq!(state.sites_remaining(), 0);
    }

    #[tokio::test]
    async fn tick_callback_is_called() {
        struct CountCallback {
            count: u64,
        }
        impl TickCallback for CountCallback {
            fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {
                self.count = self.count.saturating_add(1);
            }
        }

        let mut state = make_state(false);
        let mut cb = CountCallback { count: 0 };
        let _ = run_simulation(&mut state, &control(3), &mut cb).await.unwrap();
        assert_eq!(cb.count, 3);
    }
}
