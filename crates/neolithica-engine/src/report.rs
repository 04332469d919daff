//! Per-tick progress tracking and the end-of-run JSON report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use neolithica_core::operator::SimulationEndReason;
use neolithica_core::runner::{SimulationResult, TickCallback};
use neolithica_core::tick::{SimulationState, TickSummary};
use neolithica_types::{ResourceKind, SiteId, SiteState};
use neolithica_world::{ResourceRegistry, SPIRIT_STAT, StatSource};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// Accumulates tick summaries for the final report.
#[derive(Debug, Default)]
pub struct ProgressCallback {
    /// Orders stepped over the whole run.
    pub orders_stepped: usize,
    /// Reservations pruned over the whole run.
    pub reservations_pruned: usize,
    /// Tick at which each site finished.
    pub finished_at: BTreeMap<SiteId, u64>,
}

impl TickCallback for ProgressCallback {
    fn on_tick(&mut self, summary: &TickSummary, _state: &SimulationState) {
        self.orders_stepped = self.orders_stepped.saturating_add(summary.orders_stepped);
        self.reservations_pruned = self
            .reservations_pruned
            .saturating_add(summary.reservations_pruned);
        for &site in &summary.sites_finished {
            self.finished_at.insert(site, summary.tick);
        }
        debug!(
            tick = summary.tick,
            placed = summary.sites_placed.len(),
            remaining = summary.sites_remaining,
            idle = summary.idle_workers,
            "progress"
        );
    }
}

/// One line per site in the report.
#[derive(Debug, Serialize)]
pub struct SiteReport {
    /// Site id.
    pub id: SiteId,
    /// Building name.
    pub name: String,
    /// Final state.
    pub state: SiteState,
    /// Amount still undelivered.
    pub outstanding: Decimal,
    /// Tick the site finished on, if it finished during the run.
    pub finished_at: Option<u64>,
}

/// Everything printed at the end of a run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// World name from the config.
    pub world: String,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Why the run stopped.
    pub end_reason: SimulationEndReason,
    /// Ticks executed.
    pub total_ticks: u64,
    /// Simulated seconds elapsed.
    pub simulated_seconds: Decimal,
    /// Orders stepped over the run.
    pub orders_stepped: usize,
    /// Reservations pruned over the run.
    pub reservations_pruned: usize,
    /// Per-site outcome.
    pub sites: Vec<SiteReport>,
    /// Buildings still waiting on their requirements.
    pub queued: Vec<String>,
    /// Remaining stock.
    pub stock: BTreeMap<ResourceKind, Decimal>,
    /// Final spirit.
    pub spirit: Decimal,
}

impl RunReport {
    /// Assemble the report from the run result and final state.
    pub fn new(
        world: &str,
        result: &SimulationResult,
        progress: &ProgressCallback,
        state: &SimulationState,
    ) -> Self {
        let sites = state
            .sites
            .values()
            .map(|site| SiteReport {
                id: site.id(),
                name: site.building().name.clone(),
                state: site.state(),
                outstanding: site.outstanding_total(),
                finished_at: progress.finished_at.get(&site.id()).copied(),
            })
            .collect();
        Self {
            world: world.to_owned(),
            generated_at: Utc::now(),
            end_reason: result.end_reason,
            total_ticks: result.total_ticks,
            simulated_seconds: state.clock.elapsed_seconds(),
            orders_stepped: progress.orders_stepped,
            reservations_pruned: progress.reservations_pruned,
            sites,
            queued: state.pending.iter().map(|p| p.building.name.clone()).collect(),
            stock: state.registry.available_resources(),
            spirit: state.stats.current_value(SPIRIT_STAT),
        }
    }
}
