//! Simulation binary for Neolithica.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (first CLI argument, `NEOLITHICA_CONFIG`, or
//!    `neolithica-config.yaml` in the working directory)
//! 2. Initialize structured logging (tracing)
//! 3. Build the scenario world
//! 4. Run the simulation loop until a termination condition is met
//! 5. Log the result and print a JSON report to stdout

mod error;
mod report;
mod scenario;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use neolithica_core::config::{LoggingConfig, SimulationConfig};
use neolithica_core::operator::RunControl;
use neolithica_core::runner;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::report::{ProgressCallback, RunReport};

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "neolithica-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!(
        world_name = %config.world.name,
        max_ticks = config.simulation.max_ticks,
        tick_interval_ms = config.time.tick_interval_ms,
        "neolithica-engine starting"
    );

    // 3. Build the scenario world.
    let mut state = scenario::build_world(&config)?;

    // 4. Run.
    let control = Arc::new(RunControl::new(
        config.time.tick_interval_ms,
        &config.simulation,
    ));
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current tick");
                control.request_stop();
            }
        });
    }
    let mut progress = ProgressCallback::default();
    let result = runner::run_simulation(&mut state, &control, &mut progress)
        .await
        .map_err(EngineError::from)?;

    // 5. Report.
    runner::log_simulation_end(&result);
    let report = RunReport::new(&config.world.name, &result, &progress, &state);
    println!("{}", serde_json::to_string_pretty(&report).map_err(EngineError::from)?);

    Ok(())
}

/// Resolve and load the configuration file, falling back to defaults when
/// no file is named and the default one is absent.
fn load_config() -> Result<SimulationConfig, EngineError> {
    let named = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("NEOLITHICA_CONFIG").ok())
        .map(PathBuf::from);
    if let Some(path) = named {
        return Ok(SimulationConfig::from_file(&path)?);
    }
    let default = Path::new(DEFAULT_CONFIG_PATH);
    if default.exists() {
        Ok(SimulationConfig::from_file(default)?)
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides()?;
        Ok(config)
    }
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
