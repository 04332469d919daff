//! Configuration loading and typed config structures for the Neolithica simulation.
//!
//! The canonical configuration lives in `neolithica-config.yaml` at the
//! project root. Every field has a default, so an empty file (or no file at
//! all) yields a runnable, if uneventful, simulation.

use std::collections::BTreeMap;
use std::path::Path;

use neolithica_construction::ConstructionPlan;
use neolithica_types::{Capability, Position};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be parsed.
    #[error("invalid value {value:?} for {variable}: {reason}")]
    InvalidOverride {
        /// The environment variable.
        variable: &'static str,
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `neolithica-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// World-level settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Tick timing.
    #[serde(default)]
    pub time: TimeConfig,

    /// Reservation and delivery parameters.
    #[serde(default)]
    pub construction: ConstructionConfig,

    /// Simulation boundary parameters.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Initial world contents.
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `NEOLITHICA_MAX_TICKS` overrides `simulation.max_ticks`
    /// - `NEOLITHICA_LOG_LEVEL` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidOverride`] for an unparsable override.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::InvalidOverride`] for an unparsable override.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `NEOLITHICA_*` environment overrides in place.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] if `NEOLITHICA_MAX_TICKS`
    /// is not an unsigned integer.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("NEOLITHICA_MAX_TICKS") {
            self.simulation.max_ticks =
                val.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidOverride {
                        variable: "NEOLITHICA_MAX_TICKS",
                        value: val.clone(),
                        reason: e.to_string(),
                    })?;
        }
        if let Ok(val) = std::env::var("NEOLITHICA_LOG_LEVEL") {
            self.logging.level = val;
        }
        Ok(())
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable simulation name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Height at or below which ground is flooded.
    #[serde(default = "default_water_level")]
    pub water_level: Decimal,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            water_level: default_water_level(),
        }
    }
}

/// Tick timing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimeConfig {
    /// Simulated seconds per tick.
    #[serde(default = "default_fixed_delta_seconds")]
    pub fixed_delta_seconds: Decimal,

    /// Real-time milliseconds to sleep between ticks (0 = as fast as possible).
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            fixed_delta_seconds: default_fixed_delta_seconds(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Reservation and delivery parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConstructionConfig {
    /// Amount claimed per reservation. Overrides the plan of every
    /// scenario building.
    #[serde(default = "default_reservation_unit")]
    pub reservation_unit: Decimal,

    /// Ticks a worker spends walking to the warehouse.
    #[serde(default = "default_pickup_ticks")]
    pub pickup_ticks: u32,

    /// Ticks a worker spends carrying material to the site.
    #[serde(default = "default_transport_ticks")]
    pub transport_ticks: u32,
}

impl Default for ConstructionConfig {
    fn default() -> Self {
        Self {
            reservation_unit: default_reservation_unit(),
            pickup_ticks: default_pickup_ticks(),
            transport_ticks: default_transport_ticks(),
        }
    }
}

/// Simulation boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum ticks before the run stops (0 = unlimited).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// What the world starts with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScenarioConfig {
    /// Warehouses and their initial stock.
    #[serde(default)]
    pub warehouses: Vec<WarehouseConfig>,

    /// Technologies researched at start.
    #[serde(default)]
    pub researched: Vec<String>,

    /// Initial stat values.
    #[serde(default)]
    pub stats: BTreeMap<String, Decimal>,

    /// Workers available for construction deliveries.
    #[serde(default)]
    pub workers: u32,

    /// Workers that start out meditating.
    #[serde(default)]
    pub meditators: u32,

    /// Workers that start out fishing.
    #[serde(default)]
    pub fishers: u32,

    /// Herds present at start, each with its own hunters.
    #[serde(default)]
    pub herds: Vec<HerdConfig>,

    /// Buildings to place, in order.
    #[serde(default)]
    pub buildings: Vec<BuildingConfig>,
}

/// A herd present at start.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HerdConfig {
    /// Display name.
    pub name: String,

    /// Resource each animal yields.
    pub resource: String,

    /// Number of animals.
    #[serde(default)]
    pub population: u32,

    /// Workers that start out hunting this herd.
    #[serde(default)]
    pub hunters: u32,
}

/// A warehouse present at start.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WarehouseConfig {
    /// Display name.
    pub name: String,

    /// Initial stock per resource kind.
    #[serde(default)]
    pub stock: BTreeMap<String, Decimal>,
}

/// A building the scenario places at start.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildingConfig {
    /// Display name.
    pub name: String,

    /// Where to place it.
    #[serde(default)]
    pub position: Position,

    /// Capabilities the finished building has.
    #[serde(default)]
    pub capabilities: Vec<Capability>,

    /// Target actions the finished building exposes.
    #[serde(default)]
    pub actions: Vec<String>,

    /// Construction template.
    #[serde(default)]
    pub plan: ConstructionPlan,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_world_name() -> String {
    "Neolithica".to_owned()
}

const fn default_water_level() -> Decimal {
    neolithica_world::ground::DEFAULT_WATER_LEVEL
}

const fn default_fixed_delta_seconds() -> Decimal {
    // 0.02 s, the usual physics step.
    Decimal::from_parts(2, 0, 0, false, 2)
}

const fn default_tick_interval_ms() -> u64 {
    0
}

const fn default_reservation_unit() -> Decimal {
    Decimal::ONE
}

const fn default_pickup_ticks() -> u32 {
    2
}

const fn default_transport_ticks() -> u32 {
    3
}

const fn default_max_ticks() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_owned()
}
