//! World clock, tick cycle, and run loop for the Neolithica simulation.
//!
//! # Modules
//!
//! - [`clock`] -- Tick counter and fixed timestep.
//! - [`config`] -- Configuration loading from `neolithica-config.yaml` into
//!   strongly-typed structs.
//! - [`operator`] -- [`RunControl`] stop flag and pacing shared with the loop.
//! - [`runner`] -- The async [`run_simulation`] loop.
//! - [`tick`] -- [`SimulationState`] and the single-tick driver.
//!
//! [`RunControl`]: operator::RunControl
//! [`run_simulation`]: runner::run_simulation
//! [`SimulationState`]: tick::SimulationState

pub mod clock;
pub mod config;
pub mod operator;
pub mod runner;
pub mod tick;
