//! E-bike drivetrain sizing and ride simulation.
//!
//! - [`domain`]: component models, environment and bike specifications
//! - [`sizing`]: iterative motor/battery/controller selection
//! - [`simulation`]: time-stepped ride simulator and environmental sweeps
//! - [`wiring`]: conductor gauge selection and loss analysis

pub mod config;
pub mod domain;
pub mod error;
pub mod i18n;
pub mod simulation;
pub mod sizing;
pub mod telemetry;
pub mod wiring;
