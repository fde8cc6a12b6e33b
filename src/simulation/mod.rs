//! # Ride Simulation Module
//!
//! Time-stepped simulation of one drivetrain through one environment.
//!
//! ## Components
//!
//! - **Simulator**: the integration loop, acceleration/range tests and the throttle search
//! - **Data / Result**: per-step samples, run aggregates and CSV interchange
//! - **Sweep**: temperature and wind impact analyses over forked simulators
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ebike_sim::domain::{BikeSpecifications, Environment};
//! use ebike_sim::simulation::BikeSimulator;
//! use ebike_sim::sizing::ComponentSelector;
//!
//! let specs = BikeSpecifications::default();
//! let outcome = ComponentSelector::default().select_components(&specs)?;
//!
//! let mut simulator = BikeSimulator::new(specs, outcome.drivetrain, Environment::default());
//! let acceleration = simulator.test_acceleration();
//! let range = simulator.test_range(25.0);
//! println!("{:.1} km/h top, {:.1} km range", acceleration.max_speed_kmh, range.total_distance_km);
//! # Ok::<(), ebike_sim::error::SimError>(())
//! ```

pub mod data;
pub mod result;
pub mod simulator;
pub mod sweep;

pub use data::{ComponentKind, SimulationData, ThermalStatus};
pub use result::{SimulationResult, SimulationSummary, ThermalTimes, CSV_HEADER};
pub use simulator::{BikeSimulator, CurrentSource, RunParameters, SimulationSettings, StopPolicy, ThrottleSearch};
pub use sweep::{TemperatureImpact, TemperatureTest, WindImpactResult, WindImpactTest};
