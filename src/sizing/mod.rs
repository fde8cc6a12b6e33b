//! # Component Sizing Module
//!
//! Chooses a motor, battery and controller for a set of bike
//! specifications from read-only catalog tables, iterating until the
//! drivetrain weight assumed for the power requirement matches the weight
//! of the parts actually chosen.

pub mod catalog;
pub mod selector;

pub use catalog::{MotorModel, VoltageTier, CONTROLLER_RATINGS_A, MOTOR_CATALOG, VOLTAGE_TIERS};
pub use selector::{
    recommendations_for, CompatibilityReport, ComponentSelector, Recommendation, SelectionOutcome, SizingConfig,
};
