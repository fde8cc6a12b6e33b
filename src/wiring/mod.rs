//! # Wiring Module
//!
//! Conductor gauge selection for the battery, motor and charging circuits,
//! and loss/safety analysis of a simulated ride's currents.

pub mod analysis;
pub mod selector;

pub use analysis::{SegmentReport, WiringAnalysis};
pub use selector::{
    CircuitSegment, WireAnalysis, WireSelectionReport, WireSelector, WiringPlan, WiringSettings, WIRE_TABLE,
};
