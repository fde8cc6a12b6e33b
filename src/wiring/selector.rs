//! # Conductor Selection
//!
//! Picks an AWG gauge for a circuit run from a fixed copper table. A gauge
//! qualifies when it can carry the current continuously (rated for at least
//! 1.25x the load) and its voltage drop over the run stays within the
//! allowed share of the system voltage. The thinnest qualifying gauge wins;
//! the thickest gauge is the fallback when nothing qualifies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumIter, IntoStaticStr};
use tracing::{debug, warn};

use crate::domain::{Wire, WireSafety};
use crate::error::{require_positive, SimError, SimResult};

/// Copper conductors, thickest first
pub static WIRE_TABLE: [Wire; 8] = [
    Wire::new(4, 21.15, 150.0, 0.00081),
    Wire::new(6, 13.30, 101.0, 0.00129),
    Wire::new(8, 8.37, 73.0, 0.00205),
    Wire::new(10, 5.26, 55.0, 0.00328),
    Wire::new(12, 3.31, 41.0, 0.00521),
    Wire::new(14, 2.08, 32.0, 0.00829),
    Wire::new(16, 1.31, 22.0, 0.0132),
    Wire::new(18, 0.82, 16.0, 0.0210),
];

pub const DEFAULT_MAX_DROP_PERCENT: f64 = 3.0;
pub const CHARGING_CURRENT_A: f64 = 10.0;
pub const CHARGING_CABLE_LENGTH_M: f64 = 2.0;

/// Run lengths and drop limit for the power circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WiringSettings {
    pub battery_to_controller_m: f64,
    pub controller_to_motor_m: f64,
    /// Allowed voltage drop as a percentage of system voltage
    pub max_drop_percent: f64,
}

impl Default for WiringSettings {
    fn default() -> Self {
        Self {
            battery_to_controller_m: 0.5,
            controller_to_motor_m: 1.0,
            max_drop_percent: DEFAULT_MAX_DROP_PERCENT,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CircuitSegment {
    BatteryToController,
    ControllerToMotor,
    ChargingCable,
}

/// Gauge chosen for each segment of the circuit
pub type WiringPlan = BTreeMap<CircuitSegment, Wire>;

/// Per-length breakdown for one wire choice
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireAnalysis {
    pub length_m: f64,
    pub wire: Wire,
    pub voltage_drop_v: f64,
    pub voltage_drop_percent: f64,
    pub power_loss_w: f64,
    pub efficiency: f64,
    pub safety: WireSafety,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireSelectionReport {
    pub wires: Vec<WireAnalysis>,
}

impl WireSelectionReport {
    pub fn total_power_loss_w(&self) -> f64 {
        self.wires.iter().map(|w| w.power_loss_w).sum()
    }

    /// Mean efficiency over the analysed lengths, 1.0 when empty
    pub fn average_efficiency(&self) -> f64 {
        if self.wires.is_empty() {
            return 1.0;
        }
        self.wires.iter().map(|w| w.efficiency).sum::<f64>() / self.wires.len() as f64
    }
}

#[derive(Debug, Clone)]
pub struct WireSelector {
    table: &'static [Wire],
}

impl Default for WireSelector {
    fn default() -> Self {
        Self { table: &WIRE_TABLE }
    }
}

impl WireSelector {
    pub fn table(&self) -> &[Wire] {
        self.table
    }

    fn thickest(&self) -> SimResult<Wire> {
        self.table
            .iter()
            .copied()
            .min_by_key(|w| w.awg)
            .ok_or_else(|| SimError::invalid("wire table is empty"))
    }

    fn qualifies(wire: &Wire, current_a: f64, length_m: f64, max_drop_v: f64) -> bool {
        wire.is_suitable_for_current(current_a) && wire.voltage_drop(current_a, length_m) <= max_drop_v
    }

    /// Thinnest gauge that carries `current_a` over `length_m` within
    /// `max_drop_percent` of `voltage_v`.
    pub fn select_wire(&self, current_a: f64, length_m: f64, voltage_v: f64, max_drop_percent: f64) -> SimResult<Wire> {
        require_positive("current", current_a)?;
        require_positive("wire length", length_m)?;
        require_positive("system voltage", voltage_v)?;

        let max_drop_v = voltage_v * max_drop_percent / 100.0;
        let mut candidates: Vec<&Wire> = self.table.iter().collect();
        candidates.sort_by_key(|w| std::cmp::Reverse(w.awg));

        match candidates
            .into_iter()
            .find(|w| Self::qualifies(w, current_a, length_m, max_drop_v))
        {
            Some(wire) => {
                debug!(current_a, length_m, awg = wire.awg, "Wire selected");
                Ok(*wire)
            }
            None => {
                let wire = self.thickest()?;
                warn!(current_a, length_m, awg = wire.awg, "No gauge meets the limits, using the thickest");
                Ok(wire)
            }
        }
    }

    /// Gauges for the whole power circuit, plus the charging cable
    pub fn select_wiring(
        &self,
        battery_current_a: f64,
        motor_current_a: f64,
        voltage_v: f64,
        settings: &WiringSettings,
    ) -> SimResult<WiringPlan> {
        let mut plan = WiringPlan::new();
        plan.insert(
            CircuitSegment::BatteryToController,
            self.select_wire(battery_current_a, settings.battery_to_controller_m, voltage_v, settings.max_drop_percent)?,
        );
        plan.insert(
            CircuitSegment::ControllerToMotor,
            self.select_wire(motor_current_a, settings.controller_to_motor_m, voltage_v, settings.max_drop_percent)?,
        );
        plan.insert(
            CircuitSegment::ChargingCable,
            self.select_wire(CHARGING_CURRENT_A, CHARGING_CABLE_LENGTH_M, voltage_v, settings.max_drop_percent)?,
        );
        Ok(plan)
    }

    /// Select and evaluate a gauge for each of `lengths_m` at one current
    pub fn analyze_lengths(
        &self,
        current_a: f64,
        lengths_m: &[f64],
        voltage_v: f64,
        max_drop_percent: f64,
    ) -> SimResult<WireSelectionReport> {
        let wires = lengths_m
            .iter()
            .map(|&length_m| {
                let wire = self.select_wire(current_a, length_m, voltage_v, max_drop_percent)?;
                let voltage_drop_v = wire.voltage_drop(current_a, length_m);
                Ok(WireAnalysis {
                    length_m,
                    wire,
                    voltage_drop_v,
                    voltage_drop_percent: voltage_drop_v / voltage_v * 100.0,
                    power_loss_w: wire.power_loss(current_a, length_m),
                    efficiency: wire.efficiency(current_a, length_m, voltage_v),
                    safety: wire.safety(current_a),
                })
            })
            .collect::<SimResult<Vec<_>>>()?;
        Ok(WireSelectionReport { wires })
    }

    /// Every gauge within the default drop limit, thickest first
    pub fn alternatives(&self, current_a: f64, length_m: f64, voltage_v: f64) -> Vec<Wire> {
        let max_drop_v = voltage_v * DEFAULT_MAX_DROP_PERCENT / 100.0;
        let mut wires: Vec<Wire> = self
            .table
            .iter()
            .filter(|w| Self::qualifies(w, current_a, length_m, max_drop_v))
            .copied()
            .collect();
        wires.sort_by_key(|w| w.awg);
        wires
    }

    /// True when every segment with a known current can carry it continuously
    pub fn validate_wiring(plan: &WiringPlan, currents: &BTreeMap<CircuitSegment, f64>) -> bool {
        plan.iter().all(|(segment, wire)| {
            currents
                .get(segment)
                .map_or(true, |current| wire.is_suitable_for_current(*current))
        })
    }

    /// Human-readable recommendation for a single run
    pub fn recommendation(&self, current_a: f64, length_m: f64, voltage_v: f64) -> SimResult<String> {
        let wire = self.select_wire(current_a, length_m, voltage_v, DEFAULT_MAX_DROP_PERCENT)?;
        Ok(format!(
            "{current_a:.1} A over {length_m:.2} m at {voltage_v:.0} V: AWG {} ({:.2} mm², {:.0} A rated), \
             drop {:.3} V, loss {:.1} W, efficiency {:.1}%",
            wire.awg,
            wire.cross_section_mm2,
            wire.max_current_a,
            wire.voltage_drop(current_a, length_m),
            wire.power_loss(current_a, length_m),
            wire.efficiency(current_a, length_m, voltage_v) * 100.0,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_example_selection() {
        let wire = WireSelector::default().select_wire(30.0, 1.0, 48.0, 3.0).unwrap();
        assert_eq!(wire.awg, 12);
        assert!(wire.voltage_drop(30.0, 1.0) <= 1.44);
    }

    #[rstest]
    #[case(5.0, 0.5, 18)]
    #[case(15.0, 1.0, 16)]
    #[case(40.0, 1.0, 10)]
    #[case(100.0, 1.0, 4)]
    fn test_thinnest_qualifying_gauge(#[case] current: f64, #[case] length: f64, #[case] awg: u8) {
        let wire = WireSelector::default().select_wire(current, length, 48.0, 3.0).unwrap();
        assert_eq!(wire.awg, awg);
    }

    #[test]
    fn test_long_run_needs_thicker_wire() {
        let selector = WireSelector::default();
        let short = selector.select_wire(10.0, 1.0, 12.0, 3.0).unwrap();
        let long = selector.select_wire(10.0, 10.0, 12.0, 3.0).unwrap();
        assert!(long.awg < short.awg);
    }

    #[test]
    fn test_falls_back_to_thickest() {
        let wire = WireSelector::default().select_wire(500.0, 1.0, 48.0, 3.0).unwrap();
        assert_eq!(wire.awg, 4);
    }

    #[rstest]
    #[case(0.0, 1.0, 48.0)]
    #[case(30.0, 0.0, 48.0)]
    #[case(30.0, 1.0, -48.0)]
    #[case(f64::NAN, 1.0, 48.0)]
    fn test_rejects_invalid_inputs(#[case] current: f64, #[case] length: f64, #[case] voltage: f64) {
        assert!(matches!(
            WireSelector::default().select_wire(current, length, voltage, 3.0),
            Err(SimError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_whole_circuit_and_validation() {
        let selector = WireSelector::default();
        let plan = selector.select_wiring(25.0, 30.0, 48.0, &WiringSettings::default()).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[&CircuitSegment::ChargingCable].awg, 18);

        let mut currents = BTreeMap::new();
        currents.insert(CircuitSegment::BatteryToController, 25.0);
        currents.insert(CircuitSegment::ControllerToMotor, 30.0);
        assert!(WireSelector::validate_wiring(&plan, &currents));

        currents.insert(CircuitSegment::ChargingCable, 40.0);
        assert!(!WireSelector::validate_wiring(&plan, &currents));
    }

    #[test]
    fn test_length_report_and_alternatives() {
        let selector = WireSelector::default();
        let report = selector.analyze_lengths(30.0, &[0.5, 1.0, 2.0], 48.0, 3.0).unwrap();
        assert_eq!(report.wires.len(), 3);
        assert!(report.total_power_loss_w() > 0.0);
        assert!(report.average_efficiency() > 0.99 && report.average_efficiency() < 1.0);
        assert!(report.wires.iter().all(|w| w.safety == WireSafety::Safe));

        let alternatives = selector.alternatives(30.0, 1.0, 48.0);
        let gauges: Vec<u8> = alternatives.iter().map(|w| w.awg).collect();
        assert_eq!(gauges, vec![4, 6, 8, 10, 12]);

        assert_eq!(WireSelectionReport::default().average_efficiency(), 1.0);
        assert!(selector.recommendation(30.0, 1.0, 48.0).unwrap().contains("AWG 12"));
    }
}
