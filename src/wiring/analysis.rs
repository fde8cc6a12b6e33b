//! Wiring recommendation derived from a simulated ride.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::selector::{CircuitSegment, WireSelector, WiringPlan, WiringSettings};
use crate::domain::WireSafety;
use crate::error::SimResult;
use crate::simulation::{BikeSimulator, SimulationResult};

/// Extra current allowed for on the controller-to-motor leg
const MOTOR_LEG_CURRENT_MARGIN: f64 = 1.2;

/// Electrical picture of one segment at its design current
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentReport {
    pub segment: CircuitSegment,
    pub awg: u8,
    pub current_a: f64,
    pub length_m: f64,
    pub voltage_drop_v: f64,
    pub power_loss_w: f64,
    pub efficiency: f64,
    pub safety: WireSafety,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WiringAnalysis {
    pub plan: WiringPlan,
    /// Peak current on the battery-to-controller leg (A)
    pub max_battery_current_a: f64,
    /// Design current on the controller-to-motor leg (A)
    pub max_motor_current_a: f64,
    /// Loss in the battery leg at the ride's average current (W)
    pub estimated_avg_power_loss_w: f64,
    pub segments: Vec<SegmentReport>,
}

impl WiringAnalysis {
    /// Size the circuit for `result`'s peak current. A ride that never drew
    /// current yields an empty analysis.
    pub fn from_result(
        result: &SimulationResult,
        voltage_v: f64,
        settings: &WiringSettings,
        selector: &WireSelector,
    ) -> SimResult<Self> {
        let max_battery_current_a = result.peak_current_a();
        if result.is_empty() || max_battery_current_a <= 0.0 {
            return Ok(Self::default());
        }
        let max_motor_current_a = max_battery_current_a * MOTOR_LEG_CURRENT_MARGIN;

        let plan = selector.select_wiring(max_battery_current_a, max_motor_current_a, voltage_v, settings)?;

        let segments = plan
            .iter()
            .filter_map(|(&segment, wire)| {
                let (current_a, length_m) = match segment {
                    CircuitSegment::BatteryToController => (max_battery_current_a, settings.battery_to_controller_m),
                    CircuitSegment::ControllerToMotor => (max_motor_current_a, settings.controller_to_motor_m),
                    CircuitSegment::ChargingCable => return None,
                };
                Some(SegmentReport {
                    segment,
                    awg: wire.awg,
                    current_a,
                    length_m,
                    voltage_drop_v: wire.voltage_drop(current_a, length_m),
                    power_loss_w: wire.power_loss(current_a, length_m),
                    efficiency: wire.efficiency(current_a, length_m, voltage_v),
                    safety: wire.safety(current_a),
                })
            })
            .collect();

        let estimated_avg_power_loss_w = plan
            .get(&CircuitSegment::BatteryToController)
            .map(|wire| wire.power_loss(result.average_current_a(), settings.battery_to_controller_m))
            .unwrap_or(0.0);

        Ok(Self {
            plan,
            max_battery_current_a,
            max_motor_current_a,
            estimated_avg_power_loss_w,
            segments,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.plan.is_empty()
    }

    pub fn segment(&self, segment: CircuitSegment) -> Option<&SegmentReport> {
        self.segments.iter().find(|s| s.segment == segment)
    }
}

impl BikeSimulator {
    /// Wiring for `result` at this drivetrain's battery voltage
    pub fn analyze_wiring(&self, result: &SimulationResult, settings: &WiringSettings) -> SimResult<WiringAnalysis> {
        let voltage_v = self.drivetrain().battery.nominal_voltage_v();
        let analysis = WiringAnalysis::from_result(result, voltage_v, settings, &WireSelector::default())?;
        info!(
            peak_current_a = analysis.max_battery_current_a,
            avg_loss_w = analysis.estimated_avg_power_loss_w,
            "Wiring analysed"
        );
        Ok(analysis)
    }
}
