//! Read-only component tables used by the selector.

use serde::Serialize;

use crate::domain::curve::{Edge, StepCurve};
use crate::domain::MotorSpec;

/// Usable energy density of a complete pack (Wh/kg)
const PACK_ENERGY_DENSITY_WH_PER_KG: f64 = 150.0;
/// Case, BMS and connectors (kg)
const PACK_OVERHEAD_KG: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MotorModel {
    pub name: &'static str,
    pub voltage_v: f64,
    pub rated_power_w: f64,
    pub max_power_w: f64,
    pub efficiency: f64,
    pub weight_kg: f64,
}

impl MotorModel {
    pub fn to_spec(&self) -> MotorSpec {
        MotorSpec {
            name: self.name.to_string(),
            voltage_v: self.voltage_v,
            rated_power_w: self.rated_power_w,
            max_power_w: self.max_power_w,
            efficiency: self.efficiency,
            weight_kg: self.weight_kg,
        }
    }
}

pub static MOTOR_CATALOG: &[MotorModel] = &[
    MotorModel { name: "Bafang BBS01B", voltage_v: 36.0, rated_power_w: 250.0, max_power_w: 350.0, efficiency: 0.82, weight_kg: 4.0 },
    MotorModel { name: "Tongsheng TSDZ2", voltage_v: 36.0, rated_power_w: 350.0, max_power_w: 500.0, efficiency: 0.83, weight_kg: 3.3 },
    MotorModel { name: "Bafang BBS02B", voltage_v: 48.0, rated_power_w: 500.0, max_power_w: 750.0, efficiency: 0.85, weight_kg: 4.2 },
    MotorModel { name: "Bafang BBSHD", voltage_v: 48.0, rated_power_w: 750.0, max_power_w: 1200.0, efficiency: 0.87, weight_kg: 5.2 },
    MotorModel { name: "Grin All-Axle Hub", voltage_v: 48.0, rated_power_w: 1000.0, max_power_w: 1500.0, efficiency: 0.86, weight_kg: 5.6 },
    MotorModel { name: "Cyclone 3000W", voltage_v: 62.0, rated_power_w: 2000.0, max_power_w: 3000.0, efficiency: 0.86, weight_kg: 7.0 },
    MotorModel { name: "MXUS 3K Turbo", voltage_v: 72.0, rated_power_w: 3000.0, max_power_w: 5000.0, efficiency: 0.88, weight_kg: 8.5 },
    MotorModel { name: "QS273 V4", voltage_v: 72.0, rated_power_w: 5000.0, max_power_w: 8000.0, efficiency: 0.90, weight_kg: 12.0 },
];

/// System voltage band chosen from the required motor power
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VoltageTier {
    pub voltage_v: f64,
    /// Highest required power (W) served by this tier
    pub max_power_w: f64,
    /// Standard pack capacities at this voltage (Ah), ascending
    pub standard_capacities_ah: &'static [f64],
    /// Pack discharge ceiling at this voltage (A)
    pub max_battery_current_a: f64,
}

pub static VOLTAGE_TIERS: [VoltageTier; 4] = [
    VoltageTier {
        voltage_v: 36.0,
        max_power_w: 500.0,
        standard_capacities_ah: &[8.7, 10.4, 13.0, 14.5, 17.5, 20.0],
        max_battery_current_a: 30.0,
    },
    VoltageTier {
        voltage_v: 48.0,
        max_power_w: 1500.0,
        standard_capacities_ah: &[10.4, 13.0, 14.5, 17.5, 20.0, 25.0, 30.0],
        max_battery_current_a: 50.0,
    },
    VoltageTier {
        voltage_v: 62.0,
        max_power_w: 3000.0,
        standard_capacities_ah: &[15.0, 20.0, 25.0, 30.0, 35.0],
        max_battery_current_a: 60.0,
    },
    VoltageTier {
        voltage_v: 72.0,
        max_power_w: f64::INFINITY,
        standard_capacities_ah: &[20.0, 25.0, 30.0, 35.0, 40.0, 50.0],
        max_battery_current_a: 80.0,
    },
];

/// Standard controller current ratings (A), ascending
pub const CONTROLLER_RATINGS_A: [f64; 11] = [15.0, 18.0, 22.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 60.0, 80.0];

const CONTROLLER_WEIGHT_KG: StepCurve = StepCurve::new(
    &[(Edge::UpTo(25.0), 0.45), (Edge::UpTo(40.0), 0.7), (Edge::UpTo(60.0), 1.1)],
    1.6,
);

pub fn tier_for_power(required_power_w: f64) -> &'static VoltageTier {
    VOLTAGE_TIERS
        .iter()
        .find(|tier| required_power_w <= tier.max_power_w)
        .unwrap_or(&VOLTAGE_TIERS[VOLTAGE_TIERS.len() - 1])
}

/// Tier whose voltage is closest to `voltage_v`
pub fn tier_for_voltage(voltage_v: f64) -> &'static VoltageTier {
    VOLTAGE_TIERS
        .iter()
        .min_by(|a, b| (a.voltage_v - voltage_v).abs().total_cmp(&(b.voltage_v - voltage_v).abs()))
        .unwrap_or(&VOLTAGE_TIERS[0])
}

pub fn battery_weight_kg(energy_wh: f64) -> f64 {
    energy_wh.max(0.0) / PACK_ENERGY_DENSITY_WH_PER_KG + PACK_OVERHEAD_KG
}

pub fn controller_weight_kg(rating_a: f64) -> f64 {
    CONTROLLER_WEIGHT_KG.lookup(rating_a)
}
