//! # Traction Battery Model
//!
//! Lithium-ion pack with temperature-dependent capacity, internal resistance
//! and discharge limit.
//!
//! ## Discharge step
//!
//! [`Battery::use_charge`] applies, in order:
//! 1. Temperature: ΔT = I²R·t·k_heat + (T_ambient - T)·k_exchange·t
//! 2. Current limit: I_eff = min(I, I_max(T))
//! 3. Voltage sag: V = max(OCV(SOC) - I_eff·R(T), 0.7·V_nominal)
//! 4. Charge: Q -= (I_eff + I_eff²R·t / V_nominal)·t, never below zero
//!
//! ## Temperature bands
//!
//! Capacity peaks between 20 and 30°C. Resistance rises on both sides of the
//! 10-30°C band.

use serde::{Deserialize, Serialize};

use super::curve::{Edge, StepCurve};
use crate::i18n::ThermalLabel;

const BASE_RESISTANCE_OHM: f64 = 0.05;
const MIN_TEMPERATURE_C: f64 = -20.0;
const MAX_TEMPERATURE_C: f64 = 60.0;
/// Temperature a fresh pack is stored at
pub const DEFAULT_SOAK_TEMPERATURE_C: f64 = 20.0;
/// Ohmic heating scale (°C per joule)
const HEATING_COEFF: f64 = 0.0001;
/// Fraction of the gap to ambient closed per hour of use (1/h)
const EXCHANGE_RATE: f64 = 5.0;
/// At or below this state of charge (%) the pack counts as empty
pub const EMPTY_SOC_PCT: f64 = 1.0;
const MIN_VOLTAGE_RATIO: f64 = 0.7;
const RUNTIME_MARGIN: f64 = 0.9;

const CAPACITY_DERATING: StepCurve = StepCurve::new(
    &[
        (Edge::Below(-20.0), 0.3),
        (Edge::Below(-10.0), 0.4),
        (Edge::Below(0.0), 0.5),
        (Edge::Below(10.0), 0.7),
        (Edge::Below(20.0), 0.85),
        (Edge::UpTo(30.0), 1.0),
        (Edge::UpTo(40.0), 0.9),
        (Edge::UpTo(50.0), 0.7),
    ],
    0.5,
);

const RESISTANCE_MULTIPLIER: StepCurve = StepCurve::new(
    &[
        (Edge::Below(-10.0), 3.0),
        (Edge::Below(0.0), 2.0),
        (Edge::Below(10.0), 1.5),
        (Edge::UpTo(30.0), 1.0),
        (Edge::UpTo(40.0), 1.2),
    ],
    1.5,
);

const DISCHARGE_DERATING: StepCurve = StepCurve::new(
    &[
        (Edge::Below(-10.0), 0.3),
        (Edge::Below(0.0), 0.5),
        (Edge::Below(10.0), 0.7),
        (Edge::UpTo(35.0), 1.0),
        (Edge::UpTo(45.0), 0.8),
    ],
    0.5,
);

/// Open-circuit voltage as a fraction of nominal, by SOC ratio
const OCV_CURVE: StepCurve = StepCurve::new(
    &[
        (Edge::UpTo(0.1), 0.85),
        (Edge::UpTo(0.3), 0.9),
        (Edge::UpTo(0.5), 0.95),
        (Edge::UpTo(0.7), 1.0),
        (Edge::UpTo(0.9), 1.05),
    ],
    1.1,
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatterySpec {
    pub name: String,
    /// Nominal capacity (Ah)
    pub capacity_ah: f64,
    /// Nominal voltage (V)
    pub nominal_voltage_v: f64,
    /// Continuous discharge limit at room temperature (A)
    pub max_current_a: f64,
    pub weight_kg: f64,
}

impl BatterySpec {
    /// Stored energy at nominal voltage (Wh)
    pub fn energy_wh(&self) -> f64 {
        self.capacity_ah * self.nominal_voltage_v
    }
}

/// Whether a state of charge (%) counts as an empty pack.
///
/// SOC is judged at the 0.1 % resolution samples are recorded with, so a
/// ride's verdict and the verdict rebuilt from its exported rows agree.
pub fn is_depleted_soc(soc_pct: f64) -> bool {
    (soc_pct * 10.0).round() / 10.0 <= EMPTY_SOC_PCT
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Battery {
    spec: BatterySpec,
    charge_ah: f64,
    temperature_c: f64,
    soak_temperature_c: f64,
    voltage_v: f64,
}

impl Battery {
    pub fn new(spec: BatterySpec) -> Self {
        let charge_ah = spec.capacity_ah.max(0.0);
        let voltage_v = spec.nominal_voltage_v;
        Self {
            spec,
            charge_ah,
            temperature_c: DEFAULT_SOAK_TEMPERATURE_C,
            soak_temperature_c: DEFAULT_SOAK_TEMPERATURE_C,
            voltage_v,
        }
    }

    pub fn spec(&self) -> &BatterySpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn capacity_ah(&self) -> f64 {
        self.spec.capacity_ah
    }

    pub fn nominal_voltage_v(&self) -> f64 {
        self.spec.nominal_voltage_v
    }

    pub fn max_current_a(&self) -> f64 {
        self.spec.max_current_a
    }

    pub fn weight_kg(&self) -> f64 {
        self.spec.weight_kg
    }

    pub fn charge_ah(&self) -> f64 {
        self.charge_ah
    }

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    /// Terminal voltage after the last discharge step (V)
    pub fn voltage_v(&self) -> f64 {
        self.voltage_v
    }

    pub fn effective_capacity_ah(&self) -> f64 {
        self.spec.capacity_ah * CAPACITY_DERATING.lookup(self.temperature_c)
    }

    pub fn internal_resistance_ohm(&self) -> f64 {
        BASE_RESISTANCE_OHM * RESISTANCE_MULTIPLIER.lookup(self.temperature_c)
    }

    /// Discharge current limit at the present temperature (A)
    pub fn max_discharge_current_a(&self) -> f64 {
        self.spec.max_current_a * DISCHARGE_DERATING.lookup(self.temperature_c)
    }

    fn soc_ratio(&self) -> f64 {
        let effective = self.effective_capacity_ah();
        if effective <= 0.0 {
            return 0.0;
        }
        self.charge_ah / effective
    }

    /// State of charge relative to the temperature-derated capacity (%)
    pub fn soc(&self) -> f64 {
        (self.soc_ratio() * 100.0).clamp(0.0, 100.0)
    }

    pub fn open_circuit_voltage_v(&self) -> f64 {
        self.spec.nominal_voltage_v * OCV_CURVE.lookup(self.soc_ratio())
    }

    pub fn voltage_under_load(&self, current_a: f64) -> f64 {
        let sag = current_a.max(0.0) * self.internal_resistance_ohm();
        (self.open_circuit_voltage_v() - sag).max(self.spec.nominal_voltage_v * MIN_VOLTAGE_RATIO)
    }

    /// Draw `current_a` for `hours` while exposed to `ambient_c`.
    ///
    /// Negative currents are treated as zero; this model does not charge.
    pub fn use_charge(&mut self, current_a: f64, hours: f64, ambient_c: f64) {
        let current_a = current_a.max(0.0);
        let hours = hours.max(0.0);

        self.update_temperature(current_a, ambient_c, hours);

        let effective_current = current_a.min(self.max_discharge_current_a());
        let resistance = self.internal_resistance_ohm();
        self.voltage_v = (self.open_circuit_voltage_v() - effective_current * resistance)
            .max(self.spec.nominal_voltage_v * MIN_VOLTAGE_RATIO);

        let loss_equivalent_a = if self.spec.nominal_voltage_v > 0.0 {
            effective_current * effective_current * resistance * hours / self.spec.nominal_voltage_v
        } else {
            0.0
        };
        let used_ah = (effective_current + loss_equivalent_a) * hours;
        self.charge_ah = (self.charge_ah - used_ah).max(0.0);
    }

    fn update_temperature(&mut self, current_a: f64, ambient_c: f64, hours: f64) {
        let heating_w = current_a * current_a * self.internal_resistance_ohm();
        let delta = heating_w * hours * 3600.0 * HEATING_COEFF
            + (ambient_c - self.temperature_c) * EXCHANGE_RATE * hours;
        self.temperature_c = (self.temperature_c + delta).clamp(MIN_TEMPERATURE_C, MAX_TEMPERATURE_C);
    }

    pub fn has_charge(&self) -> bool {
        !is_depleted_soc(self.soc())
    }

    /// Refill to nominal capacity and return to the soak temperature
    pub fn reset(&mut self) {
        self.charge_ah = self.spec.capacity_ah.max(0.0);
        self.temperature_c = self.soak_temperature_c;
        self.voltage_v = self.spec.nominal_voltage_v;
    }

    /// Soak the pack at `temperature_c`. Later resets return to it.
    pub fn force_temperature(&mut self, temperature_c: f64) {
        let clamped = temperature_c.clamp(MIN_TEMPERATURE_C, MAX_TEMPERATURE_C);
        self.temperature_c = clamped;
        self.soak_temperature_c = clamped;
    }

    /// Capacity lost to temperature, as a percentage of nominal
    pub fn temperature_impact_on_range(&self) -> f64 {
        if self.spec.capacity_ah <= 0.0 {
            return 0.0;
        }
        (self.spec.capacity_ah - self.effective_capacity_ah()) / self.spec.capacity_ah * 100.0
    }

    /// Remaining energy at nominal voltage (Wh)
    pub fn available_energy_wh(&self) -> f64 {
        self.charge_ah * self.spec.nominal_voltage_v
    }

    /// Hours of operation at a constant average draw of `average_power_w`
    pub fn estimate_runtime_hours(&self, average_power_w: f64) -> f64 {
        if average_power_w <= 0.0 {
            return 0.0;
        }
        self.effective_capacity_ah() * self.spec.nominal_voltage_v / average_power_w * RUNTIME_MARGIN
    }

    pub fn remaining_time_hours(&self, current_a: f64) -> f64 {
        if current_a <= 0.0 {
            return 0.0;
        }
        self.charge_ah / current_a
    }

    pub fn is_safe_temperature(&self) -> bool {
        (-10.0..=45.0).contains(&self.temperature_c)
    }

    pub fn temperature_status(&self) -> ThermalLabel {
        match self.temperature_c {
            t if t < -10.0 => ThermalLabel::CriticallyCold,
            t if t < 0.0 => ThermalLabel::VeryCold,
            t if t < 10.0 => ThermalLabel::Cold,
            t if t > 45.0 => ThermalLabel::CriticallyHot,
            t if t > 35.0 => ThermalLabel::Hot,
            _ => ThermalLabel::Optimal,
        }
    }
}
