//! # Hub / Mid-Drive Motor Model
//!
//! Lumped thermal model driven by the copper/iron losses of the power being
//! delivered:
//!
//! ΔT = P·(1 - η)·dt·k_heat - (T - T_ambient)·dt·k_cool
//!
//! Temperature is clamped to [ambient, 120°C]. Efficiency and deliverable
//! power are derated by step functions of temperature.

use serde::{Deserialize, Serialize};

use super::curve::{clamp_between, Edge, StepCurve};
use crate::i18n::ThermalLabel;

const HEATING_COEFF: f64 = 0.01;
const COOLING_COEFF: f64 = 0.005;
const MAX_TEMPERATURE_C: f64 = 120.0;
const OVERHEAT_THRESHOLD_C: f64 = 80.0;

/// Efficiency multiplier: cold and hot windings both cost efficiency
const EFFICIENCY_DERATING: StepCurve = StepCurve::new(
    &[
        (Edge::Below(0.0), 0.9),
        (Edge::UpTo(60.0), 1.0),
        (Edge::UpTo(80.0), 0.95),
    ],
    0.9,
);

/// Fraction of requested power the motor may deliver
const POWER_DERATING: StepCurve = StepCurve::new(
    &[
        (Edge::UpTo(60.0), 1.0),
        (Edge::UpTo(80.0), 0.8),
        (Edge::UpTo(100.0), 0.5),
    ],
    0.3,
);

/// Catalog-level description of a motor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotorSpec {
    pub name: String,
    /// Rated voltage (V)
    pub voltage_v: f64,
    /// Rated continuous power (W)
    pub rated_power_w: f64,
    /// Peak power (W)
    pub max_power_w: f64,
    /// Base efficiency (0.0-1.0)
    pub efficiency: f64,
    pub weight_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motor {
    spec: MotorSpec,
    temperature_c: f64,
}

impl Motor {
    pub fn new(spec: MotorSpec) -> Self {
        Self {
            spec,
            temperature_c: 20.0,
        }
    }

    pub fn spec(&self) -> &MotorSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn voltage_v(&self) -> f64 {
        self.spec.voltage_v
    }

    pub fn rated_power_w(&self) -> f64 {
        self.spec.rated_power_w
    }

    pub fn max_power_w(&self) -> f64 {
        self.spec.max_power_w
    }

    pub fn weight_kg(&self) -> f64 {
        self.spec.weight_kg
    }

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    /// Peak current draw at rated voltage (A)
    pub fn max_current_a(&self) -> f64 {
        if self.spec.voltage_v <= 0.0 {
            return 0.0;
        }
        self.spec.max_power_w / self.spec.voltage_v
    }

    /// Efficiency at the present winding temperature
    pub fn efficiency(&self) -> f64 {
        self.spec.efficiency * EFFICIENCY_DERATING.lookup(self.temperature_c)
    }

    pub fn thermal_limit_factor(&self) -> f64 {
        POWER_DERATING.lookup(self.temperature_c)
    }

    /// Output power (W) for a throttle position, capped at peak power and
    /// derated by temperature
    pub fn output_power(&self, throttle: f64) -> f64 {
        let requested = (self.spec.rated_power_w * throttle.clamp(0.0, 1.0)).min(self.spec.max_power_w);
        requested * self.thermal_limit_factor()
    }

    /// Battery current (A) needed to deliver `power_w` at the shaft
    pub fn required_current(&self, power_w: f64) -> f64 {
        let efficiency = self.efficiency();
        if self.spec.voltage_v <= 0.0 || efficiency <= 0.0 {
            return 0.0;
        }
        power_w.max(0.0) / (self.spec.voltage_v * efficiency)
    }

    /// Shaft torque (N·m) at full throttle for a given rpm
    pub fn torque(&self, rpm: f64) -> f64 {
        if rpm <= 0.0 {
            return 0.0;
        }
        self.output_power(1.0) * 60.0 / (2.0 * std::f64::consts::PI * rpm)
    }

    pub fn can_deliver_power(&self, requested_w: f64) -> bool {
        requested_w <= self.spec.max_power_w * self.thermal_limit_factor()
    }

    pub fn is_overheating(&self) -> bool {
        self.temperature_c > OVERHEAT_THRESHOLD_C
    }

    /// Advance the winding temperature over `dt_s` seconds of delivering
    /// `power_w`.
    pub fn update_temperature(&mut self, power_w: f64, ambient_c: f64, dt_s: f64) {
        if dt_s <= 0.0 {
            return;
        }
        let loss_w = power_w.max(0.0) * (1.0 - self.efficiency());
        let heating = loss_w * dt_s * HEATING_COEFF;
        let cooling = (self.temperature_c - ambient_c) * dt_s * COOLING_COEFF;

        self.temperature_c = clamp_between(self.temperature_c + heating - cooling, ambient_c, MAX_TEMPERATURE_C);
    }

    pub fn reset(&mut self, ambient_c: f64) {
        self.temperature_c = clamp_between(ambient_c, f64::NEG_INFINITY, MAX_TEMPERATURE_C);
    }

    pub fn temperature_status(&self) -> ThermalLabel {
        match self.temperature_c {
            t if t > 80.0 => ThermalLabel::CriticalOverheating,
            t if t > 70.0 => ThermalLabel::Overheating,
            t if t > 60.0 => ThermalLabel::Warm,
            _ => ThermalLabel::Standard,
        }
    }

    #[cfg(test)]
    pub(crate) fn set_temperature(&mut self, temperature_c: f64) {
        self.temperature_c = temperature_c;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn bbshd() -> Motor {
        Motor::new(MotorSpec {
            name: "Bafang BBSHD".to_string(),
            voltage_v: 48.0,
            rated_power_w: 750.0,
            max_power_w: 1200.0,
            efficiency: 0.87,
            weight_kg: 5.2,
        })
    }

    #[test]
    fn test_output_power_scales_with_throttle() {
        let motor = bbshd();
        assert_eq!(motor.output_power(0.0), 0.0);
        assert_eq!(motor.output_power(0.5), 375.0);
        assert_eq!(motor.output_power(1.0), 750.0);
        assert_eq!(motor.output_power(3.0), 750.0);
    }

    #[rstest]
    #[case(20.0, 1.0)]
    #[case(60.0, 1.0)]
    #[case(60.5, 0.8)]
    #[case(80.0, 0.8)]
    #[case(95.0, 0.5)]
    #[case(110.0, 0.3)]
    fn test_thermal_limit_bands(#[case] temperature: f64, #[case] factor: f64) {
        let mut motor = bbshd();
        motor.set_temperature(temperature);
        assert_eq!(motor.thermal_limit_factor(), factor);
    }

    #[rstest]
    #[case(-5.0, 0.9)]
    #[case(25.0, 1.0)]
    #[case(70.0, 0.95)]
    #[case(90.0, 0.9)]
    fn test_efficiency_bands(#[case] temperature: f64, #[case] factor: f64) {
        let mut motor = bbshd();
        motor.set_temperature(temperature);
        assert!((motor.efficiency() - 0.87 * factor).abs() < 1e-12);
    }

    #[test]
    fn test_heats_under_load_and_stays_clamped() {
        let mut motor = bbshd();
        motor.reset(20.0);
        for _ in 0..100 {
            motor.update_temperature(750.0, 20.0, 1.0);
        }
        assert!(motor.temperature_c() > 20.0);
        assert!(motor.temperature_c() <= 120.0);

        for _ in 0..10_000 {
            motor.update_temperature(5000.0, 20.0, 1.0);
        }
        assert!(motor.temperature_c() <= 120.0);
    }

    #[test]
    fn test_never_cools_below_ambient() {
        let mut motor = bbshd();
        motor.reset(30.0);
        motor.update_temperature(0.0, 30.0, 100.0);
        assert_eq!(motor.temperature_c(), 30.0);
    }

    #[test]
    fn test_required_current_and_torque() {
        let motor = bbshd();
        let current = motor.required_current(480.0);
        assert!((current - 480.0 / (48.0 * 0.87)).abs() < 1e-9);
        assert_eq!(motor.required_current(-10.0), 0.0);
        assert_eq!(motor.torque(0.0), 0.0);
        assert!(motor.torque(200.0) > 30.0);
        assert_eq!(motor.max_current_a(), 25.0);
    }

    #[test]
    fn test_status_labels() {
        let mut motor = bbshd();
        motor.set_temperature(50.0);
        assert_eq!(motor.temperature_status(), ThermalLabel::Standard);
        motor.set_temperature(65.0);
        assert_eq!(motor.temperature_status(), ThermalLabel::Warm);
        motor.set_temperature(75.0);
        assert_eq!(motor.temperature_status(), ThermalLabel::Overheating);
        motor.set_temperature(85.0);
        assert_eq!(motor.temperature_status(), ThermalLabel::CriticalOverheating);
        assert!(motor.is_overheating());
        assert!(!motor.can_deliver_power(1000.0));
    }

    proptest! {
        // Hotter windings never allow more power
        #[test]
        fn power_derating_never_rises_with_temperature(a in -40.0f64..150.0, b in -40.0f64..150.0) {
            let (cool, hot) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(POWER_DERATING.lookup(hot) <= POWER_DERATING.lookup(cool));
        }
    }
}
