//! # Motor Controller Model
//!
//! Current-limited ESC. Switching losses are approximated as I²·0.1 W,
//! output current is derated above 60°C and temperature is clamped to
//! [ambient, 80°C].

use serde::{Deserialize, Serialize};

use super::curve::{clamp_between, Edge, StepCurve};
use crate::i18n::ThermalLabel;

const LOSS_COEFF: f64 = 0.1;
const HEATING_COEFF: f64 = 0.02;
const COOLING_COEFF: f64 = 0.01;
const MAX_TEMPERATURE_C: f64 = 80.0;
const OVERHEAT_THRESHOLD_C: f64 = 70.0;
const BASE_EFFICIENCY: f64 = 0.95;

const CURRENT_DERATING: StepCurve = StepCurve::new(
    &[
        (Edge::UpTo(60.0), 1.0),
        (Edge::UpTo(70.0), 0.8),
        (Edge::UpTo(80.0), 0.6),
    ],
    0.4,
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSpec {
    pub name: String,
    /// Continuous output current rating (A)
    pub max_current_a: f64,
    pub weight_kg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Controller {
    spec: ControllerSpec,
    temperature_c: f64,
}

impl Controller {
    pub fn new(spec: ControllerSpec) -> Self {
        Self {
            spec,
            temperature_c: 20.0,
        }
    }

    pub fn spec(&self) -> &ControllerSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn max_current_a(&self) -> f64 {
        self.spec.max_current_a
    }

    pub fn weight_kg(&self) -> f64 {
        self.spec.weight_kg
    }

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    pub fn thermal_factor(&self) -> f64 {
        CURRENT_DERATING.lookup(self.temperature_c)
    }

    /// Current delivered for a throttle position (A)
    pub fn output_current(&self, throttle: f64) -> f64 {
        let requested = (self.spec.max_current_a * throttle.clamp(0.0, 1.0)).min(self.spec.max_current_a);
        requested * self.thermal_factor()
    }

    pub fn is_current_safe(&self, current_a: f64) -> bool {
        current_a <= self.spec.max_current_a * self.thermal_factor()
    }

    /// Conversion efficiency at `current_a`; drops with load and heat
    pub fn efficiency(&self, current_a: f64) -> f64 {
        let load = if self.spec.max_current_a > 0.0 {
            current_a / self.spec.max_current_a
        } else {
            1.0
        };
        let load_factor = (1.0 - load * 0.1).clamp(0.85, 1.0);
        BASE_EFFICIENCY * load_factor * self.thermal_factor()
    }

    /// Heat dissipated (W) while passing `current_a` at `voltage_v`
    pub fn power_loss(&self, current_a: f64, voltage_v: f64) -> f64 {
        current_a * voltage_v * (1.0 - self.efficiency(current_a))
    }

    pub fn update_temperature(&mut self, current_a: f64, ambient_c: f64, dt_s: f64) {
        if dt_s <= 0.0 {
            return;
        }
        let loss_w = current_a * current_a * LOSS_COEFF;
        let heating = loss_w * dt_s * HEATING_COEFF;
        let cooling = (self.temperature_c - ambient_c) * dt_s * COOLING_COEFF;

        self.temperature_c = clamp_between(self.temperature_c + heating - cooling, ambient_c, MAX_TEMPERATURE_C);
    }

    pub fn reset(&mut self, ambient_c: f64) {
        self.temperature_c = clamp_between(ambient_c, f64::NEG_INFINITY, MAX_TEMPERATURE_C);
    }

    pub fn is_overheating(&self) -> bool {
        self.temperature_c > OVERHEAT_THRESHOLD_C
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

    fn controller() -> Controller {
        Controller::new(ControllerSpec {
            name: "25A Controller".to_string(),
            max_current_a: 25.0,
            weight_kg: 0.45,
        })
    }

    #[test]
    fn test_output_current_follows_throttle() {
        let c = controller();
        assert_eq!(c.output_current(0.0), 0.0);
        assert_eq!(c.output_current(0.4), 10.0);
        assert_eq!(c.output_current(1.0), 25.0);
        assert_eq!(c.output_current(2.0), 25.0);
    }

    #[rstest]
    #[case(50.0, 1.0)]
    #[case(65.0, 0.8)]
    #[case(75.0, 0.6)]
    #[case(85.0, 0.4)]
    fn test_thermal_derating(#[case] temperature: f64, #[case] factor: f64) {
        let mut c = controller();
        c.set_temperature(temperature);
        assert_eq!(c.thermal_factor(), factor);
        assert!((c.output_current(1.0) - 25.0 * factor).abs() < 1e-12);
    }

    #[test]
    fn test_heating_is_clamped() {
        let mut c = controller();
        c.reset(20.0);
        for _ in 0..5_000 {
            c.update_temperature(25.0, 20.0, 1.0);
        }
        assert!(c.temperature_c() <= 80.0);
        assert!(c.temperature_c() > 20.0);

        c.reset(30.0);
        c.update_temperature(0.0, 30.0, 50.0);
        assert_eq!(c.temperature_c(), 30.0);
    }

    #[test]
    fn test_efficiency_and_losses() {
        let c = controller();
        assert!((c.efficiency(0.0) - 0.95).abs() < 1e-12);
        assert!((c.efficiency(25.0) - 0.95 * 0.9).abs() < 1e-12);
        let loss = c.power_loss(25.0, 48.0);
        assert!((loss - 25.0 * 48.0 * (1.0 - 0.855)).abs() < 1e-9);
    }

    #[test]
    fn test_safety_predicates() {
        let mut c = controller();
        assert!(c.is_current_safe(25.0));
        assert!(!c.is_current_safe(26.0));
        c.set_temperature(72.0);
        assert!(c.is_overheating());
        assert_eq!(c.temperature_status(), ThermalLabel::Overheating);
        assert!(!c.is_current_safe(25.0));
    }

    proptest! {
        #[test]
        fn current_derating_never_rises_with_temperature(a in -40.0f64..120.0, b in -40.0f64..120.0) {
            let (cool, hot) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(CURRENT_DERATING.lookup(hot) <= CURRENT_DERATING.lookup(cool));
        }
    }
}
