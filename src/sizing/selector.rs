//! # Component Sizing
//!
//! Fixed-point iteration over drivetrain weight:
//!
//! 1. Required motor power at the target speed for rider + bike + the
//!    current drivetrain weight estimate
//! 2. System voltage tier from that power
//! 3. Lightest-power catalog motor in the tier that covers the power with
//!    margin (nearest voltage, then highest power, as fallbacks)
//! 4. Smallest standard pack at the motor's voltage covering the range
//! 5. Smallest standard controller covering the motor's peak current,
//!    capped by what the pack can deliver
//! 6. Feed the new drivetrain weight back into step 1
//!
//! Stops once the weight moves less than the tolerance or after the
//! configured number of iterations.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

use super::catalog::{
    battery_weight_kg, controller_weight_kg, tier_for_power, tier_for_voltage, MotorModel, VoltageTier,
    CONTROLLER_RATINGS_A, MOTOR_CATALOG,
};
use crate::domain::environment::{aero_drag_force, GRAVITY, ROLLING_RESISTANCE_COEFFICIENT};
use crate::domain::{
    Battery, BatterySpec, BikeSpecifications, Controller, ControllerSpec, Drivetrain, Motor, DRIVETRAIN_EFFICIENCY,
};
use crate::error::{SimError, SimResult};

/// Headroom on the steady-state power requirement
const POWER_MARGIN: f64 = 1.2;
/// Extra headroom when matching a catalog motor to the requirement
const MOTOR_SELECTION_MARGIN: f64 = 1.2;
/// Average riding speed as a share of the target top speed
const AVERAGE_SPEED_RATIO: f64 = 0.8;
const CAPACITY_MARGIN: f64 = 1.25;
/// Continuous discharge rate of a standard pack (C)
const PACK_C_RATE: f64 = 2.0;
const CONTROLLER_CURRENT_MARGIN: f64 = 1.15;
const SMALL_BATTERY_WH: f64 = 500.0;
const HIGH_POWER_MOTOR_W: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Drivetrain weight assumed before the first iteration (kg)
    pub initial_weight_estimate_kg: f64,
    pub max_iterations: u32,
    /// Weight change (kg) below which the iteration has converged
    pub tolerance_kg: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            initial_weight_estimate_kg: 12.0,
            max_iterations: 3,
            tolerance_kg: 0.05,
        }
    }
}

/// Result of sizing a drivetrain for one set of specifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionOutcome {
    pub drivetrain: Drivetrain,
    /// Required motor power of the final iteration (W)
    pub required_power_w: f64,
    /// Required pack capacity of the final iteration (Ah)
    pub required_capacity_ah: f64,
    pub voltage_tier_v: f64,
    /// The motor's voltage differs from the tier voltage
    pub voltage_fallback: bool,
    /// No standard pack covered the required capacity
    pub capacity_fallback: bool,
    pub iterations: u32,
    pub converged: bool,
}

impl SelectionOutcome {
    pub fn compatibility(&self) -> CompatibilityReport {
        CompatibilityReport::for_drivetrain(&self.drivetrain)
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        let mut list = recommendations_for(&self.drivetrain);
        if self.voltage_fallback {
            list.push(Recommendation::VoltageTierFallback {
                tier_v: self.voltage_tier_v,
                motor_v: self.drivetrain.motor.voltage_v(),
            });
        }
        list
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub voltage_match: bool,
    /// Controller rating covers the motor's peak current
    pub controller_current_match: bool,
    /// Pack can deliver the controller's rated current
    pub battery_current_match: bool,
    pub motor_peak_current_a: f64,
}

impl CompatibilityReport {
    pub fn for_drivetrain(drivetrain: &Drivetrain) -> Self {
        let motor_peak_current_a = drivetrain.motor.max_current_a();
        Self {
            voltage_match: drivetrain.voltages_match(),
            controller_current_match: drivetrain.controller.max_current_a() >= motor_peak_current_a,
            battery_current_match: drivetrain.battery.max_current_a() >= drivetrain.controller.max_current_a(),
            motor_peak_current_a,
        }
    }

    pub fn is_fully_compatible(&self) -> bool {
        self.voltage_match && self.controller_current_match && self.battery_current_match
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recommendation {
    VoltageMismatch { motor_v: f64, battery_v: f64 },
    UndersizedController { controller_a: f64, motor_peak_a: f64 },
    BatteryCurrentLimited { battery_a: f64, controller_a: f64 },
    SmallBattery { energy_wh: f64 },
    HighPowerMotor { rated_power_w: f64 },
    VoltageTierFallback { tier_v: f64, motor_v: f64 },
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VoltageMismatch { motor_v, battery_v } => {
                write!(f, "Motor voltage ({motor_v:.0} V) does not match battery voltage ({battery_v:.0} V)")
            }
            Self::UndersizedController { controller_a, motor_peak_a } => write!(
                f,
                "Controller ({controller_a:.0} A) may not handle the motor's peak current ({motor_peak_a:.1} A)"
            ),
            Self::BatteryCurrentLimited { battery_a, controller_a } => write!(
                f,
                "Battery ({battery_a:.0} A) may not deliver the controller's rated current ({controller_a:.0} A)"
            ),
            Self::SmallBattery { energy_wh } => {
                write!(f, "Small battery ({energy_wh:.0} Wh), range will be limited")
            }
            Self::HighPowerMotor { rated_power_w } => write!(
                f,
                "High-power motor ({rated_power_w:.0} W) needs good cooling and a strong frame"
            ),
            Self::VoltageTierFallback { tier_v, motor_v } => write!(
                f,
                "No suitable {tier_v:.0} V motor in the catalog, using a {motor_v:.0} V motor"
            ),
        }
    }
}

/// Recommendations that follow from the components alone
pub fn recommendations_for(drivetrain: &Drivetrain) -> Vec<Recommendation> {
    let motor = &drivetrain.motor;
    let battery = &drivetrain.battery;
    let controller = &drivetrain.controller;
    let mut list = Vec::new();

    if !drivetrain.voltages_match() {
        list.push(Recommendation::VoltageMismatch {
            motor_v: motor.voltage_v(),
            battery_v: battery.nominal_voltage_v(),
        });
    }
    if controller.max_current_a() < motor.max_current_a() {
        list.push(Recommendation::UndersizedController {
            controller_a: controller.max_current_a(),
            motor_peak_a: motor.max_current_a(),
        });
    }
    if battery.max_current_a() < controller.max_current_a() {
        list.push(Recommendation::BatteryCurrentLimited {
            battery_a: battery.max_current_a(),
            controller_a: controller.max_current_a(),
        });
    }
    let energy_wh = battery.spec().energy_wh();
    if energy_wh < SMALL_BATTERY_WH {
        list.push(Recommendation::SmallBattery { energy_wh });
    }
    if motor.rated_power_w() > HIGH_POWER_MOTOR_W {
        list.push(Recommendation::HighPowerMotor {
            rated_power_w: motor.rated_power_w(),
        });
    }
    list
}

#[derive(Debug, Clone)]
pub struct ComponentSelector {
    config: SizingConfig,
    motors: &'static [MotorModel],
}

impl Default for ComponentSelector {
    fn default() -> Self {
        Self::new(SizingConfig::default())
    }
}

impl ComponentSelector {
    pub fn new(config: SizingConfig) -> Self {
        Self {
            config,
            motors: MOTOR_CATALOG,
        }
    }

    /// Select from a different motor table
    pub fn with_catalog(mut self, motors: &'static [MotorModel]) -> Self {
        self.motors = motors;
        self
    }

    pub fn config(&self) -> &SizingConfig {
        &self.config
    }

    /// Motor power (W) to hold the target speed on the flat, including
    /// drivetrain losses and margin.
    pub fn required_power(&self, specs: &BikeSpecifications, drivetrain_kg: f64) -> f64 {
        let mass_kg = specs.total_weight_kg() + drivetrain_kg;
        specs.required_power_with_mass(specs.desired_max_speed_kmh, 0.0, mass_kg) * POWER_MARGIN
    }

    /// Pack capacity (Ah) at `voltage_v` to cover the desired range at the
    /// average riding speed, with margin.
    pub fn required_capacity_ah(&self, specs: &BikeSpecifications, drivetrain_kg: f64, voltage_v: f64) -> f64 {
        let average_kmh = specs.desired_max_speed_kmh * AVERAGE_SPEED_RATIO;
        if average_kmh <= 0.0 || voltage_v <= 0.0 {
            return 0.0;
        }
        let average_ms = average_kmh / 3.6;
        let mass_kg = specs.total_weight_kg() + drivetrain_kg;
        let force = ROLLING_RESISTANCE_COEFFICIENT * mass_kg * GRAVITY + aero_drag_force(average_ms);
        let average_power_w = force * average_ms / DRIVETRAIN_EFFICIENCY;

        let hours = specs.desired_max_range_km / average_kmh;
        average_power_w * hours / voltage_v * CAPACITY_MARGIN
    }

    /// Motor for `required_power_w` within `tier`. The flag is set when the
    /// chosen motor is not at the tier voltage.
    pub fn select_motor(&self, required_power_w: f64, tier: &VoltageTier) -> Option<(Motor, bool)> {
        let needed_w = required_power_w * MOTOR_SELECTION_MARGIN;
        let by_power = |a: &&MotorModel, b: &&MotorModel| a.rated_power_w.total_cmp(&b.rated_power_w);
        let voltage_gap = |m: &MotorModel| (m.voltage_v - tier.voltage_v).abs();

        let mut in_tier: Vec<&MotorModel> = self.motors.iter().filter(|m| voltage_gap(*m) < f64::EPSILON).collect();
        in_tier.sort_by(by_power);

        let chosen = in_tier.into_iter().find(|m| m.rated_power_w >= needed_w).or_else(|| {
            let mut nearest: Vec<&MotorModel> = self.motors.iter().collect();
            nearest.sort_by(|a, b| voltage_gap(*a).total_cmp(&voltage_gap(*b)).then_with(|| by_power(a, b)));
            nearest
                .into_iter()
                .find(|m| m.rated_power_w >= needed_w)
                .or_else(|| self.motors.iter().max_by(by_power))
        })?;

        let fallback = voltage_gap(chosen) >= f64::EPSILON;
        if fallback {
            warn!(
                tier_v = tier.voltage_v,
                motor = chosen.name,
                motor_v = chosen.voltage_v,
                "No suitable motor at the tier voltage"
            );
        }
        Some((Motor::new(chosen.to_spec()), fallback))
    }

    /// Smallest standard pack at `voltage_v` holding `required_ah`. The flag
    /// is set when even the largest standard pack falls short.
    pub fn select_battery(&self, required_ah: f64, voltage_v: f64) -> (Battery, bool) {
        let tier = tier_for_voltage(voltage_v);
        let capacities = tier.standard_capacities_ah;
        let (capacity_ah, fallback) = match capacities.iter().copied().find(|c| *c >= required_ah) {
            Some(capacity) => (capacity, false),
            None => {
                let largest = capacities.last().copied().unwrap_or(required_ah);
                warn!(required_ah, largest_ah = largest, voltage_v, "Required capacity exceeds standard packs");
                (largest, true)
            }
        };

        let max_current_a = (capacity_ah * PACK_C_RATE).min(tier.max_battery_current_a);
        let energy_wh = capacity_ah * voltage_v;
        let battery = Battery::new(BatterySpec {
            name: format!("{voltage_v:.0}V {capacity_ah}Ah"),
            capacity_ah,
            nominal_voltage_v: voltage_v,
            max_current_a,
            weight_kg: battery_weight_kg(energy_wh),
        });
        (battery, fallback)
    }

    /// Smallest standard controller covering the motor's peak current with
    /// margin, stepped down to what the pack can supply.
    pub fn select_controller(&self, motor: &Motor, battery: &Battery) -> Controller {
        let required_a = motor.max_current_a() * CONTROLLER_CURRENT_MARGIN;
        let largest = CONTROLLER_RATINGS_A[CONTROLLER_RATINGS_A.len() - 1];
        let mut rating_a = CONTROLLER_RATINGS_A
            .iter()
            .copied()
            .find(|r| *r >= required_a)
            .unwrap_or(largest);

        if rating_a > battery.max_current_a() {
            rating_a = CONTROLLER_RATINGS_A
                .iter()
                .copied()
                .filter(|r| *r <= battery.max_current_a())
                .last()
                .unwrap_or(CONTROLLER_RATINGS_A[0]);
            debug!(rating_a, battery_a = battery.max_current_a(), "Controller capped by battery current");
        }

        Controller::new(ControllerSpec {
            name: format!("{rating_a:.0}A Controller"),
            max_current_a: rating_a,
            weight_kg: controller_weight_kg(rating_a),
        })
    }

    /// Size a motor/battery/controller set for `specs`.
    pub fn select_components(&self, specs: &BikeSpecifications) -> SimResult<SelectionOutcome> {
        specs.validate_inputs()?;

        let max_iterations = self.config.max_iterations.max(1);
        let mut estimate_kg = self.config.initial_weight_estimate_kg.max(0.0);
        let mut last: Option<SelectionOutcome> = None;

        for iteration in 1..=max_iterations {
            let required_power_w = self.required_power(specs, estimate_kg);
            let tier = tier_for_power(required_power_w);
            let (motor, voltage_fallback) = self
                .select_motor(required_power_w, tier)
                .ok_or_else(|| SimError::invalid("motor catalog is empty"))?;

            let voltage_v = motor.voltage_v();
            let required_capacity_ah = self.required_capacity_ah(specs, estimate_kg, voltage_v);
            let (battery, capacity_fallback) = self.select_battery(required_capacity_ah, voltage_v);
            let controller = self.select_controller(&motor, &battery);

            let drivetrain = Drivetrain::new(motor, battery, controller);
            let weight_kg = drivetrain.weight_kg();
            let converged = (weight_kg - estimate_kg).abs() < self.config.tolerance_kg;
            debug!(iteration, required_power_w, estimate_kg, weight_kg, "Sizing iteration");

            estimate_kg = weight_kg;
            last = Some(SelectionOutcome {
                drivetrain,
                required_power_w,
                required_capacity_ah,
                voltage_tier_v: tier.voltage_v,
                voltage_fallback,
                capacity_fallback,
                iterations: iteration,
                converged,
            });
            if converged {
                break;
            }
        }

        let outcome = last.ok_or_else(|| SimError::invalid("sizing ran no iterations"))?;
        info!(
            motor = outcome.drivetrain.motor.name(),
            battery = outcome.drivetrain.battery.name(),
            controller = outcome.drivetrain.controller.name(),
            weight_kg = outcome.drivetrain.weight_kg(),
            iterations = outcome.iterations,
            converged = outcome.converged,
            "Components selected"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sizing::catalog::VOLTAGE_TIERS;
    use rstest::rstest;

    #[test]
    fn test_example_specs() {
        let specs = BikeSpecifications::default();
        let outcome = ComponentSelector::default().select_components(&specs).unwrap();
        let dt = &outcome.drivetrain;

        assert!((outcome.required_power_w - 545.0).abs() < 10.0, "{}", outcome.required_power_w);
        assert_eq!(outcome.voltage_tier_v, 48.0);
        assert_eq!(dt.motor.name(), "Bafang BBSHD");
        assert_eq!(dt.battery.capacity_ah(), 13.0);
        assert_eq!(dt.battery.nominal_voltage_v(), 48.0);
        assert_eq!(dt.battery.max_current_a(), 26.0);
        assert_eq!(dt.controller.max_current_a(), 25.0);
        assert!(outcome.converged);
        assert!(!outcome.voltage_fallback);
        assert!(outcome.compatibility().is_fully_compatible());
        assert!(outcome.recommendations().is_empty());
    }

    #[test]
    fn test_invalid_specs_rejected() {
        let specs = BikeSpecifications {
            rider_weight_kg: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            ComponentSelector::default().select_components(&specs),
            Err(SimError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_tier_fallback_to_nearest_voltage() {
        let selector = ComponentSelector::default();
        // 62V tier, but the only 62V motor is too small once margin is applied
        let (motor, fallback) = selector.select_motor(2600.0, &VOLTAGE_TIERS[2]).unwrap();
        assert!(fallback);
        assert_eq!(motor.voltage_v(), 72.0);
        assert_eq!(motor.name(), "QS273 V4");
    }

    #[test]
    fn test_highest_power_when_nothing_fits() {
        let selector = ComponentSelector::default();
        let (motor, _) = selector.select_motor(50_000.0, &VOLTAGE_TIERS[3]).unwrap();
        assert_eq!(motor.name(), "QS273 V4");
    }

    #[test]
    fn test_empty_catalog_is_an_error() {
        let selector = ComponentSelector::default().with_catalog(&[]);
        assert!(selector.select_components(&BikeSpecifications::default()).is_err());
    }

    #[test]
    fn test_battery_capacity_fallback_and_current_cap() {
        let selector = ComponentSelector::default();
        let (battery, fallback) = selector.select_battery(100.0, 36.0);
        assert!(fallback);
        assert_eq!(battery.capacity_ah(), 20.0);
        assert_eq!(battery.max_current_a(), 30.0);

        let (battery, fallback) = selector.select_battery(12.0, 48.0);
        assert!(!fallback);
        assert_eq!(battery.capacity_ah(), 13.0);
        assert_eq!(battery.max_current_a(), 26.0);
    }

    #[test]
    fn test_controller_steps_down_to_battery_limit() {
        let selector = ComponentSelector::default();
        let motor = Motor::new(MOTOR_CATALOG[3].to_spec());
        let (strong, _) = selector.select_battery(20.0, 48.0);
        assert_eq!(selector.select_controller(&motor, &strong).max_current_a(), 30.0);

        let (weak, _) = selector.select_battery(12.0, 48.0);
        let controller = selector.select_controller(&motor, &weak);
        assert_eq!(controller.max_current_a(), 25.0);
        assert_eq!(controller.weight_kg(), 0.45);
    }

    #[test]
    fn test_recommendations_flag_weak_components() {
        let selector = ComponentSelector::default();
        let motor = Motor::new(MOTOR_CATALOG[6].to_spec());
        let (battery, _) = selector.select_battery(5.0, 36.0);
        let controller = selector.select_controller(&motor, &battery);
        let list = recommendations_for(&Drivetrain::new(motor, battery, controller));

        assert!(list.iter().any(|r| matches!(r, Recommendation::VoltageMismatch { .. })));
        assert!(list.iter().any(|r| matches!(r, Recommendation::UndersizedController { .. })));
        assert!(list.iter().any(|r| matches!(r, Recommendation::SmallBattery { .. })));
        assert!(list.iter().any(|r| matches!(r, Recommendation::HighPowerMotor { .. })));
        assert!(list[0].to_string().contains("72 V"));
    }

    #[rstest]
    #[case(48.0, true)]
    #[case(48.05, true)]
    #[case(48.2, false)]
    #[case(52.0, false)]
    fn test_voltage_match_uses_one_tolerance(#[case] battery_v: f64, #[case] matched: bool) {
        let selector = ComponentSelector::default();
        let motor = Motor::new(MOTOR_CATALOG[3].to_spec());
        let (pack, _) = selector.select_battery(13.0, 48.0);
        let battery = Battery::new(BatterySpec {
            nominal_voltage_v: battery_v,
            ..pack.spec().clone()
        });
        let controller = selector.select_controller(&motor, &battery);
        let drivetrain = Drivetrain::new(motor, battery, controller);

        assert_eq!(drivetrain.motor.voltage_v(), 48.0);
        assert_eq!(drivetrain.voltages_match(), matched);
        assert_eq!(CompatibilityReport::for_drivetrain(&drivetrain).voltage_match, matched);
        let mismatch_flagged = recommendations_for(&drivetrain)
            .iter()
            .any(|r| matches!(r, Recommendation::VoltageMismatch { .. }));
        assert_eq!(mismatch_flagged, !matched);
    }

    #[test]
    fn test_fast_heavy_build_moves_up_a_tier() {
        let specs = BikeSpecifications {
            rider_weight_kg: 110.0,
            bike_weight_kg: 35.0,
            desired_max_speed_kmh: 60.0,
            desired_max_range_km: 80.0,
            ..Default::default()
        };
        let outcome = ComponentSelector::default().select_components(&specs).unwrap();
        assert!(outcome.voltage_tier_v >= 62.0);
        assert_eq!(outcome.drivetrain.motor.voltage_v(), outcome.drivetrain.battery.nominal_voltage_v());
        assert!(outcome.iterations <= 3);
    }
}
