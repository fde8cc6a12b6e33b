use serde::{Deserialize, Serialize};
use validator::Validate;

use super::environment::{aero_drag_force, GRAVITY, ROLLING_RESISTANCE_COEFFICIENT};
use crate::error::{SimError, SimResult};

/// Drivetrain efficiency assumed when converting wheel power to motor power
pub const DRIVETRAIN_EFFICIENCY: f64 = 0.8;

/// Rider, bike and the targets the drivetrain is sized for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BikeSpecifications {
    /// Rider weight (kg)
    #[validate(range(exclusive_min = 0.0))]
    pub rider_weight_kg: f64,
    /// Bike weight without drivetrain components (kg)
    #[validate(range(exclusive_min = 0.0))]
    pub bike_weight_kg: f64,
    /// Wheel diameter (inches)
    #[validate(range(exclusive_min = 0.0))]
    pub wheel_diameter_in: f64,
    /// Desired top speed (km/h)
    #[validate(range(exclusive_min = 0.0))]
    pub desired_max_speed_kmh: f64,
    /// Desired range on one charge (km)
    #[validate(range(min = 0.0))]
    pub desired_max_range_km: f64,
}

impl Default for BikeSpecifications {
    fn default() -> Self {
        Self {
            rider_weight_kg: 80.0,
            bike_weight_kg: 25.0,
            wheel_diameter_in: 26.0,
            desired_max_speed_kmh: 35.0,
            desired_max_range_km: 50.0,
        }
    }
}

impl BikeSpecifications {
    /// Rider + bike weight (kg)
    pub fn total_weight_kg(&self) -> f64 {
        self.rider_weight_kg + self.bike_weight_kg
    }

    pub fn wheel_diameter_m(&self) -> f64 {
        self.wheel_diameter_in * 0.0254
    }

    pub fn wheel_circumference_m(&self) -> f64 {
        std::f64::consts::PI * self.wheel_diameter_m()
    }

    /// Wheel revolutions per minute at a ground speed in km/h
    pub fn wheel_rpm(&self, speed_kmh: f64) -> f64 {
        let circumference = self.wheel_circumference_m();
        if circumference <= 0.0 {
            return 0.0;
        }
        (speed_kmh / 3.6) * 60.0 / circumference
    }

    /// Motor power (W) needed to hold `speed_kmh` on a `grade_percent` slope
    /// with no wind, including drivetrain losses.
    pub fn required_power(&self, speed_kmh: f64, grade_percent: f64) -> f64 {
        self.required_power_with_mass(speed_kmh, grade_percent, self.total_weight_kg())
    }

    pub(crate) fn required_power_with_mass(
        &self,
        speed_kmh: f64,
        grade_percent: f64,
        mass_kg: f64,
    ) -> f64 {
        let speed_ms = speed_kmh / 3.6;
        let rolling = ROLLING_RESISTANCE_COEFFICIENT * mass_kg * GRAVITY;
        let air = aero_drag_force(speed_ms);
        let grade = if grade_percent != 0.0 {
            mass_kg * GRAVITY * (grade_percent / 100.0).atan().sin()
        } else {
            0.0
        };

        (rolling + air + grade) * speed_ms / DRIVETRAIN_EFFICIENCY
    }

    /// Speed (km/h) at which `wheel_power_w` exactly balances rolling and
    /// aerodynamic resistance for a bike of `mass_kg`, on the flat with no
    /// wind. Bisection on [0, 200] km/h.
    pub fn steady_state_speed_kmh(&self, wheel_power_w: f64, mass_kg: f64) -> f64 {
        if wheel_power_w <= 0.0 {
            return 0.0;
        }
        let resistive_power = |speed_ms: f64| {
            (ROLLING_RESISTANCE_COEFFICIENT * mass_kg * GRAVITY + aero_drag_force(speed_ms)) * speed_ms
        };

        let (mut low, mut high) = (0.0_f64, 200.0 / 3.6);
        for _ in 0..60 {
            let mid = 0.5 * (low + high);
            if resistive_power(mid) < wheel_power_w {
                low = mid;
            } else {
                high = mid;
            }
        }
        0.5 * (low + high) * 3.6
    }

    /// Validate for the sizing entry points. Non-finite values are rejected
    /// alongside the range checks.
    pub fn validate_inputs(&self) -> SimResult<()> {
        let fields = [
            ("rider_weight_kg", self.rider_weight_kg),
            ("bike_weight_kg", self.bike_weight_kg),
            ("wheel_diameter_in", self.wheel_diameter_in),
            ("desired_max_speed_kmh", self.desired_max_speed_kmh),
            ("desired_max_range_km", self.desired_max_range_km),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SimError::invalid(format!("{name} must be finite, got {value}")));
        }
        self.validate()?;
        Ok(())
    }

    pub fn description(&self) -> String {
        format!(
            "Weight: {:.1} kg (bike {:.1} kg + rider {:.1} kg), wheels: {}\", targets: {} km/h, {} km",
            self.total_weight_kg(),
            self.bike_weight_kg,
            self.rider_weight_kg,
            self.wheel_diameter_in,
            self.desired_max_speed_kmh,
            self.desired_max_range_km
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_derived_values() {
        let specs = BikeSpecifications::default();
        assert_eq!(specs.total_weight_kg(), 105.0);
        assert!((specs.wheel_diameter_m() - 0.6604).abs() < 1e-9);
        assert!((specs.wheel_circumference_m() - 2.0747).abs() < 1e-3);
    }

    #[test]
    fn test_required_power_grows_with_grade() {
        let specs = BikeSpecifications::default();
        let flat = specs.required_power(25.0, 0.0);
        let climb = specs.required_power(25.0, 5.0);
        assert!(flat > 0.0);
        assert!(climb > flat * 2.0);
    }

    #[test]
    fn test_steady_state_speed_inverts_power_balance() {
        let specs = BikeSpecifications::default();
        let mass = specs.total_weight_kg();
        let power = specs.required_power(30.0, 0.0) * DRIVETRAIN_EFFICIENCY;
        let speed = specs.steady_state_speed_kmh(power, mass);
        assert!((speed - 30.0).abs() < 0.01, "speed = {speed}");
        assert_eq!(specs.steady_state_speed_kmh(0.0, mass), 0.0);
    }

    #[test]
    fn test_wheel_rpm() {
        let specs = BikeSpecifications::default();
        let rpm = specs.wheel_rpm(25.0);
        assert!((rpm - 200.8).abs() < 1.0, "rpm = {rpm}");
    }

    #[rstest]
    #[case::rider(|s: &mut BikeSpecifications| s.rider_weight_kg = 0.0)]
    #[case::bike(|s: &mut BikeSpecifications| s.bike_weight_kg = -5.0)]
    #[case::wheel(|s: &mut BikeSpecifications| s.wheel_diameter_in = 0.0)]
    #[case::speed(|s: &mut BikeSpecifications| s.desired_max_speed_kmh = 0.0)]
    #[case::range(|s: &mut BikeSpecifications| s.desired_max_range_km = -1.0)]
    #[case::nan(|s: &mut BikeSpecifications| s.rider_weight_kg = f64::NAN)]
    fn test_invalid_specs_rejected(#[case] mutate: fn(&mut BikeSpecifications)) {
        let mut specs = BikeSpecifications::default();
        mutate(&mut specs);
        assert!(matches!(specs.validate_inputs(), Err(SimError::InvalidInput(_))));
    }

    #[test]
    fn test_default_specs_valid() {
        assert!(BikeSpecifications::default().validate_inputs().is_ok());
    }
}
