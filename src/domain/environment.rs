//! # Riding Environment
//!
//! Ambient temperature and wind. Everything here is a pure function of the
//! stored parameters; no state changes during a run.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Air density at sea level (kg/m³)
pub const AIR_DENSITY: f64 = 1.225;
/// Drag coefficient of an upright rider
pub const DRAG_COEFFICIENT: f64 = 0.9;
/// Frontal area of rider + bike (m²)
pub const FRONTAL_AREA_M2: f64 = 0.5;
/// Tyre rolling-resistance coefficient
pub const ROLLING_RESISTANCE_COEFFICIENT: f64 = 0.01;
/// Gravitational acceleration (m/s²)
pub const GRAVITY: f64 = 9.81;

/// Aerodynamic drag (N) for an airspeed in m/s.
///
/// Signed: a negative airspeed (tailwind faster than the bike) yields a
/// pushing force.
pub fn aero_drag_force(airspeed_ms: f64) -> f64 {
    0.5 * AIR_DENSITY * DRAG_COEFFICIENT * FRONTAL_AREA_M2 * airspeed_ms * airspeed_ms.abs()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WindDirection {
    Headwind,
    Tailwind,
    Crosswind,
}

impl Default for WindDirection {
    fn default() -> Self {
        WindDirection::Headwind
    }
}

/// Wind acting on the rider
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Wind {
    /// Wind speed (m/s)
    pub speed_ms: f64,
    pub direction: WindDirection,
}

impl Wind {
    pub fn new(speed_ms: f64, direction: WindDirection) -> Self {
        Self { speed_ms, direction }
    }

    pub fn calm() -> Self {
        Self::default()
    }

    /// Airspeed seen by the rider (m/s). Crosswind is approximated as
    /// ground speed only.
    pub fn relative_airspeed_ms(&self, bike_speed_kmh: f64) -> f64 {
        let bike_speed_ms = bike_speed_kmh / 3.6;
        match self.direction {
            WindDirection::Headwind => bike_speed_ms + self.speed_ms,
            WindDirection::Tailwind => bike_speed_ms - self.speed_ms,
            WindDirection::Crosswind => bike_speed_ms,
        }
    }

    /// Aerodynamic resistance (N) at a bike speed in km/h, wind included
    pub fn effective_wind_force(&self, bike_speed_kmh: f64) -> f64 {
        aero_drag_force(self.relative_airspeed_ms(bike_speed_kmh))
    }

    /// Relative change of drag caused by the wind, in percent.
    /// Zero when the no-wind drag is zero.
    pub fn impact_percentage(&self, bike_speed_kmh: f64) -> f64 {
        let no_wind = aero_drag_force(bike_speed_kmh / 3.6);
        if no_wind <= 0.0 {
            return 0.0;
        }
        let with_wind = self.effective_wind_force(bike_speed_kmh);
        (with_wind - no_wind) / no_wind * 100.0
    }
}

/// Ambient conditions for a ride
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    /// Ambient air temperature (°C)
    pub temperature_c: f64,
    #[serde(default)]
    pub wind: Wind,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            temperature_c: 20.0,
            wind: Wind::calm(),
        }
    }
}

impl Environment {
    pub fn new(temperature_c: f64, wind: Wind) -> Self {
        Self { temperature_c, wind }
    }

    pub fn with_temperature(mut self, temperature_c: f64) -> Self {
        self.temperature_c = temperature_c;
        self
    }

    pub fn with_wind(mut self, wind: Wind) -> Self {
        self.wind = wind;
        self
    }

    /// Capacity multiplier the ambient temperature imposes on a battery
    /// (1.0 = full capacity at 25°C).
    ///
    /// - Below 0°C: 0.5 at -20°C rising 2.5% per degree
    /// - 0-25°C: 0.7 rising to 1.0
    /// - 25-40°C: falling 1% per degree
    /// - Above 40°C: 0.85 falling 0.5% per degree
    pub fn temperature_impact_on_battery(&self) -> f64 {
        match self.temperature_c {
            t if t <= 0.0 => 0.5 + (t + 20.0) * 0.025,
            t if t <= 25.0 => 0.7 + t * 0.012,
            t if t <= 40.0 => 1.0 - (t - 25.0) * 0.01,
            t => 0.85 - (t - 40.0) * 0.005,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_headwind_increases_drag() {
        let calm = Wind::calm();
        let headwind = Wind::new(5.0, WindDirection::Headwind);
        let tailwind = Wind::new(5.0, WindDirection::Tailwind);

        assert!(headwind.effective_wind_force(25.0) > calm.effective_wind_force(25.0));
        assert!(tailwind.effective_wind_force(25.0) < calm.effective_wind_force(25.0));
    }

    #[test]
    fn test_crosswind_uses_ground_speed() {
        let crosswind = Wind::new(10.0, WindDirection::Crosswind);
        assert_eq!(
            crosswind.effective_wind_force(30.0),
            aero_drag_force(30.0 / 3.6)
        );
        assert_eq!(crosswind.impact_percentage(30.0), 0.0);
    }

    #[test]
    fn test_strong_tailwind_pushes() {
        let tailwind = Wind::new(15.0, WindDirection::Tailwind);
        assert!(tailwind.effective_wind_force(18.0) < 0.0);
    }

    #[test]
    fn test_impact_zero_at_standstill() {
        let headwind = Wind::new(5.0, WindDirection::Headwind);
        assert_eq!(headwind.impact_percentage(0.0), 0.0);
    }

    #[test]
    fn test_temperature_impact_curve() {
        let env = Environment::default().with_temperature(25.0);
        assert!((env.temperature_impact_on_battery() - 1.0).abs() < 1e-9);

        let cold = Environment::default().with_temperature(-20.0);
        assert!((cold.temperature_impact_on_battery() - 0.5).abs() < 1e-9);

        let hot = Environment::default().with_temperature(40.0);
        assert!((hot.temperature_impact_on_battery() - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_direction_parsing() {
        assert_eq!("tailwind".parse::<WindDirection>().ok(), Some(WindDirection::Tailwind));
        assert_eq!(WindDirection::Crosswind.to_string(), "crosswind");
    }

    proptest! {
        #[test]
        fn zero_wind_is_direction_independent(speed_kmh in 0.0f64..80.0) {
            let expected = aero_drag_force(speed_kmh / 3.6);
            for direction in WindDirection::iter() {
                let wind = Wind::new(0.0, direction);
                prop_assert!((wind.effective_wind_force(speed_kmh) - expected).abs() < 1e-9);
            }
        }
    }
}
