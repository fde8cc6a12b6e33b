//! # Environmental Sweeps
//!
//! Re-run the range test across a grid of ambient temperatures or wind
//! conditions. Every leg runs on a forked simulator, so no thermal or charge
//! state leaks between legs or back into the caller.

use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::info;

use super::simulator::BikeSimulator;
use crate::domain::{Environment, Wind, WindDirection};

pub const SWEEP_TEMPERATURES_C: [f64; 6] = [-10.0, 0.0, 10.0, 20.0, 30.0, 40.0];
pub const SWEEP_WIND_SPEEDS_MS: [f64; 4] = [0.0, 5.0, 10.0, 15.0];

/// Average speed over a leg (km/h); the time floor keeps empty legs finite
fn leg_efficiency(range_km: f64, time_s: f64) -> f64 {
    range_km / (time_s / 3600.0).max(0.1 / 3600.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureTest {
    pub ambient_c: f64,
    pub range_km: f64,
    pub time_s: f64,
    pub final_battery_temp_c: f64,
    /// Range per hour of riding (km/h)
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemperatureImpact {
    pub tests: Vec<TemperatureTest>,
}

impl TemperatureImpact {
    pub fn add_test(&mut self, ambient_c: f64, range_km: f64, time_s: f64, final_battery_temp_c: f64) {
        self.tests.push(TemperatureTest {
            ambient_c,
            range_km,
            time_s,
            final_battery_temp_c,
            efficiency: leg_efficiency(range_km, time_s),
        });
    }

    pub fn best(&self) -> Option<&TemperatureTest> {
        self.tests.iter().max_by_key(|t| OrderedFloat(t.efficiency))
    }

    pub fn worst(&self) -> Option<&TemperatureTest> {
        self.tests.iter().min_by_key(|t| OrderedFloat(t.efficiency))
    }

    /// Ambient temperature of the best leg, 20°C when nothing was tested
    pub fn optimal_temperature(&self) -> f64 {
        self.best().map(|t| t.ambient_c).unwrap_or(20.0)
    }

    /// Range gap between the best and worst legs (km, % of worst)
    pub fn range_spread(&self) -> Option<(f64, f64)> {
        let (best, worst) = (self.best()?, self.worst()?);
        let spread = best.range_km - worst.range_km;
        let percent = if worst.range_km > 0.0 {
            spread / worst.range_km * 100.0
        } else {
            0.0
        };
        Some((spread, percent))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindImpactResult {
    pub direction: WindDirection,
    pub wind_speed_ms: f64,
    pub range_km: f64,
    pub time_s: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindImpactTest {
    pub results: Vec<WindImpactResult>,
}

impl WindImpactTest {
    pub fn add_result(&mut self, direction: WindDirection, wind_speed_ms: f64, range_km: f64, time_s: f64) {
        self.results.push(WindImpactResult {
            direction,
            wind_speed_ms,
            range_km,
            time_s,
            efficiency: leg_efficiency(range_km, time_s),
        });
    }

    pub fn best(&self) -> Option<&WindImpactResult> {
        self.results.iter().max_by_key(|r| OrderedFloat(r.efficiency))
    }

    pub fn worst(&self) -> Option<&WindImpactResult> {
        self.results.iter().min_by_key(|r| OrderedFloat(r.efficiency))
    }

    /// Legs grouped by direction, each group sorted by wind speed
    pub fn by_direction(&self) -> Vec<(WindDirection, Vec<WindImpactResult>)> {
        WindDirection::iter()
            .map(|direction| {
                let legs = self
                    .results
                    .iter()
                    .filter(|r| r.direction == direction)
                    .copied()
                    .sorted_by_key(|r| OrderedFloat(r.wind_speed_ms))
                    .collect_vec();
                (direction, legs)
            })
            .filter(|(_, legs)| !legs.is_empty())
            .collect()
    }
}

impl BikeSimulator {
    /// Range test at `speed_kmh` for each sweep temperature, with the battery
    /// soaked at that temperature.
    pub fn test_temperature_impact(&self, speed_kmh: f64) -> TemperatureImpact {
        let mut impact = TemperatureImpact::default();

        for ambient_c in SWEEP_TEMPERATURES_C {
            let environment = Environment::new(ambient_c, Wind::calm());
            let mut leg = self.fork(environment);
            leg.drivetrain_mut().battery.force_temperature(ambient_c);

            let result = leg.test_range(speed_kmh);
            impact.add_test(ambient_c, result.total_distance_km, result.total_time_s, result.final_battery_temp_c);
        }

        info!(
            speed_kmh,
            optimal_c = impact.optimal_temperature(),
            "Temperature sweep complete"
        );
        impact
    }

    /// Range test at `speed_kmh` for every wind speed and direction at the
    /// current ambient temperature.
    pub fn test_wind_impact(&self, speed_kmh: f64) -> WindImpactTest {
        let mut test = WindImpactTest::default();
        let ambient_c = self.environment().temperature_c;

        for (direction, wind_speed_ms) in WindDirection::iter().cartesian_product(SWEEP_WIND_SPEEDS_MS) {
            let environment = Environment::new(ambient_c, Wind::new(wind_speed_ms, direction));
            let result = self.fork(environment).test_range(speed_kmh);
            test.add_result(direction, wind_speed_ms, result.total_distance_km, result.total_time_s);
        }

        info!(speed_kmh, legs = test.results.len(), "Wind sweep complete");
        test
    }
}
