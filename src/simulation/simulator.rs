//! # Ride Simulator
//!
//! Integrates one drivetrain through one environment with a fixed time
//! step. Every run has three phases:
//!
//! 1. **Reset**: components return to their initial state at ambient
//! 2. **Integrate**: forces → acceleration → speed/distance → power →
//!    current → battery drain and component heating → sample
//! 3. **Finalize**: aggregates are reduced from the recorded samples
//!
//! The acceleration test, throttle probes and range test are all
//! parameterisations of the same loop ([`RunParameters`]).

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::data::SimulationData;
use super::result::SimulationResult;
use crate::domain::{BikeSpecifications, Drivetrain, Environment, ROLLING_RESISTANCE_COEFFICIENT, GRAVITY};

/// Speed (m/s) substituted when converting power to force near standstill
const MIN_FORCE_SPEED_MS: f64 = 0.1;
const MAX_ACCELERATION_MS2: f64 = 5.0;
const STANDSTILL_SPEED_MS: f64 = 0.01;
const WIND_EFFECT_RANGE_PCT: (f64, f64) = (-50.0, 100.0);
/// A probe within this many km/h of the target ends the coarse grid
const COARSE_TOLERANCE_KMH: f64 = 1.0;
const FINE_TOLERANCE_KMH: f64 = 0.1;
const COARSE_GRID_STEPS: u32 = 10;

/// Which model decides the current drawn from the battery each step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurrentSource {
    /// Controller output for the throttle position
    #[default]
    Controller,
    /// Motor demand for the delivered power, capped by the battery limit
    Demand,
}

/// When a run may end before its horizon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopPolicy {
    /// Stop at force equilibrium or when stalled
    Equilibrium,
    /// Run until the horizon or an empty battery
    DepletionOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunParameters {
    pub throttle: f64,
    pub horizon_s: f64,
    pub step_s: f64,
    pub stop: StopPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub acceleration_horizon_s: f64,
    pub acceleration_step_s: f64,
    /// Horizon of each throttle-search probe (s)
    pub probe_horizon_s: f64,
    /// Horizon of the full-throttle top-speed probe (s)
    pub top_speed_probe_horizon_s: f64,
    pub probe_step_s: f64,
    pub range_horizon_s: f64,
    pub range_step_s: f64,
    /// Bisection probes after the coarse throttle grid
    pub refinement_probes: u32,
    pub current_source: CurrentSource,
    /// Allow the equilibrium/stall heuristic to end short runs early
    pub early_stop: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            acceleration_horizon_s: 30.0,
            acceleration_step_s: 0.05,
            probe_horizon_s: 30.0,
            top_speed_probe_horizon_s: 60.0,
            probe_step_s: 0.1,
            range_horizon_s: 5.0 * 3600.0,
            range_step_s: 1.0,
            refinement_probes: 6,
            current_source: CurrentSource::Controller,
            early_stop: true,
        }
    }
}

impl SimulationSettings {
    /// Coarse steps for quick what-if runs and benchmarks
    pub fn quick() -> Self {
        Self {
            probe_step_s: 0.2,
            range_step_s: 2.0,
            refinement_probes: 3,
            ..Default::default()
        }
    }
}

/// Outcome of the throttle search for a cruising speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrottleSearch {
    pub target_kmh: f64,
    pub throttle: f64,
    /// Settled speed of the chosen throttle's probe
    pub probe_speed_kmh: f64,
    pub top_speed_kmh: f64,
    /// False when the target is at or above top speed
    pub reachable: bool,
    pub probes: u32,
}

pub struct BikeSimulator {
    specs: BikeSpecifications,
    drivetrain: Drivetrain,
    environment: Environment,
    settings: SimulationSettings,
}

impl BikeSimulator {
    pub fn new(specs: BikeSpecifications, drivetrain: Drivetrain, environment: Environment) -> Self {
        Self {
            specs,
            drivetrain,
            environment,
            settings: SimulationSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: SimulationSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn specs(&self) -> &BikeSpecifications {
        &self.specs
    }

    pub fn drivetrain(&self) -> &Drivetrain {
        &self.drivetrain
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Rider, bike and drivetrain (kg)
    pub fn total_mass_kg(&self) -> f64 {
        self.specs.total_weight_kg() + self.drivetrain.weight_kg()
    }

    /// Independent simulator over cloned specs and components
    pub fn fork(&self, environment: Environment) -> Self {
        Self {
            specs: self.specs.clone(),
            drivetrain: self.drivetrain.clone(),
            environment,
            settings: self.settings.clone(),
        }
    }

    pub(crate) fn drivetrain_mut(&mut self) -> &mut Drivetrain {
        &mut self.drivetrain
    }

    fn stop_policy(&self) -> StopPolicy {
        if self.settings.early_stop {
            StopPolicy::Equilibrium
        } else {
            StopPolicy::DepletionOnly
        }
    }

    /// Ride at a fixed throttle for up to `max_time_s`.
    pub fn simulate(&mut self, throttle: f64, max_time_s: f64, step_s: f64) -> SimulationResult {
        let stop = self.stop_policy();
        self.run(RunParameters {
            throttle,
            horizon_s: max_time_s,
            step_s,
            stop,
        })
    }

    /// Core integration loop shared by every test scenario.
    ///
    /// Never fails: a degenerate or unbounded step or horizon yields an
    /// empty result.
    pub fn run(&mut self, params: RunParameters) -> SimulationResult {
        let ambient_c = self.environment.temperature_c;
        self.drivetrain.reset(ambient_c);

        let step_ok = params.step_s > 0.0 && params.step_s.is_finite();
        let horizon_ok = params.horizon_s > 0.0 && params.horizon_s.is_finite();
        if !(step_ok && horizon_ok) {
            debug!(step_s = params.step_s, horizon_s = params.horizon_s, "Degenerate run parameters, nothing simulated");
            return SimulationResult::default();
        }

        let throttle = params.throttle.clamp(0.0, 1.0);
        let dt = params.step_s;
        let mass_kg = self.total_mass_kg();
        let rolling_force = ROLLING_RESISTANCE_COEFFICIENT * mass_kg * GRAVITY;
        let wind = self.environment.wind;
        let current_source = self.settings.current_source;

        let mut data = Vec::new();
        let mut speed_ms = 0.0_f64;
        let mut distance_km = 0.0_f64;
        let mut step: u64 = 0;

        while (step as f64) * dt < params.horizon_s && self.drivetrain.battery.has_charge() {
            let Drivetrain {
                motor,
                battery,
                controller,
            } = &mut self.drivetrain;

            let speed_kmh = speed_ms * 3.6;
            let resistive_force = rolling_force + wind.effective_wind_force(speed_kmh);

            let motor_power_w = motor.output_power(throttle);
            let available_force = motor_power_w / speed_ms.max(MIN_FORCE_SPEED_MS);

            let net_force = available_force - resistive_force;
            let mut acceleration = (net_force / mass_kg).clamp(-MAX_ACCELERATION_MS2, MAX_ACCELERATION_MS2);
            if speed_ms < STANDSTILL_SPEED_MS && net_force < 0.0 {
                acceleration = 0.0;
            }

            speed_ms = (speed_ms + acceleration * dt).max(0.0);
            distance_km += speed_ms * dt / 1000.0;

            let power_w = if speed_ms > STANDSTILL_SPEED_MS {
                ((available_force - net_force) * speed_ms).max(0.0)
            } else {
                motor_power_w
            };

            let current_a = match current_source {
                CurrentSource::Controller => controller.output_current(throttle),
                CurrentSource::Demand => motor
                    .required_current(power_w)
                    .min(battery.max_discharge_current_a()),
            };

            battery.use_charge(current_a, dt / 3600.0, ambient_c);
            motor.update_temperature(power_w, ambient_c, dt);
            controller.update_temperature(current_a, ambient_c, dt);

            let new_speed_kmh = speed_ms * 3.6;
            let wind_effect_pct = if speed_ms < MIN_FORCE_SPEED_MS {
                0.0
            } else {
                wind.impact_percentage(new_speed_kmh)
                    .clamp(WIND_EFFECT_RANGE_PCT.0, WIND_EFFECT_RANGE_PCT.1)
            };

            step += 1;
            let time_s = step as f64 * dt;

            data.push(SimulationData {
                time_s,
                speed_kmh: new_speed_kmh,
                distance_km,
                motor_temp_c: motor.temperature_c(),
                controller_temp_c: controller.temperature_c(),
                battery_temp_c: battery.temperature_c(),
                battery_soc: battery.soc(),
                current_a,
                power_w,
                wind_effect_pct,
                temp_effect_pct: battery.temperature_impact_on_range(),
            });

            if params.stop == StopPolicy::Equilibrium && should_stop(acceleration, speed_ms, time_s) {
                trace!(time_s, speed_kmh = new_speed_kmh, "Early stop");
                break;
            }
        }

        let result = SimulationResult::from_samples(data);

        debug!(
            throttle,
            samples = result.data.len(),
            distance_km = result.total_distance_km,
            time_s = result.total_time_s,
            max_speed_kmh = result.max_speed_kmh,
            battery_empty = result.battery_empty,
            "Simulation run complete"
        );
        result
    }

    /// Full throttle from standstill over the configured short horizon
    pub fn test_acceleration(&mut self) -> SimulationResult {
        let (horizon, step) = (self.settings.acceleration_horizon_s, self.settings.acceleration_step_s);
        self.simulate(1.0, horizon, step)
    }

    fn probe(&mut self, throttle: f64, horizon_s: f64) -> f64 {
        let step = self.settings.probe_step_s;
        let result = self.simulate(throttle, horizon_s, step);
        let speed = result.data.last().map(|d| d.speed_kmh).unwrap_or(0.0);
        trace!(throttle, speed_kmh = speed, "Throttle probe");
        speed
    }

    /// Find the throttle whose settled speed is closest to `target_kmh`.
    ///
    /// One full-throttle probe bounds the search; a target at or above that
    /// top speed returns full throttle. Otherwise a coarse 0.1..1.0 grid is
    /// refined by bisection between the bracketing grid points.
    pub fn find_throttle_for_speed(&mut self, target_kmh: f64) -> ThrottleSearch {
        let top_speed_horizon = self.settings.top_speed_probe_horizon_s;
        let probe_horizon = self.settings.probe_horizon_s;

        let top_speed_kmh = self.probe(1.0, top_speed_horizon);
        let mut probes = 1;

        if target_kmh >= top_speed_kmh {
            debug!(target_kmh, top_speed_kmh, "Target speed unreachable, using full throttle");
            return ThrottleSearch {
                target_kmh,
                throttle: 1.0,
                probe_speed_kmh: top_speed_kmh,
                top_speed_kmh,
                reachable: false,
                probes,
            };
        }

        let mut best = (1.0, top_speed_kmh);
        let mut below: Option<(f64, f64)> = None;
        let mut above: Option<(f64, f64)> = None;
        let closer = |candidate: (f64, f64), best: (f64, f64)| {
            (candidate.1 - target_kmh).abs() < (best.1 - target_kmh).abs()
        };

        for k in 1..=COARSE_GRID_STEPS {
            let throttle = f64::from(k) / f64::from(COARSE_GRID_STEPS);
            let speed = self.probe(throttle, probe_horizon);
            probes += 1;

            if closer((throttle, speed), best) {
                best = (throttle, speed);
            }
            if speed < target_kmh {
                below = Some((throttle, speed));
            } else {
                above = Some((throttle, speed));
            }
            if (speed - target_kmh).abs() < COARSE_TOLERANCE_KMH {
                return self.finish_search(target_kmh, best, top_speed_kmh, probes);
            }
            if above.is_some() {
                break;
            }
        }

        if let (Some((mut low, _)), Some((mut high, _))) = (below, above) {
            for _ in 0..self.settings.refinement_probes {
                let mid = 0.5 * (low + high);
                let speed = self.probe(mid, probe_horizon);
                probes += 1;

                if closer((mid, speed), best) {
                    best = (mid, speed);
                }
                if (speed - target_kmh).abs() < FINE_TOLERANCE_KMH {
                    break;
                }
                if speed < target_kmh {
                    low = mid;
                } else {
                    high = mid;
                }
            }
        }

        self.finish_search(target_kmh, best, top_speed_kmh, probes)
    }

    fn finish_search(&self, target_kmh: f64, best: (f64, f64), top_speed_kmh: f64, probes: u32) -> ThrottleSearch {
        debug!(target_kmh, throttle = best.0, speed_kmh = best.1, probes, "Throttle search complete");
        ThrottleSearch {
            target_kmh,
            throttle: best.0,
            probe_speed_kmh: best.1,
            top_speed_kmh,
            reachable: true,
            probes,
        }
    }

    /// Ride at a fixed throttle until the battery is empty or the range
    /// horizon elapses.
    pub fn simulate_range(&mut self, throttle: f64) -> SimulationResult {
        let params = RunParameters {
            throttle,
            horizon_s: self.settings.range_horizon_s,
            step_s: self.settings.range_step_s,
            stop: StopPolicy::DepletionOnly,
        };
        self.run(params)
    }

    /// Range at a cruising speed: throttle search, then a depletion run
    pub fn test_range(&mut self, speed_kmh: f64) -> SimulationResult {
        let search = self.find_throttle_for_speed(speed_kmh);
        self.simulate_range(search.throttle)
    }
}

fn should_stop(acceleration: f64, speed_ms: f64, time_s: f64) -> bool {
    let equilibrium = acceleration.abs() < 0.01 && time_s > 5.0 && speed_ms > 1.0;
    let stalled = speed_ms < 0.1 && time_s > 10.0;
    equilibrium || stalled
}
