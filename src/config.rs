use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::{BikeSpecifications, Environment, Wind, WindDirection};
use crate::i18n::Language;
use crate::simulation::SimulationSettings;
use crate::sizing::SizingConfig;
use crate::wiring::WiringSettings;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bike: BikeSpecifications,
    pub environment: EnvironmentConfig,
    pub simulation: SimulationSettings,
    pub sizing: SizingConfig,
    pub wiring: WiringSettings,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub temperature_c: f64,
    pub wind_speed_ms: f64,
    pub wind_direction: WindDirection,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            temperature_c: 20.0,
            wind_speed_ms: 0.0,
            wind_direction: WindDirection::Headwind,
        }
    }
}

impl EnvironmentConfig {
    pub fn to_environment(&self) -> Environment {
        Environment::new(self.temperature_c, Wind::new(self.wind_speed_ms, self.wind_direction))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Emit logs as JSON lines instead of human-readable text
    pub json_logs: bool,
    /// Run the temperature and wind sweeps after the main tests
    pub run_sweeps: bool,
    /// Cruising speed for the range test and sweeps (km/h)
    pub cruise_speed_kmh: f64,
    pub language: Language,
    /// Write the range run's time series here as CSV
    pub csv_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_logs: false,
            run_sweeps: false,
            cruise_speed_kmh: 25.0,
            language: Language::Primary,
            csv_path: None,
        }
    }
}

impl Config {
    /// Built-in defaults, then `config/default.toml`, then `EBIKE__*`
    /// environment variables (`EBIKE__BIKE__RIDER_WEIGHT_KG=90`).
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("EBIKE__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.bike.validate_inputs()?;
        if !(self.output.cruise_speed_kmh.is_finite() && self.output.cruise_speed_kmh > 0.0) {
            anyhow::bail!("output.cruise_speed_kmh must be positive, got {}", self.output.cruise_speed_kmh);
        }
        if self.wiring.battery_to_controller_m <= 0.0 || self.wiring.controller_to_motor_m <= 0.0 {
            anyhow::bail!("wiring lengths must be positive");
        }
        if self.wiring.max_drop_percent <= 0.0 {
            anyhow::bail!("wiring.max_drop_percent must be positive");
        }
        Ok(())
    }
}
