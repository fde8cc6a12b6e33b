use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Combined thermal regime of the drivetrain at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ThermalStatus {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ComponentKind {
    Motor,
    Controller,
    Battery,
}

/// One sample of a ride trajectory
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationData {
    /// Elapsed time (s)
    pub time_s: f64,
    pub speed_kmh: f64,
    pub distance_km: f64,
    pub motor_temp_c: f64,
    pub controller_temp_c: f64,
    pub battery_temp_c: f64,
    /// Battery state of charge (%)
    pub battery_soc: f64,
    pub current_a: f64,
    pub power_w: f64,
    /// Drag change caused by wind (%)
    pub wind_effect_pct: f64,
    /// Battery capacity lost to temperature (%)
    pub temp_effect_pct: f64,
}

impl SimulationData {
    pub fn is_motor_overheating(&self) -> bool {
        self.motor_temp_c > 80.0
    }

    pub fn is_controller_overheating(&self) -> bool {
        self.controller_temp_c > 70.0
    }

    /// Metres travelled per watt of draw at this instant; zero when idle
    pub fn instant_efficiency(&self) -> f64 {
        if self.power_w <= 0.0 || self.speed_kmh <= 0.0 {
            return 0.0;
        }
        self.speed_kmh * 1000.0 / self.power_w
    }

    pub fn thermal_status(&self) -> ThermalStatus {
        if self.motor_temp_c > 100.0 || self.controller_temp_c > 80.0 || self.battery_temp_c > 50.0 {
            ThermalStatus::Critical
        } else if self.motor_temp_c > 80.0 || self.controller_temp_c > 70.0 || self.battery_temp_c > 45.0 {
            ThermalStatus::Warning
        } else {
            ThermalStatus::Normal
        }
    }

    pub fn temperature_of(&self, component: ComponentKind) -> f64 {
        match component {
            ComponentKind::Motor => self.motor_temp_c,
            ComponentKind::Controller => self.controller_temp_c,
            ComponentKind::Battery => self.battery_temp_c,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SimulationData {
        SimulationData {
            time_s: 1.0,
            speed_kmh: 25.0,
            motor_temp_c: 40.0,
            controller_temp_c: 35.0,
            battery_temp_c: 25.0,
            power_w: 500.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_thermal_status() {
        let mut point = sample();
        assert_eq!(point.thermal_status(), ThermalStatus::Normal);

        point.controller_temp_c = 75.0;
        assert_eq!(point.thermal_status(), ThermalStatus::Warning);
        assert!(point.is_controller_overheating());

        point.battery_temp_c = 55.0;
        assert_eq!(point.thermal_status(), ThermalStatus::Critical);
    }

    #[test]
    fn test_instant_efficiency() {
        let point = sample();
        assert_eq!(point.instant_efficiency(), 50.0);

        let idle = SimulationData::default();
        assert_eq!(idle.instant_efficiency(), 0.0);
    }

    #[test]
    fn test_temperature_of() {
        let point = sample();
        assert_eq!(point.temperature_of(ComponentKind::Motor), 40.0);
        assert_eq!(point.temperature_of(ComponentKind::Battery), 25.0);
    }
}
