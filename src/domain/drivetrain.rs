use serde::{Deserialize, Serialize};

use super::{Battery, Controller, Motor};

/// Motor and pack voltages closer than this count as matched (V)
pub const VOLTAGE_MATCH_TOLERANCE_V: f64 = 0.1;

/// Motor, battery and controller travelling together as one value.
///
/// Every simulation run works on its own copy; cloning is the only way to
/// share a drivetrain between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drivetrain {
    pub motor: Motor,
    pub battery: Battery,
    pub controller: Controller,
}

impl Drivetrain {
    pub fn new(motor: Motor, battery: Battery, controller: Controller) -> Self {
        Self {
            motor,
            battery,
            controller,
        }
    }

    pub fn weight_kg(&self) -> f64 {
        self.motor.weight_kg() + self.battery.weight_kg() + self.controller.weight_kg()
    }

    pub fn voltages_match(&self) -> bool {
        (self.motor.voltage_v() - self.battery.nominal_voltage_v()).abs() < VOLTAGE_MATCH_TOLERANCE_V
    }

    /// Return every component to its initial state for a ride at `ambient_c`
    pub fn reset(&mut self, ambient_c: f64) {
        self.motor.reset(ambient_c);
        self.controller.reset(ambient_c);
        self.battery.reset();
    }
}
