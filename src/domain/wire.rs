use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr};

/// Fraction of the rated current a conductor may carry continuously
pub const CONTINUOUS_LOAD_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WireSafety {
    Safe,
    NearLimit,
    OverLimit,
}

/// Copper conductor from the AWG table. Stateless.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wire {
    /// AWG gauge; lower is thicker
    pub awg: u8,
    pub cross_section_mm2: f64,
    /// Rated continuous current (A)
    pub max_current_a: f64,
    pub resistance_ohm_per_m: f64,
}

impl Wire {
    pub const fn new(awg: u8, cross_section_mm2: f64, max_current_a: f64, resistance_ohm_per_m: f64) -> Self {
        Self {
            awg,
            cross_section_mm2,
            max_current_a,
            resistance_ohm_per_m,
        }
    }

    pub fn voltage_drop(&self, current_a: f64, length_m: f64) -> f64 {
        current_a * self.resistance_ohm_per_m * length_m
    }

    pub fn power_loss(&self, current_a: f64, length_m: f64) -> f64 {
        self.voltage_drop(current_a, length_m) * current_a
    }

    /// Share of the transmitted power that reaches the load (0.0-1.0)
    pub fn efficiency(&self, current_a: f64, length_m: f64, system_voltage_v: f64) -> f64 {
        let transmitted = system_voltage_v * current_a;
        if transmitted <= 0.0 {
            return 1.0;
        }
        1.0 - self.power_loss(current_a, length_m) / transmitted
    }

    pub fn is_suitable_for_current(&self, current_a: f64) -> bool {
        current_a <= self.max_current_a * CONTINUOUS_LOAD_RATIO
    }

    pub fn safety(&self, current_a: f64) -> WireSafety {
        if current_a > self.max_current_a {
            WireSafety::OverLimit
        } else if current_a > self.max_current_a * CONTINUOUS_LOAD_RATIO {
            WireSafety::NearLimit
        } else {
            WireSafety::Safe
        }
    }

    /// Longest run (m) that keeps the drop at `current_a` within
    /// `max_drop_v`. Unbounded for a non-positive current.
    pub fn recommended_max_length(&self, current_a: f64, max_drop_v: f64) -> f64 {
        if current_a <= 0.0 || self.resistance_ohm_per_m <= 0.0 {
            return f64::INFINITY;
        }
        max_drop_v / current_a / self.resistance_ohm_per_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AWG_12: Wire = Wire::new(12, 3.31, 41.0, 0.00521);

    #[test]
    fn test_drop_and_loss() {
        assert!((AWG_12.voltage_drop(30.0, 1.0) - 0.1563).abs() < 1e-9);
        assert!((AWG_12.power_loss(30.0, 1.0) - 4.689).abs() < 1e-9);
        let efficiency = AWG_12.efficiency(30.0, 1.0, 48.0);
        assert!(efficiency > 0.99 && efficiency < 1.0);
        assert_eq!(AWG_12.efficiency(0.0, 1.0, 48.0), 1.0);
    }

    #[test]
    fn test_safety_thresholds() {
        assert_eq!(AWG_12.safety(30.0), WireSafety::Safe);
        assert_eq!(AWG_12.safety(35.0), WireSafety::NearLimit);
        assert_eq!(AWG_12.safety(45.0), WireSafety::OverLimit);
        assert!(AWG_12.is_suitable_for_current(32.8));
        assert!(!AWG_12.is_suitable_for_current(33.0));
        assert_eq!(WireSafety::NearLimit.to_string(), "near_limit");
    }

    #[test]
    fn test_recommended_max_length() {
        let length = AWG_12.recommended_max_length(30.0, 1.44);
        assert!((length - 1.44 / 30.0 / 0.00521).abs() < 1e-9);
        assert!(AWG_12.recommended_max_length(0.0, 1.44).is_infinite());
    }
}
