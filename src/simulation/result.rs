//! # Ride Results
//!
//! A finished run: the full sample sequence plus the aggregates derived from
//! it. Results round-trip through a flat CSV format whose aggregates are
//! rebuilt purely by reducing the rows.

use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::data::{ComponentKind, SimulationData, ThermalStatus};
use crate::domain::is_depleted_soc;
use crate::error::{SimError, SimResult};

pub const CSV_HEADER: [&str; 11] = [
    "Time(s)",
    "Speed(km/h)",
    "Distance(km)",
    "MotorTemp(C)",
    "ControllerTemp(C)",
    "BatteryTemp(C)",
    "BatterySOC(%)",
    "Current(A)",
    "Power(W)",
    "WindEffect(%)",
    "TempEffect(%)",
];

/// Columns that must be present in every row; the two effect columns may be
/// omitted and default to zero.
const REQUIRED_COLUMNS: usize = 9;
/// Fraction of the target speed that counts as reaching it
const SPEED_REACHED_RATIO: f64 = 0.95;

/// Seconds spent in each thermal regime
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ThermalTimes {
    pub normal_s: f64,
    pub warning_s: f64,
    pub critical_s: f64,
}

impl ThermalTimes {
    pub fn total_s(&self) -> f64 {
        self.normal_s + self.warning_s + self.critical_s
    }

    /// (normal, warning, critical) as percentages of the total
    pub fn percentages(&self) -> (f64, f64, f64) {
        let total = self.total_s();
        if total <= 0.0 {
            return (0.0, 0.0, 0.0);
        }
        (
            self.normal_s / total * 100.0,
            self.warning_s / total * 100.0,
            self.critical_s / total * 100.0,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationResult {
    pub data: Vec<SimulationData>,
    pub total_distance_km: f64,
    pub total_time_s: f64,
    pub max_speed_kmh: f64,
    pub battery_empty: bool,
    pub average_wind_impact_pct: f64,
    pub average_temp_impact_pct: f64,
    pub final_battery_temp_c: f64,
}

/// Flat digest of a run for reports and logs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub total_distance_km: f64,
    pub total_time_s: f64,
    pub max_speed_kmh: f64,
    pub average_speed_kmh: f64,
    pub average_power_w: f64,
    pub peak_power_w: f64,
    pub energy_consumed_wh: f64,
    pub energy_efficiency_km_per_kwh: f64,
    pub max_motor_temp_c: f64,
    pub max_controller_temp_c: f64,
    pub final_battery_temp_c: f64,
    pub battery_depleted: bool,
    pub wind_impact_pct: f64,
    pub temp_impact_pct: f64,
    pub thermal_times: ThermalTimes,
}

impl SimulationSummary {
    pub fn thermal_time_percentages(&self) -> (f64, f64, f64) {
        self.thermal_times.percentages()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    values.map(OrderedFloat).max().map(|v| v.0).unwrap_or(0.0)
}

impl SimulationResult {
    /// Build a result whose aggregates are reduced from `data` alone.
    pub fn from_samples(data: Vec<SimulationData>) -> Self {
        let Some(last) = data.last().copied() else {
            return Self::default();
        };

        Self {
            total_distance_km: max_of(data.iter().map(|d| d.distance_km)),
            total_time_s: max_of(data.iter().map(|d| d.time_s)),
            max_speed_kmh: max_of(data.iter().map(|d| d.speed_kmh)),
            battery_empty: is_depleted_soc(last.battery_soc),
            average_wind_impact_pct: mean(data.iter().map(|d| d.wind_effect_pct)),
            average_temp_impact_pct: mean(data.iter().map(|d| d.temp_effect_pct)),
            final_battery_temp_c: last.battery_temp_c,
            data,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Time (s) of the first sample at or above `target_kmh`
    pub fn acceleration_time(&self, target_kmh: f64) -> Option<f64> {
        self.data.iter().find(|d| d.speed_kmh >= target_kmh).map(|d| d.time_s)
    }

    pub fn average_speed_kmh(&self) -> f64 {
        if self.total_time_s <= 0.0 {
            return 0.0;
        }
        self.total_distance_km / (self.total_time_s / 3600.0)
    }

    pub fn average_power_w(&self) -> f64 {
        mean(self.data.iter().map(|d| d.power_w))
    }

    pub fn average_current_a(&self) -> f64 {
        mean(self.data.iter().map(|d| d.current_a))
    }

    /// Trapezoidal integral of power over time (Wh)
    pub fn energy_consumed_wh(&self) -> f64 {
        self.data
            .iter()
            .tuple_windows()
            .map(|(a, b)| (a.power_w + b.power_w) / 2.0 * (b.time_s - a.time_s) / 3600.0)
            .sum()
    }

    /// Kilometres per kWh; zero when nothing was consumed or travelled
    pub fn energy_efficiency_km_per_kwh(&self) -> f64 {
        let energy = self.energy_consumed_wh();
        if energy <= 0.0 || self.total_distance_km <= 0.0 {
            return 0.0;
        }
        self.total_distance_km / (energy / 1000.0)
    }

    pub fn max_motor_temp_c(&self) -> f64 {
        max_of(self.data.iter().map(|d| d.motor_temp_c))
    }

    pub fn max_controller_temp_c(&self) -> f64 {
        max_of(self.data.iter().map(|d| d.controller_temp_c))
    }

    pub fn peak_power_w(&self) -> f64 {
        max_of(self.data.iter().map(|d| d.power_w))
    }

    pub fn peak_current_a(&self) -> f64 {
        max_of(self.data.iter().map(|d| d.current_a))
    }

    /// Each interval is attributed to the regime of its closing sample.
    pub fn thermal_operating_times(&self) -> ThermalTimes {
        self.data
            .iter()
            .tuple_windows()
            .fold(ThermalTimes::default(), |mut times, (a, b)| {
                let dt = b.time_s - a.time_s;
                match b.thermal_status() {
                    ThermalStatus::Normal => times.normal_s += dt,
                    ThermalStatus::Warning => times.warning_s += dt,
                    ThermalStatus::Critical => times.critical_s += dt,
                }
                times
            })
    }

    fn downsample<F>(&self, max_points: usize, project: F) -> Vec<(f64, f64)>
    where
        F: Fn(&SimulationData) -> (f64, f64),
    {
        let Some(last) = self.data.last() else {
            return Vec::new();
        };
        let n = self.data.len();
        let step = (n / max_points.clamp(1, n)).max(1);

        let mut points: Vec<(f64, f64)> = self.data.iter().step_by(step).map(&project).collect();
        let closing = project(last);
        if !points.iter().any(|(x, _)| (x - closing.0).abs() < 0.001) {
            points.push(closing);
        }
        points
    }

    /// (time s, speed km/h), thinned to about `max_points`; the last sample
    /// is always included.
    pub fn speed_chart(&self, max_points: usize) -> Vec<(f64, f64)> {
        self.downsample(max_points, |d| (d.time_s, d.speed_kmh))
    }

    /// (distance km, SOC %), thinned like [`Self::speed_chart`]
    pub fn discharge_chart(&self, max_points: usize) -> Vec<(f64, f64)> {
        self.downsample(max_points, |d| (d.distance_km, d.battery_soc))
    }

    pub fn point_at_soc(&self, target_soc: f64) -> Option<&SimulationData> {
        self.data.iter().find(|d| d.battery_soc <= target_soc)
    }

    pub fn point_at_temperature(&self, target_c: f64, component: ComponentKind) -> Option<&SimulationData> {
        self.data.iter().find(|d| d.temperature_of(component) >= target_c)
    }

    pub fn has_reached_speed(&self, target_kmh: f64) -> bool {
        self.data.iter().any(|d| d.speed_kmh >= target_kmh * SPEED_REACHED_RATIO)
    }

    pub fn summary(&self) -> SimulationSummary {
        if self.data.is_empty() {
            return SimulationSummary::default();
        }

        SimulationSummary {
            total_distance_km: self.total_distance_km,
            total_time_s: self.total_time_s,
            max_speed_kmh: self.max_speed_kmh,
            average_speed_kmh: self.average_speed_kmh(),
            average_power_w: self.average_power_w(),
            peak_power_w: self.peak_power_w(),
            energy_consumed_wh: self.energy_consumed_wh(),
            energy_efficiency_km_per_kwh: self.energy_efficiency_km_per_kwh(),
            max_motor_temp_c: self.max_motor_temp_c(),
            max_controller_temp_c: self.max_controller_temp_c(),
            final_battery_temp_c: self.final_battery_temp_c,
            battery_depleted: self.battery_empty,
            wind_impact_pct: self.average_wind_impact_pct,
            temp_impact_pct: self.average_temp_impact_pct,
            thermal_times: self.thermal_operating_times(),
        }
    }

    /// Write the header and one fixed-precision row per sample.
    pub fn write_csv<W: Write>(&self, writer: W) -> SimResult<()> {
        let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
        csv_writer.write_record(CSV_HEADER)?;
        for d in &self.data {
            csv_writer.write_record(&[
                format!("{:.2}", d.time_s),
                format!("{:.1}", d.speed_kmh),
                format!("{:.3}", d.distance_km),
                format!("{:.1}", d.motor_temp_c),
                format!("{:.1}", d.controller_temp_c),
                format!("{:.1}", d.battery_temp_c),
                format!("{:.1}", d.battery_soc),
                format!("{:.1}", d.current_a),
                format!("{:.1}", d.power_w),
                format!("{:.1}", d.wind_effect_pct),
                format!("{:.1}", d.temp_effect_pct),
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv(&self) -> SimResult<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Parse rows written by [`Self::write_csv`] and reduce them back into
    /// run-level aggregates. The first row is the header.
    pub fn read_csv<R: Read>(reader: R) -> SimResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut data = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            data.push(parse_row(&record)?);
        }
        Ok(Self::from_samples(data))
    }

    pub fn from_csv(text: &str) -> SimResult<Self> {
        Self::read_csv(text.as_bytes())
    }
}

fn parse_row(record: &csv::StringRecord) -> SimResult<SimulationData> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    if record.len() < REQUIRED_COLUMNS {
        return Err(SimError::MalformedRow {
            line,
            reason: format!("expected at least {REQUIRED_COLUMNS} fields, found {}", record.len()),
        });
    }

    let field = |index: usize| -> SimResult<f64> {
        match record.get(index) {
            None | Some("") if index >= REQUIRED_COLUMNS => Ok(0.0),
            None => Err(SimError::MalformedRow {
                line,
                reason: format!("missing column {}", CSV_HEADER[index]),
            }),
            Some(raw) => raw.parse::<f64>().map_err(|e| SimError::MalformedRow {
                line,
                reason: format!("{}: {e} ({raw:?})", CSV_HEADER[index]),
            }),
        }
    };

    Ok(SimulationData {
        time_s: field(0)?,
        speed_kmh: field(1)?,
        distance_km: field(2)?,
        motor_temp_c: field(3)?,
        controller_temp_c: field(4)?,
        battery_temp_c: field(5)?,
        battery_soc: field(6)?,
        current_a: field(7)?,
        power_w: field(8)?,
        wind_effect_pct: field(9)?,
        temp_effect_pct: field(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time_s: f64, speed_kmh: f64, power_w: f64) -> SimulationData {
        SimulationData {
            time_s,
            speed_kmh,
            distance_km: time_s * speed_kmh / 3600.0,
            motor_temp_c: 30.0 + time_s,
            controller_temp_c: 25.0,
            battery_temp_c: 21.0,
            battery_soc: 100.0 - time_s,
            current_a: power_w / 48.0,
            power_w,
            wind_effect_pct: 10.0,
            temp_effect_pct: 0.0,
        }
    }

    fn ride() -> SimulationResult {
        SimulationResult::from_samples(vec![
            sample(1.0, 10.0, 500.0),
            sample(2.0, 20.0, 500.0),
            sample(3.0, 30.0, 300.0),
        ])
    }

    #[test]
    fn test_aggregates_reduced_from_samples() {
        let result = ride();
        assert_eq!(result.total_time_s, 3.0);
        assert_eq!(result.max_speed_kmh, 30.0);
        assert!(!result.battery_empty);
        assert_eq!(result.average_wind_impact_pct, 10.0);
        assert_eq!(result.final_battery_temp_c, 21.0);
    }

    #[test]
    fn test_empty_result() {
        let result = SimulationResult::from_samples(Vec::new());
        assert!(result.is_empty());
        assert_eq!(result.energy_consumed_wh(), 0.0);
        assert_eq!(result.peak_current_a(), 0.0);
        assert_eq!(result.summary(), SimulationSummary::default());
        assert!(result.speed_chart(50).is_empty());
    }

    #[test]
    fn test_energy_is_trapezoidal() {
        let result = ride();
        let expected = (500.0 * 1.0 + 400.0 * 1.0) / 3600.0;
        assert!((result.energy_consumed_wh() - expected).abs() < 1e-12);
        assert!(result.energy_efficiency_km_per_kwh() > 0.0);
    }

    #[test]
    fn test_queries() {
        let result = ride();
        assert_eq!(result.acceleration_time(15.0), Some(2.0));
        assert_eq!(result.acceleration_time(50.0), None);
        assert!(result.has_reached_speed(31.0));
        assert!(!result.has_reached_speed(40.0));
        assert_eq!(result.peak_power_w(), 500.0);
        assert_eq!(result.max_motor_temp_c(), 33.0);
        assert_eq!(result.point_at_soc(98.0).map(|d| d.time_s), Some(2.0));
        assert_eq!(
            result.point_at_temperature(32.0, ComponentKind::Motor).map(|d| d.time_s),
            Some(2.0)
        );
        assert!(result.point_at_temperature(90.0, ComponentKind::Controller).is_none());
    }

    #[test]
    fn test_thermal_times() {
        let mut result = ride();
        result.data[2].motor_temp_c = 90.0;
        let times = result.thermal_operating_times();
        assert_eq!(times.normal_s, 1.0);
        assert_eq!(times.warning_s, 1.0);
        assert_eq!(times.percentages(), (50.0, 50.0, 0.0));
    }

    #[test]
    fn test_chart_keeps_last_point() {
        let data = (1..=101).map(|i| sample(i as f64, 20.0, 400.0)).collect();
        let result = SimulationResult::from_samples(data);
        let chart = result.speed_chart(10);
        assert_eq!(chart.first().map(|p| p.0), Some(1.0));
        assert_eq!(chart.last().map(|p| p.0), Some(101.0));
        assert!(chart.len() <= 12);
        assert_eq!(result.discharge_chart(0).len(), 2);
    }

    #[test]
    fn test_csv_header_and_precision() {
        let csv = ride().to_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER.join(",").as_str()));
        assert_eq!(
            lines.next(),
            Some("1.00,10.0,0.003,31.0,25.0,21.0,99.0,10.4,500.0,10.0,0.0")
        );
    }

    #[test]
    fn test_csv_optional_columns() {
        let text = format!("{}\n1.00,10.0,0.003,31.0,25.0,21.0,0.5,10.4,500.0\n", CSV_HEADER.join(","));
        let result = SimulationResult::from_csv(&text).unwrap();
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].wind_effect_pct, 0.0);
        assert!(result.battery_empty);
    }

    #[test]
    fn test_csv_malformed_rows() {
        let short = format!("{}\n1.00,10.0,0.003\n", CSV_HEADER.join(","));
        assert!(matches!(
            SimulationResult::from_csv(&short),
            Err(SimError::MalformedRow { line: 2, .. })
        ));

        let garbage = format!("{}\n1.00,fast,0.003,31.0,25.0,21.0,99.0,10.4,500.0,0,0\n", CSV_HEADER.join(","));
        assert!(matches!(
            SimulationResult::from_csv(&garbage),
            Err(SimError::MalformedRow { .. })
        ));
    }

    #[test]
    fn test_csv_empty_input() {
        let result = SimulationResult::from_csv("").unwrap();
        assert!(result.is_empty());
    }
}
