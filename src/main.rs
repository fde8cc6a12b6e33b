use anyhow::{Context, Result};
use ebike_sim::{config, i18n, simulation, sizing, telemetry};
use config::Config;
use i18n::{Localizer, StaticTranslations};
use serde::Serialize;
use simulation::{BikeSimulator, SimulationSummary, TemperatureImpact, WindImpactTest};
use sizing::{CompatibilityReport, ComponentSelector, SelectionOutcome};
use telemetry::init_tracing;
use tracing::{info, warn};

#[derive(Serialize)]
struct ThermalStatusReport {
    motor: String,
    controller: String,
    battery: String,
}

#[derive(Serialize)]
struct Report<'a> {
    selection: &'a SelectionOutcome,
    compatibility: CompatibilityReport,
    recommendations: Vec<String>,
    acceleration: SimulationSummary,
    time_to_25_kmh_s: Option<f64>,
    range: SimulationSummary,
    thermal_status: ThermalStatusReport,
    wiring: ebike_sim::wiring::WiringAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature_sweep: Option<TemperatureImpact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wind_sweep: Option<WindImpactTest>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cfg = Config::load().context("loading configuration")?;
    init_tracing(cfg.output.json_logs);

    info!(bike = %cfg.bike.description(), "starting e-bike simulation");

    let selector = ComponentSelector::new(cfg.sizing.clone());
    let outcome = selector
        .select_components(&cfg.bike)
        .context("sizing drivetrain components")?;
    if !outcome.converged {
        warn!(iterations = outcome.iterations, "Sizing did not converge, using the last iteration");
    }

    let mut simulator = BikeSimulator::new(
        cfg.bike.clone(),
        outcome.drivetrain.clone(),
        cfg.environment.to_environment(),
    )
    .with_settings(cfg.simulation.clone());

    let acceleration = simulator.test_acceleration();
    let range = simulator.test_range(cfg.output.cruise_speed_kmh);
    let wiring = simulator.analyze_wiring(&range, &cfg.wiring)?;

    if let Some(path) = &cfg.output.csv_path {
        let file = std::fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
        range.write_csv(file)?;
        info!(path = %path.display(), samples = range.data.len(), "range time series written");
    }

    let localizer = Localizer::new(&StaticTranslations, cfg.output.language);
    let drivetrain = simulator.drivetrain();
    let thermal_status = ThermalStatusReport {
        motor: drivetrain.motor.temperature_status().localized(&localizer),
        controller: drivetrain.controller.temperature_status().localized(&localizer),
        battery: drivetrain.battery.temperature_status().localized(&localizer),
    };

    let (temperature_sweep, wind_sweep) = if cfg.output.run_sweeps {
        (
            Some(simulator.test_temperature_impact(cfg.output.cruise_speed_kmh)),
            Some(simulator.test_wind_impact(cfg.output.cruise_speed_kmh)),
        )
    } else {
        (None, None)
    };

    let report = Report {
        selection: &outcome,
        compatibility: outcome.compatibility(),
        recommendations: outcome.recommendations().iter().map(ToString::to_string).collect(),
        acceleration: acceleration.summary(),
        time_to_25_kmh_s: acceleration.acceleration_time(25.0),
        range: range.summary(),
        thermal_status,
        wiring,
        temperature_sweep,
        wind_sweep,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    info!(
        range_km = range.total_distance_km,
        top_speed_kmh = acceleration.max_speed_kmh,
        "simulation complete"
    );
    Ok(())
}
