// experiment_main.rs
use intersection_ca::config::ExperimentConfig;
use intersection_ca::flow_analyzer::ExperimentDriver;
use intersection_ca::monitoring::csv_report::CsvReport;
use std::error::Error;
use std::path::PathBuf;

/// Sweeps car counts and controller parameters, appending the averaged
/// results to the two CSV files named in the config.
/// Usage: `experiment_main [config.json]`.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    run().inspect_err(|e| log::error!("experiment failed: {e}"))
}

fn run() -> Result<(), Box<dyn Error>> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = ExperimentConfig::load(config_path.as_deref())?;
    let (rows, cols) = config.grid_dimensions();
    log::info!(
        "experiment on a {rows}x{cols} grid, {} runs per car count, writing {} and {}",
        config.runs_per_count,
        config.overall_time_csv.display(),
        config.time_delay_csv.display()
    );

    let report = CsvReport::append_to(&config.overall_time_csv, &config.time_delay_csv)?;
    let mut driver = ExperimentDriver::new(config, report);
    let summary = driver.run()?;
    driver.into_sink().into_inner()?;

    for generation in &summary.generations {
        log::info!(
            "{}: {} car counts measured, road holds {}",
            generation.params.label(),
            generation.points.len(),
            generation.capacity
        );
    }
    Ok(())
}
