// simulation_main.rs
use intersection_ca::config::ExperimentConfig;
use intersection_ca::monitoring::render::render_png;
use intersection_ca::simulation_engine::simulation::Simulation;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

/// Runs one visualised simulation with the configured car count and prints
/// its metrics as JSON. Usage: `simulation_main [config.json]`.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    run().inspect_err(|e| log::error!("simulation failed: {e}"))
}

fn run() -> Result<(), Box<dyn Error>> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = ExperimentConfig::load(config_path.as_deref())?;
    let (rows, cols) = config.grid_dimensions();

    let mut sim = Simulation::with_mode(
        config.cars,
        config.mode,
        config.power,
        config.threshold,
        rows,
        cols,
        config.seed,
    )?;
    log::info!(
        "{rows}x{cols} grid, {} cars, {:?} controller",
        sim.total_cars(),
        config.mode
    );

    if let Some(dir) = &config.render.frames_dir {
        fs::create_dir_all(dir)?;
    }

    let mut step = 0u64;
    while !sim.metrics().stopped && step < config.max_steps_per_run {
        if let Some(dir) = &config.render.frames_dir {
            if step % config.render.render_every == 0 {
                let path = dir.join(format!("frame_{step:05}.png"));
                render_png(&sim.snapshot(), &path, config.render.pixels_per_cell)?;
            }
        }
        log::trace!("step {step}, signal {:?}\n{}", sim.signal_state(), sim.snapshot());
        sim.step();
        step += 1;
    }

    let metrics = sim.metrics();
    if !metrics.stopped {
        log::warn!(
            "{} cars still on the grid after {step} steps",
            sim.car_count()
        );
    }
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}
