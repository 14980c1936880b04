// sweep.rs

use crate::config::ExperimentConfig;
use crate::error::{ExperimentError, InvalidConfiguration};
use crate::shared_data::{ParameterPair, SweepPoint};
use crate::simulation_engine::simulation::Simulation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Receives sweep results as they are produced.
pub trait SweepSink {
    /// A sweep over car counts starts for `params`.
    fn begin_row(&mut self, params: ParameterPair) -> Result<(), ExperimentError>;
    /// One car count has been averaged.
    fn record(&mut self, point: &SweepPoint) -> Result<(), ExperimentError>;
    /// The road overflowed; the sweep for the current pair is over.
    fn end_row(&mut self) -> Result<(), ExperimentError>;
}

/// Sink that drops everything.
pub struct NullSink;

impl SweepSink for NullSink {
    fn begin_row(&mut self, _params: ParameterPair) -> Result<(), ExperimentError> {
        Ok(())
    }

    fn record(&mut self, _point: &SweepPoint) -> Result<(), ExperimentError> {
        Ok(())
    }

    fn end_row(&mut self) -> Result<(), ExperimentError> {
        Ok(())
    }
}

/// All sweep points measured for one parameter pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub params: ParameterPair,
    pub points: Vec<SweepPoint>,
    /// Road cells of the grid; the sweep stopped one car past this.
    pub capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExperimentSummary {
    pub generations: Vec<Generation>,
}

/// Runs the throughput/delay experiment: for each parameter pair, average
/// `runs_per_count` runs at every car count from the start count until the
/// road is full, then mutate the pair and sweep again from zero cars.
pub struct ExperimentDriver<S: SweepSink> {
    config: ExperimentConfig,
    sink: S,
    seeds: StdRng,
}

impl<S: SweepSink> ExperimentDriver<S> {
    pub fn new(config: ExperimentConfig, sink: S) -> Self {
        let seeds = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            sink,
            seeds,
        }
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn run(&mut self) -> Result<ExperimentSummary, ExperimentError> {
        let mut summary = ExperimentSummary::default();
        let mut params = self.config.parameters();
        let mut total_cars = self.config.start_cars;

        for generation in 0..self.config.max_generations {
            log::info!("generation {generation}: sweeping {}", params.label());
            self.sink.begin_row(params)?;
            let mut points = Vec::new();

            let capacity = loop {
                match self.measure(total_cars, params) {
                    Ok(point) => {
                        log::info!(
                            "cars={} mean time={:.2} mean delay={:.2}",
                            point.total_cars,
                            point.mean_overall_time,
                            point.mean_time_delay
                        );
                        self.sink.record(&point)?;
                        points.push(point);
                        total_cars += 1;
                    }
                    Err(ExperimentError::Configuration(InvalidConfiguration::TooManyCars {
                        capacity,
                        ..
                    })) => break capacity,
                    Err(e) => return Err(e),
                }
            };

            log::info!("road full at {total_cars} cars ({capacity} cells), next parameters");
            self.sink.end_row()?;
            summary.generations.push(Generation {
                params,
                points,
                capacity,
            });
            params = params.next();
            total_cars = 0;
        }

        Ok(summary)
    }

    /// Averages the metrics of `runs_per_count` fresh runs with `total_cars` cars.
    fn measure(
        &mut self,
        total_cars: usize,
        params: ParameterPair,
    ) -> Result<SweepPoint, ExperimentError> {
        let (rows, cols) = self.config.grid_dimensions();
        let runs = self.config.runs_per_count;
        let max_steps = self.config.max_steps_per_run;
        let mut overall_time = 0u64;
        let mut time_delay = 0u64;

        for _ in 0..runs {
            let seed = self.seeds.random::<u64>();
            let mut sim = Simulation::with_mode(
                total_cars,
                self.config.mode,
                params.power,
                params.threshold,
                rows,
                cols,
                seed,
            )?;
            let metrics = sim
                .run_to_completion(max_steps)
                .ok_or(ExperimentError::RunDidNotFinish {
                    total_cars,
                    steps: max_steps,
                })?;
            overall_time += metrics.overall_time;
            time_delay += metrics.time_delay;
        }

        Ok(SweepPoint {
            total_cars,
            mean_overall_time: overall_time as f64 / runs as f64,
            mean_time_delay: time_delay as f64 / runs as f64,
        })
    }
}
