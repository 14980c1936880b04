// simulation.rs
use crate::control_system::traffic_light_controller::{
    ControllerMode, SignalState, TrafficLightController,
};
use crate::error::InvalidConfiguration;
use crate::shared_data::{Metrics, Snapshot};
use crate::simulation_engine::grid::Grid;
use crate::simulation_engine::movement::{accelerate, decelerate, move_cars};

/// One run of the intersection model. Owns all mutable state; the driver
/// replaces the whole value to start a new run.
#[derive(Debug, Clone)]
pub struct Simulation {
    grid: Grid,
    controller: TrafficLightController,
    total_cars: usize,
    overall_time: u64,
    time_delay: u64,
    stopped: bool,
}

impl Simulation {
    /// A run with the adaptive controller. Fails if the grid is too small or
    /// cannot hold `total_cars`.
    pub fn new(
        total_cars: usize,
        power: f64,
        threshold: f64,
        rows: usize,
        cols: usize,
        seed: u64,
    ) -> Result<Self, InvalidConfiguration> {
        Self::with_mode(
            total_cars,
            ControllerMode::Adaptive,
            power,
            threshold,
            rows,
            cols,
            seed,
        )
    }

    pub fn with_mode(
        total_cars: usize,
        mode: ControllerMode,
        power: f64,
        threshold: f64,
        rows: usize,
        cols: usize,
        seed: u64,
    ) -> Result<Self, InvalidConfiguration> {
        let grid = Grid::build(rows, cols, total_cars, seed)?;
        log::debug!(
            "new {rows}x{cols} run: {total_cars} cars, {mode:?} p={power} k={threshold}, seed {seed}"
        );
        Ok(Self::from_parts(
            grid,
            TrafficLightController::new(mode, power, threshold),
        ))
    }

    /// A run over a prepared grid. The controller's state should match the
    /// crossing permission already in the grid.
    pub fn from_parts(grid: Grid, controller: TrafficLightController) -> Self {
        Self {
            total_cars: grid.car_count(),
            grid,
            controller,
            overall_time: 0,
            time_delay: 0,
            stopped: false,
        }
    }

    /// Advances the model by one step: accelerate, brake, move, then let the
    /// signal react and update the counters.
    ///
    /// Must not be called once [`Metrics::stopped`] is set; build a new
    /// simulation instead.
    pub fn step(&mut self) {
        accelerate(&mut self.grid);
        decelerate(&mut self.grid);
        let outcome = move_cars(&self.grid);
        self.grid = outcome.grid;
        self.time_delay += outcome.stalled;
        if outcome.exited > 0 {
            log::trace!(
                "step {}: {} cars left, {} still on the grid",
                self.overall_time + 1,
                outcome.exited,
                self.grid.car_count()
            );
        }

        self.controller.tick();
        self.controller.check(&mut self.grid);

        self.overall_time += 1;
        if !self.grid.has_cars() {
            if !self.stopped {
                log::debug!(
                    "grid emptied after {} steps, delay {}",
                    self.overall_time,
                    self.time_delay
                );
            }
            self.stopped = true;
        }
    }

    /// Steps until the grid is empty or `max_steps` steps have been taken in
    /// total. Returns the final metrics if the grid emptied.
    pub fn run_to_completion(&mut self, max_steps: u64) -> Option<Metrics> {
        while !self.stopped && self.overall_time < max_steps {
            self.step();
        }
        self.stopped.then(|| self.metrics())
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            rows: self.grid.rows(),
            cols: self.grid.cols(),
            cells: self.grid.cells(),
            signal: self.controller.state(),
        }
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            overall_time: self.overall_time,
            time_delay: self.time_delay,
            stopped: self.stopped,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn signal_state(&self) -> SignalState {
        self.controller.state()
    }

    pub fn iterations_in_state(&self) -> u32 {
        self.controller.iterations_in_state()
    }

    /// Cars requested at construction.
    pub fn total_cars(&self) -> usize {
        self.total_cars
    }

    /// Cars still on the grid.
    pub fn car_count(&self) -> usize {
        self.grid.car_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::CellState;

    #[test]
    fn empty_run_stops_after_first_step() {
        let mut sim = Simulation::new(0, 0.8, 5.0, 8, 8, 1).unwrap();
        assert!(!sim.metrics().stopped);
        sim.step();
        assert_eq!(
            sim.metrics(),
            Metrics {
                overall_time: 1,
                time_delay: 0,
                stopped: true
            }
        );
    }

    #[test]
    fn capacity_is_every_road_cell() {
        let capacity = Grid::layout(8, 8).unwrap().road_cell_count();
        let full = Simulation::new(capacity, 0.8, 5.0, 8, 8, 9).unwrap();
        assert_eq!(full.car_count(), capacity);
        assert!(full
            .grid()
            .road_cells()
            .all(|(r, c)| full.grid().cell(r, c) == CellState::Car));

        let err = Simulation::new(capacity + 1, 0.8, 5.0, 8, 8, 9).unwrap_err();
        assert_eq!(
            err,
            InvalidConfiguration::TooManyCars {
                requested: capacity + 1,
                capacity
            }
        );
    }

    /// One car approaching a red light from the left, traced by hand:
    /// the light turns orange as soon as the car queues, the car waits two
    /// steps at the stop line, then crosses on green and leaves.
    #[test]
    fn single_car_waits_at_orange_then_leaves() {
        let mut grid = Grid::layout(8, 8).unwrap();
        assert!(grid.place_car(3, 0, 1));
        let mut sim = Simulation::from_parts(
            grid,
            TrafficLightController::new(ControllerMode::Adaptive, 0.8, 5.0),
        );

        sim.step();
        assert_eq!(sim.grid().cell(3, 2), CellState::Car);
        assert_eq!(sim.signal_state(), SignalState::RedToGreen);

        sim.step();
        sim.step();
        assert_eq!(sim.grid().cell(3, 2), CellState::Car);
        assert_eq!(sim.signal_state(), SignalState::Green);
        assert_eq!(sim.metrics().time_delay, 2);

        let metrics = sim.run_to_completion(100).unwrap();
        assert_eq!(
            metrics,
            Metrics {
                overall_time: 6,
                time_delay: 2,
                stopped: true
            }
        );
        assert_eq!(sim.signal_state(), SignalState::Green);
    }

    #[test]
    fn run_to_completion_respects_cap() {
        let mut sim = Simulation::new(20, 0.8, 5.0, 8, 8, 4).unwrap();
        let _ = sim.run_to_completion(1);
        assert_eq!(sim.metrics().overall_time, 1);
    }

    #[test]
    fn snapshot_reflects_grid_and_signal() {
        let sim = Simulation::new(3, 0.8, 5.0, 8, 8, 5).unwrap();
        let snapshot = sim.snapshot();
        assert_eq!((snapshot.rows, snapshot.cols), (8, 8));
        assert_eq!(snapshot.signal, SignalState::Red);
        assert_eq!(
            snapshot.cells.iter().filter(|&&c| c == CellState::Car).count(),
            3
        );
        assert_eq!(snapshot.cell(1, 1), CellState::TrafficLight);
    }
}
