// tests/simulation_properties.rs
//
// Whole-run properties of the intersection model, checked step by step.

use intersection_ca::control_system::traffic_light_controller::{ControllerMode, SignalState};
use intersection_ca::data_structures::CellState;
use intersection_ca::error::InvalidConfiguration;
use intersection_ca::global_variables::V_MAX;
use intersection_ca::shared_data::Metrics;
use intersection_ca::simulation_engine::grid::Grid;
use intersection_ca::simulation_engine::simulation::Simulation;

const MAX_STEPS: u64 = 10_000;

fn assert_grid_invariants(grid: &Grid) {
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            let v = grid.velocity(row, col);
            assert!(
                v.row().abs() <= V_MAX && v.col().abs() <= V_MAX,
                "speed limit broken at ({row}, {col}): {v:?}"
            );
            if grid.cell(row, col) != CellState::Car {
                assert!(v.is_zero(), "velocity on an empty cell ({row}, {col})");
            }
        }
    }
}

/// Steps `sim` to the end, checking the per-step invariants on the way.
fn run_checked(mut sim: Simulation) -> Metrics {
    assert_grid_invariants(sim.grid());
    let mut previous = sim.metrics();
    let mut signal = sim.signal_state();

    while !sim.metrics().stopped {
        assert!(previous.overall_time < MAX_STEPS, "run did not finish");
        sim.step();
        let metrics = sim.metrics();
        assert_grid_invariants(sim.grid());
        assert_eq!(metrics.stopped, sim.car_count() == 0);

        assert_eq!(metrics.overall_time, previous.overall_time + 1);
        assert!(metrics.time_delay >= previous.time_delay);
        assert!(metrics.time_delay - previous.time_delay <= sim.total_cars() as u64);

        let next = sim.signal_state();
        assert!(
            next == signal || next == signal.next(),
            "signal jumped from {signal:?} to {next:?}"
        );
        signal = next;
        previous = metrics;
    }
    previous
}

#[test]
fn invariants_hold_across_densities() {
    for (cars, seed) in [(1, 1), (5, 2), (15, 3), (28, 4)] {
        let sim = Simulation::new(cars, 0.8, 5.0, 8, 8, seed).unwrap();
        let metrics = run_checked(sim);
        assert!(metrics.stopped);
        assert!(metrics.time_delay <= metrics.overall_time * cars as u64);
    }
}

#[test]
fn invariants_hold_on_a_larger_grid() {
    for mode in [ControllerMode::Classic, ControllerMode::Adaptive] {
        let sim = Simulation::with_mode(60, mode, 1.3, 5.0, 20, 24, 11).unwrap();
        assert!(run_checked(sim).stopped);
    }
}

#[test]
fn signal_visits_every_phase_in_order() {
    // A full 16x16 road keeps cars queued well past one signal cycle.
    let capacity = Grid::layout(16, 16).unwrap().road_cell_count();
    let mut sim =
        Simulation::with_mode(capacity, ControllerMode::Classic, 0.8, 5.0, 16, 16, 1).unwrap();
    let mut seen = vec![sim.signal_state()];
    while seen.len() < 5 {
        assert!(!sim.metrics().stopped, "emptied before a full cycle");
        sim.step();
        if sim.signal_state() != *seen.last().unwrap() {
            seen.push(sim.signal_state());
        }
    }
    assert_eq!(
        seen,
        [
            SignalState::Red,
            SignalState::RedToGreen,
            SignalState::Green,
            SignalState::GreenToRed,
            SignalState::Red
        ]
    );
}

#[test]
fn identical_inputs_give_identical_grids() {
    let mut a = Simulation::new(20, 0.8, 5.0, 12, 12, 99).unwrap();
    let mut b = Simulation::new(20, 0.8, 5.0, 12, 12, 99).unwrap();
    assert_eq!(a.grid(), b.grid());
    while !a.metrics().stopped {
        assert!(a.metrics().overall_time < MAX_STEPS);
        a.step();
        b.step();
        assert_eq!(a.grid(), b.grid());
        assert_eq!(a.signal_state(), b.signal_state());
        assert_eq!(a.metrics(), b.metrics());
    }
    assert!(b.metrics().stopped);
}

#[test]
fn single_car_reference_run() {
    let run = || {
        let mut sim = Simulation::new(1, 0.8, 5.0, 8, 8, 42).unwrap();
        sim.run_to_completion(MAX_STEPS).unwrap()
    };
    let metrics = run();
    assert_eq!(
        metrics,
        Metrics {
            overall_time: 2,
            time_delay: 0,
            stopped: true
        }
    );
    assert_eq!(run(), metrics);
}

#[test]
fn no_cars_stops_after_one_step() {
    let mut sim = Simulation::new(0, 0.8, 5.0, 8, 8, 42).unwrap();
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
fn stopped_stays_set() {
    let mut sim = Simulation::new(3, 0.8, 5.0, 8, 8, 5).unwrap();
    let metrics = sim.run_to_completion(MAX_STEPS).unwrap();
    for _ in 0..3 {
        assert!(sim.metrics().stopped);
        assert_eq!(sim.run_to_completion(MAX_STEPS), Some(metrics));
    }
}

#[test]
fn overflowing_the_road_is_rejected() {
    let capacity = Grid::layout(10, 10).unwrap().road_cell_count();
    assert!(Simulation::new(capacity, 0.8, 5.0, 10, 10, 1).is_ok());
    assert!(matches!(
        Simulation::new(capacity + 1, 0.8, 5.0, 10, 10, 1),
        Err(InvalidConfiguration::TooManyCars { .. })
    ));
    assert!(matches!(
        Simulation::new(0, 0.8, 5.0, 4, 10, 1),
        Err(InvalidConfiguration::GridTooSmall { .. })
    ));
}
