// src/shared_data.rs

use crate::control_system::traffic_light_controller::SignalState;
use crate::data_structures::CellState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters of one run, read by the experiment driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    /// Steps taken since the run started.
    pub overall_time: u64,
    /// Car-steps spent standing still, summed over all cars.
    pub time_delay: u64,
    /// Set once a step leaves no car on the grid; never cleared.
    pub stopped: bool,
}

/// Read-only view handed to the renderer.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub rows: usize,
    pub cols: usize,
    /// Row-major cell tags.
    pub cells: &'a [CellState],
    pub signal: SignalState,
}

impl Snapshot<'_> {
    pub fn cell(&self, row: usize, col: usize) -> CellState {
        self.cells[row * self.cols + col]
    }
}

/// One character per cell: `#` wall, `.` road, `o` car, and the light block
/// as `R`, `G` or `Y` depending on the signal.
impl fmt::Display for Snapshot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let light = match self.signal {
            SignalState::Red => 'R',
            SignalState::Green => 'G',
            SignalState::RedToGreen | SignalState::GreenToRed => 'Y',
        };
        for row in 0..self.rows {
            for col in 0..self.cols {
                let symbol = match self.cell(row, col) {
                    CellState::Wall => '#',
                    CellState::Road => '.',
                    CellState::Car => 'o',
                    CellState::TrafficLight => light,
                };
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Adaptive controller tuning: exponent and switching threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterPair {
    pub power: f64,
    pub threshold: f64,
}

impl ParameterPair {
    /// The pair tried after a sweep overflows the road: raise the power in
    /// steps of 0.5 up to 2, then raise the threshold by 10 and start the
    /// power over at 0.5.
    pub fn next(self) -> Self {
        if self.power < 2.0 {
            Self {
                power: self.power + 0.5,
                threshold: self.threshold,
            }
        } else {
            Self {
                power: 0.5,
                threshold: self.threshold + 10.0,
            }
        }
    }

    /// Row label in the result files, e.g. `p=0.8;k=5`.
    pub fn label(&self) -> String {
        format!("p={};k={}", self.power, self.threshold)
    }
}

/// Averages over all runs with the same car count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub total_cars: usize,
    pub mean_overall_time: f64,
    pub mean_time_delay: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_mutation_follows_power_then_threshold() {
        let mut pair = ParameterPair {
            power: 0.5,
            threshold: 5.0,
        };
        let mut seen = Vec::new();
        for _ in 0..4 {
            pair = pair.next();
            seen.push((pair.power, pair.threshold));
        }
        assert_eq!(seen, vec![(1.0, 5.0), (1.5, 5.0), (2.0, 5.0), (0.5, 15.0)]);
    }

    #[test]
    fn label_format() {
        let pair = ParameterPair {
            power: 0.5,
            threshold: 15.0,
        };
        assert_eq!(pair.label(), "p=0.5;k=15");
    }

    #[test]
    fn snapshot_draws_characters() {
        let cells = [
            CellState::Wall,
            CellState::Road,
            CellState::Car,
            CellState::TrafficLight,
        ];
        let snapshot = Snapshot {
            rows: 2,
            cols: 2,
            cells: &cells,
            signal: SignalState::GreenToRed,
        };
        assert_eq!(snapshot.to_string(), "#.\noY\n");
    }
}
