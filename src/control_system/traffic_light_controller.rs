use crate::data_structures::{CellState, Vector2};
use crate::global_variables::{TIME_ORANGE, TIME_STABLE};
use crate::simulation_engine::grid::Grid;
use serde::{Deserialize, Serialize};

/// Signal phases, always visited in this cyclic order.
///
/// `Red` lets the vertical road cross, `Green` the horizontal one; the two
/// orange phases close the crossing for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalState {
    Red,
    RedToGreen,
    Green,
    GreenToRed,
}

impl SignalState {
    pub fn next(self) -> Self {
        match self {
            SignalState::Red => SignalState::RedToGreen,
            SignalState::RedToGreen => SignalState::Green,
            SignalState::Green => SignalState::GreenToRed,
            SignalState::GreenToRed => SignalState::Red,
        }
    }

    /// Crossing permission while in this state.
    pub fn permission(self) -> Vector2 {
        match self {
            SignalState::Red => Vector2::new(1, 0),
            SignalState::Green => Vector2::new(0, 1),
            SignalState::RedToGreen | SignalState::GreenToRed => Vector2::ZERO,
        }
    }

    pub fn is_transitional(self) -> bool {
        matches!(self, SignalState::RedToGreen | SignalState::GreenToRed)
    }
}

/// How the stable phases decide when to end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerMode {
    /// Hold red and green for `TIME_STABLE` steps each.
    Classic,
    /// Switch when the queue pressure on the waiting road outweighs the
    /// flowing one by more than the threshold.
    #[default]
    Adaptive,
}

/// Queue pressure on each road, see [`pressure`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pressure {
    pub horizontal: f64,
    pub vertical: f64,
}

/// Sums `(1 / d)^power` over every car queued on an approach, where `d` is
/// its distance in cells to the stop line (1 for the car on the stop line).
/// Only the incoming half of each road is scanned; the crossing and the
/// outgoing halves never count.
pub fn pressure(grid: &Grid, power: f64) -> Pressure {
    let (h, l) = (grid.rows(), grid.cols());
    let weight = |distance: usize| (1.0 / distance as f64).powf(power);
    let is_car = |row: usize, col: usize| grid.cell(row, col) == CellState::Car;
    let mut p = Pressure::default();

    // Heading right on the upper row, heading left on the lower row.
    for col in 0..l / 2 - 1 {
        if is_car(h / 2 - 1, col) {
            p.horizontal += weight(l / 2 - 1 - col);
        }
    }
    for col in l / 2 + 1..l {
        if is_car(h / 2, col) {
            p.horizontal += weight(col - l / 2);
        }
    }

    // Heading down on the right column, heading up on the left column.
    for row in 0..h / 2 - 1 {
        if is_car(row, l / 2) {
            p.vertical += weight(h / 2 - 1 - row);
        }
    }
    for row in h / 2 + 1..h {
        if is_car(row, l / 2 - 1) {
            p.vertical += weight(row - h / 2);
        }
    }

    p
}

/// `waiting / flowing > threshold`, where an empty flowing side counts as
/// infinitely outweighed as long as someone is waiting.
fn outweighs(waiting: f64, flowing: f64, threshold: f64) -> bool {
    if flowing == 0.0 {
        waiting > 0.0
    } else {
        waiting / flowing > threshold
    }
}

/// The four-phase signal at the crossing.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficLightController {
    state: SignalState,
    mode: ControllerMode,
    power: f64,
    threshold: f64,
    iterations_in_state: u32,
}

impl TrafficLightController {
    /// Starts in `Red`, matching the vertical permission the grid is built with.
    pub fn new(mode: ControllerMode, power: f64, threshold: f64) -> Self {
        Self {
            state: SignalState::Red,
            mode,
            power,
            threshold,
            iterations_in_state: 0,
        }
    }

    pub fn state(&self) -> SignalState {
        self.state
    }

    pub fn mode(&self) -> ControllerMode {
        self.mode
    }

    pub fn iterations_in_state(&self) -> u32 {
        self.iterations_in_state
    }

    /// Counts one more step spent in the current state.
    pub fn tick(&mut self) {
        self.iterations_in_state += 1;
    }

    /// Decides whether the current state ends now. On a transition the
    /// counter restarts and the crossing permission in `grid` is rewritten.
    /// Returns whether a transition happened.
    pub fn check(&mut self, grid: &mut Grid) -> bool {
        let switch = if self.state.is_transitional() {
            self.iterations_in_state >= TIME_ORANGE
        } else {
            match self.mode {
                ControllerMode::Classic => self.iterations_in_state >= TIME_STABLE,
                ControllerMode::Adaptive => {
                    let p = pressure(grid, self.power);
                    let fire = match self.state {
                        SignalState::Red => outweighs(p.horizontal, p.vertical, self.threshold),
                        _ => outweighs(p.vertical, p.horizontal, self.threshold),
                    };
                    if fire {
                        log::debug!(
                            "pressure fh={:.3} fv={:.3} ends {:?}",
                            p.horizontal,
                            p.vertical,
                            self.state
                        );
                    }
                    fire
                }
            }
        };

        if switch {
            self.switch_state(grid);
        }
        switch
    }

    fn switch_state(&mut self, grid: &mut Grid) {
        let next = self.state.next();
        log::debug!(
            "signal {:?} -> {:?} after {} steps",
            self.state,
            next,
            self.iterations_in_state
        );
        self.state = next;
        self.iterations_in_state = 0;
        grid.set_crossing_permission(next.permission());
    }
}
