//! Nagel-Schreckenberg update rules on a [`Grid`]: accelerate, brake for the
//! nearest obstacle, then relocate every car into a fresh buffer.

use crate::data_structures::{CellState, Vector2};
use crate::global_variables::V_MAX;
use crate::simulation_engine::grid::Grid;

/// Distance reported when the ray leaves the grid without hitting anything.
pub const UNBOUNDED: i32 = i32::MAX;

/// Result of one move pass.
#[derive(Debug)]
pub struct MoveOutcome {
    /// The next grid.
    pub grid: Grid,
    /// Cars that stood still during this pass.
    pub stalled: u64,
    /// Cars that drove off the edge and left the simulation.
    pub exited: usize,
}

/// Panics if a car's velocity breaks the model: a component above `V_MAX`,
/// or a component pointing against (or across) its lane direction.
fn check_heading(grid: &Grid, row: usize, col: usize) {
    let v = grid.velocity(row, col);
    let dir = grid.direction(row, col);
    assert!(
        within_speed_limit(v),
        "velocity {v:?} at ({row}, {col}) exceeds V_MAX"
    );
    let opposed = |speed: i32, heading: i32| speed != 0 && speed.signum() != heading;
    assert!(
        !opposed(v.row(), dir.row()) && !opposed(v.col(), dir.col()),
        "velocity {v:?} at ({row}, {col}) does not follow lane direction {dir:?}"
    );
}

/// Speeds every car up by one cell per step along the lane axis that is
/// permitted at its cell, up to `V_MAX`.
///
/// A car that is already moving only accelerates on the axis it travels.
pub fn accelerate(grid: &mut Grid) {
    let cars: Vec<(usize, usize)> = grid.car_positions().collect();
    for (row, col) in cars {
        let v = grid.velocity(row, col);
        let mut permitted = grid.direction(row, col).hadamard(grid.permission(row, col));
        if v.row() != 0 {
            permitted = permitted.with_col(0);
        } else if v.col() != 0 {
            permitted = permitted.with_row(0);
        }

        let mut next = v;
        if permitted.row() != 0 && v.row().abs() < V_MAX {
            next = next.with_row(v.row() + permitted.row().signum());
        }
        if permitted.col() != 0 && v.col().abs() < V_MAX {
            next = next.with_col(v.col() + permitted.col().signum());
        }
        grid.set_velocity(row, col, next);
        check_heading(grid, row, col);
    }
}

/// Number of free road cells a car at `(row, col)` can advance before it
/// reaches an obstacle, marching one cell at a time along the sign of its
/// velocity.
///
/// The march stops at the first cell that is not `Road` (a wall, the traffic
/// light block, another car) or at the first cell where the permission for a
/// travelled axis drops from 1 to 0, which is a closed crossing. Leaving the
/// grid returns [`UNBOUNDED`]. A car whose neighbour ahead is blocked gets 0.
pub fn obstacle_distance(grid: &Grid, row: usize, col: usize) -> i32 {
    let step = grid.velocity(row, col).signum();
    let origin = grid.permission(row, col);
    let (mut y, mut x) = (row as i64, col as i64);
    let mut distance = 0;

    loop {
        y += step.row() as i64;
        x += step.col() as i64;
        let Some((r, c)) = grid.checked_position(y, x) else {
            return UNBOUNDED;
        };

        let here = grid.permission(r, c);
        let closed = (step.row() != 0 && origin.row() != 0 && here.row() == 0)
            || (step.col() != 0 && origin.col() != 0 && here.col() == 0);
        if closed || grid.cell(r, c) != CellState::Road {
            return distance;
        }
        distance += 1;
    }
}

/// Caps every car's speed at its obstacle distance, keeping the sign.
pub fn decelerate(grid: &mut Grid) {
    let cars: Vec<(usize, usize)> = grid.car_positions().collect();
    for (row, col) in cars {
        check_heading(grid, row, col);
        let v = grid.velocity(row, col);
        if v.is_zero() {
            continue;
        }
        let gap = obstacle_distance(grid, row, col);
        let capped = if v.row() > gap {
            v.with_row(gap)
        } else if v.row() < -gap {
            v.with_row(-gap)
        } else if v.col() > gap {
            v.with_col(gap)
        } else if v.col() < -gap {
            v.with_col(-gap)
        } else {
            v
        };
        grid.set_velocity(row, col, capped);
    }
}

/// Relocates every car by its velocity into a freshly cleared grid.
///
/// Writing into a separate buffer is required: updating in place would let a
/// car that already moved be read again, or be overwritten by one behind it.
/// Cars whose destination is off the grid are removed. If two cars land on
/// the same cell the later one in row-major order wins.
pub fn move_cars(grid: &Grid) -> MoveOutcome {
    let mut next = grid.cleared();
    let mut stalled = 0;
    let mut exited = 0;

    for (row, col) in grid.car_positions() {
        let v = grid.velocity(row, col);
        if v.is_zero() {
            stalled += 1;
        }
        let target = grid.checked_position(
            row as i64 + v.row() as i64,
            col as i64 + v.col() as i64,
        );
        match target {
            Some((r, c)) => {
                if next.put_car(r, c, v) {
                    log::warn!("car from ({row}, {col}) overwrote another car at ({r}, {c})");
                }
            }
            None => {
                log::trace!("car at ({row}, {col}) with velocity {v:?} left the grid");
                exited += 1;
            }
        }
    }

    MoveOutcome {
        grid: next,
        stalled,
        exited,
    }
}

/// True when `v` is within `V_MAX` on both axes.
pub fn within_speed_limit(v: Vector2) -> bool {
    v.row().abs() <= V_MAX && v.col().abs() <= V_MAX
}
