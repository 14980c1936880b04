use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// The state tag of a single grid cell. Exactly one per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    Wall,
    Road,
    /// Decoration next to the crossing; only its color changes with the signal.
    TrafficLight,
    Car,
}

/// A pair of integer components addressed by axis: `row` grows downwards,
/// `col` grows to the right.
///
/// Used for lane directions, car velocities and crossing permissions. Values
/// are never mutated in place; the `with_*` helpers return a new vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vector2 {
    row: i32,
    col: i32,
}

impl Vector2 {
    pub const ZERO: Vector2 = Vector2 { row: 0, col: 0 };

    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub const fn row(&self) -> i32 {
        self.row
    }

    pub const fn col(&self) -> i32 {
        self.col
    }

    pub const fn with_row(self, row: i32) -> Self {
        Self { row, col: self.col }
    }

    pub const fn with_col(self, col: i32) -> Self {
        Self { row: self.row, col }
    }

    pub const fn is_zero(&self) -> bool {
        self.row == 0 && self.col == 0
    }

    /// Elementwise product, used to mask a direction by a permission.
    pub const fn hadamard(self, other: Vector2) -> Self {
        Self {
            row: self.row * other.row,
            col: self.col * other.col,
        }
    }

    /// Per-axis sign of the components.
    pub const fn signum(self) -> Self {
        Self {
            row: self.row.signum(),
            col: self.col.signum(),
        }
    }
}

impl Mul<i32> for Vector2 {
    type Output = Vector2;

    fn mul(self, rhs: i32) -> Vector2 {
        Vector2::new(self.row * rhs, self.col * rhs)
    }
}
