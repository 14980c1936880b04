use crate::data_structures::{CellState, Vector2};
use crate::error::InvalidConfiguration;
use crate::global_variables::{MIN_GRID_DIM, V_MAX};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// The whole cellular automaton state for one step: a `rows x cols` array of
/// cell tags plus three parallel vector fields, stored row-major.
///
/// Layout (fixed at construction):
/// - the two central rows form the horizontal road, the upper one heading
///   right, the lower one heading left;
/// - the two central columns form the vertical road, the left one heading up,
///   the right one heading down;
/// - the 2x2 block where they meet is the crossing, gated by the permission
///   field that the signal controller rewrites;
/// - a 2x2 `TrafficLight` block sits diagonally above-left of the crossing;
/// - everything else is `Wall`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<CellState>,
    directions: Vec<Vector2>,
    velocities: Vec<Vector2>,
    permissions: Vec<Vector2>,
}

impl Grid {
    /// Builds the road layout and places `total_cars` cars uniformly at random
    /// over the road cells, each with a random initial speed in `1..=V_MAX`.
    pub fn build(
        rows: usize,
        cols: usize,
        total_cars: usize,
        seed: u64,
    ) -> Result<Self, InvalidConfiguration> {
        let mut grid = Self::layout(rows, cols)?;
        grid.place_random_cars(total_cars, seed)?;
        Ok(grid)
    }

    /// Builds the empty road layout without any cars.
    pub fn layout(rows: usize, cols: usize) -> Result<Self, InvalidConfiguration> {
        if rows < MIN_GRID_DIM || cols < MIN_GRID_DIM {
            return Err(InvalidConfiguration::GridTooSmall {
                rows,
                cols,
                min: MIN_GRID_DIM,
            });
        }

        // --- Walls everywhere, zero vectors ---
        let size = rows * cols;
        let mut grid = Grid {
            rows,
            cols,
            cells: vec![CellState::Wall; size],
            directions: vec![Vector2::ZERO; size],
            velocities: vec![Vector2::ZERO; size],
            permissions: vec![Vector2::ZERO; size],
        };

        // --- Horizontal road: upper row heads right, lower row heads left ---
        for row in rows / 2 - 1..rows / 2 + 1 {
            let heading = if row < rows / 2 { 1 } else { -1 };
            for col in 0..cols {
                let idx = grid.index(row, col);
                grid.cells[idx] = CellState::Road;
                grid.directions[idx] = grid.directions[idx].with_col(heading);
                grid.permissions[idx] = Vector2::new(0, 1);
            }
        }

        // --- Vertical road: left column heads up, right column heads down ---
        // Crossing cells keep the column heading from the horizontal pass.
        for row in 0..rows {
            for col in cols / 2 - 1..cols / 2 + 1 {
                let heading = if col < cols / 2 { -1 } else { 1 };
                let idx = grid.index(row, col);
                grid.cells[idx] = CellState::Road;
                grid.directions[idx] = grid.directions[idx].with_row(heading);
                grid.permissions[idx] = Vector2::new(1, 0);
            }
        }

        // --- Traffic light decoration ---
        for row in rows / 2 - 3..rows / 2 - 1 {
            for col in cols / 2 - 3..cols / 2 - 1 {
                let idx = grid.index(row, col);
                grid.cells[idx] = CellState::TrafficLight;
            }
        }

        Ok(grid)
    }

    /// Grid size for a viewport measured in pixels, one cell per `scale` pixels.
    pub fn dimensions_for_viewport(
        height_px: usize,
        width_px: usize,
        scale: usize,
    ) -> (usize, usize) {
        (height_px / scale, width_px / scale)
    }

    /// Draws cars from a pool of free road cells without replacement.
    fn place_random_cars(
        &mut self,
        total_cars: usize,
        seed: u64,
    ) -> Result<(), InvalidConfiguration> {
        let mut pool: Vec<(usize, usize)> = self.road_cells().collect();
        if total_cars > pool.len() {
            return Err(InvalidConfiguration::TooManyCars {
                requested: total_cars,
                capacity: pool.len(),
            });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..total_cars {
            let pick = rng.random_range(0..pool.len());
            let (row, col) = pool.swap_remove(pick);
            let speed = rng.random_range(1..=V_MAX);
            self.place_car(row, col, speed);
        }
        Ok(())
    }

    /// Puts a car on a road cell, heading along the lane axis currently open
    /// at that cell. Returns `false` if the cell is not a free road cell or
    /// `speed` is outside `0..=V_MAX`.
    pub fn place_car(&mut self, row: usize, col: usize, speed: i32) -> bool {
        if !(0..=V_MAX).contains(&speed) || row >= self.rows || col >= self.cols {
            return false;
        }
        let idx = self.index(row, col);
        if self.cells[idx] != CellState::Road {
            return false;
        }
        self.cells[idx] = CellState::Car;
        self.velocities[idx] = self.directions[idx].hadamard(self.permissions[idx]) * speed;
        true
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub(crate) fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Converts signed coordinates to a cell position, or `None` off the grid.
    pub fn checked_position(&self, row: i64, col: i64) -> Option<(usize, usize)> {
        if row < 0 || col < 0 || row >= self.rows as i64 || col >= self.cols as i64 {
            None
        } else {
            Some((row as usize, col as usize))
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> CellState {
        self.cells[self.index(row, col)]
    }

    pub fn direction(&self, row: usize, col: usize) -> Vector2 {
        self.directions[self.index(row, col)]
    }

    pub fn velocity(&self, row: usize, col: usize) -> Vector2 {
        self.velocities[self.index(row, col)]
    }

    pub fn permission(&self, row: usize, col: usize) -> Vector2 {
        self.permissions[self.index(row, col)]
    }

    /// Row-major cell tags.
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    pub(crate) fn set_velocity(&mut self, row: usize, col: usize, velocity: Vector2) {
        let idx = self.index(row, col);
        self.velocities[idx] = velocity;
    }

    /// Marks a cell as occupied in a freshly cleared buffer. Returns `true`
    /// if another car had already been written there.
    pub(crate) fn put_car(&mut self, row: usize, col: usize, velocity: Vector2) -> bool {
        let idx = self.index(row, col);
        let overwritten = self.cells[idx] == CellState::Car;
        self.cells[idx] = CellState::Car;
        self.velocities[idx] = velocity;
        overwritten
    }

    /// Rows and columns of the 2x2 crossing.
    pub fn crossing(&self) -> (Range<usize>, Range<usize>) {
        (
            self.rows / 2 - 1..self.rows / 2 + 1,
            self.cols / 2 - 1..self.cols / 2 + 1,
        )
    }

    pub(crate) fn set_crossing_permission(&mut self, permission: Vector2) {
        let (rows, cols) = self.crossing();
        for row in rows {
            for col in cols.clone() {
                let idx = self.index(row, col);
                self.permissions[idx] = permission;
            }
        }
    }

    /// Copy of this grid with every car turned back into road and every
    /// velocity cleared: the write target of a move pass.
    pub(crate) fn cleared(&self) -> Grid {
        let cells = self
            .cells
            .iter()
            .map(|&cell| match cell {
                CellState::Car => CellState::Road,
                other => other,
            })
            .collect();
        Grid {
            rows: self.rows,
            cols: self.cols,
            cells,
            directions: self.directions.clone(),
            velocities: vec![Vector2::ZERO; self.rows * self.cols],
            permissions: self.permissions.clone(),
        }
    }

    /// Positions of every cell that is road, free or occupied.
    pub fn road_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.positions()
            .filter(|&(row, col)| matches!(self.cell(row, col), CellState::Road | CellState::Car))
    }

    pub fn road_cell_count(&self) -> usize {
        self.road_cells().count()
    }

    pub(crate) fn car_positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.positions()
            .filter(|&(row, col)| self.cell(row, col) == CellState::Car)
    }

    pub fn car_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == CellState::Car).count()
    }

    pub fn has_cars(&self) -> bool {
        self.cells.iter().any(|&c| c == CellState::Car)
    }

    fn positions(&self) -> impl Iterator<Item = (usize, usize)> {
        let cols = self.cols;
        (0..self.rows).flat_map(move |row| (0..cols).map(move |col| (row, col)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_of_small_grid() {
        let grid = Grid::layout(8, 8).unwrap();
        assert_eq!(grid.cell(0, 0), CellState::Wall);
        assert_eq!(grid.cell(3, 0), CellState::Road);
        assert_eq!(grid.cell(4, 7), CellState::Road);
        assert_eq!(grid.cell(0, 3), CellState::Road);
        assert_eq!(grid.cell(7, 4), CellState::Road);
        for (row, col) in [(1, 1), (1, 2), (2, 1), (2, 2)] {
            assert_eq!(grid.cell(row, col), CellState::TrafficLight);
        }
        assert_eq!(grid.road_cell_count(), 2 * 8 + 2 * 8 - 4);
    }

    #[test]
    fn lane_directions_and_permissions() {
        let grid = Grid::layout(8, 8).unwrap();
        assert_eq!(grid.direction(3, 0), Vector2::new(0, 1));
        assert_eq!(grid.direction(4, 0), Vector2::new(0, -1));
        assert_eq!(grid.direction(0, 3), Vector2::new(-1, 0));
        assert_eq!(grid.direction(0, 4), Vector2::new(1, 0));
        assert_eq!(grid.permission(3, 0), Vector2::new(0, 1));
        assert_eq!(grid.permission(0, 3), Vector2::new(1, 0));
        assert_eq!(grid.direction(0, 0), Vector2::ZERO);

        // The crossing belongs to both roads and starts open vertically.
        assert_eq!(grid.direction(3, 3), Vector2::new(-1, 1));
        assert_eq!(grid.direction(4, 4), Vector2::new(1, -1));
        assert_eq!(grid.permission(3, 4), Vector2::new(1, 0));
        assert_eq!(grid.crossing(), (3..5, 3..5));
    }

    #[test]
    fn too_small_grid_is_rejected() {
        assert_eq!(
            Grid::layout(5, 8),
            Err(InvalidConfiguration::GridTooSmall {
                rows: 5,
                cols: 8,
                min: MIN_GRID_DIM
            })
        );
    }

    #[test]
    fn placed_cars_move_along_their_lane() {
        let grid = Grid::build(8, 8, 20, 7).unwrap();
        assert_eq!(grid.car_count(), 20);
        for (row, col) in grid.car_positions() {
            let v = grid.velocity(row, col);
            let lane = grid.direction(row, col).hadamard(grid.permission(row, col));
            assert!(!v.is_zero());
            assert_eq!(v.signum(), lane);
            assert!(v.row().abs() <= V_MAX && v.col().abs() <= V_MAX);
        }
    }

    #[test]
    fn viewport_maps_to_cells() {
        assert_eq!(Grid::dimensions_for_viewport(640, 480, 10), (64, 48));
    }

    #[test]
    fn place_car_rejects_occupied_and_wall_cells() {
        let mut grid = Grid::layout(8, 8).unwrap();
        assert!(!grid.place_car(0, 0, 1));
        assert!(grid.place_car(3, 0, 2));
        assert!(!grid.place_car(3, 0, 2));
        assert_eq!(grid.velocity(3, 0), Vector2::new(0, 2));
    }

    #[test]
    fn place_car_rejects_speeds_outside_the_limit() {
        let mut grid = Grid::layout(8, 8).unwrap();
        assert!(!grid.place_car(3, 0, V_MAX + 1));
        assert!(!grid.place_car(3, 0, -1));
        assert_eq!(grid.cell(3, 0), CellState::Road);
        assert!(!grid.place_car(8, 0, 1));
        assert!(grid.place_car(3, 0, V_MAX));
    }

    #[test]
    fn cleared_buffer_keeps_layout_only() {
        let grid = Grid::build(8, 8, 10, 3).unwrap();
        let next = grid.cleared();
        assert!(!next.has_cars());
        assert_eq!(next.road_cell_count(), grid.road_cell_count());
        assert!(next.velocities.iter().all(|v| v.is_zero()));
    }
}
