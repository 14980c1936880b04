// Model constants

/// Side length of one cell in viewport pixels (the length of a car).
pub const SCALE: usize = 10;

/// Maximum speed of a car, in cells per step, on either axis.
pub const V_MAX: i32 = 4;

/// Steps spent in a transitional (orange) signal state, in every controller mode.
pub const TIME_ORANGE: u32 = 2;

/// Steps a stable state (red or green) is held by the classic controller.
pub const TIME_STABLE: u32 = 5;

/// Smallest grid side that still fits the traffic-light block next to the crossing.
pub const MIN_GRID_DIM: usize = 6;

// Driver defaults
pub const DEFAULT_VIEWPORT_PX: usize = 640;
pub const RUNS_PER_COUNT: usize = 10;
pub const DEFAULT_POWER: f64 = 0.8;
pub const DEFAULT_THRESHOLD: f64 = 5.0;

// Output files
pub const OVERALL_TIME_CSV: &str = "overall_time.csv";
pub const TIME_DELAY_CSV: &str = "time_delay.csv";
