use crate::control_system::traffic_light_controller::ControllerMode;
use crate::error::ConfigError;
use crate::global_variables::{
    DEFAULT_POWER, DEFAULT_THRESHOLD, DEFAULT_VIEWPORT_PX, OVERALL_TIME_CSV, RUNS_PER_COUNT,
    SCALE, TIME_DELAY_CSV,
};
use crate::shared_data::ParameterPair;
use crate::simulation_engine::grid::Grid;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for the executables. Every field has a default, so a config
/// file only needs to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub viewport_width_px: usize,
    pub viewport_height_px: usize,
    /// Pixels per cell; grid dimensions are the viewport divided by this.
    pub cell_scale: usize,
    pub mode: ControllerMode,
    pub power: f64,
    pub threshold: f64,
    pub seed: u64,
    /// Car count of a single visualised run.
    pub cars: usize,
    /// Runs averaged into one sweep point.
    pub runs_per_count: usize,
    /// Car count the first sweep starts from; later sweeps start from zero.
    pub start_cars: usize,
    /// Parameter pairs to sweep before the driver stops.
    pub max_generations: usize,
    /// A run still holding cars after this many steps is reported as an error.
    pub max_steps_per_run: u64,
    pub overall_time_csv: PathBuf,
    pub time_delay_csv: PathBuf,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Directory for PNG frames; nothing is rendered when unset.
    pub frames_dir: Option<PathBuf>,
    /// Render every n-th step.
    pub render_every: u64,
    pub pixels_per_cell: u32,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            viewport_width_px: DEFAULT_VIEWPORT_PX,
            viewport_height_px: DEFAULT_VIEWPORT_PX,
            cell_scale: SCALE,
            mode: ControllerMode::default(),
            power: DEFAULT_POWER,
            threshold: DEFAULT_THRESHOLD,
            seed: 42,
            cars: 50,
            runs_per_count: RUNS_PER_COUNT,
            start_cars: 0,
            max_generations: 1,
            max_steps_per_run: 100_000,
            overall_time_csv: PathBuf::from(OVERALL_TIME_CSV),
            time_delay_csv: PathBuf::from(TIME_DELAY_CSV),
            render: RenderConfig::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frames_dir: None,
            render_every: 1,
            pixels_per_cell: SCALE as u32,
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Loads `path` if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_json_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cell_scale == 0 {
            return Err(ConfigError::Invalid("cell_scale must be positive"));
        }
        if self.runs_per_count == 0 {
            return Err(ConfigError::Invalid("runs_per_count must be positive"));
        }
        if self.threshold.is_nan() || self.threshold <= 0.0 {
            return Err(ConfigError::Invalid("threshold must be positive"));
        }
        if !self.power.is_finite() {
            return Err(ConfigError::Invalid("power must be finite"));
        }
        if self.render.render_every == 0 || self.render.pixels_per_cell == 0 {
            return Err(ConfigError::Invalid(
                "render_every and pixels_per_cell must be positive",
            ));
        }
        Ok(())
    }

    /// `(rows, cols)` of the grid this viewport holds.
    pub fn grid_dimensions(&self) -> (usize, usize) {
        Grid::dimensions_for_viewport(
            self.viewport_height_px,
            self.viewport_width_px,
            self.cell_scale,
        )
    }

    pub fn parameters(&self) -> ParameterPair {
        ParameterPair {
            power: self.power,
            threshold: self.threshold,
        }
    }
}
