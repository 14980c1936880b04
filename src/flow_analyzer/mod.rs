pub mod sweep;

pub use sweep::{ExperimentDriver, ExperimentSummary, Generation, NullSink, SweepSink};
