use crate::error::ExperimentError;
use crate::flow_analyzer::sweep::SweepSink;
use crate::shared_data::{ParameterPair, SweepPoint};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Writes sweep results to two delimited outputs, one for the mean overall
/// time and one for the mean delay.
///
/// Each parameter pair is one row: the label `p=<power>;k=<threshold>`, then
/// one value per car count. Values are flushed as they arrive so a long
/// sweep can be watched while it runs.
pub struct CsvReport<W: Write> {
    overall_time: csv::Writer<W>,
    time_delay: csv::Writer<W>,
}

impl CsvReport<File> {
    /// Appends to the given files, creating them if needed.
    pub fn append_to(overall_time: &Path, time_delay: &Path) -> Result<Self, ExperimentError> {
        let open = |path: &Path| OpenOptions::new().append(true).create(true).open(path);
        Ok(Self::from_writers(open(overall_time)?, open(time_delay)?))
    }
}

impl<W: Write> CsvReport<W> {
    pub fn from_writers(overall_time: W, time_delay: W) -> Self {
        let writer = |inner: W| {
            csv::WriterBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_writer(inner)
        };
        Self {
            overall_time: writer(overall_time),
            time_delay: writer(time_delay),
        }
    }

    /// Flushes and returns the underlying writers.
    pub fn into_inner(self) -> Result<(W, W), ExperimentError> {
        let overall = self
            .overall_time
            .into_inner()
            .map_err(|e| e.into_error())?;
        let delay = self.time_delay.into_inner().map_err(|e| e.into_error())?;
        Ok((overall, delay))
    }

    fn both(
        &mut self,
        mut f: impl FnMut(&mut csv::Writer<W>) -> csv::Result<()>,
    ) -> Result<(), ExperimentError> {
        f(&mut self.overall_time)?;
        f(&mut self.time_delay)?;
        self.overall_time.flush()?;
        self.time_delay.flush()?;
        Ok(())
    }
}

impl<W: Write> SweepSink for CsvReport<W> {
    fn begin_row(&mut self, params: ParameterPair) -> Result<(), ExperimentError> {
        let label = params.label();
        self.both(|w| w.write_field(&label))
    }

    fn record(&mut self, point: &SweepPoint) -> Result<(), ExperimentError> {
        self.overall_time
            .write_field(point.mean_overall_time.to_string())?;
        self.time_delay.write_field(point.mean_time_delay.to_string())?;
        self.overall_time.flush()?;
        self.time_delay.flush()?;
        Ok(())
    }

    fn end_row(&mut self) -> Result<(), ExperimentError> {
        self.both(|w| w.write_record(None::<&[u8]>))
    }
}
