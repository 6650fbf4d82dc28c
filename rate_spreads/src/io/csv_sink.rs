//! Date-aligned CSV rendering of a [`SeriesStore`].

use std::io::Write;

use snafu::ResultExt;

use crate::{
    io::sink::{CsvSnafu, IoSnafu, SeriesSink, SinkError},
    models::series::SeriesStore,
};

/// Writes one row per date of the store's shared axis and one column per
/// series, in store order. Missing values are empty cells.
///
/// ```text
/// date,DGS10-DGS2,DGS10-DGS3MO
/// 2024-05-01,-0.35,-0.78
/// 2024-05-02,,-0.80
/// ```
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    precision: Option<usize>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
            precision: None,
        }
    }

    /// Rounds values to `digits` decimals instead of the shortest exact form.
    pub fn with_precision(mut self, digits: usize) -> Self {
        self.precision = Some(digits);
        self
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(csv::IntoInnerError::into_error)
            .context(IoSnafu)
    }

    fn format_value(&self, value: Option<f64>) -> String {
        match (value, self.precision) {
            (None, _) => String::new(),
            (Some(v), Some(digits)) => format!("{v:.digits$}"),
            (Some(v), None) => v.to_string(),
        }
    }
}

impl<W: Write> SeriesSink for CsvSink<W> {
    /// Number of data rows written.
    type Output = usize;

    fn render(&mut self, store: &SeriesStore) -> Result<usize, SinkError> {
        let header = std::iter::once("date").chain(store.ids().map(|id| id.as_str()));
        self.writer.write_record(header).context(CsvSnafu)?;

        let dates = store.dates();
        for date in &dates {
            let mut record = vec![date.format("%Y-%m-%d").to_string()];
            record.extend(
                store
                    .iter()
                    .map(|(_, series)| self.format_value(series.value_at(*date))),
            );
            self.writer.write_record(&record).context(CsvSnafu)?;
        }

        self.writer.flush().context(IoSnafu)?;
        Ok(dates.len())
    }
}
