use snafu::{Backtrace, Snafu};

use crate::models::series::SeriesStore;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// The CSV encoder rejected a record.
    #[snafu(display("Failed to write CSV record: {source}"))]
    Csv {
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// A generic I/O error.
    #[snafu(display("I/O error: {source}"))]
    Io {
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

/// Presentation boundary: anything that renders a [`SeriesStore`].
pub trait SeriesSink {
    /// The type of output returned after a successful render.
    ///
    /// For example:
    /// - A table writer might return the number of rows written.
    /// - A chart exporter might return the path of the produced file.
    type Output;

    /// Renders every series of `store`.
    fn render(&mut self, store: &SeriesStore) -> Result<Self::Output, SinkError>;
}
