pub mod csv_sink;
pub mod sink;

pub use csv_sink::CsvSink;
pub use sink::{SeriesSink, SinkError};
