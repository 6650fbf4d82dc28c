//! Treasury rate spreads from FRED, memoized on disk.
//!
//! The crate fetches a catalog of yield curve series through a
//! [`providers::SeriesProvider`], derives spread series with
//! [`spreads::SpreadEngine`], and memoizes both stages with
//! [`cache::ExpiringCache`]. [`pipeline::SpreadPipeline`] wires them together
//! and [`io::CsvSink`] renders the result.

pub mod cache;
pub mod config;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod spreads;
pub mod yield_curve;
