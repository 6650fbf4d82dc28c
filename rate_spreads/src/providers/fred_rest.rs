//! FRED (Federal Reserve Economic Data) REST provider.
//!
//! Observations are read from the `fred/series/observations` endpoint. See
//! <https://fred.stlouisfed.org/docs/api/fred/series_observations.html>.

pub mod params;
pub mod provider;
pub mod response;

pub use params::{AggregationMethod, FredParams, Frequency};
pub use provider::{API_KEY_ENV, DEFAULT_BASE_URL, FredOptions, FredProvider};
