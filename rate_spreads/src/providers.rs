//! Provider abstraction for remote time-series sources.
//!
//! This module defines the [`SeriesProvider`] trait, the single capability the
//! rest of the crate needs from a data vendor: "give me series `id` over
//! `[start, end)`". The FRED implementation lives in [`fred_rest`]; tests plug
//! in their own implementations.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use rate_spreads::models::{
//!     date_range::DateRange,
//!     series::{Series, SeriesId},
//! };
//! use rate_spreads::providers::{ProviderError, SeriesProvider};
//!
//! struct EmptyProvider;
//!
//! #[async_trait]
//! impl SeriesProvider for EmptyProvider {
//!     async fn fetch_series(
//!         &self,
//!         _id: &SeriesId,
//!         _range: DateRange,
//!     ) -> Result<Series, ProviderError> {
//!         Ok(Series::default())
//!     }
//! }
//! ```

pub mod fred_rest;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::{
    date_range::DateRange,
    series::{Series, SeriesError, SeriesId},
};

/// Fetches one named series from a remote data provider.
///
/// Implementations are expected to return observations whose dates fall in
/// the half-open `range`, in increasing date order.
#[async_trait]
pub trait SeriesProvider {
    /// Fetches the series `id` over `range`.
    ///
    /// # Returns
    ///
    /// * `Ok(Series)` - The observations, possibly with missing values.
    /// * `Err(ProviderError)` - Network, authentication or unknown-id failures.
    async fn fetch_series(&self, id: &SeriesId, range: DateRange)
    -> Result<Series, ProviderError>;

    /// Provider settings that change what [`fetch_series`](Self::fetch_series)
    /// returns for the same id and range. Cached results are keyed on it.
    fn request_tag(&self) -> String {
        String::new()
    }
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `SeriesProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider's API answered with an error status (e.g., invalid API key, unknown series).
    #[snafu(display("API error ({status}): {message}"))]
    Api {
        status: u16,
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid.
    #[snafu(display("Invalid request: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// An internal error occurred while processing data within the provider.
    #[snafu(display("Internal provider error: {message}"))]
    Internal {
        message: String,
        backtrace: Backtrace,
    },

    /// The observations returned for a series do not form a valid series.
    #[snafu(display("Provider returned an invalid series '{id}': {source}"))]
    InvalidSeries {
        id: SeriesId,
        #[snafu(backtrace)]
        source: SeriesError,
    },

    /// An error during provider configuration or initialization.
    #[snafu(display("Provider initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: ProviderInitError,
    },
}

impl From<ProviderInitError> for ProviderError {
    fn from(source: ProviderInitError) -> Self {
        ProviderError::Init { source }
    }
}
