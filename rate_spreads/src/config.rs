//! Application configuration: parsing, defaults, and validation.
//!
//! The configuration is a TOML document in which every section is optional:
//!
//! ```toml
//! [cache]
//! dir = ".cache/rate_spreads"
//! yield_curve_ttl_secs = 86400
//! spreads_ttl_secs = 86400
//!
//! [fetch]
//! start = "2020-01-01"
//! end = "2025-01-01"
//!
//! [provider]
//! base_url = "https://api.stlouisfed.org"
//! timeout_secs = 30
//! frequency = "weekly"
//!
//! [[catalog]]
//! id = "DGS10"
//! maturity_years = 10.0
//!
//! [[recipe]]
//! minuend = "DGS10"
//! subtrahend = "DGS2"
//! ```
//!
//! A missing `catalog` or `recipe` falls back to the built-in FRED Treasury
//! curve and the "versus 10 year" recipe. The API key never lives here; it
//! is read from `FRED_API_KEY`.
//!
//! Entrypoints:
//! - Parse + validate from a TOML string: [`AppConfig::load_str`]
//! - Parse + validate from a file path: [`AppConfig::load_path`]

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    time::Duration,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use snafu::{Backtrace, ResultExt, Snafu};
use tracing::warn;

use crate::{
    cache::DEFAULT_TTL,
    models::catalog::{MaturityCatalogEntry, SpreadRecipe, fred_treasury_catalog},
    providers::fred_rest::{
        AggregationMethod, DEFAULT_BASE_URL, FredOptions, FredParams, Frequency,
    },
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    #[snafu(display("Failed to read config file {}: {source}", path.display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to parse config: {source}"))]
    Parse {
        source: toml::de::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid config: {message}"))]
    Invalid {
        message: String,
        backtrace: Backtrace,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub cache: CacheCfg,
    #[serde(default)]
    pub fetch: FetchCfg,
    #[serde(default)]
    pub provider: ProviderCfg,
    /// Series fetched by the yield curve adapter.
    #[serde(default = "fred_treasury_catalog")]
    pub catalog: Vec<MaturityCatalogEntry>,
    /// Spreads derived from the yield curve.
    #[serde(default = "SpreadRecipe::versus_10y")]
    pub recipe: SpreadRecipe,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache: CacheCfg::default(),
            fetch: FetchCfg::default(),
            provider: ProviderCfg::default(),
            catalog: fred_treasury_catalog(),
            recipe: SpreadRecipe::versus_10y(),
        }
    }
}

/// Where cache files live and how long each cached stage stays fresh.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheCfg {
    pub dir: PathBuf,
    pub yield_curve_ttl_secs: u64,
    pub spreads_ttl_secs: u64,
}

impl Default for CacheCfg {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".cache/rate_spreads"),
            yield_curve_ttl_secs: DEFAULT_TTL.as_secs(),
            spreads_ttl_secs: DEFAULT_TTL.as_secs(),
        }
    }
}

impl CacheCfg {
    pub fn yield_curve_ttl(&self) -> Duration {
        Duration::from_secs(self.yield_curve_ttl_secs)
    }

    pub fn spreads_ttl(&self) -> Duration {
        Duration::from_secs(self.spreads_ttl_secs)
    }
}

/// Date bounds of the yield curve request. Unset bounds use the adapter defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FetchCfg {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// FRED connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderCfg {
    pub base_url: String,
    pub timeout_secs: u64,
    pub frequency: Option<Frequency>,
    pub aggregation_method: Option<AggregationMethod>,
}

impl Default for ProviderCfg {
    fn default() -> Self {
        let defaults = FredOptions::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: defaults.timeout.as_secs(),
            frequency: None,
            aggregation_method: None,
        }
    }
}

impl ProviderCfg {
    pub fn fred_options(&self) -> FredOptions {
        FredOptions {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            params: FredParams {
                frequency: self.frequency,
                aggregation_method: self.aggregation_method,
            },
        }
    }
}

impl AppConfig {
    /// Parses and validates a TOML document.
    pub fn load_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = toml::from_str(s).context(ParseSnafu)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).context(ReadSnafu { path })?;
        Self::load_str(&s)
    }

    /// Checks the invariants the pipeline relies on.
    ///
    /// Errors:
    /// - Empty catalog, duplicate catalog ids, or a non-positive maturity
    /// - A recipe pair subtracting a series from itself
    /// - `fetch.start` not before `fetch.end`
    ///
    /// Recipe pairs naming series outside the catalog are allowed (the spread
    /// engine skips them) but logged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.catalog.is_empty() {
            return invalid("catalog must contain at least one series");
        }

        let mut seen = HashSet::new();
        for entry in &self.catalog {
            if entry.id.as_str().trim().is_empty() {
                return invalid("catalog ids cannot be empty");
            }
            if !seen.insert(entry.id.as_str()) {
                return invalid(format!("duplicate catalog id: {}", entry.id));
            }
            if !(entry.maturity_years.is_finite() && entry.maturity_years > 0.0) {
                return invalid(format!(
                    "maturity of {} must be a positive number of years, got {}",
                    entry.id, entry.maturity_years
                ));
            }
        }

        for pair in self.recipe.pairs() {
            if pair.minuend == pair.subtrahend {
                return invalid(format!(
                    "recipe pair {} subtracts a series from itself",
                    pair.output_id()
                ));
            }
            for id in [&pair.minuend, &pair.subtrahend] {
                if !seen.contains(id.as_str()) {
                    warn!(
                        %id,
                        spread = %pair.output_id(),
                        "recipe references a series outside the catalog"
                    );
                }
            }
        }

        if let FetchCfg {
            start: Some(start),
            end: Some(end),
        } = self.fetch
        {
            if start >= end {
                return invalid(format!(
                    "fetch.start {start} must be before fetch.end {end}"
                ));
            }
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Result<(), ConfigError> {
    InvalidSnafu {
        message: message.into(),
    }
    .fail()
}
