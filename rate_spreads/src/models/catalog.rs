//! Static configuration models: which series to fetch and which spreads to derive.
//!
//! Both the maturity catalog and the spread recipe are plain data, loaded at
//! startup (see [`crate::config`]) and handed to the adapter and engine
//! constructors. The FRED constant-maturity yield curve and the "versus 10
//! year" recipe are available as built-ins.

use serde::{Deserialize, Serialize};

use crate::models::series::SeriesId;

/// FRED codes of the built-in yield curve.
pub mod fred_codes {
    pub const FED_FUNDS_EFFECTIVE_RATE: &str = "EFFR";
    pub const TREASURY_1M: &str = "DGS1MO";
    pub const TREASURY_3M: &str = "DGS3MO";
    pub const TREASURY_6M: &str = "DGS6MO";
    pub const TREASURY_1Y: &str = "DGS1";
    pub const TREASURY_2Y: &str = "DGS2";
    pub const TREASURY_3Y: &str = "DGS3";
    pub const TREASURY_5Y: &str = "DGS5";
    pub const TREASURY_7Y: &str = "DGS7";
    pub const TREASURY_10Y: &str = "DGS10";
    pub const TREASURY_20Y: &str = "DGS20";
    pub const TREASURY_30Y: &str = "DGS30";
}

/// One series of the yield curve together with its maturity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaturityCatalogEntry {
    /// Provider identifier of the series.
    pub id: SeriesId,
    /// Time to maturity in years (overnight rates use `1/365`).
    pub maturity_years: f64,
}

impl MaturityCatalogEntry {
    pub fn new(id: impl Into<SeriesId>, maturity_years: f64) -> Self {
        Self {
            id: id.into(),
            maturity_years,
        }
    }
}

/// The FRED constant-maturity Treasury curve, anchored by the effective fed
/// funds rate at the overnight end. Ordered by maturity.
pub fn fred_treasury_catalog() -> Vec<MaturityCatalogEntry> {
    use fred_codes::*;

    vec![
        MaturityCatalogEntry::new(FED_FUNDS_EFFECTIVE_RATE, 1.0 / 365.0),
        MaturityCatalogEntry::new(TREASURY_1M, 1.0 / 12.0),
        MaturityCatalogEntry::new(TREASURY_3M, 3.0 / 12.0),
        MaturityCatalogEntry::new(TREASURY_6M, 6.0 / 12.0),
        MaturityCatalogEntry::new(TREASURY_1Y, 1.0),
        MaturityCatalogEntry::new(TREASURY_2Y, 2.0),
        MaturityCatalogEntry::new(TREASURY_3Y, 3.0),
        MaturityCatalogEntry::new(TREASURY_5Y, 5.0),
        MaturityCatalogEntry::new(TREASURY_7Y, 7.0),
        MaturityCatalogEntry::new(TREASURY_10Y, 10.0),
        MaturityCatalogEntry::new(TREASURY_20Y, 20.0),
        MaturityCatalogEntry::new(TREASURY_30Y, 30.0),
    ]
}

/// A single `minuend - subtrahend` instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpreadPair {
    pub minuend: SeriesId,
    pub subtrahend: SeriesId,
}

impl SpreadPair {
    pub fn new(minuend: impl Into<SeriesId>, subtrahend: impl Into<SeriesId>) -> Self {
        Self {
            minuend: minuend.into(),
            subtrahend: subtrahend.into(),
        }
    }

    /// Name of the derived series, `"{minuend}-{subtrahend}"`.
    pub fn output_id(&self) -> SeriesId {
        SeriesId::new(format!("{}-{}", self.minuend, self.subtrahend))
    }
}

/// Ordered list of spreads the engine is allowed to produce.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpreadRecipe {
    pairs: Vec<SpreadPair>,
}

impl SpreadRecipe {
    pub fn new(pairs: Vec<SpreadPair>) -> Self {
        Self { pairs }
    }

    pub fn pairs(&self) -> &[SpreadPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The 10 year yield against every shorter point of the FRED curve.
    pub fn versus_10y() -> Self {
        use fred_codes::*;

        let shorter = [
            FED_FUNDS_EFFECTIVE_RATE,
            TREASURY_1M,
            TREASURY_3M,
            TREASURY_6M,
            TREASURY_1Y,
            TREASURY_2Y,
            TREASURY_3Y,
            TREASURY_5Y,
            TREASURY_7Y,
        ];
        Self::new(
            shorter
                .into_iter()
                .map(|code| SpreadPair::new(TREASURY_10Y, code))
                .collect(),
        )
    }
}

impl FromIterator<SpreadPair> for SpreadRecipe {
    fn from_iter<I: IntoIterator<Item = SpreadPair>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_ordered_by_maturity() {
        let catalog = fred_treasury_catalog();
        assert_eq!(catalog.len(), 12);
        assert!(
            catalog
                .windows(2)
                .all(|w| w[0].maturity_years < w[1].maturity_years)
        );
        assert_eq!(catalog[9].id.as_str(), "DGS10");
    }

    #[test]
    fn versus_10y_names_the_classic_2s10s_spread() {
        let recipe = SpreadRecipe::versus_10y();
        assert_eq!(recipe.len(), 9);
        let names: Vec<_> = recipe.pairs().iter().map(SpreadPair::output_id).collect();
        assert!(names.contains(&SeriesId::from("DGS10-DGS2")));
        assert!(names.contains(&SeriesId::from("DGS10-EFFR")));
        assert!(!names.contains(&SeriesId::from("DGS10-DGS30")));
    }
}
