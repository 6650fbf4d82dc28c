//! Canonical in-memory representation of named time series.
//!
//! A [`SeriesStore`] is the common currency between the stages of the
//! pipeline: the yield curve adapter produces one, the spread engine consumes
//! one and produces another, and sinks render them. Series inside a store are
//! aligned by date: an observation on a given day in one series corresponds to
//! the same day in every other series of the store.

use std::{borrow::Borrow, collections::BTreeSet, fmt};

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use snafu::{Backtrace, Snafu};

/// Opaque identifier of a named time series (e.g. the FRED code `"DGS10"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesId(String);

impl SeriesId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SeriesId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SeriesId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for SeriesId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SeriesId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A single observation. `value` is `None` when the provider has no
/// observation for that day (holidays, discontinued maturities, ...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    /// Observation date.
    pub date: NaiveDate,
    /// Observed value, absent for a missing observation.
    pub value: Option<f64>,
}

impl TimePoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value: Some(value),
        }
    }

    pub fn missing(date: NaiveDate) -> Self {
        Self { date, value: None }
    }
}

/// Errors raised when a sequence of points breaks the [`Series`] invariant.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SeriesError {
    /// Two consecutive points are out of order or share a date.
    #[snafu(display("series dates must be strictly increasing: {previous} is followed by {next}"))]
    NotStrictlyIncreasing {
        previous: NaiveDate,
        next: NaiveDate,
        backtrace: Backtrace,
    },
}

/// An ordered sequence of [`TimePoint`]s with strictly increasing dates.
///
/// The invariant is checked on construction and on deserialization, so a
/// `Series` obtained from a cache file is as trustworthy as a fresh one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TimePoint>", into = "Vec<TimePoint>")]
pub struct Series {
    points: Vec<TimePoint>,
}

impl Series {
    /// Builds a series, rejecting points whose dates are not strictly increasing.
    pub fn new(points: Vec<TimePoint>) -> Result<Self, SeriesError> {
        if let Some(pair) = points.windows(2).find(|pair| pair[0].date >= pair[1].date) {
            return NotStrictlyIncreasingSnafu {
                previous: pair[0].date,
                next: pair[1].date,
            }
            .fail();
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimePoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Value observed on `date`. `None` both when the date is not part of the
    /// series and when the observation on that date is missing.
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .and_then(|idx| self.points[idx].value)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.iter().map(|p| p.date)
    }
}

impl TryFrom<Vec<TimePoint>> for Series {
    type Error = SeriesError;

    fn try_from(points: Vec<TimePoint>) -> Result<Self, Self::Error> {
        Self::new(points)
    }
}

impl From<Series> for Vec<TimePoint> {
    fn from(series: Series) -> Self {
        series.points
    }
}

impl<'a> IntoIterator for &'a Series {
    type Item = &'a TimePoint;
    type IntoIter = std::slice::Iter<'a, TimePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Immutable mapping of [`SeriesId`] to [`Series`], in insertion order.
///
/// There is no way to mutate a store after it is built; transformations
/// produce a new store. Build one with `collect()` over `(SeriesId, Series)`
/// pairs; a repeated id keeps the last series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesStore {
    series: IndexMap<SeriesId, Series>,
}

impl SeriesStore {
    pub fn get(&self, id: &str) -> Option<&Series> {
        self.series.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.series.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &SeriesId> {
        self.series.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SeriesId, &Series)> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// The shared time axis: sorted union of the dates of every series.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.series
            .values()
            .flat_map(Series::dates)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl FromIterator<(SeriesId, Series)> for SeriesStore {
    fn from_iter<I: IntoIterator<Item = (SeriesId, Series)>>(iter: I) -> Self {
        Self {
            series: iter.into_iter().collect(),
        }
    }
}
