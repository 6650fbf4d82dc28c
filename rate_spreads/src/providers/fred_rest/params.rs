use serde::{Deserialize, Serialize};

use crate::models::{date_range::DateRange, series::SeriesId};

/// Largest page FRED serves for one observations request.
pub const MAX_PAGE_SIZE: usize = 100_000;

/// Observation frequency. FRED aggregates daily series down when asked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

impl Frequency {
    fn code(self) -> &'static str {
        match self {
            Frequency::Daily => "d",
            Frequency::Weekly => "w",
            Frequency::Monthly => "m",
            Frequency::Quarterly => "q",
            Frequency::Annual => "a",
        }
    }
}

/// How observations are combined when a lower [`Frequency`] is requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    Avg,
    Sum,
    /// End of period.
    Eop,
}

impl AggregationMethod {
    fn code(self) -> &'static str {
        match self {
            AggregationMethod::Avg => "avg",
            AggregationMethod::Sum => "sum",
            AggregationMethod::Eop => "eop",
        }
    }
}

/// FRED-specific knobs applied to every request of a provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FredParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<Frequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation_method: Option<AggregationMethod>,
}

impl FredParams {
    /// Compact form of the set knobs, e.g. `"frequency=w,aggregation_method=eop"`.
    pub fn tag(&self) -> String {
        let frequency = self.frequency.map(|f| format!("frequency={}", f.code()));
        let aggregation = self
            .aggregation_method
            .map(|m| format!("aggregation_method={}", m.code()));
        [frequency, aggregation]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Query parameters for one observations page, without the API key.
///
/// FRED's `observation_end` is inclusive, so the exclusive end of `range` is
/// moved back by one day.
pub fn construct_params(
    id: &SeriesId,
    range: &DateRange,
    params: &FredParams,
    offset: usize,
) -> Vec<(&'static str, String)> {
    let last_day = range.end().pred_opt().unwrap_or(range.start());

    let mut query = vec![
        ("series_id", id.to_string()),
        ("file_type", "json".to_string()),
        ("observation_start", range.start().format("%Y-%m-%d").to_string()),
        ("observation_end", last_day.format("%Y-%m-%d").to_string()),
        ("sort_order", "asc".to_string()),
        ("limit", MAX_PAGE_SIZE.to_string()),
        ("offset", offset.to_string()),
    ];
    if let Some(frequency) = params.frequency {
        query.push(("frequency", frequency.code().to_string()));
    }
    if let Some(method) = params.aggregation_method {
        query.push(("aggregation_method", method.code().to_string()));
    }
    query
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        )
        .unwrap()
    }

    fn value<'a>(query: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn tag_lists_only_set_knobs() {
        assert_eq!(FredParams::default().tag(), "");
        let weekly = FredParams {
            frequency: Some(Frequency::Weekly),
            aggregation_method: None,
        };
        assert_eq!(weekly.tag(), "frequency=w");
        let weekly_eop = FredParams {
            aggregation_method: Some(AggregationMethod::Eop),
            ..weekly
        };
        assert_eq!(weekly_eop.tag(), "frequency=w,aggregation_method=eop");
    }

    #[test]
    fn end_bound_becomes_inclusive_last_day() {
        let query = construct_params(&SeriesId::from("DGS10"), &range(), &FredParams::default(), 0);
        assert_eq!(value(&query, "series_id"), Some("DGS10"));
        assert_eq!(value(&query, "observation_start"), Some("2020-01-01"));
        assert_eq!(value(&query, "observation_end"), Some("2024-12-31"));
        assert_eq!(value(&query, "file_type"), Some("json"));
        assert_eq!(value(&query, "frequency"), None);
        assert!(value(&query, "api_key").is_none());
    }

    #[test]
    fn optional_knobs_and_offset() {
        let params = FredParams {
            frequency: Some(Frequency::Weekly),
            aggregation_method: Some(AggregationMethod::Eop),
        };
        let query = construct_params(&SeriesId::from("DGS2"), &range(), &params, 250);
        assert_eq!(value(&query, "frequency"), Some("w"));
        assert_eq!(value(&query, "aggregation_method"), Some("eop"));
        assert_eq!(value(&query, "offset"), Some("250"));
    }
}
