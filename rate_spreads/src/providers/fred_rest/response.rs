use chrono::NaiveDate;
use serde::Deserialize;
use snafu::ResultExt;

use crate::{
    models::{
        date_range::DateRange,
        series::{Series, SeriesId, TimePoint},
    },
    providers::{InternalSnafu, InvalidSeriesSnafu, ProviderError},
};

/// Marker FRED uses for a missing observation.
const MISSING_VALUE: &str = ".";

#[derive(Deserialize, Debug)]
pub struct FredObservation {
    pub date: NaiveDate,
    /// Decimal number as text, or `"."` when there is no observation.
    pub value: String,
}

#[derive(Deserialize, Debug)]
pub struct FredObservationsResponse {
    /// Total number of observations matching the request, across pages.
    #[serde(default)]
    pub count: usize,
    pub observations: Vec<FredObservation>,
}

#[derive(Deserialize, Debug)]
pub struct FredErrorResponse {
    pub error_message: String,
}

/// Extracts FRED's `error_message` from an error body, falling back to the raw body.
pub fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<FredErrorResponse>(body) {
        Ok(err) => err.error_message,
        Err(_) if body.trim().is_empty() => "Unknown API error".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

fn parse_value(id: &SeriesId, obs: &FredObservation) -> Result<Option<f64>, ProviderError> {
    let raw = obs.value.trim();
    if raw == MISSING_VALUE || raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some).map_err(|_| {
        InternalSnafu {
            message: format!("series {id}: unparsable value '{raw}' on {}", obs.date),
        }
        .build()
    })
}

/// Converts raw observations into a [`Series`], keeping only dates inside `range`.
pub fn into_series(
    id: &SeriesId,
    observations: Vec<FredObservation>,
    range: &DateRange,
) -> Result<Series, ProviderError> {
    let points = observations
        .iter()
        .filter(|obs| range.contains(obs.date))
        .map(|obs| {
            Ok(TimePoint {
                date: obs.date,
                value: parse_value(id, obs)?,
            })
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    Series::new(points).context(InvalidSeriesSnafu { id: id.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "realtime_start": "2025-01-10",
        "realtime_end": "2025-01-10",
        "observation_start": "2024-12-30",
        "observation_end": "2025-01-02",
        "units": "lin",
        "output_type": 1,
        "file_type": "json",
        "order_by": "observation_date",
        "sort_order": "asc",
        "count": 4,
        "offset": 0,
        "limit": 100000,
        "observations": [
            {"realtime_start": "2025-01-10", "realtime_end": "2025-01-10", "date": "2024-12-30", "value": "4.55"},
            {"realtime_start": "2025-01-10", "realtime_end": "2025-01-10", "date": "2024-12-31", "value": "4.58"},
            {"realtime_start": "2025-01-10", "realtime_end": "2025-01-10", "date": "2025-01-01", "value": "."},
            {"realtime_start": "2025-01-10", "realtime_end": "2025-01-10", "date": "2025-01-02", "value": "4.57"}
        ]
    }"#;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_page_with_missing_marker() {
        let page: FredObservationsResponse = serde_json::from_str(PAGE).unwrap();
        assert_eq!(page.count, 4);

        let range = DateRange::new(ymd(2024, 12, 30), ymd(2025, 1, 3)).unwrap();
        let series = into_series(&SeriesId::from("DGS10"), page.observations, &range).unwrap();

        assert_eq!(series.len(), 4);
        assert_eq!(series.value_at(ymd(2024, 12, 31)), Some(4.58));
        assert_eq!(series.points()[2], TimePoint::missing(ymd(2025, 1, 1)));
    }

    #[test]
    fn page_needs_only_observations() {
        let page: FredObservationsResponse =
            serde_json::from_str(r#"{"observations": [{"date": "2025-01-02", "value": "4.57"}]}"#)
                .unwrap();
        assert_eq!(page.count, 0);
        assert_eq!(page.observations.len(), 1);
    }

    #[test]
    fn drops_observations_outside_the_range() {
        let page: FredObservationsResponse = serde_json::from_str(PAGE).unwrap();
        let range = DateRange::new(ymd(2024, 12, 31), ymd(2025, 1, 2)).unwrap();
        let series = into_series(&SeriesId::from("DGS10"), page.observations, &range).unwrap();

        let dates: Vec<_> = series.dates().collect();
        assert_eq!(dates, vec![ymd(2024, 12, 31), ymd(2025, 1, 1)]);
    }

    #[test]
    fn garbage_value_is_an_internal_error() {
        let observations = vec![FredObservation {
            date: ymd(2025, 1, 2),
            value: "n/a".to_string(),
        }];
        let range = DateRange::new(ymd(2025, 1, 1), ymd(2025, 2, 1)).unwrap();
        let err = into_series(&SeriesId::from("DGS10"), observations, &range).unwrap_err();
        assert!(matches!(err, ProviderError::Internal { .. }), "{err}");
    }

    #[test]
    fn unordered_observations_are_rejected() {
        let observations = vec![
            FredObservation { date: ymd(2025, 1, 3), value: "1".to_string() },
            FredObservation { date: ymd(2025, 1, 2), value: "2".to_string() },
        ];
        let range = DateRange::new(ymd(2025, 1, 1), ymd(2025, 2, 1)).unwrap();
        let err = into_series(&SeriesId::from("DGS10"), observations, &range).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidSeries { .. }));
    }

    #[test]
    fn error_bodies() {
        let body = r#"{"error_code":400,"error_message":"Bad Request.  The series does not exist."}"#;
        assert_eq!(
            api_error_message(body),
            "Bad Request.  The series does not exist."
        );
        assert_eq!(
            api_error_message(r#"{"error_message":"Bad Request.  Variable api_key is not set."}"#),
            "Bad Request.  Variable api_key is not set."
        );
        assert_eq!(api_error_message("<html>gateway</html>"), "<html>gateway</html>");
        assert_eq!(api_error_message("  "), "Unknown API error");
    }
}
