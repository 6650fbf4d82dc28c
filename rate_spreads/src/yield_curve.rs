//! Assembles the configured maturity catalog into a [`SeriesStore`].

use chrono::NaiveDate;
use tracing::info;

use crate::{
    models::{
        catalog::MaturityCatalogEntry,
        date_range::DateRange,
        series::SeriesStore,
    },
    providers::{ProviderError, SeriesProvider, ValidationSnafu},
};

/// Fetches every series of a maturity catalog from a [`SeriesProvider`].
pub struct YieldCurveAdapter<P> {
    provider: P,
    catalog: Vec<MaturityCatalogEntry>,
}

impl<P: SeriesProvider> YieldCurveAdapter<P> {
    pub fn new(provider: P, catalog: Vec<MaturityCatalogEntry>) -> Self {
        Self { provider, catalog }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn catalog(&self) -> &[MaturityCatalogEntry] {
        &self.catalog
    }

    /// Fetches the whole catalog over `[start_date, end_date)`.
    ///
    /// `end_date` defaults to today and `start_date` to five years before
    /// `end_date`. Either every series is fetched or the first provider error
    /// is returned; there is no partial result.
    pub async fn fetch(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<SeriesStore, ProviderError> {
        self.fetch_range(resolve_range(start_date, end_date)?).await
    }

    /// Fetches the whole catalog over an already resolved range.
    pub async fn fetch_range(&self, range: DateRange) -> Result<SeriesStore, ProviderError> {
        info!(
            start = %range.start(),
            end = %range.end(),
            series = self.catalog.len(),
            "fetching yield curve"
        );

        let mut fetched = Vec::with_capacity(self.catalog.len());
        for entry in &self.catalog {
            let series = self.provider.fetch_series(&entry.id, range).await?;
            fetched.push((entry.id.clone(), series));
        }
        Ok(fetched.into_iter().collect())
    }
}

/// [`DateRange::resolve`] with the failure reported as a
/// [`ProviderError::Validation`].
pub fn resolve_range(
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
) -> Result<DateRange, ProviderError> {
    DateRange::resolve(start_date, end_date).map_err(|err| {
        ValidationSnafu {
            message: err.to_string(),
        }
        .build()
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{
        models::series::{Series, SeriesId, TimePoint},
        providers::ApiSnafu,
    };

    /// Records requested ranges and fails for one id if asked to.
    #[derive(Default)]
    struct RecordingProvider {
        calls: Mutex<Vec<(SeriesId, DateRange)>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl SeriesProvider for RecordingProvider {
        async fn fetch_series(
            &self,
            id: &SeriesId,
            range: DateRange,
        ) -> Result<Series, ProviderError> {
            self.calls.lock().unwrap().push((id.clone(), range));
            if self.fail_on == Some(id.as_str()) {
                return ApiSnafu {
                    status: 400_u16,
                    message: "series does not exist",
                }
                .fail();
            }
            Ok(Series::new(vec![TimePoint::new(range.start(), 1.0)]).unwrap())
        }
    }

    fn catalog() -> Vec<MaturityCatalogEntry> {
        vec![
            MaturityCatalogEntry::new("DGS2", 2.0),
            MaturityCatalogEntry::new("DGS10", 10.0),
        ]
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn fetches_every_catalog_entry_in_order() {
        let adapter = YieldCurveAdapter::new(RecordingProvider::default(), catalog());
        let store = adapter
            .fetch(Some(ymd(2024, 1, 1)), Some(ymd(2024, 7, 1)))
            .await
            .unwrap();

        assert_eq!(
            store.ids().map(SeriesId::as_str).collect::<Vec<_>>(),
            vec!["DGS2", "DGS10"]
        );
        let calls = adapter.provider().calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert!(
            calls
                .iter()
                .all(|(_, r)| r.start() == ymd(2024, 1, 1) && r.end() == ymd(2024, 7, 1))
        );
    }

    #[tokio::test]
    async fn start_defaults_to_five_years_before_end() {
        let adapter = YieldCurveAdapter::new(RecordingProvider::default(), catalog());
        adapter.fetch(None, Some(ymd(2025, 3, 31))).await.unwrap();

        let calls = adapter.provider().calls.lock().unwrap();
        assert_eq!(calls[0].1.start(), ymd(2020, 3, 31));
        assert_eq!(calls[0].1.end(), ymd(2025, 3, 31));
    }

    #[tokio::test]
    async fn inverted_range_is_rejected_before_any_call() {
        let adapter = YieldCurveAdapter::new(RecordingProvider::default(), catalog());
        let err = adapter
            .fetch(Some(ymd(2025, 1, 2)), Some(ymd(2025, 1, 1)))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Validation { .. }));
        assert!(adapter.provider().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn one_failing_series_fails_the_whole_curve() {
        let provider = RecordingProvider {
            fail_on: Some("DGS2"),
            ..Default::default()
        };
        let adapter = YieldCurveAdapter::new(provider, catalog());

        let err = adapter.fetch(None, None).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 400, .. }));
        // Fetching stops at the first failure.
        assert_eq!(adapter.provider().calls.lock().unwrap().len(), 1);
    }
}
