//! Provider → yield curve → spreads, with each stage memoized on disk.
//!
//! The yield curve of a range `[start, end)` is cached under
//! `yield_curve_{start}_{end}` and its spreads under `spreads_{start}_{end}`,
//! each with its own TTL. Every entry also records the request it was computed
//! for: the catalog ids and provider settings, plus the recipe for spreads. An
//! entry recorded for another request is recomputed and replaced.

use std::time::Duration;

use chrono::NaiveDate;

use crate::{
    cache::{CacheKey, CacheStore, ExpiringCache},
    models::{date_range::DateRange, series::SeriesStore},
    providers::{ProviderError, SeriesProvider},
    spreads::SpreadEngine,
    yield_curve::{YieldCurveAdapter, resolve_range},
};

/// Key name prefix of the fetched yield curve.
pub const YIELD_CURVE_KEY: &str = "yield_curve";
/// Key name prefix of the derived spreads.
pub const SPREADS_KEY: &str = "spreads";

pub struct SpreadPipeline<P, S> {
    adapter: YieldCurveAdapter<P>,
    engine: SpreadEngine,
    cache: ExpiringCache<S>,
    yield_curve_ttl: Option<Duration>,
    spreads_ttl: Option<Duration>,
}

impl<P: SeriesProvider, S: CacheStore> SpreadPipeline<P, S> {
    /// Both stages use the cache's default TTL until [`with_ttls`](Self::with_ttls) is called.
    pub fn new(
        adapter: YieldCurveAdapter<P>,
        engine: SpreadEngine,
        cache: ExpiringCache<S>,
    ) -> Self {
        Self {
            adapter,
            engine,
            cache,
            yield_curve_ttl: None,
            spreads_ttl: None,
        }
    }

    /// A spreads entry is served while fresh even after the yield curve it was
    /// computed from has expired.
    pub fn with_ttls(mut self, yield_curve: Duration, spreads: Duration) -> Self {
        self.yield_curve_ttl = Some(yield_curve);
        self.spreads_ttl = Some(spreads);
        self
    }

    pub fn adapter(&self) -> &YieldCurveAdapter<P> {
        &self.adapter
    }

    pub fn engine(&self) -> &SpreadEngine {
        &self.engine
    }

    pub fn cache(&self) -> &ExpiringCache<S> {
        &self.cache
    }

    pub fn yield_curve_key(&self, range: DateRange) -> CacheKey {
        CacheKey::new(format!("{YIELD_CURVE_KEY}_{}_{}", range.start(), range.end()))
            .with_request(self.curve_request())
    }

    pub fn spreads_key(&self, range: DateRange) -> CacheKey {
        let recipe: Vec<String> = self
            .engine
            .recipe()
            .pairs()
            .iter()
            .map(|pair| pair.output_id().to_string())
            .collect();
        CacheKey::new(format!("{SPREADS_KEY}_{}_{}", range.start(), range.end()))
            .with_request(format!("{};recipe={}", self.curve_request(), recipe.join(",")))
    }

    fn curve_request(&self) -> String {
        let ids: Vec<&str> = self
            .adapter
            .catalog()
            .iter()
            .map(|entry| entry.id.as_str())
            .collect();
        format!(
            "catalog={};provider={}",
            ids.join(","),
            self.adapter.provider().request_tag()
        )
    }

    /// The yield curve over `[start, end)`, from cache when fresh.
    pub async fn yield_curve(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<SeriesStore, ProviderError> {
        self.yield_curve_range(resolve_range(start, end)?).await
    }

    pub async fn yield_curve_range(&self, range: DateRange) -> Result<SeriesStore, ProviderError> {
        self.cache
            .get_or_try_compute(self.yield_curve_key(range), self.yield_curve_ttl, || {
                self.adapter.fetch_range(range)
            })
            .await
    }

    /// The spreads of the yield curve over `[start, end)`, from cache when fresh.
    ///
    /// A fresh spreads entry is returned without looking at the yield curve.
    pub async fn spreads(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<SeriesStore, ProviderError> {
        let range = resolve_range(start, end)?;
        let key = self.spreads_key(range);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let curve = self.yield_curve_range(range).await?;
        let spreads = self.engine.compute(&curve);
        self.cache.insert(&key, self.spreads_ttl, &spreads);
        Ok(spreads)
    }

    /// Fetches and computes without reading or writing the cache.
    pub async fn spreads_uncached(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<SeriesStore, ProviderError> {
        let curve = self.adapter.fetch(start, end).await?;
        Ok(self.engine.compute(&curve))
    }
}
