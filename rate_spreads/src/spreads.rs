//! Derives spread series from a [`SeriesStore`] according to a [`SpreadRecipe`].

use std::cmp::Ordering;

use tracing::debug;

use crate::models::{
    catalog::SpreadRecipe,
    series::{Series, SeriesStore, TimePoint},
};

/// Applies a fixed recipe to yield curves.
#[derive(Debug, Clone)]
pub struct SpreadEngine {
    recipe: SpreadRecipe,
}

impl SpreadEngine {
    pub fn new(recipe: SpreadRecipe) -> Self {
        Self { recipe }
    }

    pub fn recipe(&self) -> &SpreadRecipe {
        &self.recipe
    }

    pub fn compute(&self, store: &SeriesStore) -> SeriesStore {
        compute_spreads(store, &self.recipe)
    }
}

/// Computes `"{minuend}-{subtrahend}"` for every recipe pair whose two series
/// are in `store`. Pairs referencing an absent series are skipped.
///
/// The result holds only derived series. Each one spans the union of its two
/// inputs' dates; a date missing from either input, or carrying a missing
/// value, yields a missing value.
pub fn compute_spreads(store: &SeriesStore, recipe: &SpreadRecipe) -> SeriesStore {
    recipe
        .pairs()
        .iter()
        .filter_map(|pair| {
            let (Some(minuend), Some(subtrahend)) = (
                store.get(pair.minuend.as_str()),
                store.get(pair.subtrahend.as_str()),
            ) else {
                debug!(
                    minuend = %pair.minuend,
                    subtrahend = %pair.subtrahend,
                    "skipping spread, series not in store"
                );
                return None;
            };
            Some((pair.output_id(), difference(minuend, subtrahend)))
        })
        .collect()
}

/// Pointwise `a - b`, merge-joined on date.
fn difference(a: &Series, b: &Series) -> Series {
    let (a, b) = (a.points(), b.points());
    let mut out = Vec::with_capacity(a.len().max(b.len()));
    let (mut i, mut j) = (0, 0);

    while i < a.len() || j < b.len() {
        let order = match (a.get(i), b.get(j)) {
            (Some(x), Some(y)) => x.date.cmp(&y.date),
            (Some(_), None) => Ordering::Less,
            (None, _) => Ordering::Greater,
        };
        match order {
            Ordering::Equal => {
                let value = a[i].value.zip(b[j].value).map(|(x, y)| x - y);
                out.push(TimePoint {
                    date: a[i].date,
                    value,
                });
                i += 1;
                j += 1;
            }
            Ordering::Less => {
                out.push(TimePoint::missing(a[i].date));
                i += 1;
            }
            Ordering::Greater => {
                out.push(TimePoint::missing(b[j].date));
                j += 1;
            }
        }
    }

    // Both inputs are strictly increasing, so the merge is too.
    Series::new(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::{catalog::SpreadPair, series::SeriesId};

    fn t(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    fn series(points: &[(u32, Option<f64>)]) -> Series {
        Series::new(
            points
                .iter()
                .map(|&(day, value)| TimePoint { date: t(day), value })
                .collect(),
        )
        .unwrap()
    }

    fn store(entries: Vec<(&str, Series)>) -> SeriesStore {
        entries
            .into_iter()
            .map(|(id, s)| (SeriesId::from(id), s))
            .collect()
    }

    fn recipe(pairs: &[(&str, &str)]) -> SpreadRecipe {
        pairs.iter().map(|&(m, s)| SpreadPair::new(m, s)).collect()
    }

    #[test]
    fn subtracts_aligned_values() {
        let input = store(vec![
            ("A", series(&[(1, Some(5.0)), (2, Some(7.0))])),
            ("B", series(&[(1, Some(2.0)), (2, Some(3.0))])),
        ]);

        let out = compute_spreads(&input, &recipe(&[("A", "B")]));

        assert_eq!(out.len(), 1);
        assert_eq!(
            out.get("A-B").unwrap(),
            &series(&[(1, Some(3.0)), (2, Some(4.0))])
        );
    }

    #[test]
    fn pairs_with_absent_series_are_skipped() {
        let input = store(vec![("A", series(&[(1, Some(5.0))]))]);

        let out = compute_spreads(&input, &recipe(&[("A", "X"), ("X", "A")]));

        assert!(out.is_empty());
        assert!(out.get("A-X").is_none());
    }

    #[test]
    fn output_spans_the_union_of_dates() {
        let input = store(vec![
            ("A", series(&[(1, Some(5.0))])),
            ("B", series(&[(1, Some(2.0)), (2, Some(3.0))])),
        ]);

        let out = compute_spreads(&input, &recipe(&[("A", "B")]));
        let spread = out.get("A-B").unwrap();

        assert_eq!(spread.value_at(t(1)), Some(3.0));
        assert_eq!(spread.points()[1], TimePoint::missing(t(2)));
        assert_eq!(spread.len(), 2);
    }

    #[test]
    fn interleaved_dates_and_missing_values() {
        let input = store(vec![
            ("A", series(&[(1, Some(1.0)), (3, None), (4, Some(4.0)), (6, Some(6.0))])),
            ("B", series(&[(2, Some(0.5)), (3, Some(1.0)), (4, Some(1.5))])),
        ]);

        let spread = compute_spreads(&input, &recipe(&[("A", "B")]))
            .get("A-B")
            .cloned()
            .unwrap();

        assert_eq!(
            spread,
            series(&[
                (1, None),
                (2, None),
                (3, None),
                (4, Some(2.5)),
                (6, None),
            ])
        );
    }

    #[test]
    fn inputs_are_not_copied_through() {
        let input = store(vec![
            ("DGS10", series(&[(1, Some(4.2))])),
            ("DGS2", series(&[(1, Some(4.6))])),
            ("DGS30", series(&[(1, Some(4.4))])),
        ]);

        let engine = SpreadEngine::new(recipe(&[("DGS10", "DGS2"), ("DGS10", "DGS2")]));
        let out = engine.compute(&input);

        assert_eq!(out.ids().collect::<Vec<_>>(), vec![&SeriesId::from("DGS10-DGS2")]);
        let value = out.get("DGS10-DGS2").unwrap().value_at(t(1)).unwrap();
        assert!((value - -0.4).abs() < 1e-12);
    }

    #[test]
    fn empty_inputs() {
        let input = store(vec![("A", Series::default()), ("B", series(&[(2, Some(1.0))]))]);
        let out = compute_spreads(&input, &recipe(&[("A", "B")]));
        assert_eq!(out.get("A-B").unwrap(), &series(&[(2, None)]));
    }
}
