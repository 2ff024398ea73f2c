//! Summary scalars derived from a region's price history.
//!
//! The history is indexed once by calendar month; every anchor lookup is
//! then a map lookup instead of a scan.

use crate::period::{AsOf, YearMonth};
use crate::price_point::PricePoint;
use hpt_utils::numbers::percent_change;
use serde::Serialize;
use std::collections::BTreeMap;

/// Month-keyed view over a history. Points without a known month are
/// not indexed. When a month appears twice, the first column wins.
#[derive(Debug)]
pub struct PeriodIndex<'a> {
    by_period: BTreeMap<YearMonth, &'a PricePoint>,
    latest_actual: Option<&'a PricePoint>,
}

impl<'a> PeriodIndex<'a> {
    pub fn new(history: &'a [PricePoint]) -> Self {
        let mut by_period: BTreeMap<YearMonth, &'a PricePoint> = BTreeMap::new();
        for point in history {
            if let Some(period) = point.period() {
                by_period.entry(period).or_insert(point);
            }
        }
        let latest_actual = history
            .iter()
            .filter(|p| p.is_actual())
            .filter_map(|p| p.period().map(|period| (period, p)))
            .max_by_key(|(period, _)| *period)
            .map(|(_, p)| p);
        PeriodIndex {
            by_period,
            latest_actual,
        }
    }

    pub fn get(&self, period: YearMonth) -> Option<&'a PricePoint> {
        self.by_period.get(&period).copied()
    }

    /// Price at `period`, 0 when the month is absent.
    pub fn price_at(&self, period: YearMonth) -> u64 {
        self.get(period).map_or(0, |p| p.price)
    }

    /// Chronologically last observed point with a non-zero price.
    pub fn latest_actual(&self) -> Option<&'a PricePoint> {
        self.latest_actual
    }
}

/// Current, previous-month and previous-year prices. Zero means unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PriceMetrics {
    pub current_price: u64,
    pub prev_month_price: u64,
    pub prev_year_price: u64,
}

impl PriceMetrics {
    /// Derive the three scalars from a completed history.
    ///
    /// The current price is the as-of month's price when that month is
    /// present with a non-zero price, otherwise the latest observed
    /// non-zero price.
    pub fn extract(history: &[PricePoint], as_of: &AsOf) -> PriceMetrics {
        let index = PeriodIndex::new(history);
        let current_price = index
            .get(as_of.current())
            .filter(|p| p.price > 0)
            .or_else(|| index.latest_actual())
            .map_or(0, |p| p.price);
        PriceMetrics {
            current_price,
            prev_month_price: index.price_at(as_of.prev_month()),
            prev_year_price: index.price_at(as_of.prev_year()),
        }
    }
}

/// Percent changes shown beside a region, rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TrendRates {
    pub month_over_month: f64,
    pub year_over_year: f64,
    /// Current price against the extrapolated trailing point.
    pub extrapolated: f64,
}

impl TrendRates {
    pub fn new(metrics: &PriceMetrics, extrapolated_price: Option<u64>) -> TrendRates {
        let current = metrics.current_price as f64;
        TrendRates {
            month_over_month: percent_change(metrics.prev_month_price as f64, current, 1),
            year_over_year: percent_change(metrics.prev_year_price as f64, current, 1),
            extrapolated: extrapolated_price
                .map_or(0.0, |price| percent_change(current, price as f64, 1)),
        }
    }
}
