//! Ranked region table: one row per record with its forecast attached.

use crate::forecast::{ForecastResult, Forecaster};
use hpt_core::RegionRecord;
use log::debug;
use serde::Serialize;
use std::cmp::Ordering;

/// Rows rendered by default.
pub const DEFAULT_TABLE_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortKey {
    Region,
    CurrentPrice,
    PrevMonthPrice,
    PrevYearPrice,
    ForecastPrice,
    ForecastRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Clicking the same column again flips a descending sort to ascending;
    /// anything else starts descending.
    pub fn toggled(current_key: SortKey, current: SortDirection, clicked: SortKey) -> SortDirection {
        if current_key == clicked && current == SortDirection::Descending {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub id: usize,
    pub region: String,
    pub current_price: u64,
    pub prev_month_price: u64,
    pub prev_year_price: u64,
    pub forecast_price: u64,
    pub forecast_rate: f64,
    pub forecast_positive: bool,
}

impl TableRow {
    pub fn new(record: &RegionRecord, forecast: ForecastResult) -> Self {
        TableRow {
            id: record.id(),
            region: record.region().to_string(),
            current_price: record.current_price(),
            prev_month_price: record.prev_month_price(),
            prev_year_price: record.prev_year_price(),
            forecast_price: forecast.price,
            forecast_rate: forecast.rate_percent,
            forecast_positive: forecast.is_positive,
        }
    }

    fn compare(&self, other: &Self, key: SortKey) -> Ordering {
        match key {
            SortKey::Region => self.region.cmp(&other.region),
            SortKey::CurrentPrice => self.current_price.cmp(&other.current_price),
            SortKey::PrevMonthPrice => self.prev_month_price.cmp(&other.prev_month_price),
            SortKey::PrevYearPrice => self.prev_year_price.cmp(&other.prev_year_price),
            SortKey::ForecastPrice => self.forecast_price.cmp(&other.forecast_price),
            SortKey::ForecastRate => self.forecast_rate.total_cmp(&other.forecast_rate),
        }
    }
}

/// Forecast every record, sort (stable) and keep the first `limit` rows.
pub fn build_table(
    records: &[RegionRecord],
    forecaster: &dyn Forecaster,
    key: SortKey,
    direction: SortDirection,
    limit: usize,
) -> Vec<TableRow> {
    let mut rows: Vec<TableRow> = records
        .iter()
        .map(|record| TableRow::new(record, forecaster.forecast(record.history())))
        .collect();
    rows.sort_by(|a, b| {
        let ordering = a.compare(b, key);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });
    debug!("table: {} row(s) by {:?} {:?}, keeping {}", rows.len(), key, direction, limit);
    rows.truncate(limit);
    rows
}
