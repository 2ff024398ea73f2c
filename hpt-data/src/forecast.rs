//! Next-month price forecast by ordinary least squares.
//!
//! Fits `price = intercept + slope * i` over the trailing window of
//! observed prices (i = 0..n-1 in chronological order) and evaluates the
//! line at i = n.

use hpt_core::period::AsOf;
use hpt_core::price_point::PricePoint;
use hpt_utils::numbers::{percent_change, round_price};
use serde::Serialize;

/// One year of monthly observations.
pub const DEFAULT_WINDOW: usize = 12;

/// Fewer observed points than this yields [`ForecastResult::NEUTRAL`].
pub const MIN_SAMPLES: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Projected price, floored at 0.
    pub price: u64,
    /// Change from the last observed price to the unfloored projection,
    /// in percent, 2 decimals.
    pub rate_percent: f64,
    pub is_positive: bool,
}

impl ForecastResult {
    pub const NEUTRAL: ForecastResult = ForecastResult {
        price: 0,
        rate_percent: 0.0,
        is_positive: false,
    };
}

/// Anything that turns a price history into a next-period forecast.
pub trait Forecaster {
    fn forecast(&self, history: &[PricePoint]) -> ForecastResult;
}

/// Least-squares trend over a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearForecast {
    as_of: AsOf,
    window: usize,
}

impl Default for LinearForecast {
    fn default() -> Self {
        LinearForecast::new(AsOf::default(), DEFAULT_WINDOW)
    }
}

impl LinearForecast {
    /// `window` below [`MIN_SAMPLES`] is raised to it.
    pub fn new(as_of: AsOf, window: usize) -> Self {
        LinearForecast {
            as_of,
            window: window.max(MIN_SAMPLES),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Observed, non-zero, dated points up to the as-of month, sorted
    /// chronologically, trailing window only.
    fn sample<'h>(&self, history: &'h [PricePoint]) -> Vec<&'h PricePoint> {
        let current = self.as_of.current();
        let mut actual: Vec<&PricePoint> = history
            .iter()
            .filter(|p| p.is_actual())
            .filter(|p| p.period().is_some_and(|period| period <= current))
            .collect();
        actual.sort_by(|a, b| a.chronological_cmp(b));
        let skip = actual.len().saturating_sub(self.window);
        actual.split_off(skip)
    }
}

impl Forecaster for LinearForecast {
    fn forecast(&self, history: &[PricePoint]) -> ForecastResult {
        let sample = self.sample(history);
        if sample.len() < MIN_SAMPLES {
            return ForecastResult::NEUTRAL;
        }
        let prices: Vec<f64> = sample.iter().map(|p| p.price as f64).collect();
        let (slope, intercept) = least_squares(&prices);
        // the rate follows the fitted line even when it dips below zero;
        // only the reported price is floored
        let projected = (slope * prices.len() as f64 + intercept).round();

        let last_actual = sample.last().map_or(0, |p| p.price);
        let rate_percent = if last_actual == 0 {
            0.0
        } else {
            percent_change(last_actual as f64, projected, 2)
        };
        ForecastResult {
            price: round_price(projected),
            rate_percent,
            is_positive: rate_percent > 0.0,
        }
    }
}

/// Slope and intercept of `values` against their indices 0..n-1.
/// Requires at least two values.
pub fn least_squares(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let sum_i: f64 = (0..values.len()).map(|i| i as f64).sum();
    let sum_y: f64 = values.iter().sum();
    let sum_i2: f64 = (0..values.len()).map(|i| (i * i) as f64).sum();
    let sum_iy: f64 = values.iter().enumerate().map(|(i, y)| i as f64 * y).sum();

    let slope = (n * sum_iy - sum_i * sum_y) / (n * sum_i2 - sum_i * sum_i);
    let intercept = (sum_y - slope * sum_i) / n;
    (slope, intercept)
}
