//! Shared utility functions for HPT crates.

/// Calendar period helpers ("YYYY-MM" strings, month arithmetic)
pub mod periods {
    use crate::error::PeriodError;
    use chrono::{Datelike, NaiveDate};

    /// Parse a period string in "YYYY-MM" format into `(year, month)`.
    pub fn parse_period(s: &str) -> Result<(i32, u32), PeriodError> {
        let trimmed = s.trim();
        NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d")
            .map(|date| (date.year(), date.month()))
            .map_err(|_| PeriodError(trimmed.to_string()))
    }

    /// Format a `(year, month)` pair as "YYYY-MM"
    pub fn format_period(year: i32, month: u32) -> String {
        format!("{year:04}-{month:02}")
    }

    /// Move a `(year, month)` pair by `delta` months, crossing year
    /// boundaries in either direction.
    pub fn shift_months(year: i32, month: u32, delta: i32) -> (i32, u32) {
        let index = year * 12 + (month as i32 - 1) + delta;
        (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
    }

}

/// Rounding and rate-of-change helpers
pub mod numbers {
    /// Round `value` to `decimals` decimal places (half away from zero).
    pub fn round_to(value: f64, decimals: u32) -> f64 {
        let factor = 10f64.powi(decimals as i32);
        (value * factor).round() / factor
    }

    /// Percent change from `base` to `current`, rounded to `decimals` places.
    ///
    /// A zero (or non-finite) base yields `0.0` instead of NaN or infinity.
    pub fn percent_change(base: f64, current: f64, decimals: u32) -> f64 {
        if base == 0.0 || !base.is_finite() || !current.is_finite() {
            return 0.0;
        }
        round_to((current - base) / base * 100.0, decimals)
    }

    /// Round a monetary amount to a whole, non-negative price.
    pub fn round_price(value: f64) -> u64 {
        if !value.is_finite() || value <= 0.0 {
            return 0;
        }
        value.round() as u64
    }

}

/// Error types
pub mod error {
    use std::fmt;

    /// A period string that is not of the form "YYYY-MM".
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct PeriodError(pub String);

    impl fmt::Display for PeriodError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Period error: '{}' (expected YYYY-MM)", self.0)
        }
    }

    impl std::error::Error for PeriodError {}
}
