use hpt_utils::{error::PeriodError, periods};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Anchor month used when no as-of period is configured.
pub const DEFAULT_AS_OF: YearMonth = YearMonth::new(2025, 11);

/// A calendar month. Ordering is chronological.
#[derive(Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Copy, Clone, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub const fn new(year: i32, month: u32) -> Self {
        YearMonth { year, month }
    }

    /// Move forward (positive `delta`) or backward by whole months.
    pub fn shift(self, delta: i32) -> Self {
        let (year, month) = periods::shift_months(self.year, self.month, delta);
        YearMonth { year, month }
    }

    pub fn next(self) -> Self {
        self.shift(1)
    }

    pub fn prev(self) -> Self {
        self.shift(-1)
    }

    /// Chart label, e.g. "2025.03".
    pub fn label(&self) -> String {
        format!("{}.{:02}", self.year, self.month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", periods::format_period(self.year, self.month))
    }
}

impl FromStr for YearMonth {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = periods::parse_period(s)?;
        Ok(YearMonth { year, month })
    }
}

/// The "as-of" month every anchor lookup is derived from.
///
/// - current month: the as-of month itself
/// - previous month: one month earlier
/// - previous year: twelve months earlier
/// - cutoff: the month after; anything at or beyond it counts as predicted
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub struct AsOf(pub YearMonth);

impl Default for AsOf {
    fn default() -> Self {
        AsOf(DEFAULT_AS_OF)
    }
}

impl AsOf {
    pub fn current(&self) -> YearMonth {
        self.0
    }

    pub fn prev_month(&self) -> YearMonth {
        self.0.prev()
    }

    pub fn prev_year(&self) -> YearMonth {
        self.0.shift(-12)
    }

    pub fn cutoff(&self) -> YearMonth {
        self.0.next()
    }

    /// True when `period` lies at or beyond the cutoff month.
    pub fn is_predicted_period(&self, period: YearMonth) -> bool {
        period >= self.cutoff()
    }
}
