use crate::period::YearMonth;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Price per unit area in the export is converted to a per-pyeong price.
pub const UNIT_CONVERSION_FACTOR: f64 = 3.3;

/// One month of a region's price series.
///
/// `year` and `month` are 0 when the column header could not be read;
/// such points stay in the history but are left out of every
/// chronological lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub year: i32,
    pub month: u32,
    pub price: u64,
    /// "YYYY.MM"
    pub display_label: String,
    /// Header text the point came from.
    pub source_label: String,
    pub is_predicted: bool,
    /// Set only on the synthetic trailing point appended for chart continuity.
    #[serde(default)]
    pub is_extrapolated: bool,
}

impl PricePoint {
    pub fn new(year: i32, month: u32, price: u64, source_label: &str, is_predicted: bool) -> Self {
        PricePoint {
            year,
            month,
            price,
            display_label: format!("{}.{:02}", year, month),
            source_label: source_label.to_string(),
            is_predicted,
            is_extrapolated: false,
        }
    }

    /// Known calendar month, `None` for points from unreadable headers.
    pub fn period(&self) -> Option<YearMonth> {
        if self.year == 0 || self.month == 0 {
            None
        } else {
            Some(YearMonth::new(self.year, self.month))
        }
    }

    /// Observed (not predicted) and non-zero.
    pub fn is_actual(&self) -> bool {
        !self.is_predicted && self.price > 0
    }

    /// Chronological order, ties broken by price so that sorting does not
    /// depend on input order.
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        (self.year, self.month, self.price).cmp(&(other.year, other.month, other.price))
    }
}

/// Parse an exported price cell and convert it to a rounded per-pyeong
/// price. Empty or unreadable cells become 0.
pub fn parse_price_field(field: &str) -> u64 {
    let cleaned = field.replace(['"', ',', '\r'], "");
    let raw = cleaned.trim().parse::<f64>().unwrap_or(0.0);
    hpt_utils::numbers::round_price(raw * UNIT_CONVERSION_FACTOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_label_is_zero_padded() {
        let point = PricePoint::new(2025, 3, 100, "2025년 3월", false);
        assert_eq!(point.display_label, "2025.03");
        assert_eq!(point.period(), Some(YearMonth::new(2025, 3)));
    }

    #[test]
    fn test_unparsed_point_has_no_period() {
        let point = PricePoint::new(0, 0, 100, "", false);
        assert_eq!(point.display_label, "0.00");
        assert_eq!(point.period(), None);
    }

    #[test]
    fn test_parse_price_field() {
        assert_eq!(parse_price_field("1000"), 3300);
        assert_eq!(parse_price_field("\"1,000\""), 3300);
        assert_eq!(parse_price_field("1200.5"), 3962);
        assert_eq!(parse_price_field(""), 0);
        assert_eq!(parse_price_field("-"), 0);
        assert_eq!(parse_price_field("-10"), 0);
    }
}
