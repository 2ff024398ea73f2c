//! Views derived from parsed region records.
//!
//! This crate turns region records into the forms the command layer
//! renders: forecasts, the ranked table, search suggestions, chart series
//! and choropleth cells.

pub mod forecast;
pub mod heatmap;
pub mod table;

/// Region lookup by name.
pub mod search {
    use hpt_core::RegionRecord;

    /// Suggestions shown while typing.
    pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

    /// Records whose label contains `query`, in input order. An empty
    /// query suggests nothing.
    pub fn suggestions<'r>(records: &'r [RegionRecord], query: &str, limit: usize) -> Vec<&'r RegionRecord> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        records
            .iter()
            .filter(|r| r.region().contains(query))
            .take(limit)
            .collect()
    }

    /// Exact label match.
    pub fn find<'r>(records: &'r [RegionRecord], region: &str) -> Option<&'r RegionRecord> {
        records.iter().find(|r| r.region() == region.trim())
    }

    /// The nationwide record when present, otherwise the first record.
    pub fn default_selection(records: &[RegionRecord]) -> Option<&RegionRecord> {
        records
            .iter()
            .find(|r| r.is_nationwide())
            .or_else(|| records.first())
    }

}

/// Chart series for one region.
pub mod chart {
    use hpt_core::period::AsOf;
    use hpt_core::price_point::PricePoint;

    /// First year offered by the year filter.
    pub const FIRST_YEAR: i32 = 2012;

    /// Padding added above and below the plotted range.
    pub const Y_AXIS_PADDING: u64 = 1_000_000;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum YearFilter {
        All,
        Year(i32),
    }

    impl YearFilter {
        pub fn accepts(&self, point: &PricePoint) -> bool {
            match self {
                YearFilter::All => true,
                YearFilter::Year(year) => point.year == *year,
            }
        }
    }

    /// Points of `history` passing `filter`, in history order.
    pub fn chart_series<'h>(history: &'h [PricePoint], filter: YearFilter) -> Vec<&'h PricePoint> {
        history.iter().filter(|p| filter.accepts(p)).collect()
    }

    /// `(lower, upper)` bounds of the value axis. With no points the lower
    /// bound is 0 and the upper bound is left to the renderer.
    pub fn y_axis_domain(series: &[&PricePoint]) -> (u64, Option<u64>) {
        let min = series.iter().map(|p| p.price).min();
        let max = series.iter().map(|p| p.price).max();
        match (min, max) {
            (Some(min), Some(max)) => (
                min.saturating_sub(Y_AXIS_PADDING),
                Some(max.saturating_add(Y_AXIS_PADDING)),
            ),
            _ => (0, None),
        }
    }

    /// Years offered by the filter, oldest first.
    pub fn available_years(as_of: &AsOf) -> Vec<i32> {
        (FIRST_YEAR..=as_of.current().year).collect()
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use hpt_core::period::YearMonth;

        fn history() -> Vec<PricePoint> {
            vec![
                PricePoint::new(2024, 12, 3_000_000, "", false),
                PricePoint::new(2025, 1, 3_500_000, "", false),
                PricePoint::new(2025, 2, 4_000_000, "", false),
            ]
        }

        #[test]
        fn test_year_filter() {
            let history = history();
            assert_eq!(chart_series(&history, YearFilter::All).len(), 3);
            let only_2025 = chart_series(&history, YearFilter::Year(2025));
            assert_eq!(only_2025.len(), 2);
            assert_eq!(only_2025[0].display_label, "2025.01");
            assert!(chart_series(&history, YearFilter::Year(2013)).is_empty());
        }

        #[test]
        fn test_y_axis_domain() {
            let history = history();
            let series = chart_series(&history, YearFilter::All);
            assert_eq!(y_axis_domain(&series), (2_000_000, Some(5_000_000)));
            assert_eq!(y_axis_domain(&[]), (0, None));
        }

        #[test]
        fn test_y_axis_lower_bound_clamps_at_zero() {
            let history = vec![PricePoint::new(2025, 1, 400_000, "", false)];
            let series = chart_series(&history, YearFilter::All);
            assert_eq!(y_axis_domain(&series), (0, Some(1_400_000)));
        }

        #[test]
        fn test_available_years() {
            let years = available_years(&AsOf::default());
            assert_eq!(years.first(), Some(&2012));
            assert_eq!(years.last(), Some(&2025));
            assert_eq!(years.len(), 14);
            assert_eq!(available_years(&AsOf(YearMonth::new(2012, 1))), vec![2012]);
        }
    }
}
