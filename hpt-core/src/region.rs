use crate::csv_table::{clean_field, CsvTable, RawRow};
use crate::date_header::{self, DateHeader, FORECAST_MARKER, METADATA_COLUMNS};
use crate::metrics::{PriceMetrics, TrendRates};
use crate::period::{AsOf, YearMonth};
use crate::price_point::{parse_price_field, PricePoint};
use hpt_utils::numbers::round_price;
use log::{debug, info};
use serde::Serialize;

/// Header text that leaks into some data rows' locale columns.
pub const REGION_PLACEHOLDER: &str = "지역";

/// Label of the nationwide aggregate row.
pub const NATIONWIDE_LABEL: &str = "전국";

/// Options threaded through a parse pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildOptions {
    pub as_of: AsOf,
    /// Append a synthetic next-month point to each history.
    pub extrapolate: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            as_of: AsOf::default(),
            extrapolate: true,
        }
    }
}

/// One region's price history and summary prices.
///
/// Only built through [`RegionRecord::new`], which refuses histories
/// without a known current price; `current_price` is always non-zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRecord {
    id: usize,
    region: String,
    history: Vec<PricePoint>,
    current_price: u64,
    prev_month_price: u64,
    prev_year_price: u64,
}

impl RegionRecord {
    pub fn new(id: usize, region: String, history: Vec<PricePoint>, as_of: &AsOf) -> Option<Self> {
        let metrics = PriceMetrics::extract(&history, as_of);
        if metrics.current_price == 0 {
            return None;
        }
        Some(RegionRecord {
            id,
            region,
            history,
            current_price: metrics.current_price,
            prev_month_price: metrics.prev_month_price,
            prev_year_price: metrics.prev_year_price,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn history(&self) -> &[PricePoint] {
        &self.history
    }

    pub fn current_price(&self) -> u64 {
        self.current_price
    }

    /// 0 when the previous month is missing.
    pub fn prev_month_price(&self) -> u64 {
        self.prev_month_price
    }

    /// 0 when the same month a year earlier is missing.
    pub fn prev_year_price(&self) -> u64 {
        self.prev_year_price
    }

    pub fn metrics(&self) -> PriceMetrics {
        PriceMetrics {
            current_price: self.current_price,
            prev_month_price: self.prev_month_price,
            prev_year_price: self.prev_year_price,
        }
    }

    /// Price of the synthetic trailing point, when one was appended.
    pub fn extrapolated_price(&self) -> Option<u64> {
        self.history
            .last()
            .filter(|p| p.is_extrapolated)
            .map(|p| p.price)
    }

    pub fn trend_rates(&self) -> TrendRates {
        TrendRates::new(&self.metrics(), self.extrapolated_price())
    }

    pub fn is_nationwide(&self) -> bool {
        self.region == NATIONWIDE_LABEL
    }
}

/// Turns data rows into region records using the interpreted header row.
pub struct RegionSeriesBuilder<'a> {
    headers: &'a [DateHeader],
    options: BuildOptions,
}

impl<'a> RegionSeriesBuilder<'a> {
    pub fn new(headers: &'a [DateHeader], options: BuildOptions) -> Self {
        RegionSeriesBuilder { headers, options }
    }

    /// Build one record, or `None` when the row has no usable current price.
    pub fn build(&self, row: &RawRow) -> Option<RegionRecord> {
        let region = region_label(&row.fields);
        let mut history = self.price_points(row);
        if self.options.extrapolate {
            if let Some(point) = extrapolate(&history, &self.options.as_of) {
                history.push(point);
            }
        }
        let record = RegionRecord::new(row.line.saturating_sub(1), region, history, &self.options.as_of);
        if record.is_none() {
            debug!("region: line {} has no current price, excluded", row.line);
        }
        record
    }

    fn price_points(&self, row: &RawRow) -> Vec<PricePoint> {
        row.fields
            .iter()
            .enumerate()
            .skip(METADATA_COLUMNS)
            .map(|(column, field)| {
                let offset = column - METADATA_COLUMNS;
                let missing;
                let header = match self.headers.get(offset) {
                    Some(h) => h,
                    None => {
                        missing = DateHeader::missing(column);
                        &missing
                    }
                };
                let price = parse_price_field(field);
                PricePoint::new(
                    header.year(),
                    header.month(),
                    price,
                    &header.raw_text,
                    self.is_predicted(header),
                )
            })
            .collect()
    }

    /// Forecast-marked columns and months at or past the cutoff.
    fn is_predicted(&self, header: &DateHeader) -> bool {
        header.forecast_marked
            || header
                .period
                .year_month()
                .is_some_and(|period| self.options.as_of.is_predicted_period(period))
    }
}

/// Space-joined distinct locale names, in order of first appearance.
pub fn region_label(fields: &[String]) -> String {
    let mut names: Vec<String> = Vec::new();
    for field in fields.iter().skip(1).take(METADATA_COLUMNS - 1) {
        let name = clean_field(field);
        if name.is_empty() || name == REGION_PLACEHOLDER || names.contains(&name) {
            continue;
        }
        names.push(name);
    }
    names.join(" ")
}

/// Naive one-step extension of a history: the last price grown by the
/// last observed month-over-month ratio. Placed at the month after the
/// latest dated point, and never before the cutoff.
pub fn extrapolate(history: &[PricePoint], as_of: &AsOf) -> Option<PricePoint> {
    let last = history.last()?;
    let last_price = last.price;
    let prev_price = history
        .len()
        .checked_sub(2)
        .and_then(|i| history.get(i))
        .map(|p| p.price)
        .filter(|price| *price > 0)
        .unwrap_or(last_price);
    let growth = if prev_price > 0 {
        (last_price as f64 - prev_price as f64) / prev_price as f64
    } else {
        0.0
    };
    let period = history
        .iter()
        .filter_map(PricePoint::period)
        .max()
        .map_or(as_of.cutoff(), |latest| latest.next().max(as_of.cutoff()));
    let mut point = PricePoint::new(
        period.year,
        period.month,
        round_price(last_price as f64 * (1.0 + growth)),
        &extrapolated_label(period),
        true,
    );
    point.is_extrapolated = true;
    Some(point)
}

fn extrapolated_label(period: YearMonth) -> String {
    format!("{}년 {}월 ({})", period.year, period.month, FORECAST_MARKER)
}

/// Parse a whole export into region records, in input row order.
///
/// Malformed input degrades to fewer (possibly zero) records; it never
/// fails.
pub fn parse_regions(raw_text: &str, options: &BuildOptions) -> Vec<RegionRecord> {
    let table = CsvTable::parse(raw_text);
    let headers = date_header::interpret(&table.header);
    let builder = RegionSeriesBuilder::new(&headers, *options);
    let records: Vec<RegionRecord> = table.rows.iter().filter_map(|row| builder.build(row)).collect();
    info!(
        "region: {} month column(s), {} of {} row(s) kept (as of {})",
        headers.len(),
        records.len(),
        table.rows.len(),
        options.as_of.current()
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    static SAMPLE: &str = include_str!("../../fixtures/sample_prices.csv");

    fn fields(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn find<'r>(records: &'r [RegionRecord], region: &str) -> &'r RegionRecord {
        records
            .iter()
            .find(|r| r.region() == region)
            .unwrap_or_else(|| panic!("missing region {region}"))
    }

    #[test]
    fn test_region_label_dedup() {
        let row = fields(&["7", "Seoul", "Seoul", "Gangnam", "Gangnam", "100"]);
        assert_eq!(region_label(&row), "Seoul Gangnam");
    }

    #[test]
    fn test_region_label_drops_placeholder() {
        let row = fields(&["7", "지역", "서울", "\"서울\"", "", "100"]);
        assert_eq!(region_label(&row), "서울");
    }

    #[test]
    fn test_parse_sample_fixture() {
        let records = parse_regions(SAMPLE, &BuildOptions::default());
        let labels: Vec<&str> = records.iter().map(|r| r.region()).collect();
        assert_eq!(
            labels,
            vec!["전국", "서울", "서울 강남구", "부산 해운대구", "경기 수원시"]
        );
        assert!(records.iter().all(|r| r.current_price() > 0));
    }

    #[test]
    fn test_record_prices_and_anchors() {
        let records = parse_regions(SAMPLE, &BuildOptions::default());
        let gangnam = find(&records, "서울 강남구");
        assert_eq!(gangnam.current_price(), 13200);
        assert_eq!(gangnam.prev_month_price(), 12870);
        assert_eq!(gangnam.prev_year_price(), 9900);
        assert_eq!(gangnam.id(), 5);
    }

    #[test]
    fn test_predicted_flags() {
        let records = parse_regions(SAMPLE, &BuildOptions::default());
        let seoul = find(&records, "서울");
        let flags: Vec<(String, bool)> = seoul
            .history()
            .iter()
            .map(|p| (p.display_label.clone(), p.is_predicted))
            .collect();
        assert!(flags.contains(&("2025.09".to_string(), false)));
        assert!(flags.contains(&("2025.10".to_string(), false)));
        assert!(flags.contains(&("2025.11".to_string(), false)));
        assert!(flags.contains(&("2025.12".to_string(), true)));
    }

    #[test]
    fn test_forecast_marker_overrides_period() {
        let text = "\
id,a,b,c,d,2025년 10월 (예측),2025년 11월
m
m
1,서울,서울,서울,서울,100,110
";
        let records = parse_regions(text, &BuildOptions::default());
        assert!(records[0].history()[0].is_predicted);
        assert!(!records[0].history()[1].is_predicted);
    }

    #[test]
    fn test_row_without_current_price_is_excluded() {
        let records = parse_regions(SAMPLE, &BuildOptions::default());
        assert!(records.iter().all(|r| r.region() != "대구 수성구"));
    }

    #[test]
    fn test_fallback_current_price() {
        let records = parse_regions(SAMPLE, &BuildOptions::default());
        let suwon = find(&records, "경기 수원시");
        // no 2025-11 value, last observed month is 2025-10
        assert_eq!(suwon.current_price(), 6930);
        assert_eq!(suwon.prev_month_price(), 6930);
    }

    #[test]
    fn test_extrapolated_point() {
        let records = parse_regions(SAMPLE, &BuildOptions::default());
        let gangnam = find(&records, "서울 강남구");
        let last = gangnam.history().last().unwrap();
        assert!(last.is_extrapolated);
        assert!(last.is_predicted);
        assert_eq!(last.display_label, "2026.01");
        assert_eq!(last.source_label, "2026년 1월 (예측)");
        // 13530 * (13530 / 13200)
        assert_eq!(gangnam.extrapolated_price(), Some(13868));
    }

    #[test]
    fn test_extrapolate_uses_last_price_when_previous_is_zero() {
        let history = vec![
            PricePoint::new(2025, 10, 0, "", false),
            PricePoint::new(2025, 11, 1000, "", false),
        ];
        let point = extrapolate(&history, &AsOf::default()).unwrap();
        assert_eq!(point.price, 1000);
        assert_eq!((point.year, point.month), (2025, 12));
    }

    #[test]
    fn test_extrapolate_empty_history() {
        assert!(extrapolate(&[], &AsOf::default()).is_none());
    }

    #[test]
    fn test_without_extrapolation() {
        let options = BuildOptions {
            extrapolate: false,
            ..BuildOptions::default()
        };
        let records = parse_regions(SAMPLE, &options);
        assert!(records.iter().all(|r| r.extrapolated_price().is_none()));
    }

    #[test]
    fn test_as_of_moves_anchors() {
        let options = BuildOptions {
            as_of: AsOf(YearMonth::new(2025, 10)),
            ..BuildOptions::default()
        };
        let records = parse_regions(SAMPLE, &options);
        let gangnam = find(&records, "서울 강남구");
        assert_eq!(gangnam.current_price(), 12870);
        assert_eq!(gangnam.prev_month_price(), 12540);
        let nov = gangnam
            .history()
            .iter()
            .find(|p| p.display_label == "2025.11")
            .unwrap();
        assert!(nov.is_predicted);
    }

    #[test]
    fn test_build_row_without_line_number() {
        let header = fields(&["id", "a", "b", "c", "d", "2025년 10월", "2025년 11월"]);
        let headers = date_header::interpret(&header);
        let builder = RegionSeriesBuilder::new(&headers, BuildOptions::default());
        let row = RawRow {
            line: 0,
            fields: fields(&["1", "서울", "서울", "서울", "서울", "100", "110"]),
        };
        let record = builder.build(&row).unwrap();
        assert_eq!(record.id(), 0);
        assert_eq!(record.region(), "서울");
    }

    #[test]
    fn test_unclosed_quote_row_does_not_drop_neighbours() {
        let text = "\
id,a,b,c,d,2025년 10월,2025년 11월
m
m
1,서울,\"서울,서울,서울,100,110
2,부산,부산,부산,부산,200,210
3,대구,대구,대구,대구,300,310
";
        let records = parse_regions(text, &BuildOptions::default());
        let labels: Vec<&str> = records.iter().map(|r| r.region()).collect();
        assert_eq!(labels, vec!["부산", "대구"]);
    }

    #[test]
    fn test_empty_and_short_input() {
        assert!(parse_regions("", &BuildOptions::default()).is_empty());
        assert!(parse_regions("a\nb\nc", &BuildOptions::default()).is_empty());
    }

    #[test]
    fn test_parse_is_deterministic() {
        let first = parse_regions(SAMPLE, &BuildOptions::default());
        let second = parse_regions(SAMPLE, &BuildOptions::default());
        assert_eq!(first, second);
    }
}
