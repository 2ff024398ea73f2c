//! Choropleth aggregation: province-name matching, per-area averages and
//! the value each map mode colours by.

use hpt_core::RegionRecord;
use hpt_utils::numbers::percent_change;
use serde::Serialize;

/// Short province names, as they appear as the first word of region labels.
pub const PROVINCES: [&str; 17] = [
    "서울", "부산", "대구", "인천", "광주", "대전", "울산", "세종", "경기", "강원", "충북", "충남",
    "전북", "전남", "경북", "경남", "제주",
];

/// Long-form names for provinces whose short name is not a substring of it.
const LONG_NAMES: [(&str, &str); 6] = [
    ("충청북도", "충북"),
    ("충청남도", "충남"),
    ("전라북도", "전북"),
    ("전라남도", "전남"),
    ("경상북도", "경북"),
    ("경상남도", "경남"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MapMode {
    Price,
    GrowthMonthOverMonth,
    GrowthYearOverYear,
}

impl MapMode {
    /// Colour-scale clamp for growth modes, in percent.
    pub fn growth_limit(&self) -> Option<f64> {
        match self {
            MapMode::Price => None,
            MapMode::GrowthMonthOverMonth => Some(1.5),
            MapMode::GrowthYearOverYear => Some(5.0),
        }
    }
}

/// Short province name for a map geography name such as "서울특별시" or
/// "경상북도". Provinces are checked in [`PROVINCES`] order.
pub fn normalize_province(geo_name: &str) -> Option<&'static str> {
    let name = geo_name.trim();
    if name.is_empty() {
        return None;
    }
    for province in PROVINCES {
        if name.contains(province) {
            return Some(province);
        }
        let long_form = LONG_NAMES
            .iter()
            .any(|&(long, short)| short == province && name.contains(long));
        if long_form {
            return Some(province);
        }
    }
    None
}

/// Records shown for one map area.
///
/// On the national map an area matches records labelled exactly with its
/// name, falling back to labels starting with it. In a province
/// drill-down (`name` is "province municipality") labels equal to or
/// containing the name match.
pub fn match_records<'r>(records: &'r [RegionRecord], name: &str, national: bool) -> Vec<&'r RegionRecord> {
    if name.is_empty() {
        return Vec::new();
    }
    if national {
        let exact: Vec<&RegionRecord> = records.iter().filter(|r| r.region() == name).collect();
        if !exact.is_empty() {
            return exact;
        }
        records.iter().filter(|r| r.region().starts_with(name)).collect()
    } else {
        records.iter().filter(|r| r.region().contains(name)).collect()
    }
}

/// Averages over the records matched to one area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AreaAggregate {
    pub count: usize,
    pub avg_current: f64,
    pub avg_prev_month: f64,
    pub avg_prev_year: f64,
}

impl AreaAggregate {
    pub fn from_records(records: &[&RegionRecord]) -> Option<AreaAggregate> {
        if records.is_empty() {
            return None;
        }
        let count = records.len() as f64;
        let mean = |f: fn(&RegionRecord) -> u64| records.iter().map(|r| f(*r) as f64).sum::<f64>() / count;
        Some(AreaAggregate {
            count: records.len(),
            avg_current: mean(RegionRecord::current_price),
            avg_prev_month: mean(RegionRecord::prev_month_price),
            avg_prev_year: mean(RegionRecord::prev_year_price),
        })
    }

    /// Average price, or percent growth against the base month average
    /// (2 decimals, 0 when the base is 0).
    pub fn value(&self, mode: MapMode) -> f64 {
        match mode {
            MapMode::Price => self.avg_current,
            MapMode::GrowthMonthOverMonth => percent_change(self.avg_prev_month, self.avg_current, 2),
            MapMode::GrowthYearOverYear => percent_change(self.avg_prev_year, self.avg_current, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaCell {
    pub name: String,
    pub aggregate: Option<AreaAggregate>,
    pub value: f64,
}

fn cell(records: &[RegionRecord], name: &str, national: bool, mode: MapMode) -> AreaCell {
    let matched = match_records(records, name, national);
    let aggregate = AreaAggregate::from_records(&matched);
    AreaCell {
        name: name.to_string(),
        value: aggregate.map_or(0.0, |a| a.value(mode)),
        aggregate,
    }
}

/// One cell per province for the national map.
pub fn province_cells(records: &[RegionRecord], mode: MapMode) -> Vec<AreaCell> {
    PROVINCES
        .iter()
        .map(|province| cell(records, province, true, mode))
        .collect()
}

/// One cell per municipality of `province`. Municipalities are the second
/// word of region labels under that province.
pub fn municipality_cells(records: &[RegionRecord], province: &str, mode: MapMode) -> Vec<AreaCell> {
    let mut municipalities: Vec<&str> = Vec::new();
    for record in records {
        let mut words = record.region().split(' ');
        if words.next() != Some(province) {
            continue;
        }
        if let Some(municipality) = words.next() {
            if !municipalities.contains(&municipality) {
                municipalities.push(municipality);
            }
        }
    }
    municipalities
        .into_iter()
        .map(|m| cell(records, &format!("{province} {m}"), false, mode))
        .collect()
}

/// Price range for the legend; the nationwide row and zero prices are
/// left out. `None` when nothing qualifies.
pub fn legend_range(records: &[RegionRecord]) -> Option<(u64, u64)> {
    let prices = records
        .iter()
        .filter(|r| !r.is_nationwide() && r.current_price() > 0)
        .map(|r| r.current_price());
    let (min, max) = prices.fold((u64::MAX, 0u64), |(min, max), p| (min.min(p), max.max(p)));
    if max == 0 {
        None
    } else {
        Some((min, max))
    }
}

/// Symmetric colour domain bound for growth modes: the largest absolute
/// value (1 when all are 0), clamped to the mode's limit.
pub fn growth_domain(values: &[f64], mode: MapMode) -> Option<f64> {
    let limit = mode.growth_limit()?;
    let max_abs = values.iter().map(|v| v.abs()).fold(0.0, f64::max);
    let max_abs = if max_abs == 0.0 { 1.0 } else { max_abs };
    Some(max_abs.min(limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hpt_core::period::AsOf;
    use hpt_core::price_point::PricePoint;

    fn record(id: usize, region: &str, prev_year: u64, prev_month: u64, current: u64) -> RegionRecord {
        let history = vec![
            PricePoint::new(2024, 11, prev_year, "", false),
            PricePoint::new(2025, 10, prev_month, "", false),
            PricePoint::new(2025, 11, current, "", false),
        ];
        RegionRecord::new(id, region.to_string(), history, &AsOf::default()).unwrap()
    }

    fn sample() -> Vec<RegionRecord> {
        vec![
            record(1, "전국", 900, 990, 1000),
            record(2, "서울", 2000, 2100, 2200),
            record(3, "서울 강남구", 4000, 4300, 4400),
            record(4, "서울 서초구", 3000, 3100, 3200),
            record(5, "경북 포항시", 800, 800, 800),
            record(6, "경북 경주시", 600, 0, 700),
        ]
    }

    #[test]
    fn test_normalize_province() {
        assert_eq!(normalize_province("서울"), Some("서울"));
        assert_eq!(normalize_province("서울특별시"), Some("서울"));
        assert_eq!(normalize_province("경상북도"), Some("경북"));
        assert_eq!(normalize_province("제주특별자치도"), Some("제주"));
        assert_eq!(normalize_province("Tokyo"), None);
        assert_eq!(normalize_province(""), None);
    }

    #[test]
    fn test_national_match_prefers_exact() {
        let records = sample();
        let matched = match_records(&records, "서울", true);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id(), 2);
    }

    #[test]
    fn test_national_match_falls_back_to_prefix() {
        let records = sample();
        let matched = match_records(&records, "경북", true);
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn test_province_cells() {
        let records = sample();
        let cells = province_cells(&records, MapMode::Price);
        assert_eq!(cells.len(), PROVINCES.len());
        let gyeongbuk = cells.iter().find(|c| c.name == "경북").unwrap();
        assert_eq!(gyeongbuk.value, 750.0);
        let jeju = cells.iter().find(|c| c.name == "제주").unwrap();
        assert!(jeju.aggregate.is_none());
        assert_eq!(jeju.value, 0.0);
    }

    #[test]
    fn test_growth_values() {
        let records = sample();
        let seoul = province_cells(&records, MapMode::GrowthYearOverYear)
            .into_iter()
            .find(|c| c.name == "서울")
            .unwrap();
        assert_eq!(seoul.value, 10.0);
        let seoul_mom = province_cells(&records, MapMode::GrowthMonthOverMonth)
            .into_iter()
            .find(|c| c.name == "서울")
            .unwrap();
        assert_eq!(seoul_mom.value, 4.76);
    }

    #[test]
    fn test_municipality_cells() {
        let records = sample();
        let cells = municipality_cells(&records, "서울", MapMode::Price);
        let names: Vec<&str> = cells.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["서울 강남구", "서울 서초구"]);
        assert_eq!(cells[0].value, 4400.0);
    }

    #[test]
    fn test_legend_range_excludes_nationwide() {
        let records = sample();
        assert_eq!(legend_range(&records), Some((700, 4400)));
        assert_eq!(legend_range(&[]), None);
    }

    #[test]
    fn test_growth_domain() {
        assert_eq!(growth_domain(&[0.5, -0.8], MapMode::GrowthMonthOverMonth), Some(0.8));
        assert_eq!(growth_domain(&[12.0], MapMode::GrowthYearOverYear), Some(5.0));
        assert_eq!(growth_domain(&[0.0], MapMode::GrowthYearOverYear), Some(1.0));
        assert_eq!(growth_domain(&[1.0], MapMode::Price), None);
    }
}
