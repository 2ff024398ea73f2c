//! Command implementations for the HPT CLI.
//!
//! Every subcommand loads a price export (file or URL), parses it into
//! region records and renders one view of them.

use anyhow::bail;
use clap::{Args, Subcommand, ValueEnum};
use hpt_core::period::{AsOf, YearMonth, DEFAULT_AS_OF};
use hpt_core::{parse_regions, BuildOptions, RegionRecord};
use hpt_data::chart::{self, YearFilter};
use hpt_data::forecast::{Forecaster, LinearForecast, DEFAULT_WINDOW};
use hpt_data::heatmap::{self, MapMode};
use hpt_data::search::{self, DEFAULT_SUGGESTION_LIMIT};
use hpt_data::table::{self, SortDirection, SortKey, DEFAULT_TABLE_LIMIT};
use log::{info, warn};
use render::{HeatmapReport, OutputFormat, RegionReport};
use std::io;
use std::path::PathBuf;

pub mod input;
pub mod render;

/// Where the export comes from; exactly one is required.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct InputSource {
    /// Path to a downloaded price export CSV
    #[arg(short = 'i', long)]
    pub input: Option<PathBuf>,

    /// URL of the price export CSV
    #[arg(long)]
    pub url: Option<String>,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Source {
    #[command(flatten)]
    pub from: InputSource,

    /// Text encoding of the export
    #[arg(long, default_value = input::DEFAULT_ENCODING)]
    pub encoding: String,

    /// Latest observed month; earlier anchors are derived from it
    #[arg(long, value_name = "YYYY-MM", default_value_t = DEFAULT_AS_OF)]
    pub as_of: YearMonth,

    /// Trailing months used by the forecast
    #[arg(long, default_value_t = DEFAULT_WINDOW)]
    pub window: usize,

    /// Do not append the trend-extrapolated month to each history
    #[arg(long)]
    pub no_extrapolate: bool,

    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl Source {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            as_of: AsOf(self.as_of),
            extrapolate: !self.no_extrapolate,
        }
    }

    pub fn forecaster(&self) -> LinearForecast {
        LinearForecast::new(AsOf(self.as_of), self.window)
    }

    /// Read, decode and parse the export.
    pub async fn load(&self) -> anyhow::Result<Vec<RegionRecord>> {
        let bytes = match (&self.from.input, &self.from.url) {
            (Some(path), _) => input::read_file(path)?,
            (None, Some(url)) => input::fetch_url(url).await?,
            (None, None) => bail!("either --input or --url is required"),
        };
        let text = input::decode(&bytes, &self.encoding)?;
        let records = parse_regions(&text, &self.build_options());
        if records.is_empty() {
            warn!("No region records found in input");
        }
        Ok(records)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortColumn {
    Region,
    Current,
    PrevMonth,
    PrevYear,
    Forecast,
    Rate,
}

impl From<SortColumn> for SortKey {
    fn from(column: SortColumn) -> SortKey {
        match column {
            SortColumn::Region => SortKey::Region,
            SortColumn::Current => SortKey::CurrentPrice,
            SortColumn::PrevMonth => SortKey::PrevMonthPrice,
            SortColumn::PrevYear => SortKey::PrevYearPrice,
            SortColumn::Forecast => SortKey::ForecastPrice,
            SortColumn::Rate => SortKey::ForecastRate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MapValue {
    Price,
    GrowthMom,
    GrowthYoy,
}

impl From<MapValue> for MapMode {
    fn from(value: MapValue) -> MapMode {
        match value {
            MapValue::Price => MapMode::Price,
            MapValue::GrowthMom => MapMode::GrowthMonthOverMonth,
            MapValue::GrowthYoy => MapMode::GrowthYearOverYear,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Rank regions by price or forecast
    Table {
        #[command(flatten)]
        source: Source,

        /// Column to sort by
        #[arg(short = 's', long, value_enum, default_value_t = SortColumn::Current)]
        sort: SortColumn,

        /// Sort ascending instead of descending
        #[arg(long)]
        ascending: bool,

        /// Number of rows to show
        #[arg(short = 'n', long, default_value_t = DEFAULT_TABLE_LIMIT)]
        limit: usize,
    },

    /// Price summary, forecast and monthly series for one region
    Forecast {
        #[command(flatten)]
        source: Source,

        /// Region label, e.g. "서울 강남구" (defaults to the nationwide series)
        region: Option<String>,

        /// Only show months of this year in the series
        #[arg(short = 'y', long)]
        year: Option<i32>,
    },

    /// Find regions whose name contains a query
    Search {
        #[command(flatten)]
        source: Source,

        query: String,

        #[arg(short = 'n', long, default_value_t = DEFAULT_SUGGESTION_LIMIT)]
        limit: usize,
    },

    /// Per-province (or per-municipality) map values
    Heatmap {
        #[command(flatten)]
        source: Source,

        /// Value to colour by
        #[arg(short = 'm', long, value_enum, default_value_t = MapValue::Price)]
        mode: MapValue,

        /// Drill down into one province, e.g. "서울"
        #[arg(short = 'p', long)]
        province: Option<String>,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Table {
            source,
            sort,
            ascending,
            limit,
        } => {
            let records = source.load().await?;
            let direction = if ascending {
                SortDirection::Ascending
            } else {
                SortDirection::Descending
            };
            let rows = table::build_table(&records, &source.forecaster(), sort.into(), direction, limit);
            info!("Showing {} of {} regions", rows.len(), records.len());
            render::table(io::stdout().lock(), &rows, source.format)
        }
        Command::Forecast { source, region, year } => {
            let records = source.load().await?;
            let record = select_region(&records, region.as_deref())?;
            let filter = year.map_or(YearFilter::All, YearFilter::Year);
            let report = region_report(record, &source.forecaster(), filter);
            render::region_report(io::stdout().lock(), &report, source.format)
        }
        Command::Search { source, query, limit } => {
            let records = source.load().await?;
            let matches = search::suggestions(&records, &query, limit);
            info!("{} region(s) match '{}'", matches.len(), query);
            render::suggestions(io::stdout().lock(), &matches, source.format)
        }
        Command::Heatmap {
            source,
            mode,
            province,
        } => {
            let records = source.load().await?;
            let report = heatmap_report(&records, mode.into(), province.as_deref())?;
            render::heatmap(io::stdout().lock(), &report, source.format)
        }
    }
}

/// The named region, or the default selection when no name is given.
/// An unknown name is an error listing close matches.
pub fn select_region<'r>(records: &'r [RegionRecord], region: Option<&str>) -> anyhow::Result<&'r RegionRecord> {
    match region {
        Some(name) => match search::find(records, name) {
            Some(record) => Ok(record),
            None => {
                let similar: Vec<&str> = search::suggestions(records, name, DEFAULT_SUGGESTION_LIMIT)
                    .iter()
                    .map(|r| r.region())
                    .collect();
                if similar.is_empty() {
                    bail!("unknown region '{}'", name)
                }
                bail!("unknown region '{}'; did you mean: {}", name, similar.join(", "))
            }
        },
        None => match search::default_selection(records) {
            Some(record) => Ok(record),
            None => bail!("input contains no region records"),
        },
    }
}

pub fn region_report<'r>(record: &'r RegionRecord, forecaster: &dyn Forecaster, filter: YearFilter) -> RegionReport<'r> {
    let series = chart::chart_series(record.history(), filter);
    RegionReport {
        id: record.id(),
        region: record.region(),
        metrics: record.metrics(),
        trend_rates: record.trend_rates(),
        extrapolated_price: record.extrapolated_price(),
        forecast: forecaster.forecast(record.history()),
        y_axis: chart::y_axis_domain(&series),
        series,
    }
}

pub fn heatmap_report(records: &[RegionRecord], mode: MapMode, province: Option<&str>) -> anyhow::Result<HeatmapReport> {
    let cells = match province {
        None => heatmap::province_cells(records, mode),
        Some(name) => match heatmap::normalize_province(name) {
            Some(short) => heatmap::municipality_cells(records, short, mode),
            None => bail!("unknown province '{}'", name),
        },
    };
    let values: Vec<f64> = cells.iter().filter(|c| c.aggregate.is_some()).map(|c| c.value).collect();
    Ok(HeatmapReport {
        mode,
        legend: heatmap::legend_range(records),
        growth_domain: heatmap::growth_domain(&values, mode),
        cells,
    })
}
