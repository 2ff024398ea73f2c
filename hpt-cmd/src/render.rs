//! Output rendering: aligned text, CSV (via `csv::Writer`) or pretty JSON.

use clap::ValueEnum;
use hpt_core::metrics::{PriceMetrics, TrendRates};
use hpt_core::price_point::PricePoint;
use hpt_core::RegionRecord;
use hpt_data::forecast::ForecastResult;
use hpt_data::heatmap::{AreaCell, MapMode};
use hpt_data::table::TableRow;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Csv,
    Json,
}

/// Everything shown for one selected region.
#[derive(Debug, Serialize)]
pub struct RegionReport<'a> {
    pub id: usize,
    pub region: &'a str,
    pub metrics: PriceMetrics,
    pub trend_rates: TrendRates,
    pub extrapolated_price: Option<u64>,
    pub forecast: ForecastResult,
    pub y_axis: (u64, Option<u64>),
    pub series: Vec<&'a PricePoint>,
}

#[derive(Debug, Serialize)]
pub struct HeatmapReport {
    pub mode: MapMode,
    pub legend: Option<(u64, u64)>,
    pub growth_domain: Option<f64>,
    pub cells: Vec<AreaCell>,
}

#[derive(Debug, Serialize)]
struct SuggestionRow<'a> {
    id: usize,
    region: &'a str,
    current_price: u64,
}

#[derive(Debug, Serialize)]
struct HeatmapRow<'a> {
    name: &'a str,
    records: usize,
    value: f64,
    avg_current: f64,
    avg_prev_month: f64,
    avg_prev_year: f64,
}

/// `1234567` -> `"1,234,567"`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn write_csv<W: Write, T: Serialize>(out: W, rows: impl IntoIterator<Item = T>) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_json<W: Write, T: Serialize + ?Sized>(mut out: W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn table<W: Write>(mut out: W, rows: &[TableRow], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Csv => write_csv(out, rows),
        OutputFormat::Json => write_json(out, rows),
        OutputFormat::Text => {
            writeln!(
                out,
                "{:<24} {:>14} {:>14} {:>14} {:>14} {:>9}",
                "region", "current", "prev month", "prev year", "forecast", "rate"
            )?;
            for row in rows {
                writeln!(
                    out,
                    "{:<24} {:>14} {:>14} {:>14} {:>14} {:>8.2}%",
                    row.region,
                    group_thousands(row.current_price),
                    group_thousands(row.prev_month_price),
                    group_thousands(row.prev_year_price),
                    group_thousands(row.forecast_price),
                    row.forecast_rate
                )?;
            }
            Ok(())
        }
    }
}

pub fn region_report<W: Write>(mut out: W, report: &RegionReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Csv => write_csv(out, report.series.iter().copied()),
        OutputFormat::Json => write_json(out, report),
        OutputFormat::Text => {
            let rates = &report.trend_rates;
            writeln!(out, "{} (#{})", report.region, report.id)?;
            writeln!(out, "  current     {:>14}", group_thousands(report.metrics.current_price))?;
            writeln!(
                out,
                "  prev month  {:>14}  ({:+.1}%)",
                group_thousands(report.metrics.prev_month_price),
                rates.month_over_month
            )?;
            writeln!(
                out,
                "  prev year   {:>14}  ({:+.1}%)",
                group_thousands(report.metrics.prev_year_price),
                rates.year_over_year
            )?;
            if let Some(price) = report.extrapolated_price {
                writeln!(out, "  next (trend){:>14}  ({:+.1}%)", group_thousands(price), rates.extrapolated)?;
            }
            writeln!(
                out,
                "  forecast    {:>14}  ({:+.2}%)",
                group_thousands(report.forecast.price),
                report.forecast.rate_percent
            )?;
            writeln!(out)?;
            for point in &report.series {
                let marker = if point.is_predicted { " *" } else { "" };
                writeln!(out, "  {}  {:>14}{}", point.display_label, group_thousands(point.price), marker)?;
            }
            Ok(())
        }
    }
}

pub fn suggestions<W: Write>(mut out: W, records: &[&RegionRecord], format: OutputFormat) -> anyhow::Result<()> {
    let rows = records.iter().map(|r| SuggestionRow {
        id: r.id(),
        region: r.region(),
        current_price: r.current_price(),
    });
    match format {
        OutputFormat::Csv => write_csv(out, rows),
        OutputFormat::Json => write_json(out, &rows.collect::<Vec<_>>()),
        OutputFormat::Text => {
            for row in rows {
                writeln!(out, "{:<24} {:>14}", row.region, group_thousands(row.current_price))?;
            }
            Ok(())
        }
    }
}

pub fn heatmap<W: Write>(mut out: W, report: &HeatmapReport, format: OutputFormat) -> anyhow::Result<()> {
    let rows = report.cells.iter().map(|cell| {
        let aggregate = cell.aggregate;
        HeatmapRow {
            name: &cell.name,
            records: aggregate.map_or(0, |a| a.count),
            value: cell.value,
            avg_current: aggregate.map_or(0.0, |a| a.avg_current),
            avg_prev_month: aggregate.map_or(0.0, |a| a.avg_prev_month),
            avg_prev_year: aggregate.map_or(0.0, |a| a.avg_prev_year),
        }
    });
    match format {
        OutputFormat::Csv => write_csv(out, rows),
        OutputFormat::Json => write_json(out, report),
        OutputFormat::Text => {
            if let Some((min, max)) = report.legend {
                writeln!(out, "legend: {} .. {}", group_thousands(min), group_thousands(max))?;
            }
            if let Some(bound) = report.growth_domain {
                writeln!(out, "scale: -{bound:.2}% .. +{bound:.2}%")?;
            }
            for row in rows {
                if row.records == 0 {
                    writeln!(out, "{:<20} {:>14}", row.name, "-")?;
                } else if report.mode == MapMode::Price {
                    writeln!(out, "{:<20} {:>14}", row.name, group_thousands(row.value.round() as u64))?;
                } else {
                    writeln!(out, "{:<20} {:>13.2}%", row.name, row.value)?;
                }
            }
            Ok(())
        }
    }
}
