//! Splitting a price export into its header row and data rows.
//!
//! The export has a fixed layout:
//!
//! ```text
//! line 1      header: id, 4 locale columns, one column per month
//! lines 2-3   metadata (ignored)
//! line 4..    data rows
//! ```
//!
//! Every physical line is read on its own: quoted fields may contain the
//! delimiter but never a line break. Rows with fewer than
//! [`MIN_ROW_FIELDS`] fields are skipped individually.

use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, info};

/// Lines before the first data row (header plus two metadata lines).
pub const PREAMBLE_LINES: usize = 3;

/// A data row needs the id column and four locale columns at minimum.
pub const MIN_ROW_FIELDS: usize = 5;

/// One data row, keyed by its 1-based line number in the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub line: usize,
    pub fields: Vec<String>,
}

/// Header fields and data rows of a single export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub header: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl CsvTable {
    /// Parse raw export text. Returns an empty table when the text has
    /// fewer than four lines.
    pub fn parse(raw_text: &str) -> CsvTable {
        Self::parse_with_delimiter(raw_text, b',')
    }

    pub fn parse_with_delimiter(raw_text: &str, delimiter: u8) -> CsvTable {
        let text = raw_text.trim();
        let line_count = text.lines().count();
        if line_count <= PREAMBLE_LINES {
            info!("csv_table: {} line(s), need at least {}; no data", line_count, PREAMBLE_LINES + 1);
            return CsvTable::default();
        }

        let mut table = CsvTable::default();
        let mut skipped = 0u32;
        for (index, raw_line) in text.lines().enumerate() {
            let line = index + 1;
            if line > 1 && line <= PREAMBLE_LINES {
                continue;
            }
            let fields = match read_line(raw_line, delimiter) {
                Ok(Some(fields)) => fields,
                Ok(None) => continue,
                Err(e) => {
                    debug!("csv_table: skipping unreadable line {}: {}", line, e);
                    skipped += 1;
                    continue;
                }
            };
            if line == 1 {
                table.header = fields;
            } else if fields.len() < MIN_ROW_FIELDS {
                debug!("csv_table: line {} has {} field(s), skipping", line, fields.len());
                skipped += 1;
            } else {
                table.rows.push(RawRow { line, fields });
            }
        }
        info!(
            "csv_table: {} header field(s), {} data row(s), {} skipped",
            table.header.len(),
            table.rows.len(),
            skipped
        );
        table
    }
}

/// Read a single physical line as one record, so an unbalanced quote
/// never swallows the lines after it. `None` for a blank line.
fn read_line(line: &str, delimiter: u8) -> Result<Option<Vec<String>>, csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());
    let mut record = StringRecord::new();
    if rdr.read_record(&mut record)? {
        Ok(Some(record.iter().map(clean_field).collect()))
    } else {
        Ok(None)
    }
}

/// Strip carriage returns and stray quote characters from a field.
pub fn clean_field(field: &str) -> String {
    field.replace(['"', '\r'], "").trim().to_string()
}
