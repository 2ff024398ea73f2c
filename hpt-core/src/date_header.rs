//! Interpreting free-form Korean month headers such as `"2025년 11월"`,
//! `"'24년 3월"` or `"2025년 12월 (예측)"`.
//!
//! Header text is tokenized into number runs, words and separators. The
//! first two number runs give the year and month; the forecast marker is
//! recognised only as a whole word, never as a substring of other text.

use crate::period::YearMonth;
use log::debug;
use serde::{Deserialize, Serialize};

/// Columns before the first month column: id plus four locale columns.
pub const METADATA_COLUMNS: usize = 5;

/// Word that marks a column as a forecast rather than an observed month.
pub const FORECAST_MARKER: &str = "예측";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderToken {
    Number(u32),
    /// A digit run too long for any year or month.
    Oversized(String),
    Word(String),
}

/// Unit suffixes that always stand as their own word, so text glued to
/// them ("9월예측") still tokenizes into separate words.
const UNIT_CHARS: [char; 2] = ['년', '월'];

/// Outcome of reading a period out of header text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderPeriod {
    Parsed { year: i32, month: u32 },
    Unparsed,
}

impl HeaderPeriod {
    pub fn year_month(&self) -> Option<YearMonth> {
        match *self {
            HeaderPeriod::Parsed { year, month } => Some(YearMonth::new(year, month)),
            HeaderPeriod::Unparsed => None,
        }
    }
}

/// One month column of the header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateHeader {
    /// Position in the header row.
    pub index: usize,
    pub raw_text: String,
    pub period: HeaderPeriod,
    pub forecast_marked: bool,
}

impl DateHeader {
    pub fn from_text(index: usize, text: &str) -> DateHeader {
        let raw_text = sanitize(text);
        let tokens = tokenize(&raw_text);
        let period = read_period(&tokens);
        let forecast_marked = tokens
            .iter()
            .any(|t| matches!(t, HeaderToken::Word(w) if w == FORECAST_MARKER));
        if period == HeaderPeriod::Unparsed {
            debug!("date_header: column {} '{}' has no year/month", index, raw_text);
        }
        DateHeader {
            index,
            raw_text,
            period,
            forecast_marked,
        }
    }

    /// An empty, unparsed header for price columns beyond the header row.
    pub fn missing(index: usize) -> DateHeader {
        DateHeader {
            index,
            raw_text: String::new(),
            period: HeaderPeriod::Unparsed,
            forecast_marked: false,
        }
    }

    /// Year, or 0 when unparsed.
    pub fn year(&self) -> i32 {
        self.period.year_month().map_or(0, |p| p.year)
    }

    /// Month, or 0 when unparsed.
    pub fn month(&self) -> u32 {
        self.period.year_month().map_or(0, |p| p.month)
    }
}

/// Interpret every month column of a header row (fields past the
/// metadata columns).
pub fn interpret(header_fields: &[String]) -> Vec<DateHeader> {
    header_fields
        .iter()
        .enumerate()
        .skip(METADATA_COLUMNS)
        .map(|(index, text)| DateHeader::from_text(index, text))
        .collect()
}

fn sanitize(text: &str) -> String {
    text.trim_start_matches(['\u{feff}', '"'])
        .trim_end_matches(['"', '\r'])
        .trim()
        .to_string()
}

pub fn tokenize(text: &str) -> Vec<HeaderToken> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() {
            let mut digits = String::new();
            while let Some(&d) = chars.peek().filter(|d| d.is_ascii_digit()) {
                digits.push(d);
                chars.next();
            }
            match digits.parse::<u32>() {
                Ok(n) => tokens.push(HeaderToken::Number(n)),
                Err(_) => tokens.push(HeaderToken::Oversized(digits)),
            }
        } else if UNIT_CHARS.contains(&c) {
            tokens.push(HeaderToken::Word(c.to_string()));
            chars.next();
        } else if c.is_alphabetic() {
            let mut word = String::new();
            while let Some(&w) = chars
                .peek()
                .filter(|w| w.is_alphabetic() && !UNIT_CHARS.contains(*w))
            {
                word.push(w);
                chars.next();
            }
            tokens.push(HeaderToken::Word(word));
        } else {
            chars.next();
        }
    }
    tokens
}

fn read_period(tokens: &[HeaderToken]) -> HeaderPeriod {
    // an oversized run still counts as one of the first two numbers
    let mut numbers = tokens.iter().filter_map(|t| match t {
        HeaderToken::Number(n) => Some(Some(*n)),
        HeaderToken::Oversized(_) => Some(None),
        HeaderToken::Word(_) => None,
    });
    match (numbers.next(), numbers.next()) {
        (Some(Some(year)), Some(Some(month))) if (1..=12).contains(&month) && year <= 9999 => {
            let year = if year < 100 { year + 2000 } else { year };
            HeaderPeriod::Parsed {
                year: year as i32,
                month,
            }
        }
        _ => HeaderPeriod::Unparsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_digit_year() {
        let header = DateHeader::from_text(5, "24년 11월");
        assert_eq!(header.period, HeaderPeriod::Parsed { year: 2024, month: 11 });
        assert_eq!((header.year(), header.month()), (2024, 11));
    }

    #[test]
    fn test_four_digit_year() {
        let header = DateHeader::from_text(5, "2012년 1월");
        assert_eq!((header.year(), header.month()), (2012, 1));
        assert!(!header.forecast_marked);
    }

    #[test]
    fn test_month_only_is_unparsed() {
        let header = DateHeader::from_text(5, "11월");
        assert_eq!(header.period, HeaderPeriod::Unparsed);
        assert_eq!((header.year(), header.month()), (0, 0));
    }

    #[test]
    fn test_no_numbers_is_unparsed() {
        let header = DateHeader::from_text(5, "지역");
        assert_eq!(header.period, HeaderPeriod::Unparsed);
    }

    #[test]
    fn test_out_of_range_month_is_unparsed() {
        let header = DateHeader::from_text(5, "2025년 13월");
        assert_eq!(header.period, HeaderPeriod::Unparsed);
    }

    #[test]
    fn test_bom_and_quotes_are_stripped() {
        let header = DateHeader::from_text(5, "\u{feff}\"2025년 3월\"\r");
        assert_eq!(header.raw_text, "2025년 3월");
        assert_eq!((header.year(), header.month()), (2025, 3));
    }

    #[test]
    fn test_forecast_marker_is_a_whole_word() {
        let marked = DateHeader::from_text(5, "2025년 12월 (예측)");
        assert!(marked.forecast_marked);
        assert_eq!((marked.year(), marked.month()), (2025, 12));

        let unmarked = DateHeader::from_text(5, "2025년 10월");
        assert!(!unmarked.forecast_marked);

        let longer_word = DateHeader::from_text(5, "2025년 10월 예측치");
        assert!(!longer_word.forecast_marked);
    }

    #[test]
    fn test_forecast_marker_glued_to_month() {
        let header = DateHeader::from_text(5, "2025년 9월예측");
        assert!(header.forecast_marked);
        assert_eq!((header.year(), header.month()), (2025, 9));
        assert_eq!(
            tokenize("9월예측"),
            vec![
                HeaderToken::Number(9),
                HeaderToken::Word("월".to_string()),
                HeaderToken::Word("예측".to_string()),
            ]
        );
    }

    #[test]
    fn test_oversized_number_is_unparsed() {
        let header = DateHeader::from_text(5, "99999999999년 2025년 3월");
        assert_eq!(header.period, HeaderPeriod::Unparsed);
        assert_eq!(
            tokenize("99999999999년")[0],
            HeaderToken::Oversized("99999999999".to_string())
        );
    }

    #[test]
    fn test_interpret_skips_metadata_columns() {
        let fields: Vec<String> = ["id", "a", "b", "c", "d", "2025년 10월", "2025년 11월"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let headers = interpret(&fields);
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[0].index, 5);
        assert_eq!(headers[1].index, 6);
        assert_eq!(headers[1].month(), 11);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("'25년 9월"),
            vec![
                HeaderToken::Number(25),
                HeaderToken::Word("년".to_string()),
                HeaderToken::Number(9),
                HeaderToken::Word("월".to_string()),
            ]
        );
    }
}
