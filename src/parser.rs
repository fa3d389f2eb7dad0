//! Parser for the pipe-delimited climate-division degree-day text files.
//!
//! Layout: free-form preamble, one `Region|YYYYMMDD|YYYYMMDD|...` header, then
//! data lines `<region>|<value>|<value>|...`. Only lines whose first character
//! is an ASCII digit are data; everything else after the header (blank lines,
//! totals, footers) is ignored.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::FormatError;

pub const HEADER_SENTINEL: &str = "Region|";

/// One region's degree-day value for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub region: String,
    pub date: NaiveDate,
    pub value: f64,
}

/// A located header plus the unparsed text that follows it.
///
/// Borrowing the text keeps parsing lazy: rows are produced on demand by
/// [`DegreeDayTable::observations`], which can be called any number of times
/// and always yields the same sequence.
#[derive(Debug, Clone)]
pub struct DegreeDayTable<'a> {
    /// Header date per value column. `None` marks an empty label, whose
    /// cells are ignored.
    dates: Vec<Option<NaiveDate>>,
    body: &'a str,
}

impl<'a> DegreeDayTable<'a> {
    /// Finds the header line and decodes its date labels.
    ///
    /// # Errors
    ///
    /// [`FormatError::MissingHeader`] if no line starts with `Region|`;
    /// [`FormatError::BadDateLabel`] if a non-empty label is not a calendar
    /// date in `YYYYMMDD` form.
    pub fn parse(text: &'a str) -> Result<Self, FormatError> {
        let mut offset = 0;
        for raw in text.split_inclusive('\n') {
            offset += raw.len();
            let line = raw.trim_end_matches(['\n', '\r']);
            if let Some(labels) = line.strip_prefix(HEADER_SENTINEL) {
                let dates = labels
                    .split('|')
                    .enumerate()
                    .map(|(i, label)| parse_date_label(i + 1, label))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Self {
                    dates,
                    body: &text[offset..],
                });
            }
        }
        Err(FormatError::MissingHeader)
    }

    /// Header dates in column order, labels are neither unique nor sorted.
    pub fn dates(&self) -> &[Option<NaiveDate>] {
        &self.dates
    }

    /// A fresh pass over the data lines.
    pub fn observations(&self) -> Observations<'_> {
        Observations {
            dates: &self.dates,
            lines: self.body.lines(),
            current: None,
        }
    }
}

type Cells<'t> = std::iter::Zip<std::str::Split<'t, char>, std::slice::Iter<'t, Option<NaiveDate>>>;

/// Lazy iterator over the observations of one [`DegreeDayTable`].
///
/// Cells pair with header dates by position. A row longer or shorter than the
/// header is truncated to the shorter of the two.
#[derive(Debug, Clone)]
pub struct Observations<'t> {
    dates: &'t [Option<NaiveDate>],
    lines: std::str::Lines<'t>,
    current: Option<(&'t str, Cells<'t>)>,
}

impl Iterator for Observations<'_> {
    type Item = Observation;

    fn next(&mut self) -> Option<Observation> {
        loop {
            if let Some((region, cells)) = self.current.as_mut() {
                for (cell, date) in cells.by_ref() {
                    if let (Some(date), Some(value)) = (date, parse_cell(cell)) {
                        return Some(Observation {
                            region: region.to_string(),
                            date: *date,
                            value,
                        });
                    }
                }
                self.current = None;
            }

            let line = self.lines.next()?;
            if !line.starts_with(|c: char| c.is_ascii_digit()) {
                continue;
            }
            let mut fields = line.split('|');
            let region = fields.next().unwrap_or_default();
            self.current = Some((region, fields.zip(self.dates.iter())));
        }
    }
}

/// Parses a whole artifact and collects its rows.
pub fn parse_artifact(text: &str) -> Result<Vec<Observation>, FormatError> {
    Ok(DegreeDayTable::parse(text)?.observations().collect())
}

fn parse_date_label(column: usize, label: &str) -> Result<Option<NaiveDate>, FormatError> {
    let label = label.trim();
    if label.is_empty() {
        return Ok(None);
    }
    let bad = || FormatError::BadDateLabel {
        column,
        label: label.to_string(),
    };
    if label.len() != 8 || !label.bytes().all(|b| b.is_ascii_digit()) {
        return Err(bad());
    }
    NaiveDate::parse_from_str(label, "%Y%m%d")
        .map(Some)
        .map_err(|_| bad())
}

/// Malformed, placeholder, and non-finite cells are dropped.
fn parse_cell(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
