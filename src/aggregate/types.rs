//! Tables produced by the aggregation stage.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::parser::Observation;
use crate::partition::DegreeDayKind;

/// Long-format rows of one kind, concatenated across partitions in partition
/// order. Not sorted and not deduplicated: overlapping source files keep both
/// copies of a (region, date) pair.
#[derive(Debug, Clone)]
pub struct TidyTable {
    kind: DegreeDayKind,
    rows: Vec<Observation>,
}

impl TidyTable {
    pub fn new(kind: DegreeDayKind) -> Self {
        Self {
            kind,
            rows: Vec::new(),
        }
    }

    pub fn kind(&self) -> DegreeDayKind {
        self.kind
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends rows, returning how many were added.
    pub fn append(&mut self, rows: impl IntoIterator<Item = Observation>) -> usize {
        let before = self.rows.len();
        self.rows.extend(rows);
        self.rows.len() - before
    }
}

/// Cross-region mean per date for one kind. Dates without observations are
/// absent rather than zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyIndex {
    kind: DegreeDayKind,
    means: BTreeMap<NaiveDate, f64>,
}

impl DailyIndex {
    pub fn from_means(kind: DegreeDayKind, means: impl IntoIterator<Item = (NaiveDate, f64)>) -> Self {
        Self {
            kind,
            means: means.into_iter().collect(),
        }
    }

    pub fn kind(&self) -> DegreeDayKind {
        self.kind
    }

    pub fn get(&self, date: &NaiveDate) -> Option<f64> {
        self.means.get(date).copied()
    }

    /// Entries in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.means.iter().map(|(d, v)| (*d, *v))
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }
}

/// One row of the combined national table: `date,CDD,HDD`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedRow {
    pub date: NaiveDate,
    #[serde(rename = "CDD")]
    pub cooling: f64,
    #[serde(rename = "HDD")]
    pub heating: f64,
}

impl CombinedRow {
    pub const HEADER: [&'static str; 3] = ["date", "CDD", "HDD"];
}
