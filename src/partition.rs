//! Identities shared by every stage: the year partition and the artifact kind.

use serde::Serialize;
use std::fmt;

/// A year-labelled remote directory, e.g. `2019`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Partition(String);

impl Partition {
    /// Accepts exactly four ASCII digits.
    pub fn new(label: &str) -> Option<Self> {
        (label.len() == 4 && label.bytes().all(|b| b.is_ascii_digit()))
            .then(|| Self(label.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The two degree-day artifacts published per partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DegreeDayKind {
    Cooling,
    Heating,
}

impl DegreeDayKind {
    pub const ALL: [DegreeDayKind; 2] = [DegreeDayKind::Cooling, DegreeDayKind::Heating];

    pub fn as_str(&self) -> &'static str {
        match self {
            DegreeDayKind::Cooling => "cooling",
            DegreeDayKind::Heating => "heating",
        }
    }

    /// Remote and cached file name.
    pub fn file_name(&self) -> &'static str {
        match self {
            DegreeDayKind::Cooling => "ClimateDivisions.Cooling.txt",
            DegreeDayKind::Heating => "ClimateDivisions.Heating.txt",
        }
    }

    /// Column header of this kind's mean in the combined table.
    pub fn column(&self) -> &'static str {
        match self {
            DegreeDayKind::Cooling => "CDD",
            DegreeDayKind::Heating => "HDD",
        }
    }

    /// File name of this kind's tidy table.
    pub fn tidy_file_name(&self) -> &'static str {
        match self {
            DegreeDayKind::Cooling => "weather_cdd.csv",
            DegreeDayKind::Heating => "weather_hdd.csv",
        }
    }
}

impl fmt::Display for DegreeDayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
