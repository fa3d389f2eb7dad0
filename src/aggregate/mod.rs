//! Partition aggregation: per-kind tidy tables, daily national means, and
//! the combined daily table.

pub mod daily;
pub mod pipeline;
pub mod types;
pub mod utility;

pub use daily::{combine, daily_index};
pub use pipeline::{Acquire, RunReport, RunSummary, Skip, SkipReason, Source};
pub use types::{CombinedRow, DailyIndex, TidyTable};

/// Everything a run persists, derived in full from the two tidy tables.
#[derive(Debug, Clone)]
pub struct Aggregates {
    pub cooling: TidyTable,
    pub heating: TidyTable,
    pub cooling_daily: DailyIndex,
    pub heating_daily: DailyIndex,
    pub combined: Vec<CombinedRow>,
}

impl Aggregates {
    pub fn from_tables(cooling: TidyTable, heating: TidyTable) -> Self {
        let cooling_daily = daily_index(&cooling);
        let heating_daily = daily_index(&heating);
        let combined = combine(&cooling_daily, &heating_daily);
        Self {
            cooling,
            heating,
            cooling_daily,
            heating_daily,
            combined,
        }
    }
}
