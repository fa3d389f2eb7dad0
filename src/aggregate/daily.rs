use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::aggregate::types::{CombinedRow, DailyIndex, TidyTable};
use crate::aggregate::utility::mean;

/// Groups a tidy table by date and averages every value reported that day,
/// duplicates included.
pub fn daily_index(table: &TidyTable) -> DailyIndex {
    let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for row in table.rows() {
        by_date.entry(row.date).or_default().push(row.value);
    }
    DailyIndex::from_means(
        table.kind(),
        by_date.into_iter().map(|(date, values)| (date, mean(&values))),
    )
}

/// Inner join on date. Dates missing from either index are dropped; rows come
/// out in ascending date order.
pub fn combine(cooling: &DailyIndex, heating: &DailyIndex) -> Vec<CombinedRow> {
    cooling
        .iter()
        .filter_map(|(date, cdd)| {
            heating.get(&date).map(|hdd| CombinedRow {
                date,
                cooling: cdd,
                heating: hdd,
            })
        })
        .collect()
}
