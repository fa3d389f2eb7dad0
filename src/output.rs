//! CSV persistence for the processed tables.
//!
//! Every table is rewritten from scratch on each run and always carries its
//! header row, even when it has no data rows.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::aggregate::{Aggregates, CombinedRow, TidyTable};
use crate::partition::DegreeDayKind;

pub const COMBINED_FILE_NAME: &str = "weather_agg.csv";
pub const TIDY_HEADER: [&str; 3] = ["region", "date", "value"];

/// Where [`write_outputs`] put the three tables.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub cooling: PathBuf,
    pub heating: PathBuf,
    pub combined: PathBuf,
}

/// Writes `weather_cdd.csv`, `weather_hdd.csv` and `weather_agg.csv` into `dir`.
pub fn write_outputs(dir: &Path, aggregates: &Aggregates) -> Result<OutputPaths> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let paths = OutputPaths {
        cooling: dir.join(DegreeDayKind::Cooling.tidy_file_name()),
        heating: dir.join(DegreeDayKind::Heating.tidy_file_name()),
        combined: dir.join(COMBINED_FILE_NAME),
    };

    write_tidy_table(&paths.cooling, &aggregates.cooling)?;
    write_tidy_table(&paths.heating, &aggregates.heating)?;
    write_combined(&paths.combined, &aggregates.combined)?;

    info!(
        cooling_rows = aggregates.cooling.len(),
        heating_rows = aggregates.heating.len(),
        combined_rows = aggregates.combined.len(),
        dir = %dir.display(),
        "wrote processed tables"
    );
    Ok(paths)
}

/// `region,date,value`, one row per observation in table order.
pub fn write_tidy_table(path: &Path, table: &TidyTable) -> Result<()> {
    write_csv(path, &TIDY_HEADER, table.rows())
}

/// `date,CDD,HDD`, ascending by date.
pub fn write_combined(path: &Path, rows: &[CombinedRow]) -> Result<()> {
    write_csv(path, &CombinedRow::HEADER, rows)
}

/// Writes `header` followed by each serialized row, replacing any existing file.
pub fn write_csv<'a, T, I>(path: &Path, header: &[&str], rows: I) -> Result<()>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
{
    debug!(path = %path.display(), "writing CSV");
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;

    // header is written by hand so empty tables still get one
    let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}
