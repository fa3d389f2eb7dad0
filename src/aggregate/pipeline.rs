//! The ingestion loop: partitions → cached artifacts → parsed rows → tables.
//!
//! Everything runs in sequence. A missing or unparseable artifact only leaves
//! a gap; the one fatal condition is a failed discovery.

use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::aggregate::{Aggregates, TidyTable};
use crate::cache::{FetchCache, FetchOutcome};
use crate::discovery::discover_partitions;
use crate::error::{FetchFailure, FormatError};
use crate::fetch::HttpClient;
use crate::output::{OutputPaths, write_outputs};
use crate::parser::DegreeDayTable;
use crate::partition::{DegreeDayKind, Partition};

/// How artifacts are obtained for each partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquire {
    /// Use the cache, downloading what is missing.
    Download,
    /// Use only what is already cached; never touch the network.
    CachedOnly,
}

/// Where the partition list comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Discover partitions from the remote index and fetch missing artifacts.
    Remote,
    /// Aggregate the partitions already under the cache root.
    Local,
}

#[derive(Debug)]
pub enum SkipReason {
    FetchFailed(FetchFailure),
    NotCached,
    Unreadable(String),
    Unparseable(FormatError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::FetchFailed(e) => write!(f, "fetch failed: {e}"),
            SkipReason::NotCached => f.write_str("not cached"),
            SkipReason::Unreadable(e) => write!(f, "unreadable: {e}"),
            SkipReason::Unparseable(e) => write!(f, "unparseable: {e}"),
        }
    }
}

/// An artifact that contributes no rows to this run.
#[derive(Debug)]
pub struct Skip {
    pub partition: Partition,
    pub kind: DegreeDayKind,
    pub reason: SkipReason,
}

/// Per-run bookkeeping.
#[derive(Debug, Default)]
pub struct RunReport {
    pub partitions: usize,
    pub downloaded: usize,
    pub cached: usize,
    pub parsed: usize,
    pub skipped: Vec<Skip>,
}

impl RunReport {
    /// Counts one [`FetchCache::ensure`] outcome; returns the local path when
    /// there is one to parse.
    fn record(
        &mut self,
        partition: &Partition,
        kind: DegreeDayKind,
        outcome: FetchOutcome,
    ) -> Option<PathBuf> {
        match outcome {
            FetchOutcome::Skipped(path) => {
                self.cached += 1;
                Some(path)
            }
            FetchOutcome::Fetched(path) => {
                self.downloaded += 1;
                Some(path)
            }
            FetchOutcome::Failed(failure) => {
                self.skip(partition, kind, SkipReason::FetchFailed(failure));
                None
            }
        }
    }

    fn skip(&mut self, partition: &Partition, kind: DegreeDayKind, reason: SkipReason) {
        warn!(partition = %partition, kind = %kind, reason = %reason, "skipping artifact");
        self.skipped.push(Skip {
            partition: partition.clone(),
            kind,
            reason,
        });
    }

    /// Repeats every skip at the end of the run so gaps are easy to spot.
    pub fn log_summary(&self) {
        info!(
            partitions = self.partitions,
            downloaded = self.downloaded,
            cached = self.cached,
            parsed = self.parsed,
            skipped = self.skipped.len(),
            "run summary"
        );
        for s in &self.skipped {
            warn!(partition = %s.partition, kind = %s.kind, reason = %s.reason, "missing from output");
        }
    }
}

/// Tidy tables gathered from a set of partitions.
#[derive(Debug)]
pub struct Collected {
    pub cooling: TidyTable,
    pub heating: TidyTable,
    pub report: RunReport,
}

impl Collected {
    fn table_mut(&mut self, kind: DegreeDayKind) -> &mut TidyTable {
        match kind {
            DegreeDayKind::Cooling => &mut self.cooling,
            DegreeDayKind::Heating => &mut self.heating,
        }
    }
}

/// Outcome of a complete run.
#[derive(Debug)]
pub struct RunSummary {
    pub report: RunReport,
    pub outputs: OutputPaths,
    pub aggregates: Aggregates,
}

/// Concatenates every parseable artifact of each kind, in partition order.
pub async fn collect_tables<C: HttpClient>(
    cache: &FetchCache<C>,
    partitions: &[Partition],
    acquire: Acquire,
) -> Result<Collected> {
    let mut collected = Collected {
        cooling: TidyTable::new(DegreeDayKind::Cooling),
        heating: TidyTable::new(DegreeDayKind::Heating),
        report: RunReport {
            partitions: partitions.len(),
            ..Default::default()
        },
    };

    for partition in partitions {
        info!(partition = %partition, "processing partition");
        for kind in DegreeDayKind::ALL {
            let path = match acquire {
                Acquire::Download => {
                    let outcome = cache.ensure(partition, kind).await?;
                    match collected.report.record(partition, kind, outcome) {
                        Some(path) => path,
                        None => continue,
                    }
                }
                Acquire::CachedOnly => match cache.cached(partition, kind) {
                    Some(path) => {
                        collected.report.cached += 1;
                        path
                    }
                    None => {
                        collected.report.skip(partition, kind, SkipReason::NotCached);
                        continue;
                    }
                },
            };

            match load_rows(&path, collected.table_mut(kind)) {
                Ok(Ok(rows)) => {
                    collected.report.parsed += 1;
                    debug!(partition = %partition, kind = %kind, rows, "parsed artifact");
                }
                Ok(Err(e)) => collected
                    .report
                    .skip(partition, kind, SkipReason::Unparseable(e)),
                Err(e) => collected
                    .report
                    .skip(partition, kind, SkipReason::Unreadable(e.to_string())),
            }
        }
    }

    Ok(collected)
}

/// Reads one cached artifact and appends its rows to `table`.
/// Outer error: the file could not be read. Inner error: it could not be parsed.
fn load_rows(path: &Path, table: &mut TidyTable) -> std::io::Result<Result<usize, FormatError>> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);
    Ok(DegreeDayTable::parse(&text).map(|parsed| table.append(parsed.observations())))
}

/// Discovers partitions and makes sure every artifact is cached. No parsing.
#[tracing::instrument(skip_all, fields(base = %cache.base_url()))]
pub async fn download<C: HttpClient>(cache: &FetchCache<C>) -> Result<RunReport> {
    let partitions = discover_partitions(cache.client(), cache.base_url())
        .await
        .context("discovering partitions")?;

    let mut report = RunReport {
        partitions: partitions.len(),
        ..Default::default()
    };
    if partitions.is_empty() {
        warn!(base = %cache.base_url(), "no partitions found");
        return Ok(report);
    }

    for partition in &partitions {
        info!(partition = %partition, "processing partition");
        for kind in DegreeDayKind::ALL {
            let outcome = cache.ensure(partition, kind).await?;
            report.record(partition, kind, outcome);
        }
    }

    info!("finished downloading degree-day files");
    Ok(report)
}

/// Full run: resolve partitions, collect both tables, derive the daily
/// means, and write all three outputs to `processed_dir`.
#[tracing::instrument(skip_all, fields(source = ?source, processed_dir = %processed_dir.display()))]
pub async fn run<C: HttpClient>(
    cache: &FetchCache<C>,
    processed_dir: &Path,
    source: Source,
) -> Result<RunSummary> {
    let (partitions, acquire) = match source {
        Source::Remote => (
            discover_partitions(cache.client(), cache.base_url())
                .await
                .context("discovering partitions")?,
            Acquire::Download,
        ),
        Source::Local => (cache.local_partitions()?, Acquire::CachedOnly),
    };
    if partitions.is_empty() {
        warn!("no partitions found; writing empty tables");
    }

    let collected = collect_tables(cache, &partitions, acquire).await?;
    let aggregates = Aggregates::from_tables(collected.cooling, collected.heating);
    let outputs = write_outputs(processed_dir, &aggregates)?;

    Ok(RunSummary {
        report: collected.report,
        outputs,
        aggregates,
    })
}
