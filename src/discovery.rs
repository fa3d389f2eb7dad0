//! Partition discovery from the remote directory index.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::error::DiscoveryError;
use crate::fetch::{self, HttpClient};
use crate::partition::Partition;

static YEAR_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}/$").expect("year directory pattern should compile"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector should parse"));

/// Fetches the listing at `base` and returns its year partitions, ascending.
///
/// Any failure here is fatal for the run: without the index there is nothing
/// to fetch.
#[tracing::instrument(skip_all, fields(base = %base))]
pub async fn discover_partitions<C: HttpClient + ?Sized>(
    client: &C,
    base: &Url,
) -> Result<Vec<Partition>, DiscoveryError> {
    let resp = fetch::get(client, base)
        .await
        .map_err(|source| DiscoveryError::Transport {
            url: base.to_string(),
            source,
        })?;

    let status = resp.status();
    if !status.is_success() {
        return Err(DiscoveryError::Status {
            url: base.to_string(),
            status,
        });
    }

    let html = resp.text().await.map_err(|source| DiscoveryError::Body {
        url: base.to_string(),
        source,
    })?;

    let partitions = partitions_from_index(&html);
    info!(count = partitions.len(), "discovered partitions");
    Ok(partitions)
}

/// Extracts anchors whose target is exactly `YYYY/`. Files and other
/// directories are ignored; duplicates collapse.
pub fn partitions_from_index(html: &str) -> Vec<Partition> {
    let document = Html::parse_document(html);
    let found: BTreeSet<Partition> = document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| YEAR_DIR.is_match(href))
        .filter_map(|href| Partition::new(href.trim_end_matches('/')))
        .collect();

    debug!(partitions = ?found, "parsed directory index");
    found.into_iter().collect()
}
