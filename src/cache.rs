//! Idempotent local cache of per-partition artifacts.
//!
//! An artifact that is already on disk is never requested again, even if the
//! remote copy has changed since. The existence check and the write are not
//! guarded against other processes; one run at a time per cache root.

use anyhow::{Context, Result, bail};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::FetchFailure;
use crate::fetch::{self, HttpClient};
use crate::partition::{DegreeDayKind, Partition};

/// Result of [`FetchCache::ensure`] for one (partition, kind).
#[derive(Debug)]
pub enum FetchOutcome {
    /// Already resident; no request was made.
    Skipped(PathBuf),
    /// Downloaded and persisted by this call.
    Fetched(PathBuf),
    /// Soft failure: nothing was written.
    Failed(FetchFailure),
}

impl FetchOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            FetchOutcome::Skipped(p) | FetchOutcome::Fetched(p) => Some(p),
            FetchOutcome::Failed(_) => None,
        }
    }
}

pub struct FetchCache<C> {
    client: C,
    base_url: Url,
    root: PathBuf,
}

impl<C: HttpClient> FetchCache<C> {
    /// `base_url` must end in `/` so that partitions join beneath it.
    pub fn new(client: C, base_url: Url, root: impl Into<PathBuf>) -> Self {
        Self {
            client,
            base_url,
            root: root.into(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<partition>/<artifact>`.
    pub fn path_for(&self, partition: &Partition, kind: DegreeDayKind) -> PathBuf {
        self.root.join(partition.as_str()).join(kind.file_name())
    }

    /// `<base>/<partition>/<artifact>`.
    pub fn url_for(&self, partition: &Partition, kind: DegreeDayKind) -> Result<Url> {
        let rel = format!("{}/{}", partition, kind.file_name());
        self.base_url
            .join(&rel)
            .with_context(|| format!("joining {} onto {}", rel, self.base_url))
    }

    /// The cached path if the artifact is resident. Never touches the network.
    pub fn cached(&self, partition: &Partition, kind: DegreeDayKind) -> Option<PathBuf> {
        let path = self.path_for(partition, kind);
        path.is_file().then_some(path)
    }

    /// Returns the local copy, downloading it first if it is not cached.
    ///
    /// Non-200 responses and transport errors come back as
    /// [`FetchOutcome::Failed`]; only local I/O problems are errors, including
    /// something other than a regular file sitting at the artifact path.
    #[tracing::instrument(skip_all, fields(partition = %partition, kind = %kind))]
    pub async fn ensure(&self, partition: &Partition, kind: DegreeDayKind) -> Result<FetchOutcome> {
        let dir = self.root.join(partition.as_str());
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        let path = dir.join(kind.file_name());
        if path.is_file() {
            info!(path = %path.display(), "already cached");
            return Ok(FetchOutcome::Skipped(path));
        }
        if path.exists() {
            bail!("{} exists but is not a regular file", path.display());
        }

        let url = self.url_for(partition, kind)?;
        info!(url = %url, "downloading");

        let resp = match fetch::get(&self.client, &url).await {
            Ok(resp) => resp,
            Err(e) => {
                let failure = FetchFailure::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                };
                warn!(error = %failure, "skipping artifact");
                return Ok(FetchOutcome::Failed(failure));
            }
        };

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let failure = FetchFailure::Status {
                url: url.to_string(),
                status,
            };
            warn!(status = status.as_u16(), "skipping artifact");
            return Ok(FetchOutcome::Failed(failure));
        }

        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) => {
                let failure = FetchFailure::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                };
                warn!(error = %failure, "skipping artifact");
                return Ok(FetchOutcome::Failed(failure));
            }
        };

        persist_atomically(&dir, &path, &body)?;
        info!(path = %path.display(), bytes = body.len(), "saved");
        Ok(FetchOutcome::Fetched(path))
    }

    /// Partitions already present under the cache root, ascending. Used when
    /// aggregating without network access.
    pub fn local_partitions(&self) -> Result<Vec<Partition>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut partitions = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("listing {}", self.root.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(p) = entry.file_name().to_str().and_then(Partition::new) {
                partitions.push(p);
            }
        }
        partitions.sort();
        debug!(count = partitions.len(), "local partitions");
        Ok(partitions)
    }
}

/// Writes to a temp file in `dir`, then renames over `path`. A crash never
/// leaves a truncated artifact behind for later runs to treat as cached.
fn persist_atomically(dir: &Path, path: &Path, body: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(body)?;
    tmp.flush()?;
    tmp.persist(path)
        .with_context(|| format!("persisting {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::BasicClient;
    use crate::fetch::fake::FakeClient;
    use tempfile::tempdir;

    const BASE: &str = "http://cpc.test/daily/";

    fn year(label: &str) -> Partition {
        Partition::new(label).unwrap()
    }

    fn cooling_url(label: &str) -> String {
        format!("{BASE}{label}/ClimateDivisions.Cooling.txt")
    }

    #[test]
    fn test_paths_are_deterministic() {
        let cache = FetchCache::new(FakeClient::new(), Url::parse(BASE).unwrap(), "/raw");
        assert_eq!(
            cache.path_for(&year("2020"), DegreeDayKind::Heating),
            PathBuf::from("/raw/2020/ClimateDivisions.Heating.txt")
        );
        assert_eq!(
            cache.url_for(&year("2020"), DegreeDayKind::Cooling).unwrap().as_str(),
            cooling_url("2020")
        );
    }

    #[tokio::test]
    async fn test_second_ensure_makes_no_request() {
        let dir = tempdir().unwrap();
        let client = FakeClient::new().route(&cooling_url("2020"), 200, "Region|20200101\n");
        let cache = FetchCache::new(client, Url::parse(BASE).unwrap(), dir.path());

        let first = cache.ensure(&year("2020"), DegreeDayKind::Cooling).await.unwrap();
        assert!(matches!(first, FetchOutcome::Fetched(_)));
        let path = first.path().unwrap().to_path_buf();
        let before = fs::read(&path).unwrap();
        assert_eq!(cache.client().calls().len(), 1);

        let second = cache.ensure(&year("2020"), DegreeDayKind::Cooling).await.unwrap();
        assert!(matches!(second, FetchOutcome::Skipped(ref p) if *p == path));
        assert_eq!(cache.client().calls().len(), 1);
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_existing_file_is_never_refreshed() {
        let dir = tempdir().unwrap();
        let client = FakeClient::new().route(&cooling_url("2020"), 200, "new remote content");
        let cache = FetchCache::new(client, Url::parse(BASE).unwrap(), dir.path());

        let path = cache.path_for(&year("2020"), DegreeDayKind::Cooling);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "stale local content").unwrap();

        let outcome = cache.ensure(&year("2020"), DegreeDayKind::Cooling).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Skipped(_)));
        assert!(cache.client().calls().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "stale local content");
    }

    #[tokio::test]
    async fn test_non_200_is_soft_failure_and_writes_nothing() {
        let dir = tempdir().unwrap();
        let cache = FetchCache::new(FakeClient::new(), Url::parse(BASE).unwrap(), dir.path());

        let outcome = cache.ensure(&year("2021"), DegreeDayKind::Heating).await.unwrap();
        match outcome {
            FetchOutcome::Failed(FetchFailure::Status { status, .. }) => {
                assert_eq!(status.as_u16(), 404)
            }
            other => panic!("expected 404 failure, got {other:?}"),
        }
        assert!(cache.cached(&year("2021"), DegreeDayKind::Heating).is_none());
        // the partition directory itself is created either way
        assert!(dir.path().join("2021").is_dir());
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("2021")).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_is_retried_on_next_run() {
        let dir = tempdir().unwrap();
        let failing = FetchCache::new(FakeClient::new(), Url::parse(BASE).unwrap(), dir.path());
        let outcome = failing.ensure(&year("2020"), DegreeDayKind::Cooling).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Failed(_)));

        let client = FakeClient::new().route(&cooling_url("2020"), 200, "ok");
        let healthy = FetchCache::new(client, Url::parse(BASE).unwrap(), dir.path());
        let outcome = healthy.ensure(&year("2020"), DegreeDayKind::Cooling).await.unwrap();
        assert!(matches!(outcome, FetchOutcome::Fetched(_)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_soft_failure_and_writes_nothing() {
        let dir = tempdir().unwrap();
        // nothing listens on port 1
        let cache = FetchCache::new(
            BasicClient::new(),
            Url::parse("http://127.0.0.1:1/daily/").unwrap(),
            dir.path(),
        );

        let outcome = cache.ensure(&year("2020"), DegreeDayKind::Cooling).await.unwrap();
        match outcome {
            FetchOutcome::Failed(FetchFailure::Transport { url, .. }) => {
                assert_eq!(url, "http://127.0.0.1:1/daily/2020/ClimateDivisions.Cooling.txt")
            }
            other => panic!("expected transport failure, got {other:?}"),
        }
        assert!(cache.cached(&year("2020"), DegreeDayKind::Cooling).is_none());
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("2020")).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_directory_at_artifact_path_is_not_treated_as_cached() {
        let dir = tempdir().unwrap();
        let client = FakeClient::new().route(&cooling_url("2020"), 200, "Region|20200101\n");
        let cache = FetchCache::new(client, Url::parse(BASE).unwrap(), dir.path());
        let path = cache.path_for(&year("2020"), DegreeDayKind::Cooling);
        fs::create_dir_all(&path).unwrap();

        assert!(cache.cached(&year("2020"), DegreeDayKind::Cooling).is_none());
        let err = cache
            .ensure(&year("2020"), DegreeDayKind::Cooling)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a regular file"));
        assert!(cache.client().calls().is_empty());
    }

    #[test]
    fn test_local_partitions_lists_year_directories_only() {
        let dir = tempdir().unwrap();
        for name in ["2005", "1999", "notes", "20051"] {
            fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("2010"), "a file, not a directory").unwrap();

        let cache = FetchCache::new(FakeClient::new(), Url::parse(BASE).unwrap(), dir.path());
        let parts = cache.local_partitions().unwrap();
        assert_eq!(parts, vec![year("1999"), year("2005")]);
    }

    #[test]
    fn test_local_partitions_of_missing_root_is_empty() {
        let dir = tempdir().unwrap();
        let cache = FetchCache::new(
            FakeClient::new(),
            Url::parse(BASE).unwrap(),
            dir.path().join("absent"),
        );
        assert!(cache.local_partitions().unwrap().is_empty());
    }
}
