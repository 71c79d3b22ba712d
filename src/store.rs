//! Shared news store backed by a JSON snapshot.
//!
//! The ingester exports competitors and news rows into a snapshot file
//! (`{"competitors": [...], "news": [...]}`). The store loads it once and
//! serves reads from memory. Clones share the same data through
//! `Arc<RwLock<>>`, so the HTTP handlers can read concurrently while flag
//! updates take the write lock. When file backed, every mutation is written
//! back to the snapshot through a temp file and a rename.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::filter::NewsFilter;
use crate::region::region_from_location;
use crate::types::{Competitor, MAX_THREAT, MIN_THREAT, NewsDetails, NewsItem};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("news item {0} not found")]
    NotFound(String),
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    #[error("failed to persist snapshot: {0:#}")]
    Persist(anyhow::Error),
}

/// On-disk snapshot layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub competitors: Vec<Competitor>,
    #[serde(default)]
    pub news: Vec<NewsItem>,
}

/// Which flag a mutation touches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsFlag {
    Read,
    Starred,
}

#[derive(Clone)]
pub struct NewsStore {
    inner: Arc<RwLock<StoreInner>>,
}

struct StoreInner {
    snapshot: Snapshot,
    path: Option<PathBuf>,
}

impl NewsStore {
    /// Load a snapshot file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;

        tracing::info!(
            competitors = snapshot.competitors.len(),
            news = snapshot.news.len(),
            "Loaded snapshot from {}",
            path.display()
        );

        Ok(Self::build(snapshot, Some(path.to_path_buf())))
    }

    /// In-memory store that never touches disk
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self::build(snapshot, None)
    }

    fn build(mut snapshot: Snapshot, path: Option<PathBuf>) -> Self {
        for item in &mut snapshot.news {
            normalize_item(item);
        }
        Self {
            inner: Arc::new(RwLock::new(StoreInner { snapshot, path })),
        }
    }

    pub async fn competitors(&self) -> Vec<Competitor> {
        self.inner.read().await.snapshot.competitors.clone()
    }

    pub async fn all(&self) -> Vec<NewsItem> {
        self.inner.read().await.snapshot.news.clone()
    }

    pub async fn get(&self, id: &str) -> Result<NewsItem, StoreError> {
        let inner = self.inner.read().await;
        inner
            .snapshot
            .news
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Items matching `filter`, newest first
    pub async fn list(&self, filter: &NewsFilter) -> Result<Vec<NewsItem>, StoreError> {
        let inner = self.inner.read().await;
        filter
            .apply(&inner.snapshot.news)
            .map_err(|e| StoreError::InvalidFilter(e.to_string()))
    }

    pub async fn set_read(&self, id: &str, value: bool) -> Result<NewsItem, StoreError> {
        self.set_flag(id, NewsFlag::Read, value).await
    }

    pub async fn set_starred(&self, id: &str, value: bool) -> Result<NewsItem, StoreError> {
        self.set_flag(id, NewsFlag::Starred, value).await
    }

    /// Set a flag and persist. The write lock is held until the snapshot is
    /// on disk so concurrent updates are written in order.
    pub async fn set_flag(
        &self,
        id: &str,
        flag: NewsFlag,
        value: bool,
    ) -> Result<NewsItem, StoreError> {
        let mut inner = self.inner.write().await;

        let item = inner
            .snapshot
            .news
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let slot = match flag {
            NewsFlag::Read => &mut item.is_read,
            NewsFlag::Starred => &mut item.is_starred,
        };
        if *slot == value {
            return Ok(item.clone());
        }
        *slot = value;
        let updated = item.clone();

        tracing::debug!(id, ?flag, value, "Updated news flag");

        if let Some(ref path) = inner.path {
            persist(path, &inner.snapshot)
                .await
                .map_err(StoreError::Persist)?;
        }

        Ok(updated)
    }

    /// Fill in the region of rows that have none, from the details blob.
    /// Rows that already carry a region, or whose details cannot be read,
    /// are left alone. Returns how many rows changed; the snapshot is
    /// written once if any did.
    pub async fn backfill_regions(&self) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;

        let mut updated = 0;
        for item in &mut inner.snapshot.news {
            if item.region_label().is_some() {
                continue;
            }
            let Some(region) = inferred_region(item) else {
                tracing::debug!(id = %item.id, "No readable details, region left empty");
                continue;
            };
            tracing::debug!(id = %item.id, %region, "Backfilled region");
            item.region = Some(region);
            updated += 1;
        }

        if updated > 0
            && let Some(ref path) = inner.path
        {
            persist(path, &inner.snapshot)
                .await
                .map_err(StoreError::Persist)?;
        }

        tracing::info!("Backfilled region on {} row(s)", updated);
        Ok(updated)
    }
}

/// Clamp the threat level to 1..=5, as the ingester does. Regions are
/// left as stored.
fn normalize_item(item: &mut NewsItem) {
    item.threat_level = item.threat_level.clamp(MIN_THREAT, MAX_THREAT);
}

/// Region for a row that has none: `primary_region` from the details blob,
/// else the region of its location. Rows without a details object get
/// nothing.
fn inferred_region(item: &NewsItem) -> Option<String> {
    let details = NewsDetails::try_parse(item.details.as_deref()?)?;
    let region = details.primary_region.unwrap_or_else(|| {
        let location = details.location.unwrap_or_default();
        region_from_location(&location).to_string()
    });
    Some(region)
}

async fn persist(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot).context("Failed to serialize snapshot")?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, json)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::resolve;

    const SNAPSHOT: &str = r#"{
        "competitors": [
            {"id": "acme", "name": "Acme Machines", "headquarters": "Stuttgart, Germany"}
        ],
        "news": [
            {
                "id": "n1",
                "competitorId": "acme",
                "date": "2025-06-01T00:00:00.000Z",
                "title": "Acme wins tender",
                "threatLevel": 4,
                "details": "{\"location\":\"Bogota, Colombia\"}"
            },
            {
                "id": "n2",
                "competitorId": "acme",
                "date": "2025-06-02T00:00:00.000Z",
                "title": "Acme opens office",
                "threatLevel": 3,
                "region": "EUROPE",
                "details": "{\"location\":\"Madrid\"}"
            },
            {
                "id": "n3",
                "competitorId": "acme",
                "date": "2025-06-03T00:00:00.000Z",
                "title": "Acme hires CFO",
                "threatLevel": 0,
                "details": "broken"
            },
            {
                "id": "n4",
                "competitorId": "acme",
                "date": "2025-06-04T00:00:00.000Z",
                "title": "Acme signs distributor",
                "threatLevel": 9,
                "details": "{\"location\":\"Jeddah, Saudi Arabia\"}"
            }
        ]
    }"#;

    fn store() -> NewsStore {
        NewsStore::from_snapshot(serde_json::from_str(SNAPSHOT).unwrap())
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("compintel-{}-{}.json", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_rows_are_normalized_on_load() {
        let store = store();
        let n1 = store.get("n1").await.unwrap();
        assert_eq!(n1.threat_level, 4);
        assert_eq!(n1.region, None);

        let n2 = store.get("n2").await.unwrap();
        assert_eq!(n2.region.as_deref(), Some("EUROPE"));

        let n3 = store.get("n3").await.unwrap();
        assert_eq!(n3.threat_level, 1);
        assert_eq!(n3.region, None);

        assert_eq!(store.get("n4").await.unwrap().threat_level, 5);
    }

    #[tokio::test]
    async fn test_loading_does_not_move_map_markers() {
        let raw: Snapshot = serde_json::from_str(SNAPSHOT).unwrap();
        let store = NewsStore::from_snapshot(raw.clone());

        let loaded = resolve(&store.all().await);
        assert_eq!(loaded, resolve(&raw.news));
        // only Madrid is a known place; the others have no region
        assert_eq!(loaded.unresolved, 3);
        assert_eq!(loaded.buckets["Madrid"].count, 1);
    }

    #[tokio::test]
    async fn test_backfill_regions() {
        let store = store();
        assert_eq!(store.backfill_regions().await.unwrap(), 2);

        let region = |id: &'static str| {
            let store = store.clone();
            async move { store.get(id).await.unwrap().region }
        };
        assert_eq!(region("n1").await.as_deref(), Some("South America"));
        assert_eq!(region("n2").await.as_deref(), Some("EUROPE"));
        assert_eq!(region("n3").await, None);
        assert_eq!(region("n4").await.as_deref(), Some("MENA"));

        // n1 and n4 now sit on their region centroids
        let placement = resolve(&store.all().await);
        assert_eq!(placement.unresolved, 1);
        assert_eq!(placement.buckets["South America"].count, 1);
        assert_eq!(placement.buckets["MENA"].max_severity, 5);

        assert_eq!(store.backfill_regions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_backfill_is_persisted() {
        let path = temp_path("backfill");
        tokio::fs::write(&path, SNAPSHOT).await.unwrap();

        let store = NewsStore::load(&path).await.unwrap();
        store.backfill_regions().await.unwrap();

        let reloaded = NewsStore::load(&path).await.unwrap();
        assert_eq!(reloaded.get("n4").await.unwrap().region.as_deref(), Some("MENA"));

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn test_list_with_region_filter() {
        let store = store();
        let items = store.list(&NewsFilter::for_region("Europe")).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "n2");
    }

    #[tokio::test]
    async fn test_invalid_filter() {
        let filter = NewsFilter {
            min_threat: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            store().list(&filter).await,
            Err(StoreError::InvalidFilter(_))
        ));
    }

    #[tokio::test]
    async fn test_flags_are_shared_between_clones() {
        let store = store();
        let other = store.clone();

        let updated = store.set_starred("n2", true).await.unwrap();
        assert!(updated.is_starred);
        assert!(other.get("n2").await.unwrap().is_starred);

        other.set_read("n2", true).await.unwrap();
        let starred_unread = NewsFilter {
            starred: Some(true),
            read: Some(false),
            ..Default::default()
        };
        assert!(store.list(&starred_unread).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id() {
        assert!(matches!(
            store().set_read("missing", true).await,
            Err(StoreError::NotFound(id)) if id == "missing"
        ));
    }

    #[tokio::test]
    async fn test_mutations_are_persisted() {
        let path = temp_path("persist");
        tokio::fs::write(&path, SNAPSHOT).await.unwrap();

        let store = NewsStore::load(&path).await.unwrap();
        store.set_read("n1", true).await.unwrap();

        let reloaded = NewsStore::load(&path).await.unwrap();
        assert!(reloaded.get("n1").await.unwrap().is_read);
        assert_eq!(reloaded.competitors().await.len(), 1);

        tokio::fs::remove_file(&path).await.ok();
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        assert!(NewsStore::load(temp_path("missing")).await.is_err());
    }
}
