//! Quote store: validated operations over the database, shared by all
//! quotd interfaces.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use rand::Rng;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::db::{Database, LibSqlMetaRepository, LibSqlQuoteRepository, MetaRepository, QuoteRepository};
use crate::defaults::default_quotes;
use crate::error::{Error, Result};
use crate::export::{build_export_document, parse_import_payload, ExportDocument, ImportQuote};
use crate::models::{ConflictRecord, Quote, QuoteId};
use crate::util::unix_timestamp_ms;

/// Author recorded for imported quotes that carry none
const IMPORT_FALLBACK_AUTHOR: &str = "Unknown";

/// Category selection for reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryFilter {
    All,
    Category(String),
}

impl CategoryFilter {
    /// Parse a filter value; `None`, empty, and `"all"` select everything
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => Self::All,
            Some(name) if name.eq_ignore_ascii_case("all") => Self::All,
            Some(name) => Self::Category(name.to_lowercase()),
        }
    }

    /// The selected category, `None` for `All`
    #[must_use]
    pub fn as_category(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Category(name) => Some(name),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Category(name) => write!(f, "{name}"),
        }
    }
}

/// Outcome of an import batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Items appended to the collection
    pub imported: usize,
    /// Items skipped for failing validation
    pub skipped: usize,
}

/// Collection totals for status displays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub categories: usize,
    pub custom: usize,
    /// Quotes never registered with the remote side
    pub pending_upload: usize,
}

/// Thread-safe quote store over a shared database connection.
///
/// Every mutating call commits before returning; a failed write mutates
/// nothing. User-driven mutations stamp the last-local-change timestamp
/// the sync engine's conflict check reads.
#[derive(Clone)]
pub struct QuoteStore {
    db: Arc<Mutex<Database>>,
}

impl QuoteStore {
    /// Open a store at the given filesystem path, creating parent
    /// directories and seeding the default quote set on first open.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self {
            db: Arc::new(Mutex::new(Database::open(&db_path).await?)),
        };
        store.seed_defaults_if_needed().await?;
        Ok(store)
    }

    /// Open an in-memory store. No default seeding; tests start empty.
    pub async fn open_in_memory() -> Result<Self> {
        Ok(Self {
            db: Arc::new(Mutex::new(Database::open_in_memory().await?)),
        })
    }

    /// Seed the shipped quote set exactly once per installation.
    ///
    /// The seed marker survives a cleared collection, so clearing does not
    /// resurrect the defaults on the next open.
    pub async fn seed_defaults_if_needed(&self) -> Result<()> {
        let db = self.db.lock().await;
        let meta = LibSqlMetaRepository::new(db.connection());
        if meta.has_seeded().await? {
            return Ok(());
        }

        let repo = LibSqlQuoteRepository::new(db.connection());
        if repo.list(None).await?.is_empty() {
            repo.insert_batch(&default_quotes()).await?;
            tracing::info!("Seeded default quote set");
        }
        meta.mark_seeded().await?;
        Ok(())
    }

    /// Add a validated quote to the collection
    pub async fn add(
        &self,
        text: &str,
        category: &str,
        author: &str,
    ) -> Result<Quote> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("quote text must not be empty".into()));
        }
        if category.trim().is_empty() {
            return Err(Error::InvalidInput(
                "quote category must not be empty".into(),
            ));
        }

        let quote = Quote::new(text, category, author);

        let db = self.db.lock().await;
        LibSqlQuoteRepository::new(db.connection())
            .insert(&quote)
            .await?;
        LibSqlMetaRepository::new(db.connection())
            .set_last_local_change(unix_timestamp_ms())
            .await?;

        tracing::debug!(id = %quote.id, category = %quote.category, "Quote added");
        Ok(quote)
    }

    /// Remove every quote matching the predicate; returns the removed
    /// count. A no-op when nothing matches, never an error.
    pub async fn remove_matching(
        &self,
        predicate: impl Fn(&Quote) -> bool,
    ) -> Result<usize> {
        let db = self.db.lock().await;
        let repo = LibSqlQuoteRepository::new(db.connection());

        let matching: Vec<QuoteId> = repo
            .list(None)
            .await?
            .into_iter()
            .filter(|quote| predicate(quote))
            .map(|quote| quote.id)
            .collect();

        if matching.is_empty() {
            return Ok(0);
        }

        let removed = repo.remove_ids(&matching).await?;
        LibSqlMetaRepository::new(db.connection())
            .set_last_local_change(unix_timestamp_ms())
            .await?;
        Ok(removed)
    }

    /// Remove all custom quotes
    pub async fn clear_custom(&self) -> Result<usize> {
        self.remove_matching(|quote| quote.is_custom).await
    }

    /// List quotes in stable insertion order
    pub async fn list(&self, filter: &CategoryFilter) -> Result<Vec<Quote>> {
        let db = self.db.lock().await;
        LibSqlQuoteRepository::new(db.connection())
            .list(filter.as_category())
            .await
    }

    /// A uniformly random quote from the filtered set
    pub async fn random(&self, filter: &CategoryFilter) -> Result<Option<Quote>> {
        let quotes = self.list(filter).await?;
        if quotes.is_empty() {
            return Ok(None);
        }
        let index = rand::thread_rng().gen_range(0..quotes.len());
        Ok(quotes.into_iter().nth(index))
    }

    /// Distinct categories, sorted
    pub async fn categories(&self) -> Result<Vec<String>> {
        let mut categories: Vec<String> = self
            .list(&CategoryFilter::All)
            .await?
            .into_iter()
            .map(|quote| quote.category)
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    /// Collection totals
    pub async fn stats(&self) -> Result<StoreStats> {
        let quotes = self.list(&CategoryFilter::All).await?;
        let mut categories: Vec<&str> =
            quotes.iter().map(|quote| quote.category.as_str()).collect();
        categories.sort_unstable();
        categories.dedup();

        Ok(StoreStats {
            total: quotes.len(),
            categories: categories.len(),
            custom: quotes.iter().filter(|quote| quote.is_custom).count(),
            pending_upload: quotes.iter().filter(|quote| !quote.is_uploaded()).count(),
        })
    }

    /// Import quote-like items: valid ones are appended in a single
    /// transaction, invalid ones are counted. A batch with zero valid
    /// items is rejected without mutation.
    pub async fn import_batch(&self, items: &[ImportQuote]) -> Result<ImportReport> {
        let mut valid = Vec::new();
        let mut skipped = 0usize;

        for item in items {
            let text = item.text.as_deref().map(str::trim).unwrap_or_default();
            let category = item.category.as_deref().map(str::trim).unwrap_or_default();
            if text.is_empty() || category.is_empty() {
                skipped += 1;
                continue;
            }

            let author = item
                .author
                .as_deref()
                .map(str::trim)
                .filter(|author| !author.is_empty())
                .unwrap_or(IMPORT_FALLBACK_AUTHOR);
            valid.push(Quote::new(text, category, author));
        }

        if valid.is_empty() {
            return Err(Error::ImportRejected(
                "no valid quotes found in file".to_string(),
            ));
        }

        let db = self.db.lock().await;
        LibSqlQuoteRepository::new(db.connection())
            .insert_batch(&valid)
            .await?;
        LibSqlMetaRepository::new(db.connection())
            .set_last_local_change(unix_timestamp_ms())
            .await?;

        let report = ImportReport {
            imported: valid.len(),
            skipped,
        };
        tracing::info!(imported = report.imported, skipped = report.skipped, "Import completed");
        Ok(report)
    }

    /// Parse and import a raw JSON payload (bare array or wrapper form)
    pub async fn import_payload(&self, payload: &str) -> Result<ImportReport> {
        let items = parse_import_payload(payload)?;
        self.import_batch(&items).await
    }

    /// Export the custom-quote set with round-trip metadata
    pub async fn export_snapshot(&self) -> Result<ExportDocument> {
        let custom: Vec<Quote> = self
            .list(&CategoryFilter::All)
            .await?
            .into_iter()
            .filter(|quote| quote.is_custom)
            .collect();
        let installation_id = self.installation_id().await?;
        Ok(build_export_document(
            &custom,
            &installation_id,
            unix_timestamp_ms(),
        ))
    }

    // ------------------------------------------------------------------
    // Preferences and sync metadata
    // ------------------------------------------------------------------

    /// Persisted category filter preference
    pub async fn category_filter(&self) -> Result<CategoryFilter> {
        let db = self.db.lock().await;
        let stored = LibSqlMetaRepository::new(db.connection())
            .category_filter()
            .await?;
        Ok(CategoryFilter::parse(Some(&stored)))
    }

    pub async fn set_category_filter(&self, filter: &CategoryFilter) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlMetaRepository::new(db.connection())
            .set_category_filter(&filter.to_string())
            .await
    }

    pub async fn auto_sync_enabled(&self) -> Result<bool> {
        let db = self.db.lock().await;
        LibSqlMetaRepository::new(db.connection())
            .auto_sync_enabled()
            .await
    }

    pub async fn set_auto_sync_enabled(&self, enabled: bool) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlMetaRepository::new(db.connection())
            .set_auto_sync_enabled(enabled)
            .await
    }

    pub async fn last_sync_time(&self) -> Result<Option<i64>> {
        let db = self.db.lock().await;
        LibSqlMetaRepository::new(db.connection())
            .last_sync_time()
            .await
    }

    pub async fn set_last_sync_time(&self, timestamp_ms: i64) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlMetaRepository::new(db.connection())
            .set_last_sync_time(timestamp_ms)
            .await
    }

    pub async fn last_local_change(&self) -> Result<Option<i64>> {
        let db = self.db.lock().await;
        LibSqlMetaRepository::new(db.connection())
            .last_local_change()
            .await
    }

    pub async fn installation_id(&self) -> Result<String> {
        let db = self.db.lock().await;
        LibSqlMetaRepository::new(db.connection())
            .installation_id()
            .await
    }

    // ------------------------------------------------------------------
    // Sync engine support; these writes do not count as local changes
    // ------------------------------------------------------------------

    /// Local quotes never registered with the remote side
    pub async fn quotes_without_server_id(&self) -> Result<Vec<Quote>> {
        Ok(self
            .list(&CategoryFilter::All)
            .await?
            .into_iter()
            .filter(|quote| !quote.is_uploaded())
            .collect())
    }

    /// Whether a remote identifier is already present locally
    pub async fn has_server_id(&self, server_id: &str) -> Result<bool> {
        let db = self.db.lock().await;
        Ok(LibSqlQuoteRepository::new(db.connection())
            .get_by_server_id(server_id)
            .await?
            .is_some())
    }

    /// Append quotes materialized from remote records, atomically
    pub async fn append_materialized(&self, quotes: &[Quote]) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlQuoteRepository::new(db.connection())
            .insert_batch(quotes)
            .await
    }

    /// Replace the whole custom set, atomically
    pub async fn replace_custom(&self, quotes: &[Quote]) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlQuoteRepository::new(db.connection())
            .replace_custom(quotes)
            .await
    }

    /// Stamp the identifier the remote side assigned to a quote
    pub async fn set_server_id(&self, id: &QuoteId, server_id: &str) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlQuoteRepository::new(db.connection())
            .set_server_id(id, server_id)
            .await
    }

    /// Append a row to the conflict resolution log
    pub async fn record_conflict(
        &self,
        local_count: usize,
        remote_count: usize,
        strategy: &str,
        resolved_at: i64,
    ) -> Result<()> {
        let db = self.db.lock().await;
        LibSqlQuoteRepository::new(db.connection())
            .record_conflict(local_count, remote_count, strategy, resolved_at)
            .await
    }

    /// List resolved conflicts, newest first
    pub async fn list_conflicts(&self, limit: usize) -> Result<Vec<ConflictRecord>> {
        let db = self.db.lock().await;
        LibSqlQuoteRepository::new(db.connection())
            .list_conflicts(limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    async fn setup() -> QuoteStore {
        QuoteStore::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn add_then_list_contains_exactly_one_new_record() {
        let store = setup().await;

        let added = store.add("Be bold", "Motivation", "Anonymous").await.unwrap();
        let all = store.list(&CategoryFilter::All).await.unwrap();

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, added.id);
        assert_eq!(all[0].text, "Be bold");
        assert_eq!(all[0].category, "motivation");
        assert!(store.last_local_change().await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn add_rejects_blank_fields() {
        let store = setup().await;

        assert!(matches!(
            store.add("   ", "misc", "").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            store.add("text", " \t", "").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(store.list(&CategoryFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn list_filters_by_category_case_insensitively() {
        let store = setup().await;
        store.add("One", "Work", "").await.unwrap();
        store.add("Two", "life", "").await.unwrap();
        store.add("Three", "WORK", "").await.unwrap();

        let work = store
            .list(&CategoryFilter::parse(Some("Work")))
            .await
            .unwrap();
        assert_eq!(work.len(), 2);
        assert!(work.iter().all(|quote| quote.category == "work"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn random_respects_filter_and_empty_set() {
        let store = setup().await;
        assert!(store.random(&CategoryFilter::All).await.unwrap().is_none());

        store.add("Only one", "solo", "").await.unwrap();
        let picked = store
            .random(&CategoryFilter::parse(Some("solo")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(picked.text, "Only one");

        assert!(store
            .random(&CategoryFilter::parse(Some("other")))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn remove_matching_is_noop_without_matches() {
        let store = setup().await;
        store.add("Stay", "misc", "").await.unwrap();

        let removed = store
            .remove_matching(|quote| quote.category == "absent")
            .await
            .unwrap();
        assert_eq!(removed, 0);
        assert_eq!(store.list(&CategoryFilter::All).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn clear_custom_keeps_shipped_quotes() {
        let store = setup().await;
        store
            .append_materialized(&default_quotes())
            .await
            .unwrap();
        store.add("Mine", "misc", "").await.unwrap();

        let removed = store.clear_custom().await.unwrap();
        assert_eq!(removed, 1);

        let remaining = store.list(&CategoryFilter::All).await.unwrap();
        assert_eq!(remaining.len(), 8);
        assert!(remaining.iter().all(|quote| !quote.is_custom));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn import_batch_counts_valid_and_skipped() {
        let store = setup().await;

        let report = store
            .import_payload(
                r#"[
                    {"text": "Good one", "category": "misc"},
                    {"text": "  ", "category": "misc"},
                    {"text": "Another", "category": "", "author": "A"},
                    {"text": "Keeper", "category": "Wisdom", "author": " B "}
                ]"#,
            )
            .await
            .unwrap();

        assert_eq!(report, ImportReport { imported: 2, skipped: 2 });

        let all = store.list(&CategoryFilter::All).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].author, "Unknown");
        assert_eq!(all[1].author, "B");
        assert_eq!(all[1].category, "wisdom");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn import_batch_rejects_all_invalid_without_mutation() {
        let store = setup().await;
        store.add("Existing", "misc", "").await.unwrap();

        let result = store
            .import_payload(r#"[{"text": ""}, {"category": "misc"}]"#)
            .await;
        assert!(matches!(result, Err(Error::ImportRejected(_))));
        assert_eq!(store.list(&CategoryFilter::All).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn export_then_import_round_trips_custom_set() {
        let store = setup().await;
        store.add("First", "alpha", "Author A").await.unwrap();
        store.add("Second", "beta", "Author B").await.unwrap();

        let document = store.export_snapshot().await.unwrap();
        let rendered = crate::export::render_json_export(&document).unwrap();

        let fresh = setup().await;
        let report = fresh.import_payload(&rendered).await.unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped, 0);

        let original = store.list(&CategoryFilter::All).await.unwrap();
        let restored = fresh.list(&CategoryFilter::All).await.unwrap();
        let key = |quotes: &[Quote]| {
            quotes
                .iter()
                .map(|q| (q.text.clone(), q.category.clone(), q.author.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(key(&original), key(&restored));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn export_snapshot_excludes_shipped_quotes() {
        let store = setup().await;
        store
            .append_materialized(&default_quotes())
            .await
            .unwrap();
        store.add("Mine", "misc", "Me").await.unwrap();

        let document = store.export_snapshot().await.unwrap();
        assert_eq!(document.total_quotes, 1);
        assert_eq!(document.quotes[0].text, "Mine");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stats_cover_totals_and_pending_uploads() {
        let store = setup().await;
        let uploaded = store.add("Synced", "a", "").await.unwrap();
        store.add("Local only", "b", "").await.unwrap();
        store.set_server_id(&uploaded.id, "srv-1").await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.categories, 2);
        assert_eq!(stats.custom, 2);
        assert_eq!(stats.pending_upload, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn seeding_happens_once_per_installation() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("quotd.db");

        {
            let store = QuoteStore::open_path(&db_path).await.unwrap();
            assert_eq!(store.list(&CategoryFilter::All).await.unwrap().len(), 8);
            let cleared = store.clear_custom().await.unwrap();
            assert_eq!(cleared, 0); // defaults are not custom
            store.remove_matching(|_| true).await.unwrap();
        }

        let store = QuoteStore::open_path(&db_path).await.unwrap();
        assert!(store.list(&CategoryFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn category_filter_preference_round_trips() {
        let store = setup().await;
        assert_eq!(store.category_filter().await.unwrap(), CategoryFilter::All);

        store
            .set_category_filter(&CategoryFilter::Category("wisdom".to_string()))
            .await
            .unwrap();
        assert_eq!(
            store.category_filter().await.unwrap(),
            CategoryFilter::Category("wisdom".to_string())
        );
    }
}
