//! Local/remote synchronization engine.
//!
//! Reconciles the quote store against a [`RemoteSource`] on demand or on a
//! timer. Exactly one sync attempt may be active at a time; a detected
//! conflict parks a snapshot that the caller settles through [`SyncEngine::resolve`]
//! with one of three strategies. There is no mid-operation cancellation: an
//! in-flight fetch or upload runs to completion, failure, or its timeout
//! before state advances.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::models::{normalized_key, ConflictSnapshot, ConflictSummary, Quote, Resolution};
use crate::remote::{QuoteUpload, RemoteError, RemoteQuote, RemoteSource};
use crate::store::{CategoryFilter, QuoteStore};
use crate::util::unix_timestamp_ms;

/// Configuration for the sync engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Interval between automatic sync attempts
    pub sync_interval: Duration,
    /// Per-call timeout on remote fetch/upload
    pub remote_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_interval: Duration::from_secs(60),
            remote_timeout: Duration::from_secs(10),
        }
    }
}

impl SyncConfig {
    /// Set the automatic sync interval
    #[must_use]
    pub const fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Set the remote fetch/upload timeout
    #[must_use]
    pub const fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }
}

/// Observable engine state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SyncStatus {
    Idle,
    Syncing,
    Conflict,
    Synced,
    Error,
}

/// What a completed reconciliation did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Remote quotes appended locally
    pub pulled: usize,
    /// Local quotes registered with the remote side
    pub pushed: usize,
}

/// Result of a sync attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Reconciliation ran to completion
    Completed(SyncReport),
    /// Both sides changed since the last sync; resolution required
    Conflict(ConflictSummary),
}

struct EngineInner {
    pending: Option<ConflictSnapshot>,
    status: SyncStatus,
}

/// Synchronization engine; single instance per store.
///
/// The in-flight gate is an atomic compare-and-swap: a second `sync` or
/// `resolve` arriving while one is active is rejected with
/// [`Error::SyncInProgress`], never queued.
pub struct SyncEngine {
    store: QuoteStore,
    remote: Arc<dyn RemoteSource>,
    config: SyncConfig,
    in_progress: AtomicBool,
    inner: Mutex<EngineInner>,
}

impl SyncEngine {
    pub fn new(store: QuoteStore, remote: Arc<dyn RemoteSource>, config: SyncConfig) -> Self {
        Self {
            store,
            remote,
            config,
            in_progress: AtomicBool::new(false),
            inner: Mutex::new(EngineInner {
                pending: None,
                status: SyncStatus::Idle,
            }),
        }
    }

    /// Current observable status
    pub async fn status(&self) -> SyncStatus {
        self.inner.lock().await.status
    }

    /// Summary of the conflict awaiting resolution, if any
    pub async fn pending_conflict(&self) -> Option<ConflictSummary> {
        self.inner
            .lock()
            .await
            .pending
            .as_ref()
            .map(ConflictSnapshot::summary)
    }

    /// Run one sync attempt.
    ///
    /// Rejected with [`Error::SyncInProgress`] while another attempt is in
    /// flight or a conflict awaits resolution. A remote failure returns the
    /// error and leaves the engine ready for the next attempt; no retry is
    /// scheduled here.
    pub async fn sync(&self) -> Result<SyncOutcome> {
        let _gate = self.acquire_gate()?;
        if self.inner.lock().await.pending.is_some() {
            return Err(Error::SyncInProgress);
        }

        self.set_status(SyncStatus::Syncing).await;
        match self.sync_inner().await {
            Ok(outcome) => {
                let status = match outcome {
                    SyncOutcome::Completed(_) => SyncStatus::Synced,
                    SyncOutcome::Conflict(_) => SyncStatus::Conflict,
                };
                self.set_status(status).await;
                Ok(outcome)
            }
            Err(error) => {
                tracing::warn!(%error, "Sync attempt failed");
                self.set_status(SyncStatus::Error).await;
                Err(error)
            }
        }
    }

    /// Settle the pending conflict with the chosen strategy.
    ///
    /// Every strategy stamps the last-sync timestamp, records a row in the
    /// conflict log, and clears the snapshot.
    pub async fn resolve(&self, resolution: Resolution) -> Result<SyncReport> {
        let _gate = self.acquire_gate()?;

        let Some(snapshot) = self.inner.lock().await.pending.take() else {
            return Err(Error::NoPendingConflict);
        };

        self.set_status(SyncStatus::Syncing).await;
        let result: Result<SyncReport> = async {
            let report = self.resolve_inner(resolution, &snapshot).await?;
            self.store
                .record_conflict(
                    snapshot.local_quotes.len(),
                    snapshot.remote_quotes.len(),
                    resolution.as_str(),
                    unix_timestamp_ms(),
                )
                .await?;
            self.store.set_last_sync_time(unix_timestamp_ms()).await?;
            Ok(report)
        }
        .await;

        match result {
            Ok(report) => {
                self.set_status(SyncStatus::Synced).await;
                tracing::info!(
                    strategy = resolution.as_str(),
                    pulled = report.pulled,
                    pushed = report.pushed,
                    "Conflict resolved"
                );
                Ok(report)
            }
            Err(error) => {
                tracing::warn!(%error, strategy = resolution.as_str(), "Conflict resolution failed");
                self.set_status(SyncStatus::Error).await;
                Err(error)
            }
        }
    }

    /// Spawn the periodic sync task.
    ///
    /// The returned handle owns the timer; dropping or stopping it aborts
    /// the task, so no timer outlives its engine's users. In-progress
    /// rejections on a tick are expected and skipped quietly.
    pub fn spawn_auto_sync(self: Arc<Self>) -> AutoSyncHandle {
        let interval = self.config.sync_interval;
        let engine = self;
        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                match engine.sync().await {
                    Ok(SyncOutcome::Completed(report)) => {
                        tracing::debug!(pulled = report.pulled, pushed = report.pushed, "Auto-sync completed");
                    }
                    Ok(SyncOutcome::Conflict(summary)) => {
                        tracing::warn!(
                            local = summary.local_count,
                            remote = summary.remote_count,
                            "Auto-sync detected a conflict; resolution required"
                        );
                    }
                    Err(Error::SyncInProgress) => {
                        tracing::debug!("Auto-sync tick skipped; attempt already active");
                    }
                    Err(error) => {
                        tracing::warn!(%error, "Auto-sync attempt failed");
                    }
                }
            }
        });
        AutoSyncHandle { task }
    }

    // ------------------------------------------------------------------

    fn acquire_gate(&self) -> Result<GateGuard<'_>> {
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::SyncInProgress);
        }
        Ok(GateGuard { engine: self })
    }

    async fn set_status(&self, status: SyncStatus) {
        self.inner.lock().await.status = status;
    }

    async fn sync_inner(&self) -> Result<SyncOutcome> {
        let remote_quotes = self.fetch_with_timeout().await?;

        let last_sync = self.store.last_sync_time().await?;
        let local_change = self.store.last_local_change().await?;
        let has_local_changes = match (local_change, last_sync) {
            (Some(change), Some(sync)) => change > sync,
            (Some(_), None) => true,
            (None, _) => false,
        };
        let has_remote_changes = !remote_quotes.is_empty();

        if has_local_changes && has_remote_changes {
            let snapshot = ConflictSnapshot {
                local_quotes: self.store.list(&CategoryFilter::All).await?,
                remote_quotes,
                local_update_time: local_change,
                last_sync_time: last_sync,
                detected_at: unix_timestamp_ms(),
            };
            let summary = snapshot.summary();
            self.inner.lock().await.pending = Some(snapshot);
            tracing::info!(
                local = summary.local_count,
                remote = summary.remote_count,
                "Conflict detected; awaiting resolution"
            );
            return Ok(SyncOutcome::Conflict(summary));
        }

        let report = self.reconcile(&remote_quotes).await?;
        self.store.set_last_sync_time(unix_timestamp_ms()).await?;
        tracing::debug!(pulled = report.pulled, pushed = report.pushed, "Sync completed");
        Ok(SyncOutcome::Completed(report))
    }

    /// No-conflict path: append unknown remote quotes, then register local
    /// quotes the remote has never seen.
    async fn reconcile(&self, remote_quotes: &[RemoteQuote]) -> Result<SyncReport> {
        let mut incoming = Vec::new();
        for record in remote_quotes {
            if record.text.trim().is_empty() {
                tracing::warn!(server_id = %record.server_id, "Skipping remote quote with empty text");
                continue;
            }
            if !self.store.has_server_id(&record.server_id).await? {
                incoming.push(record.materialize());
            }
        }
        let pulled = incoming.len();
        self.store.append_materialized(&incoming).await?;

        let pushed = self.upload_pending().await?;

        Ok(SyncReport { pulled, pushed })
    }

    async fn resolve_inner(
        &self,
        resolution: Resolution,
        snapshot: &ConflictSnapshot,
    ) -> Result<SyncReport> {
        match resolution {
            Resolution::KeepLocal => {
                // Remote snapshot is discarded wholesale
                let pushed = self.upload_pending().await?;
                Ok(SyncReport { pulled: 0, pushed })
            }
            Resolution::TakeServer => {
                let replacement: Vec<Quote> = snapshot
                    .remote_quotes
                    .iter()
                    .filter(|record| !record.text.trim().is_empty())
                    .map(RemoteQuote::materialize)
                    .collect();
                let pulled = replacement.len();
                self.store.replace_custom(&replacement).await?;
                Ok(SyncReport { pulled, pushed: 0 })
            }
            Resolution::Merge => {
                let mut seen: HashSet<String> = snapshot
                    .local_quotes
                    .iter()
                    .map(Quote::dedup_key)
                    .collect();

                let mut incoming = Vec::new();
                for record in &snapshot.remote_quotes {
                    if record.text.trim().is_empty() {
                        continue;
                    }
                    let key = normalized_key(&record.text);
                    // Local copy wins on key collision
                    if seen.insert(key) {
                        incoming.push(record.materialize());
                    }
                }
                let pulled = incoming.len();
                self.store.append_materialized(&incoming).await?;
                Ok(SyncReport { pulled, pushed: 0 })
            }
        }
    }

    async fn upload_pending(&self) -> Result<usize> {
        let mut pushed = 0usize;
        for quote in self.store.quotes_without_server_id().await? {
            let upload = QuoteUpload::from_quote(&quote);
            let server_id = self.upload_with_timeout(&upload).await?;
            self.store.set_server_id(&quote.id, &server_id).await?;
            pushed += 1;
        }
        Ok(pushed)
    }

    async fn fetch_with_timeout(&self) -> Result<Vec<RemoteQuote>> {
        match tokio::time::timeout(self.config.remote_timeout, self.remote.fetch_remote()).await {
            Ok(result) => result.map_err(Error::Remote),
            Err(_) => Err(Error::Remote(RemoteError::Timeout)),
        }
    }

    async fn upload_with_timeout(&self, upload: &QuoteUpload) -> Result<String> {
        match tokio::time::timeout(self.config.remote_timeout, self.remote.upload(upload)).await {
            Ok(result) => result.map_err(Error::Remote),
            Err(_) => Err(Error::Remote(RemoteError::Timeout)),
        }
    }
}

struct GateGuard<'a> {
    engine: &'a SyncEngine,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.engine.in_progress.store(false, Ordering::Release);
    }
}

/// Owner of the periodic sync task; aborts it on stop or drop
pub struct AutoSyncHandle {
    task: JoinHandle<()>,
}

impl AutoSyncHandle {
    /// Stop the periodic task
    pub fn stop(self) {
        // Drop aborts
    }
}

impl Drop for AutoSyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
