use std::path::Path;

use quotd_core::models::{ConflictRecord, ConflictSummary, Resolution};
use quotd_core::sync::{SyncOutcome, SyncReport};
use quotd_core::Error as CoreError;
use serde::Serialize;

use crate::cli::{AutoSyncState, ResolveStrategy};
use crate::commands::common::{build_engine, format_relative_time, open_store, sync_interval};
use crate::error::CliError;

impl From<ResolveStrategy> for Resolution {
    fn from(strategy: ResolveStrategy) -> Self {
        match strategy {
            ResolveStrategy::Local => Self::KeepLocal,
            ResolveStrategy::Server => Self::TakeServer,
            ResolveStrategy::Merge => Self::Merge,
        }
    }
}

pub async fn run_sync_now(
    resolve: Option<ResolveStrategy>,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let engine = build_engine(store, sync_interval(None))?;

    match engine.sync().await? {
        SyncOutcome::Completed(report) => {
            print_report("Sync completed", report);
            Ok(())
        }
        SyncOutcome::Conflict(summary) => {
            print_conflict(summary);
            let Some(strategy) = resolve else {
                return Err(CliError::ConflictUnresolved);
            };

            let report = engine.resolve(strategy.into()).await?;
            print_report("Conflict resolved", report);
            Ok(())
        }
    }
}

pub async fn run_sync_auto(
    state: Option<AutoSyncState>,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path).await?;

    match state {
        Some(AutoSyncState::On) => {
            store.set_auto_sync_enabled(true).await?;
            println!("Auto-sync enabled");
        }
        Some(AutoSyncState::Off) => {
            store.set_auto_sync_enabled(false).await?;
            println!("Auto-sync disabled");
        }
        None => {
            let enabled = store.auto_sync_enabled().await?;
            println!("Auto-sync is {}", if enabled { "on" } else { "off" });
        }
    }
    Ok(())
}

/// Foreground sync loop: one attempt per interval until Ctrl-C. A conflict
/// is settled with the given strategy, or left pending for the next run of
/// `sync now --resolve`.
pub async fn run_sync_watch(
    interval_secs: Option<u64>,
    resolve: Option<ResolveStrategy>,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let interval = sync_interval(interval_secs);
    let engine = build_engine(store, interval)?;

    println!(
        "Watching: sync every {}s (Ctrl-C to stop)",
        interval.as_secs()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("Stopped");
                return Ok(());
            }
            () = tokio::time::sleep(interval) => {
                match engine.sync().await {
                    Ok(SyncOutcome::Completed(report)) => print_report("Synced", report),
                    Ok(SyncOutcome::Conflict(summary)) => {
                        print_conflict(summary);
                        match resolve {
                            Some(strategy) => match engine.resolve(strategy.into()).await {
                                Ok(report) => print_report("Conflict resolved", report),
                                Err(error) => eprintln!("Resolution failed: {error}"),
                            },
                            None => eprintln!(
                                "Leaving conflict unresolved; re-run `quotd sync now --resolve <strategy>`"
                            ),
                        }
                    }
                    Err(CoreError::SyncInProgress) => {}
                    Err(error) => eprintln!("Sync failed: {error}"),
                }
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SyncConflictItem {
    pub id: i64,
    pub local_count: i64,
    pub remote_count: i64,
    pub resolved_at: i64,
    pub strategy: String,
}

pub async fn run_sync_conflicts(
    limit: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let conflicts = store.list_conflicts(limit).await?;

    if as_json {
        let json_items = conflicts
            .iter()
            .map(conflict_to_item)
            .collect::<Vec<SyncConflictItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("No sync conflicts recorded.");
        return Ok(());
    }

    let now = chrono::Utc::now().timestamp_millis();
    for conflict in &conflicts {
        println!(
            "#{:<4} {:<6}  local {:>3} / remote {:>3}  {}",
            conflict.id,
            conflict.strategy,
            conflict.local_count,
            conflict.remote_count,
            format_relative_time(conflict.resolved_at, now)
        );
    }
    Ok(())
}

fn conflict_to_item(conflict: &ConflictRecord) -> SyncConflictItem {
    SyncConflictItem {
        id: conflict.id,
        local_count: conflict.local_count,
        remote_count: conflict.remote_count,
        resolved_at: conflict.resolved_at,
        strategy: conflict.strategy.clone(),
    }
}

fn print_report(label: &str, report: SyncReport) {
    println!(
        "{label} (pulled {}, pushed {})",
        report.pulled, report.pushed
    );
}

fn print_conflict(summary: ConflictSummary) {
    println!(
        "Conflict detected: {} local quotes vs {} remote quotes changed since the last sync",
        summary.local_count, summary.remote_count
    );
}

#[cfg(test)]
mod tests {
    use quotd_core::store::CategoryFilter;
    use quotd_core::QuoteStore;

    use super::*;

    // The simulated remote is process-local, so these tests exercise the
    // full command path against it.

    #[tokio::test(flavor = "multi_thread")]
    async fn run_sync_now_pulls_simulated_remote_into_fresh_store() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("quotd.db");

        // Seeded defaults are not "local changes", so the first sync
        // reconciles without conflict.
        run_sync_now(None, &db_path).await.unwrap();

        let store = QuoteStore::open_path(&db_path).await.unwrap();
        let quotes = store.list(&CategoryFilter::All).await.unwrap();
        assert!(quotes.iter().any(|quote| quote.server_id.is_some()));
        assert!(store.last_sync_time().await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn run_sync_now_without_resolve_reports_pending_conflict() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("quotd.db");

        {
            let store = QuoteStore::open_path(&db_path).await.unwrap();
            store.add("Local change", "misc", "").await.unwrap();
        }

        let error = run_sync_now(None, &db_path).await.unwrap_err();
        assert!(matches!(error, CliError::ConflictUnresolved));

        // Nothing was committed, so the next attempt with a strategy works
        run_sync_now(Some(ResolveStrategy::Merge), &db_path)
            .await
            .unwrap();

        let store = QuoteStore::open_path(&db_path).await.unwrap();
        assert!(store.last_sync_time().await.unwrap().is_some());
        assert_eq!(store.list_conflicts(10).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn run_sync_auto_round_trips_preference() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("quotd.db");

        run_sync_auto(Some(AutoSyncState::On), &db_path).await.unwrap();
        let store = QuoteStore::open_path(&db_path).await.unwrap();
        assert!(store.auto_sync_enabled().await.unwrap());
        drop(store);

        run_sync_auto(Some(AutoSyncState::Off), &db_path).await.unwrap();
        let store = QuoteStore::open_path(&db_path).await.unwrap();
        assert!(!store.auto_sync_enabled().await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn run_sync_conflicts_lists_recorded_resolutions() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("quotd.db");

        {
            let store = QuoteStore::open_path(&db_path).await.unwrap();
            store.record_conflict(2, 3, "merge", 1_000).await.unwrap();
        }

        run_sync_conflicts(10, false, &db_path).await.unwrap();
        run_sync_conflicts(10, true, &db_path).await.unwrap();
    }
}
