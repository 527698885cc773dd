//! Shared helpers for CLI commands: database/remote wiring and quote
//! formatting.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use quotd_core::remote::{HttpRemote, InMemoryRemote, RemoteSource};
use quotd_core::sync::SyncConfig;
use quotd_core::{Quote, QuoteStore, SyncEngine};
use serde::Serialize;

use crate::error::CliError;

const DEFAULT_SYNC_INTERVAL_SECS: u64 = 60;

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("QUOTD_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quotd")
        .join("quotd.db")
}

pub async fn open_store(db_path: &Path) -> Result<QuoteStore, CliError> {
    Ok(QuoteStore::open_path(db_path).await?)
}

/// Remote source selection: `QUOTD_REMOTE_URL` enables the HTTP client;
/// without it the built-in simulated remote is used.
pub fn build_remote() -> Result<Arc<dyn RemoteSource>, CliError> {
    match env::var("QUOTD_REMOTE_URL") {
        Ok(url) if !url.trim().is_empty() => {
            tracing::info!(endpoint = %url.trim(), "Using HTTP remote");
            let remote =
                HttpRemote::new(url).map_err(|error| CliError::InvalidRemote(error.to_string()))?;
            Ok(Arc::new(remote))
        }
        _ => {
            tracing::debug!("QUOTD_REMOTE_URL not set; using simulated remote");
            Ok(Arc::new(InMemoryRemote::seeded()))
        }
    }
}

pub fn sync_interval(cli_secs: Option<u64>) -> Duration {
    let secs = cli_secs
        .or_else(|| {
            env::var("QUOTD_SYNC_INTERVAL_SECS")
                .ok()
                .and_then(|raw| raw.trim().parse().ok())
        })
        .unwrap_or(DEFAULT_SYNC_INTERVAL_SECS);
    Duration::from_secs(secs.max(1))
}

pub fn build_engine(store: QuoteStore, interval: Duration) -> Result<Arc<SyncEngine>, CliError> {
    let remote = build_remote()?;
    let config = SyncConfig::default().with_sync_interval(interval);
    Ok(Arc::new(SyncEngine::new(store, remote, config)))
}

#[derive(Debug, Serialize)]
pub struct QuoteListItem {
    pub id: String,
    pub text: String,
    pub category: String,
    pub author: String,
    pub is_custom: bool,
    pub date_added: i64,
    pub last_modified: i64,
    pub server_id: Option<String>,
    pub relative_time: String,
}

pub fn quote_to_list_item(quote: &Quote) -> QuoteListItem {
    let now_ms = Utc::now().timestamp_millis();
    QuoteListItem {
        id: quote.id.to_string(),
        text: quote.text.clone(),
        category: quote.category.clone(),
        author: quote.author.clone(),
        is_custom: quote.is_custom,
        date_added: quote.date_added,
        last_modified: quote.last_modified,
        server_id: quote.server_id.clone(),
        relative_time: format_relative_time(quote.last_modified, now_ms),
    }
}

pub fn format_quote_lines(quotes: &[Quote]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    quotes
        .iter()
        .map(|quote| {
            let id = quote.id.to_string();
            let short_id = id.chars().take(13).collect::<String>();
            let preview = quote_preview(quote, 48);
            let relative_time = format_relative_time(quote.last_modified, now_ms);
            format!(
                "{short_id:<13}  {preview:<48}  [{}]  {relative_time}",
                quote.category
            )
        })
        .collect()
}

/// One quote rendered for display, attribution included
pub fn format_quote_block(quote: &Quote) -> String {
    if quote.author.is_empty() {
        format!("\"{}\"\n  — {}", quote.text, quote.category)
    } else {
        format!("\"{}\"\n  — {} ({})", quote.text, quote.author, quote.category)
    }
}

pub fn quote_preview(quote: &Quote, max_chars: usize) -> String {
    let collapsed = quote.text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_relative_time_units() {
        let now = 10_000_000;
        assert_eq!(format_relative_time(now - 30_000, now), "just now");
        assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
        assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
    }

    #[test]
    fn quote_preview_truncates_with_ellipsis() {
        let quote = Quote::new(
            "This is a very long sentence that should be shortened",
            "misc",
            "",
        );
        let preview = quote_preview(&quote, 20);
        assert_eq!(preview, "This is a very lo...");
    }

    #[test]
    fn format_quote_block_includes_attribution() {
        let with_author = Quote::new("Be bold", "motivation", "Someone");
        assert_eq!(
            format_quote_block(&with_author),
            "\"Be bold\"\n  — Someone (motivation)"
        );

        let without_author = Quote::new("Be bold", "motivation", "");
        assert_eq!(
            format_quote_block(&without_author),
            "\"Be bold\"\n  — motivation"
        );
    }

    #[test]
    fn sync_interval_defaults_and_floors() {
        assert_eq!(sync_interval(Some(120)), Duration::from_secs(120));
        assert_eq!(sync_interval(Some(0)), Duration::from_secs(1));
    }
}
