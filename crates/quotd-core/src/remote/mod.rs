//! Remote quote source boundary.
//!
//! The sync engine talks to the upstream side exclusively through the
//! [`RemoteSource`] trait. Two implementations ship with the crate: an
//! in-memory simulation used by tests and offline runs, and an HTTP client
//! for a real endpoint.

mod http;
mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use http::HttpRemote;
pub use memory::InMemoryRemote;

use crate::models::Quote;
use crate::util::unix_timestamp_ms;

/// Category assigned to remote records that carry none
pub const DEFAULT_REMOTE_CATEGORY: &str = "general";

/// A quote record as the remote side serves it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteQuote {
    /// Identifier assigned by the remote side
    pub server_id: String,
    /// Quote text
    pub text: String,
    /// Category; the fetch protocol may omit it
    #[serde(default)]
    pub category: Option<String>,
    /// Attributed author
    #[serde(default)]
    pub author: String,
    /// Remote-side modification timestamp (Unix ms)
    pub last_modified: i64,
}

impl RemoteQuote {
    /// Materialize a local record from this remote one.
    ///
    /// Assigns a fresh local id, keeps the remote identity in `server_id`,
    /// and falls back to [`DEFAULT_REMOTE_CATEGORY`] when the wire record
    /// carries no category.
    #[must_use]
    pub fn materialize(&self) -> Quote {
        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .unwrap_or(DEFAULT_REMOTE_CATEGORY);

        let mut quote = Quote::new(self.text.clone(), category, self.author.clone());
        quote.last_modified = self.last_modified;
        quote.server_id = Some(self.server_id.clone());
        quote
    }
}

/// Payload for registering a local quote with the remote side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteUpload {
    pub text: String,
    pub category: String,
    pub author: String,
}

impl QuoteUpload {
    /// Build an upload payload from a local quote
    #[must_use]
    pub fn from_quote(quote: &Quote) -> Self {
        Self {
            text: quote.text.clone(),
            category: quote.category.clone(),
            author: quote.author.clone(),
        }
    }
}

/// Errors crossing the remote boundary
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Remote HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {0}")]
    Api(String),
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
    #[error("Remote request timed out")]
    Timeout,
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// A remote quote source the sync engine reconciles against.
///
/// Absence of a successful response is always an error, never "zero
/// quotes" — callers must treat any `Err` as a failed sync attempt.
#[async_trait::async_trait]
pub trait RemoteSource: Send + Sync {
    /// Fetch a snapshot of the remote quote set
    async fn fetch_remote(&self) -> RemoteResult<Vec<RemoteQuote>>;

    /// Register a local quote with the remote side; returns the assigned
    /// identifier to stamp back onto the local record
    async fn upload(&self, upload: &QuoteUpload) -> RemoteResult<String>;
}

/// Stamp a remote-side timestamp for records created upstream
pub(crate) fn remote_now() -> i64 {
    unix_timestamp_ms()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn materialize_defaults_missing_category() {
        let remote = RemoteQuote {
            server_id: "srv-1".to_string(),
            text: "Stay hungry".to_string(),
            category: None,
            author: "Unknown".to_string(),
            last_modified: 1_000,
        };

        let quote = remote.materialize();
        assert_eq!(quote.category, DEFAULT_REMOTE_CATEGORY);
        assert_eq!(quote.server_id.as_deref(), Some("srv-1"));
        assert_eq!(quote.last_modified, 1_000);
        assert!(quote.is_custom);
    }

    #[test]
    fn materialize_lowercases_category() {
        let remote = RemoteQuote {
            server_id: "srv-2".to_string(),
            text: "Stay foolish".to_string(),
            category: Some("Wisdom".to_string()),
            author: String::new(),
            last_modified: 2_000,
        };

        assert_eq!(remote.materialize().category, "wisdom");
    }

    #[test]
    fn remote_quote_accepts_missing_optional_fields() {
        let parsed: RemoteQuote = serde_json::from_str(
            r#"{"server_id": "srv-9", "text": "Less is more", "last_modified": 5}"#,
        )
        .unwrap();
        assert_eq!(parsed.category, None);
        assert_eq!(parsed.author, "");
    }
}
