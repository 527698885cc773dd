//! Quote model

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Length of the normalized-text prefix used as a deduplication key
const DEDUP_KEY_LEN: usize = 50;

/// A unique identifier for a quote, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuoteId(Uuid);

impl QuoteId {
    /// Create a new unique quote ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for QuoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QuoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A quote in the collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Unique identifier
    pub id: QuoteId,
    /// Quote text
    pub text: String,
    /// Category, stored lowercase
    pub category: String,
    /// Attributed author
    pub author: String,
    /// User-authored (or imported) rather than shipped with the app
    pub is_custom: bool,
    /// Creation timestamp (Unix ms)
    pub date_added: i64,
    /// Last modification timestamp (Unix ms)
    pub last_modified: i64,
    /// Identifier assigned by the remote side, once uploaded
    pub server_id: Option<String>,
}

impl Quote {
    /// Create a new custom quote. Text and category are trimmed; the
    /// category is case-folded to lowercase. Validation of non-empty
    /// fields happens in the store, not here.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        category: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: QuoteId::new(),
            text: text.into().trim().to_string(),
            category: category.into().trim().to_lowercase(),
            author: author.into().trim().to_string(),
            is_custom: true,
            date_added: now,
            last_modified: now,
            server_id: None,
        }
    }

    /// Deduplication key for this quote's text
    #[must_use]
    pub fn dedup_key(&self) -> String {
        normalized_key(&self.text)
    }

    /// Check if quote text is empty (whitespace-only counts as empty)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// True once the quote has been registered with the remote side
    #[must_use]
    pub const fn is_uploaded(&self) -> bool {
        self.server_id.is_some()
    }
}

/// Normalized deduplication key over quote text.
///
/// Lowercases the text, strips every non-alphanumeric character, and
/// truncates to a fixed prefix. Two quotes with the same key are treated
/// as duplicates by the merge strategy.
///
/// # Examples
///
/// ```
/// use quotd_core::models::normalized_key;
///
/// assert_eq!(normalized_key("Be bold!!"), "bebold");
/// assert_eq!(normalized_key("Be  bold"), normalized_key("BE BOLD."));
/// ```
#[must_use]
pub fn normalized_key(text: &str) -> String {
    let re = Regex::new(r"[^a-z0-9]+").expect("Invalid regex");
    re.replace_all(&text.to_lowercase(), "")
        .chars()
        .take(DEDUP_KEY_LEN)
        .collect()
}
