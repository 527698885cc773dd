//! Sync conflict types

use serde::{Deserialize, Serialize};

use crate::models::Quote;
use crate::remote::RemoteQuote;

/// Strategy used to resolve a pending conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// Discard the remote snapshot, upload un-uploaded local quotes
    #[serde(rename = "local")]
    KeepLocal,
    /// Replace the local custom set with the remote snapshot
    #[serde(rename = "server")]
    TakeServer,
    /// Union of both sides, deduplicated by normalized text, local wins
    Merge,
}

impl Resolution {
    /// Strategy name as recorded in the conflict log
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::KeepLocal => "local",
            Self::TakeServer => "server",
            Self::Merge => "merge",
        }
    }
}

impl std::str::FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "keep-local" => Ok(Self::KeepLocal),
            "server" | "take-server" => Ok(Self::TakeServer),
            "merge" => Ok(Self::Merge),
            other => Err(format!("unknown resolution strategy: {other}")),
        }
    }
}

/// Immutable capture of both sides at conflict-detection time.
///
/// Consumed exactly once by the resolution step, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictSnapshot {
    /// Local collection at detection time
    pub local_quotes: Vec<Quote>,
    /// Remote snapshot at detection time
    pub remote_quotes: Vec<RemoteQuote>,
    /// Last local modification timestamp (Unix ms)
    pub local_update_time: Option<i64>,
    /// Last successful sync timestamp (Unix ms)
    pub last_sync_time: Option<i64>,
    /// Detection timestamp (Unix ms)
    pub detected_at: i64,
}

impl ConflictSnapshot {
    /// Lightweight view for callers deciding on a resolution
    #[must_use]
    pub fn summary(&self) -> ConflictSummary {
        ConflictSummary {
            local_count: self.local_quotes.len(),
            remote_count: self.remote_quotes.len(),
            local_update_time: self.local_update_time,
            detected_at: self.detected_at,
        }
    }
}

/// What the caller sees when a sync attempt detects a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConflictSummary {
    /// Size of the local collection at detection time
    pub local_count: usize,
    /// Size of the remote snapshot at detection time
    pub remote_count: usize,
    /// Last local modification timestamp (Unix ms)
    pub local_update_time: Option<i64>,
    /// Detection timestamp (Unix ms)
    pub detected_at: i64,
}

/// Recorded sync conflict resolved by a chosen strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// Conflict row identifier
    pub id: i64,
    /// Size of the local collection at detection time
    pub local_count: i64,
    /// Size of the remote snapshot at detection time
    pub remote_count: i64,
    /// Resolution timestamp (unix ms)
    pub resolved_at: i64,
    /// Resolution strategy name
    pub strategy: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_parses_aliases() {
        assert_eq!("local".parse::<Resolution>().unwrap(), Resolution::KeepLocal);
        assert_eq!(
            "take-server".parse::<Resolution>().unwrap(),
            Resolution::TakeServer
        );
        assert_eq!("Merge".parse::<Resolution>().unwrap(), Resolution::Merge);
        assert!("both".parse::<Resolution>().is_err());
    }

    #[test]
    fn resolution_round_trips_through_name() {
        for strategy in [Resolution::KeepLocal, Resolution::TakeServer, Resolution::Merge] {
            assert_eq!(strategy.as_str().parse::<Resolution>().unwrap(), strategy);
        }
    }
}
