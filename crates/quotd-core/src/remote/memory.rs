//! In-memory simulated remote quote source.

use std::sync::Mutex;

use super::{remote_now, QuoteUpload, RemoteError, RemoteQuote, RemoteResult, RemoteSource};

/// Simulated upstream backed by a mutex-guarded vector.
///
/// Supports failure injection so callers can exercise the failed-sync
/// path without a network.
pub struct InMemoryRemote {
    inner: Mutex<RemoteState>,
}

struct RemoteState {
    quotes: Vec<RemoteQuote>,
    next_id: u64,
    failing: bool,
}

impl InMemoryRemote {
    /// Create an empty simulated remote
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(Vec::new())
    }

    /// Create a simulated remote pre-populated with the given records
    #[must_use]
    pub fn with_seed(quotes: Vec<RemoteQuote>) -> Self {
        let next_id = quotes.len() as u64 + 1;
        Self {
            inner: Mutex::new(RemoteState {
                quotes,
                next_id,
                failing: false,
            }),
        }
    }

    /// Simulated remote seeded with a small fixed quote set
    #[must_use]
    pub fn seeded() -> Self {
        Self::with_seed(vec![
            RemoteQuote {
                server_id: "srv-1".to_string(),
                text: "Be yourself; everyone else is already taken.".to_string(),
                category: Some("motivation".to_string()),
                author: "Oscar Wilde".to_string(),
                last_modified: 1_692_265_200_000,
            },
            RemoteQuote {
                server_id: "srv-2".to_string(),
                text: "Simplicity is the ultimate sophistication.".to_string(),
                category: Some("wisdom".to_string()),
                author: "Leonardo da Vinci".to_string(),
                last_modified: 1_692_351_600_000,
            },
        ])
    }

    /// Toggle failure injection: while on, every call errors
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Add a record on the remote side, as if another client uploaded it
    pub fn push_remote(&self, text: impl Into<String>, author: impl Into<String>) -> String {
        let mut state = self.lock();
        let server_id = format!("srv-{}", state.next_id);
        state.next_id += 1;
        let record = RemoteQuote {
            server_id: server_id.clone(),
            text: text.into(),
            category: None,
            author: author.into(),
            last_modified: remote_now(),
        };
        state.quotes.push(record);
        server_id
    }

    /// Current remote-side record set
    #[must_use]
    pub fn snapshot(&self) -> Vec<RemoteQuote> {
        self.lock().quotes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RemoteState> {
        // Mutex poisoning only happens if a holder panicked; the state is
        // plain data, safe to keep using.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RemoteSource for InMemoryRemote {
    async fn fetch_remote(&self) -> RemoteResult<Vec<RemoteQuote>> {
        let state = self.lock();
        if state.failing {
            return Err(RemoteError::Api("simulated outage".to_string()));
        }
        Ok(state.quotes.clone())
    }

    async fn upload(&self, upload: &QuoteUpload) -> RemoteResult<String> {
        let mut state = self.lock();
        if state.failing {
            return Err(RemoteError::Api("simulated outage".to_string()));
        }

        let server_id = format!("srv-{}", state.next_id);
        state.next_id += 1;
        state.quotes.push(RemoteQuote {
            server_id: server_id.clone(),
            text: upload.text.clone(),
            category: Some(upload.category.clone()),
            author: upload.author.clone(),
            last_modified: remote_now(),
        });

        Ok(server_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn upload_assigns_monotonic_ids() {
        let remote = InMemoryRemote::new();
        let upload = QuoteUpload {
            text: "First".to_string(),
            category: "misc".to_string(),
            author: String::new(),
        };

        let first = remote.upload(&upload).await.unwrap();
        let second = remote.upload(&upload).await.unwrap();
        assert_eq!(first, "srv-1");
        assert_eq!(second, "srv-2");
        assert_eq!(remote.fetch_remote().await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failure_injection_errors_both_calls() {
        let remote = InMemoryRemote::seeded();
        remote.set_failing(true);

        assert!(remote.fetch_remote().await.is_err());
        let upload = QuoteUpload {
            text: "x".to_string(),
            category: "misc".to_string(),
            author: String::new(),
        };
        assert!(remote.upload(&upload).await.is_err());

        remote.set_failing(false);
        assert_eq!(remote.fetch_remote().await.unwrap().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn push_remote_continues_id_sequence() {
        let remote = InMemoryRemote::seeded();
        let id = remote.push_remote("New on the server", "Nobody");
        assert_eq!(id, "srv-3");
        assert_eq!(remote.snapshot().len(), 3);
    }
}
