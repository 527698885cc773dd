//! Quote repository implementation

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for counts/LIMIT

use crate::error::Result;
use crate::models::{ConflictRecord, Quote, QuoteId};
use libsql::{params, Connection};

/// Trait for quote storage operations (async)
#[allow(async_fn_in_trait)]
pub trait QuoteRepository {
    /// Insert a single quote
    async fn insert(&self, quote: &Quote) -> Result<()>;

    /// Insert a batch of quotes atomically
    async fn insert_batch(&self, quotes: &[Quote]) -> Result<()>;

    /// Get a quote by ID
    async fn get(&self, id: &QuoteId) -> Result<Option<Quote>>;

    /// Get a quote by its remote-side identifier
    async fn get_by_server_id(&self, server_id: &str) -> Result<Option<Quote>>;

    /// List quotes in stable insertion order, optionally restricted to a
    /// category (case-insensitive; categories are stored lowercase)
    async fn list(&self, category: Option<&str>) -> Result<Vec<Quote>>;

    /// Remove the given quotes atomically; returns the number removed
    async fn remove_ids(&self, ids: &[QuoteId]) -> Result<usize>;

    /// Replace the whole custom set with the given quotes atomically
    async fn replace_custom(&self, quotes: &[Quote]) -> Result<()>;

    /// Stamp the identifier the remote side assigned to a quote
    async fn set_server_id(&self, id: &QuoteId, server_id: &str) -> Result<()>;

    /// Append a row to the conflict resolution log
    async fn record_conflict(
        &self,
        local_count: usize,
        remote_count: usize,
        strategy: &str,
        resolved_at: i64,
    ) -> Result<()>;

    /// List resolved conflicts, newest first
    async fn list_conflicts(&self, limit: usize) -> Result<Vec<ConflictRecord>>;
}

/// libSQL implementation of `QuoteRepository`
pub struct LibSqlQuoteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlQuoteRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a quote from a database row
    fn parse_quote(row: &libsql::Row) -> Result<Quote> {
        let id: String = row.get(0)?;
        let server_id = match row.get_value(7)? {
            libsql::Value::Text(text) => Some(text),
            _ => None,
        };
        Ok(Quote {
            id: id.parse().unwrap_or_default(),
            text: row.get(1)?,
            category: row.get(2)?,
            author: row.get(3)?,
            is_custom: row.get::<i32>(4)? != 0,
            date_added: row.get(5)?,
            last_modified: row.get(6)?,
            server_id,
        })
    }

    async fn insert_in_open_transaction(&self, quote: &Quote) -> Result<()> {
        let server_id = quote
            .server_id
            .clone()
            .map_or(libsql::Value::Null, libsql::Value::Text);

        self.conn
            .execute(
                "INSERT INTO quotes
                    (id, text, category, author, is_custom, date_added, last_modified, server_id)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    quote.id.as_str(),
                    quote.text.clone(),
                    quote.category.clone(),
                    quote.author.clone(),
                    i32::from(quote.is_custom),
                    quote.date_added,
                    quote.last_modified,
                    server_id
                ],
            )
            .await?;
        Ok(())
    }
}

const SELECT_COLUMNS: &str =
    "id, text, category, author, is_custom, date_added, last_modified, server_id";

impl QuoteRepository for LibSqlQuoteRepository<'_> {
    async fn insert(&self, quote: &Quote) -> Result<()> {
        self.insert_in_open_transaction(quote).await
    }

    async fn insert_batch(&self, quotes: &[Quote]) -> Result<()> {
        if quotes.is_empty() {
            return Ok(());
        }

        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        for quote in quotes {
            if let Err(e) = self.insert_in_open_transaction(quote).await {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e);
            }
        }
        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
        Ok(())
    }

    async fn get(&self, id: &QuoteId) -> Result<Option<Quote>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {SELECT_COLUMNS} FROM quotes WHERE id = ?"),
                params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_quote(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_by_server_id(&self, server_id: &str) -> Result<Option<Quote>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {SELECT_COLUMNS} FROM quotes WHERE server_id = ?"),
                params![server_id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_quote(&row)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, category: Option<&str>) -> Result<Vec<Quote>> {
        let mut rows = match category {
            Some(category) => {
                self.conn
                    .query(
                        &format!(
                            "SELECT {SELECT_COLUMNS} FROM quotes
                             WHERE category = ? ORDER BY rowid"
                        ),
                        params![category.trim().to_lowercase()],
                    )
                    .await?
            }
            None => {
                self.conn
                    .query(
                        &format!("SELECT {SELECT_COLUMNS} FROM quotes ORDER BY rowid"),
                        (),
                    )
                    .await?
            }
        };

        let mut quotes = Vec::new();
        while let Some(row) = rows.next().await? {
            quotes.push(Self::parse_quote(&row)?);
        }
        Ok(quotes)
    }

    async fn remove_ids(&self, ids: &[QuoteId]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        self.conn.execute("BEGIN TRANSACTION", ()).await?;
        let mut removed = 0usize;
        for id in ids {
            match self
                .conn
                .execute("DELETE FROM quotes WHERE id = ?", params![id.as_str()])
                .await
            {
                Ok(rows) => removed += usize::try_from(rows).unwrap_or(0),
                Err(e) => {
                    self.conn.execute("ROLLBACK", ()).await.ok();
                    return Err(e.into());
                }
            }
        }
        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
        Ok(removed)
    }

    async fn replace_custom(&self, quotes: &[Quote]) -> Result<()> {
        self.conn.execute("BEGIN TRANSACTION", ()).await?;

        if let Err(e) = self
            .conn
            .execute("DELETE FROM quotes WHERE is_custom = 1", ())
            .await
        {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }

        for quote in quotes {
            if let Err(e) = self.insert_in_open_transaction(quote).await {
                self.conn.execute("ROLLBACK", ()).await.ok();
                return Err(e);
            }
        }

        if let Err(e) = self.conn.execute("COMMIT", ()).await {
            self.conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
        Ok(())
    }

    async fn set_server_id(&self, id: &QuoteId, server_id: &str) -> Result<()> {
        let rows = self
            .conn
            .execute(
                "UPDATE quotes SET server_id = ? WHERE id = ?",
                params![server_id, id.as_str()],
            )
            .await?;

        if rows == 0 {
            return Err(crate::error::Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn record_conflict(
        &self,
        local_count: usize,
        remote_count: usize,
        strategy: &str,
        resolved_at: i64,
    ) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO sync_conflicts (local_count, remote_count, resolved_at, strategy)
                 VALUES (?, ?, ?, ?)",
                params![
                    local_count as i64,
                    remote_count as i64,
                    resolved_at,
                    strategy
                ],
            )
            .await?;
        Ok(())
    }

    async fn list_conflicts(&self, limit: usize) -> Result<Vec<ConflictRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, local_count, remote_count, resolved_at, strategy
                 FROM sync_conflicts
                 ORDER BY resolved_at DESC, id DESC
                 LIMIT ?",
                params![limit as i64],
            )
            .await?;

        let mut conflicts = Vec::new();
        while let Some(row) = rows.next().await? {
            conflicts.push(ConflictRecord {
                id: row.get(0)?,
                local_count: row.get(1)?,
                remote_count: row.get(2)?,
                resolved_at: row.get(3)?,
                strategy: row.get(4)?,
            });
        }
        Ok(conflicts)
    }
}
