//! Import/export document formats shared by all quotd interfaces.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Quote;

/// Export format version written into the wrapper document
pub const EXPORT_VERSION: &str = "1.0";

/// Export output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Serializable quote representation used in exports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportQuote {
    pub id: String,
    pub text: String,
    pub category: String,
    pub author: String,
    pub date_added: i64,
    pub last_modified: i64,
}

/// Wrapper document written by `export` and accepted back by `import`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub quotes: Vec<ExportQuote>,
    /// Export time, RFC 3339
    pub export_date: String,
    pub version: String,
    pub installation_id: String,
    pub total_quotes: usize,
    pub categories: Vec<String>,
}

/// A quote-like object as it appears in an import file. Fields are
/// optional so validation can report per-item problems instead of
/// rejecting the whole file on the first malformed entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImportQuote {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportPayload {
    Bare(Vec<serde_json::Value>),
    Wrapped(ImportWrapper),
}

#[derive(Deserialize)]
struct ImportWrapper {
    quotes: Vec<serde_json::Value>,
}

/// Parse an import file: either a bare array of quote-like objects or a
/// wrapper object carrying them under `quotes`. Unknown wrapper fields
/// are ignored. Items that are not objects at all come back with every
/// field `None` and fail validation downstream, so one bad entry never
/// sinks the batch.
pub fn parse_import_payload(payload: &str) -> Result<Vec<ImportQuote>> {
    let parsed: ImportPayload = serde_json::from_str(payload)
        .map_err(|_| Error::ImportRejected("invalid quotes data structure".to_string()))?;

    let raw_items = match parsed {
        ImportPayload::Bare(items) => items,
        ImportPayload::Wrapped(wrapper) => wrapper.quotes,
    };

    Ok(raw_items
        .into_iter()
        .map(|value| serde_json::from_value(value).unwrap_or_default())
        .collect())
}

/// Convert a quote into an export record
#[must_use]
pub fn quote_to_export_item(quote: &Quote) -> ExportQuote {
    ExportQuote {
        id: quote.id.to_string(),
        text: quote.text.clone(),
        category: quote.category.clone(),
        author: quote.author.clone(),
        date_added: quote.date_added,
        last_modified: quote.last_modified,
    }
}

/// Build the wrapper document around a quote set
#[must_use]
pub fn build_export_document(
    quotes: &[Quote],
    installation_id: &str,
    exported_at_ms: i64,
) -> ExportDocument {
    let mut categories: Vec<String> = quotes.iter().map(|q| q.category.clone()).collect();
    categories.sort();
    categories.dedup();

    ExportDocument {
        quotes: quotes.iter().map(quote_to_export_item).collect(),
        export_date: format_rfc3339(exported_at_ms),
        version: EXPORT_VERSION.to_string(),
        installation_id: installation_id.to_string(),
        total_quotes: quotes.len(),
        categories,
    }
}

/// Render the wrapper document as pretty-printed JSON
pub fn render_json_export(document: &ExportDocument) -> serde_json::Result<String> {
    serde_json::to_string_pretty(document)
}

/// Render quotes as Markdown blockquotes with attribution
#[must_use]
pub fn render_markdown_export(quotes: &[Quote]) -> String {
    let mut output = String::new();

    for (index, quote) in quotes.iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }

        let _ = writeln!(output, "> {}", quote.text);
        if quote.author.is_empty() {
            let _ = writeln!(output, "> ({})", quote.category);
        } else {
            let _ = writeln!(output, "> — {} ({})", quote.author, quote.category);
        }
    }

    output
}

/// Build a deterministic default file name for export flows, dated with
/// the export day
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, exported_at_ms: i64) -> String {
    let day = chrono::DateTime::from_timestamp_millis(exported_at_ms)
        .map_or_else(|| "unknown-date".to_string(), |dt| dt.format("%Y-%m-%d").to_string());
    format!("quotes-export-{day}.{}", format.extension())
}

fn format_rfc3339(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms)
        .map_or_else(String::new, |dt| dt.to_rfc3339())
}
