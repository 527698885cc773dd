use std::path::Path;

use quotd_core::store::CategoryFilter;

use crate::commands::common::{
    format_quote_lines, format_relative_time, open_store, quote_to_list_item, QuoteListItem,
};
use crate::error::CliError;

pub async fn run_list(
    category: Option<&str>,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let quotes = store.list(&CategoryFilter::parse(category)).await?;

    if as_json {
        let json_items = quotes
            .iter()
            .map(quote_to_list_item)
            .collect::<Vec<QuoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if quotes.is_empty() {
        println!("No quotes found. Add one with `quotd add`.");
    } else {
        for line in format_quote_lines(&quotes) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_categories(db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let quotes = store.list(&CategoryFilter::All).await?;

    let mut counts: Vec<(String, usize)> = Vec::new();
    for quote in &quotes {
        match counts.iter_mut().find(|(name, _)| *name == quote.category) {
            Some((_, count)) => *count += 1,
            None => counts.push((quote.category.clone(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    if counts.is_empty() {
        println!("No categories yet.");
    } else {
        for (name, count) in counts {
            println!("{name:<20} {count}");
        }
    }

    Ok(())
}

pub async fn run_stats(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let stats = store.stats().await?;
    let last_sync = store.last_sync_time().await?;

    if as_json {
        let payload = serde_json::json!({
            "total": stats.total,
            "categories": stats.categories,
            "custom": stats.custom,
            "pending_upload": stats.pending_upload,
            "last_sync_time": last_sync,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Quotes:          {}", stats.total);
    println!("Categories:      {}", stats.categories);
    println!("Custom quotes:   {}", stats.custom);
    println!("Pending upload:  {}", stats.pending_upload);
    match last_sync {
        Some(timestamp) => {
            let now = chrono::Utc::now().timestamp_millis();
            println!("Last sync:       {}", format_relative_time(timestamp, now));
        }
        None => println!("Last sync:       never"),
    }

    Ok(())
}
