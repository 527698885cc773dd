use std::path::Path;

use crate::commands::common::open_store;
use crate::error::CliError;

pub async fn run_add(
    text_parts: &[String],
    category: &str,
    author: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let text = text_parts.join(" ");
    if text.trim().is_empty() {
        return Err(CliError::EmptyText);
    }

    let store = open_store(db_path).await?;
    let quote = store.add(&text, category, author).await?;

    println!("{}", quote.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use quotd_core::store::CategoryFilter;
    use quotd_core::QuoteStore;

    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn run_add_persists_quote() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("quotd.db");

        run_add(
            &["Stay".to_string(), "curious".to_string()],
            "Learning",
            "Anonymous",
            &db_path,
        )
        .await
        .unwrap();

        let store = QuoteStore::open_path(&db_path).await.unwrap();
        let added = store
            .list(&CategoryFilter::parse(Some("learning")))
            .await
            .unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].text, "Stay curious");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn run_add_rejects_empty_text() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("quotd.db");

        let error = run_add(&[" ".to_string()], "misc", "", &db_path)
            .await
            .unwrap_err();
        assert!(matches!(error, CliError::EmptyText));
    }
}
