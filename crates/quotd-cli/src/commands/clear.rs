use std::path::Path;

use crate::commands::common::open_store;
use crate::error::CliError;

pub async fn run_clear(db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let removed = store.clear_custom().await?;

    if removed == 0 {
        println!("No custom quotes to clear.");
    } else {
        println!("Cleared {removed} custom quotes");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use quotd_core::store::CategoryFilter;
    use quotd_core::QuoteStore;

    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn run_clear_removes_only_custom_quotes() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("quotd.db");

        {
            let store = QuoteStore::open_path(&db_path).await.unwrap();
            store.add("Mine", "misc", "").await.unwrap();
        }

        run_clear(&db_path).await.unwrap();

        let store = QuoteStore::open_path(&db_path).await.unwrap();
        let remaining = store.list(&CategoryFilter::All).await.unwrap();
        assert_eq!(remaining.len(), 8); // seeded defaults survive
        assert!(remaining.iter().all(|quote| !quote.is_custom));
    }
}
