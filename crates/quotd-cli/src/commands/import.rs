use std::path::Path;

use crate::commands::common::open_store;
use crate::error::CliError;

pub async fn run_import(file: &Path, db_path: &Path) -> Result<(), CliError> {
    let payload = std::fs::read_to_string(file)?;

    let store = open_store(db_path).await?;
    let report = store.import_payload(&payload).await?;

    if report.skipped > 0 {
        println!(
            "Imported {} quotes ({} invalid quotes skipped)",
            report.imported, report.skipped
        );
    } else {
        println!("Imported {} quotes", report.imported);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use quotd_core::store::CategoryFilter;
    use quotd_core::QuoteStore;

    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn run_import_reads_bare_array_file() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("quotd.db");
        let import_path = tmp.path().join("quotes.json");
        std::fs::write(
            &import_path,
            r#"[{"text": "From file", "category": "files", "author": "Tester"}]"#,
        )
        .unwrap();

        run_import(&import_path, &db_path).await.unwrap();

        let store = QuoteStore::open_path(&db_path).await.unwrap();
        let imported = store
            .list(&CategoryFilter::parse(Some("files")))
            .await
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].author, "Tester");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn run_import_surfaces_rejection() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("quotd.db");
        let import_path = tmp.path().join("bad.json");
        std::fs::write(&import_path, "not json at all").unwrap();

        let error = run_import(&import_path, &db_path).await.unwrap_err();
        assert!(error.to_string().contains("Import rejected"));
    }
}
