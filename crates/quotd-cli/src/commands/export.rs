use std::path::Path;

use quotd_core::export::{
    render_json_export, render_markdown_export, suggested_export_file_name, ExportFormat,
};
use quotd_core::store::CategoryFilter;
use quotd_core::util::unix_timestamp_ms;

use crate::cli;
use crate::commands::common::open_store;
use crate::error::CliError;

pub async fn run_export(
    format: cli::ExportFormat,
    output_path: Option<&Path>,
    to_stdout: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path).await?;

    let (rendered, core_format) = match format {
        cli::ExportFormat::Json => {
            let document = store.export_snapshot().await?;
            (render_json_export(&document)?, ExportFormat::Json)
        }
        cli::ExportFormat::Markdown => {
            let quotes = store.list(&CategoryFilter::All).await?;
            (render_markdown_export(&quotes), ExportFormat::Markdown)
        }
    };

    if to_stdout {
        println!("{rendered}");
        return Ok(());
    }

    let path = match output_path {
        Some(path) => path.to_path_buf(),
        None => suggested_export_file_name(core_format, unix_timestamp_ms()).into(),
    };
    std::fs::write(&path, rendered)?;
    println!("{}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use quotd_core::QuoteStore;

    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn run_export_writes_round_trippable_json() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("quotd.db");
        let output_path = tmp.path().join("export.json");

        {
            let store = QuoteStore::open_path(&db_path).await.unwrap();
            store.add("Export me", "files", "Tester").await.unwrap();
        }

        run_export(
            cli::ExportFormat::Json,
            Some(&output_path),
            false,
            &db_path,
        )
        .await
        .unwrap();

        let exported = std::fs::read_to_string(&output_path).unwrap();
        assert!(exported.contains("\"text\": \"Export me\""));

        // Round-trip into a fresh store
        let fresh_path = tmp.path().join("fresh.db");
        let fresh = QuoteStore::open_path(&fresh_path).await.unwrap();
        let report = fresh.import_payload(&exported).await.unwrap();
        assert_eq!(report.imported, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn run_export_markdown_renders_blockquotes() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("quotd.db");
        let output_path = tmp.path().join("export.md");

        run_export(
            cli::ExportFormat::Markdown,
            Some(&output_path),
            false,
            &db_path,
        )
        .await
        .unwrap();

        let exported = std::fs::read_to_string(&output_path).unwrap();
        assert!(exported.starts_with("> "));
        assert!(exported.contains("Steve Jobs"));
    }
}
