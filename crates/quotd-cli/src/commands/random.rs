use std::path::Path;

use quotd_core::store::CategoryFilter;

use crate::commands::common::{format_quote_block, open_store};
use crate::error::CliError;

/// Show a random quote. An explicit category overrides the saved filter
/// preference; passing a category also saves it as the new preference.
pub async fn run_random(category: Option<&str>, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;

    let filter = match category {
        Some(name) => {
            let filter = CategoryFilter::parse(Some(name));
            store.set_category_filter(&filter).await?;
            filter
        }
        None => store.category_filter().await?,
    };

    match store.random(&filter).await? {
        Some(quote) => println!("{}", format_quote_block(&quote)),
        None => println!("No quotes found in this category. Add some quotes!"),
    }

    Ok(())
}
