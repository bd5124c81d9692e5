//! Collections command - list, inspect and delete collections.

use super::init::prompt_continue;
use crate::cli::{CollectionsAction, Output};
use crate::config::Settings;
use crate::vector_store::create_vector_index;
use anyhow::Result;

/// Run the collections command.
pub async fn run_collections(action: &CollectionsAction, settings: &Settings) -> Result<()> {
    let index = create_vector_index(settings)?;

    match action {
        CollectionsAction::List => {
            let names = index.list_collections().await?;
            if names.is_empty() {
                Output::info("No collections yet. Create one with 'mampfsearch init'.");
                return Ok(());
            }

            Output::header(&format!("Collections ({})", names.len()));
            for name in names {
                let info = index.collection_info(&name).await?;
                Output::list_item(&format!("{} ({} points)", info.name, info.points));
            }
        }

        CollectionsAction::Info { name } => {
            let info = index.collection_info(name).await?;
            Output::header(&info.name);
            Output::kv("Points", &info.points.to_string());
            Output::kv("Dense dimension", &info.dense_dimension.to_string());
            Output::kv("Fields", &info.fields.join(", "));
            Output::kv("Created", &info.created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
        }

        CollectionsAction::Delete { name, yes } => {
            if !index.collection_exists(name).await? {
                anyhow::bail!("Collection not found: {}", name);
            }
            if !*yes && !prompt_continue(&format!("Delete collection '{}'?", name))? {
                Output::info("Cancelled.");
                return Ok(());
            }
            index.delete_collection(name).await?;
            Output::success(&format!("Deleted collection {}", name));
        }
    }

    Ok(())
}
