use anyhow::{Context, Result};
use shihua_core::OutputFormat;
use shihua_favorites::{FavoritesStore, KvStore};
use shihua_generator::PoemGenerator;

use crate::render::{render_entry, render_poem};

/// Generate a poem for `image`; with a store, also save it to favorites.
pub(crate) async fn handle_generate<K: KvStore>(
    generator: &dyn PoemGenerator,
    save_to: Option<&FavoritesStore<K>>,
    image: &str,
    format: OutputFormat,
) -> Result<String> {
    let poem = generator.generate(image).await;

    let Some(store) = save_to else {
        return match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&poem)? + "\n"),
            OutputFormat::Text => Ok(render_poem(&poem)),
        };
    };

    let entry = store
        .save(poem, image)
        .await
        .context("Failed to save poem to favorites")?;
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&entry)? + "\n"),
        OutputFormat::Text => Ok(format!(
            "{}\nSaved to favorites.\n",
            render_entry(&entry)
        )),
    }
}
