use anyhow::{Context, Result, bail};
use serde_json::json;
use shihua_core::OutputFormat;
use shihua_favorites::{FavoritesStore, KvStore};

use crate::render::{render_entry, render_list, resolve_by_prefix};

pub(crate) struct ListOutput {
    pub stdout: String,
    /// Printed to stderr when unreadable data was shown as empty.
    pub warning: Option<String>,
}

pub(crate) async fn handle_list<K: KvStore>(
    store: &FavoritesStore<K>,
    format: OutputFormat,
) -> Result<ListOutput> {
    let listing = store
        .list_with_status()
        .await
        .context("Failed to load favorites")?;
    let stdout = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&listing.entries)? + "\n",
        OutputFormat::Text => render_list(&listing.entries),
    };
    let warning = listing.recovered_from.map(|reason| {
        format!(
            "warning: favorites under key '{}' could not be read ({reason}); showing none. \
             The unreadable data is backed up under '{}<time>' on the next save.",
            store.key(),
            store.corrupt_key_prefix()
        )
    });
    Ok(ListOutput { stdout, warning })
}

pub(crate) async fn handle_show<K: KvStore>(
    store: &FavoritesStore<K>,
    id_prefix: &str,
    format: OutputFormat,
) -> Result<String> {
    let entries = store.list().await.context("Failed to load favorites")?;
    let Some(entry) = resolve_by_prefix(&entries, id_prefix)? else {
        bail!("No favorite matching '{id_prefix}'.");
    };
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(entry)? + "\n"),
        OutputFormat::Text => Ok(render_entry(entry)),
    }
}

/// Remove by full id or unique prefix. An unknown id is not an error.
pub(crate) async fn handle_remove<K: KvStore>(
    store: &FavoritesStore<K>,
    id: &str,
    format: OutputFormat,
) -> Result<String> {
    let entries = store.list().await.context("Failed to load favorites")?;
    let target = match resolve_by_prefix(&entries, id)? {
        Some(entry) => entry.id.clone(),
        None => id.to_string(),
    };

    let removed = store
        .remove(&target)
        .await
        .with_context(|| format!("Failed to remove favorite {target}"))?;

    match format {
        OutputFormat::Json => {
            let body = json!({ "id": target, "removed": removed });
            Ok(serde_json::to_string_pretty(&body)? + "\n")
        }
        OutputFormat::Text if removed => Ok(format!("Removed favorite {target}.\n")),
        OutputFormat::Text => Ok(format!("No favorite with id {target}; nothing removed.\n")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shihua_core::{PoemRecord, SavedPoemEntry};
    use shihua_favorites::MemoryKvStore;

    fn poem(title: &str) -> PoemRecord {
        PoemRecord::new(title, "远上寒山石径斜，白云生处有人家。", "AI 创作")
    }

    async fn seeded() -> (FavoritesStore<MemoryKvStore>, SavedPoemEntry, SavedPoemEntry) {
        let store = FavoritesStore::new(MemoryKvStore::new());
        let older = store.save(poem("山行"), "file://a.jpg").await.unwrap();
        let newer = store.save(poem("静夜思"), "file://b.jpg").await.unwrap();
        (store, older, newer)
    }

    #[tokio::test]
    async fn test_list_text_empty() {
        let store = FavoritesStore::new(MemoryKvStore::new());
        let out = handle_list(&store, OutputFormat::Text).await.unwrap();
        assert!(out.stdout.starts_with(crate::render::EMPTY_FAVORITES));
        assert!(out.warning.is_none());
    }

    #[tokio::test]
    async fn test_list_warns_when_data_unreadable() {
        let kv = MemoryKvStore::new();
        kv.insert_raw("savedPoems", "not json at all");
        let store = FavoritesStore::new(kv);

        let out = handle_list(&store, OutputFormat::Json).await.unwrap();
        let parsed: Vec<SavedPoemEntry> = serde_json::from_str(&out.stdout).unwrap();
        assert!(parsed.is_empty());
        let warning = out.warning.expect("unreadable data must be reported");
        assert!(warning.contains("'savedPoems'"));
        assert!(warning.contains("savedPoems.corrupt-"));
    }

    #[tokio::test]
    async fn test_list_json_newest_first() {
        let (store, older, newer) = seeded().await;
        let out = handle_list(&store, OutputFormat::Json).await.unwrap();
        let parsed: Vec<SavedPoemEntry> = serde_json::from_str(&out.stdout).unwrap();
        assert_eq!(parsed, vec![newer, older]);
    }

    #[tokio::test]
    async fn test_show_by_full_id() {
        let (store, older, _newer) = seeded().await;
        let out = handle_show(&store, &older.id, OutputFormat::Text)
            .await
            .unwrap();
        assert!(out.contains(&format!("ID: {}", older.id)));
        assert!(out.contains("山行"));
    }

    #[tokio::test]
    async fn test_show_unknown_id_errors() {
        let (store, _, _) = seeded().await;
        let err = handle_show(&store, "zzz", OutputFormat::Text)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No favorite matching 'zzz'"));
    }

    #[tokio::test]
    async fn test_remove_existing_then_again() {
        let (store, older, newer) = seeded().await;

        let out = handle_remove(&store, &older.id, OutputFormat::Json)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(body["removed"], true);
        assert_eq!(body["id"], older.id.as_str());
        assert_eq!(store.list().await.unwrap(), vec![newer]);

        let out = handle_remove(&store, &older.id, OutputFormat::Text)
            .await
            .unwrap();
        assert!(out.contains("nothing removed"));
    }

    #[tokio::test]
    async fn test_remove_nonexistent_on_empty_store() {
        let store = FavoritesStore::new(MemoryKvStore::new());
        let out = handle_remove(&store, "nonexistent-id", OutputFormat::Text)
            .await
            .unwrap();
        assert_eq!(out, "No favorite with id nonexistent-id; nothing removed.\n");
    }

    #[tokio::test]
    async fn test_remove_by_prefix_on_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = shihua_config::StorageConfig {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        let store = FavoritesStore::from_config(&storage);
        let saved = store.save(poem("山行"), "file://a.jpg").await.unwrap();

        let reopened = FavoritesStore::from_config(&storage);
        let out = handle_remove(&reopened, &saved.id[..20], OutputFormat::Text)
            .await
            .unwrap();
        assert_eq!(out, format!("Removed favorite {}.\n", saved.id));
        assert!(reopened.list().await.unwrap().is_empty());
    }
}
