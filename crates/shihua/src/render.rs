//! Text rendering shared by the poem and favorites commands.

use std::fmt::Write as _;

use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use shihua_core::{PoemRecord, SavedPoemEntry};

pub(crate) const EMPTY_FAVORITES: &str = "暂无收藏的诗歌";
pub(crate) const EMPTY_FAVORITES_HINT: &str = "Generate a poem with `shihua generate <image> --save` to add one.";

/// Title, verses and attribution, the way the poem card shows them.
pub(crate) fn render_poem(poem: &PoemRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", poem.title);
    let _ = writeln!(out);
    for verse in poem.verses() {
        let _ = writeln!(out, "  {verse}");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "—— {}", poem.author);
    out
}

pub(crate) fn render_entry(entry: &SavedPoemEntry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "ID: {}", entry.id);
    let _ = writeln!(out, "Saved: {}", entry.saved_at.to_rfc3339());
    let _ = writeln!(out, "Image: {}", entry.image_reference);
    let _ = writeln!(out);
    out.push_str(&render_poem(&entry.poem));
    out
}

pub(crate) fn render_list(entries: &[SavedPoemEntry]) -> String {
    let mut out = String::new();
    if entries.is_empty() {
        let _ = writeln!(out, "{EMPTY_FAVORITES}");
        let _ = writeln!(out, "{EMPTY_FAVORITES_HINT}");
        return out;
    }

    let _ = writeln!(
        out,
        "{:<10}  {:<16}  {:<16}  IMAGE",
        "ID", "SAVED", "TITLE"
    );
    for entry in entries {
        let _ = writeln!(
            out,
            "{:<10}  {:<16}  {:<16}  {}",
            short_id(&entry.id, 10),
            format_timestamp(entry.saved_at),
            truncate_chars(&entry.poem.title, 16),
            truncate_chars(&entry.image_reference, 60)
        );
    }
    out
}

/// Find the entry whose id starts with `prefix` (case-insensitive).
///
/// `Ok(None)` when nothing matches; an error when the prefix is ambiguous.
pub(crate) fn resolve_by_prefix<'a>(
    entries: &'a [SavedPoemEntry],
    prefix: &str,
) -> Result<Option<&'a SavedPoemEntry>> {
    if let Some(exact) = entries.iter().find(|entry| entry.id == prefix) {
        return Ok(Some(exact));
    }

    let normalized = prefix.to_ascii_lowercase();
    let matches: Vec<&SavedPoemEntry> = entries
        .iter()
        .filter(|entry| entry.id.to_ascii_lowercase().starts_with(&normalized))
        .collect();

    match matches.as_slice() {
        [] => Ok(None),
        [entry] => Ok(Some(*entry)),
        many => {
            let choices = many
                .iter()
                .map(|entry| short_id(&entry.id, 12))
                .collect::<Vec<_>>()
                .join(", ");
            bail!("Ambiguous prefix '{prefix}'. Matches: {choices}");
        }
    }
}

fn short_id(id: &str, len: usize) -> String {
    id.chars().take(len).collect()
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M").to_string()
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    let single_line = value.replace('\n', " ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let mut truncated: String = single_line.chars().take(max_chars.saturating_sub(3)).collect();
    truncated.push_str("...");
    truncated
}
