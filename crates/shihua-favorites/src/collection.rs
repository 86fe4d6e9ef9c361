//! JSON encoding of the favorites collection.
//!
//! The collection is one JSON array, newest entry first.

use std::collections::HashSet;

use shihua_core::SavedPoemEntry;

/// Decode persisted bytes into a collection.
///
/// Blank input counts as an empty collection. Anything else must be a JSON
/// array of valid entries with pairwise distinct ids; otherwise the reason is
/// returned as a string for `CorruptStore`.
pub(crate) fn decode(bytes: &[u8]) -> Result<Vec<SavedPoemEntry>, String> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let entries: Vec<SavedPoemEntry> =
        serde_json::from_slice(bytes).map_err(|e| e.to_string())?;

    let mut seen = HashSet::with_capacity(entries.len());
    for (idx, entry) in entries.iter().enumerate() {
        entry
            .validate()
            .map_err(|e| format!("entry {idx}: {e}"))?;
        if !seen.insert(entry.id.as_str()) {
            return Err(format!("entry {idx}: duplicate id '{}'", entry.id));
        }
    }
    Ok(entries)
}

pub(crate) fn encode(entries: &[SavedPoemEntry]) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(entries)
}
