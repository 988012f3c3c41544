//! Applying user edits to an aggregated state.
//!
//! Edits never mutate their input; each returns a fresh state so the loaded
//! baseline can never be reached through an alias.

use crate::aggregate::{AggregatedField, AggregatedState, FieldData, KeywordEntry, KeywordStatus};
use crate::error::{MetadataError, Result};
use crate::fields::{self, FieldKind, KEYWORDS};

/// Replace one field with a user-supplied value.
///
/// The field always becomes unique. A field that was already unique keeps its
/// consolidation flag until a save rewrites the files; a mixed field becomes
/// consolidated since every file will receive the same value.
pub fn apply_edit(
    state: &AggregatedState,
    field: &str,
    value: impl Into<FieldData>,
) -> Result<AggregatedState> {
    let descriptor = fields::descriptor(field)?;
    let value = value.into();
    if value.kind() != descriptor.kind {
        return Err(MetadataError::FieldKindMismatch {
            field: field.to_string(),
            expected: match descriptor.kind {
                FieldKind::Text => "text",
                FieldKind::Keywords => "keyword list",
            },
        });
    }

    let is_consolidated = state
        .get(field)
        .map(AggregatedField::is_consolidated)
        .unwrap_or(true);

    let mut next = state.clone();
    next.insert(field, AggregatedField::unique(value, is_consolidated));
    Ok(next)
}

/// Add a keyword to every selected file.
///
/// A partial keyword is promoted to common. Blank names leave the state as is.
pub fn with_keyword_added(state: &AggregatedState, name: &str) -> Result<AggregatedState> {
    let name = name.trim();
    if name.is_empty() {
        return Ok(state.clone());
    }

    let mut entries = state.keyword_entries().to_vec();
    match entries.iter().position(|e| e.name == name) {
        Some(i) if entries[i].status == KeywordStatus::Common => return Ok(state.clone()),
        Some(i) => entries[i].status = KeywordStatus::Common,
        None => entries.push(KeywordEntry::common(name)),
    }
    apply_edit(state, KEYWORDS, entries)
}

/// Remove a keyword from every selected file that holds it.
pub fn with_keyword_removed(state: &AggregatedState, name: &str) -> Result<AggregatedState> {
    let name = name.trim();
    let entries = state.keyword_entries();
    if !entries.iter().any(|e| e.name == name) {
        return Ok(state.clone());
    }
    let remaining: Vec<KeywordEntry> = entries.iter().filter(|e| e.name != name).cloned().collect();
    apply_edit(state, KEYWORDS, remaining)
}
