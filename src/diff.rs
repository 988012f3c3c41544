//! Building the minimal per-file save payload.
//!
//! Text fields are written to a file when the user changed them or when that
//! file's own field is not consolidated. A field left mixed keeps each file's
//! own value. Keywords are never overwritten wholesale: the additions and
//! removals made to the aggregate are replayed on each file's own list.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::aggregate::{AggregatedField, AggregatedState, FieldData, KeywordEntry, KeywordStatus};
use crate::fields::{FieldKind, FIELDS, KEYWORDS};
use crate::tracker::ChangeTracker;
use crate::value::ImageFile;

/// The patch for a single file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileUpdate {
    pub path: String,
    /// The file's record exactly as fetched.
    pub original_metadata: Map<String, Value>,
    /// Tag name to new plain value: a scalar for text fields, a string array
    /// for keywords.
    pub new_metadata: Map<String, Value>,
}

/// The body of a save request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavePayload {
    pub files_to_update: Vec<FileUpdate>,
    /// Keyword names introduced by this save, for the suggestion engine.
    pub keywords_to_learn: Vec<String>,
}

impl SavePayload {
    /// True when no file needs writing.
    pub fn is_empty(&self) -> bool {
        self.files_to_update.is_empty()
    }
}

/// The backend's answer to a save request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    #[serde(default)]
    pub message: String,
}

/// Keyword additions and removals made to the aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordDelta {
    /// Names that must end up on every file.
    pub added: Vec<String>,
    /// Names that must be stripped from every file.
    pub removed: Vec<String>,
}

fn unique_keywords(state: &AggregatedState) -> Option<&[KeywordEntry]> {
    state
        .get(KEYWORDS)
        .and_then(AggregatedField::value)
        .and_then(FieldData::as_keywords)
}

impl KeywordDelta {
    /// Compare the aggregate keyword entries.
    ///
    /// A name counts as added when it was absent at load time, whatever its
    /// status now, or when it was partial at load time and is common now.
    /// Promoting a partial keyword therefore spreads it to the files that
    /// lacked it.
    pub fn between(current: &AggregatedState, original: &AggregatedState) -> Self {
        let (Some(current), Some(original)) = (unique_keywords(current), unique_keywords(original))
        else {
            return Self::default();
        };

        let mut added = Vec::new();
        for entry in current {
            if added.contains(&entry.name) {
                continue;
            }
            let is_added = match original.iter().find(|o| o.name == entry.name) {
                None => true,
                Some(o) => {
                    o.status == KeywordStatus::Partial && entry.status == KeywordStatus::Common
                }
            };
            if is_added {
                added.push(entry.name.clone());
            }
        }

        let mut removed = Vec::new();
        for entry in original {
            if !current.iter().any(|c| c.name == entry.name) && !removed.contains(&entry.name) {
                removed.push(entry.name.clone());
            }
        }

        Self { added, removed }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Replay the delta on one file's keyword list, keeping its order and
    /// appending new names at the end.
    pub fn apply(&self, keywords: &[String]) -> Vec<String> {
        let mut result: Vec<String> = keywords
            .iter()
            .filter(|k| !self.removed.contains(k))
            .cloned()
            .collect();
        for name in &self.added {
            if !result.contains(name) {
                result.push(name.clone());
            }
        }
        result
    }
}

/// Compute the per-file patches for saving `current`.
///
/// Files whose patch would be empty are left out.
pub fn build_save_payload(
    files: &[ImageFile],
    current: &AggregatedState,
    original: &AggregatedState,
) -> SavePayload {
    let dirty = ChangeTracker::new(files, current, original).dirty_fields();
    let delta = KeywordDelta::between(current, original);

    let mut files_to_update = Vec::new();
    for file in files {
        let mut new_metadata = Map::new();

        for d in FIELDS {
            match d.kind {
                FieldKind::Text => {
                    let is_dirty = dirty.contains(&d.name);
                    if !is_dirty && !file.is_field_unconsolidated(d.name) {
                        continue;
                    }
                    // untouched repairs write back the file's own stored value
                    let value = match current.get(d.name).and_then(AggregatedField::value) {
                        Some(FieldData::Text(text)) if is_dirty => Value::String(text.clone()),
                        _ => file.text_field_raw(d.name),
                    };
                    new_metadata.insert(d.name.to_string(), value);
                }
                FieldKind::Keywords => {
                    let own = file.keywords_field();
                    let next = delta.apply(&own.value);
                    if next != own.value || !own.is_consolidated {
                        new_metadata.insert(
                            d.name.to_string(),
                            Value::Array(next.into_iter().map(Value::String).collect()),
                        );
                    }
                }
            }
        }

        if new_metadata.is_empty() {
            continue;
        }
        files_to_update.push(FileUpdate {
            path: file.filename.clone(),
            original_metadata: file.metadata.clone(),
            new_metadata,
        });
    }

    let original_names: Vec<&str> = unique_keywords(original)
        .unwrap_or(&[])
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    let keywords_to_learn: Vec<String> = delta
        .added
        .iter()
        .filter(|name| !original_names.contains(&name.as_str()))
        .cloned()
        .collect();

    tracing::info!(
        files_to_update = files_to_update.len(),
        keywords_to_learn = keywords_to_learn.len(),
        dirty_fields = ?dirty,
        "Built save payload"
    );

    SavePayload {
        files_to_update,
        keywords_to_learn,
    }
}
