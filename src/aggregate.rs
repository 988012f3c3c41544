//! Collapsing many files' metadata into one editable view.
//!
//! Every tracked text field becomes either [`AggregatedField::Unique`] (all
//! selected files agree) or [`AggregatedField::Mixed`]. The keyword field is
//! always unique: it holds the union of every file's keywords, each tagged
//! [`KeywordStatus::Common`] or [`KeywordStatus::Partial`].
//!
//! A file missing a field and a file holding an empty value for it are
//! aggregated identically.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::fields::{FieldKind, FIELDS, KEYWORDS};
use crate::value::{FieldValue, ImageFile};

/// The aggregate of one field across the selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AggregatedField<T> {
    /// Every selected file holds this value.
    Unique {
        value: T,
        /// True only if every contributing file reported a consolidated field.
        #[serde(rename = "isConsolidated")]
        is_consolidated: bool,
    },
    /// The selected files disagree. There is no value to display.
    Mixed,
}

impl<T> AggregatedField<T> {
    pub fn unique(value: T, is_consolidated: bool) -> Self {
        AggregatedField::Unique {
            value,
            is_consolidated,
        }
    }

    /// The shared value, or `None` when mixed.
    pub fn value(&self) -> Option<&T> {
        match self {
            AggregatedField::Unique { value, .. } => Some(value),
            AggregatedField::Mixed => None,
        }
    }

    pub fn is_mixed(&self) -> bool {
        matches!(self, AggregatedField::Mixed)
    }

    /// The consolidation flag of a unique field. Mixed fields report `true`.
    pub fn is_consolidated(&self) -> bool {
        match self {
            AggregatedField::Unique {
                is_consolidated, ..
            } => *is_consolidated,
            AggregatedField::Mixed => true,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AggregatedField<U> {
        match self {
            AggregatedField::Unique {
                value,
                is_consolidated,
            } => AggregatedField::Unique {
                value: f(value),
                is_consolidated,
            },
            AggregatedField::Mixed => AggregatedField::Mixed,
        }
    }
}

/// Whether a keyword is held by every selected file or only some.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordStatus {
    Common,
    Partial,
}

/// One keyword in the aggregated keyword list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub name: String,
    pub status: KeywordStatus,
}

impl KeywordEntry {
    pub fn common(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: KeywordStatus::Common,
        }
    }

    pub fn partial(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: KeywordStatus::Partial,
        }
    }
}

/// The value carried by an aggregated field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldData {
    Text(String),
    Keywords(Vec<KeywordEntry>),
}

impl FieldData {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldData::Text(_) => FieldKind::Text,
            FieldData::Keywords(_) => FieldKind::Keywords,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldData::Text(s) => Some(s),
            FieldData::Keywords(_) => None,
        }
    }

    pub fn as_keywords(&self) -> Option<&[KeywordEntry]> {
        match self {
            FieldData::Keywords(k) => Some(k),
            FieldData::Text(_) => None,
        }
    }
}

impl From<&str> for FieldData {
    fn from(s: &str) -> Self {
        FieldData::Text(s.to_string())
    }
}

impl From<String> for FieldData {
    fn from(s: String) -> Self {
        FieldData::Text(s)
    }
}

impl From<Vec<KeywordEntry>> for FieldData {
    fn from(k: Vec<KeywordEntry>) -> Self {
        FieldData::Keywords(k)
    }
}

/// One aggregated entry per tracked field, keyed by backend tag name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregatedState {
    fields: BTreeMap<String, AggregatedField<FieldData>>,
}

impl AggregatedState {
    pub fn get(&self, name: &str) -> Option<&AggregatedField<FieldData>> {
        self.fields.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AggregatedField<FieldData>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The aggregated keyword entries; empty when the state is empty.
    pub fn keyword_entries(&self) -> &[KeywordEntry] {
        self.get(KEYWORDS)
            .and_then(AggregatedField::value)
            .and_then(FieldData::as_keywords)
            .unwrap_or(&[])
    }

    pub(crate) fn insert(&mut self, name: &str, field: AggregatedField<FieldData>) {
        self.fields.insert(name.to_string(), field);
    }
}

/// Aggregate one scalar field across files.
///
/// No values yields a consolidated default.
pub fn aggregate_values<T, I>(values: I) -> AggregatedField<T>
where
    T: PartialEq + Default,
    I: IntoIterator<Item = FieldValue<T>>,
{
    let mut values = values.into_iter();
    let Some(first) = values.next() else {
        return AggregatedField::unique(T::default(), true);
    };
    let mut is_consolidated = first.is_consolidated;
    for v in values {
        if v.value != first.value {
            return AggregatedField::Mixed;
        }
        is_consolidated &= v.is_consolidated;
    }
    AggregatedField::unique(first.value, is_consolidated)
}

/// Aggregate keyword lists into a union tagged with common/partial status.
///
/// Entries are returned in first-seen order.
pub fn aggregate_keywords<I>(lists: I) -> AggregatedField<Vec<KeywordEntry>>
where
    I: IntoIterator<Item = FieldValue<Vec<String>>>,
{
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut file_count = 0usize;
    let mut is_consolidated = true;

    for list in lists {
        file_count += 1;
        is_consolidated &= list.is_consolidated;
        let mut seen_in_file: Vec<&str> = Vec::with_capacity(list.value.len());
        for name in &list.value {
            if seen_in_file.contains(&name.as_str()) {
                continue;
            }
            seen_in_file.push(name.as_str());
            let count = counts.entry(name.clone()).or_insert_with(|| {
                order.push(name.clone());
                0
            });
            *count += 1;
        }
    }

    let entries = order
        .into_iter()
        .map(|name| {
            let status = if counts.get(&name) == Some(&file_count) {
                KeywordStatus::Common
            } else {
                KeywordStatus::Partial
            };
            KeywordEntry { name, status }
        })
        .collect();

    AggregatedField::unique(entries, is_consolidated)
}

/// Build the aggregated view of a selection.
///
/// An empty selection yields an empty state.
pub fn aggregate(files: &[ImageFile]) -> AggregatedState {
    let mut state = AggregatedState::default();
    if files.is_empty() {
        return state;
    }

    for d in FIELDS {
        let field = match d.kind {
            FieldKind::Text => {
                aggregate_values(files.iter().map(|f| f.text_field(d.name))).map(FieldData::Text)
            }
            FieldKind::Keywords => aggregate_keywords(files.iter().map(ImageFile::keywords_field))
                .map(FieldData::Keywords),
        };
        state.insert(d.name, field);
    }

    let mixed = state.iter().filter(|(_, f)| f.is_mixed()).count();
    tracing::debug!(
        files = files.len(),
        fields = state.len(),
        mixed,
        "Aggregated selection metadata"
    );
    state
}

/// The two aggregate copies kept for a loaded selection.
///
/// `original` is fixed at load time and is the only baseline for dirtiness
/// and keyword deltas. `current` reflects user edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    current: AggregatedState,
    original: AggregatedState,
}

impl Snapshot {
    pub fn from_files(files: &[ImageFile]) -> Self {
        let original = aggregate(files);
        Self {
            current: original.clone(),
            original,
        }
    }

    pub fn current(&self) -> &AggregatedState {
        &self.current
    }

    pub fn original(&self) -> &AggregatedState {
        &self.original
    }

    pub(crate) fn replace_current(&mut self, state: AggregatedState) {
        self.current = state;
    }
}
