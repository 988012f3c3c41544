//! Per-file metadata as reported by the backend.
//!
//! Each file carries a map of tag name to `{ value, isConsolidated }`. The map
//! is kept as raw JSON so it can be handed back to the backend untouched as
//! `original_metadata`; typed views are read on demand and never fail.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::fields::{FIELDS, KEYWORDS};

fn consolidated_by_default() -> bool {
    true
}

/// One file's value for one metadata field.
///
/// `is_consolidated == false` means the backend found synonymous source tags
/// that disagree, so the field should be rewritten on the next save even if
/// the user never touches it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue<T> {
    pub value: T,
    #[serde(rename = "isConsolidated", default = "consolidated_by_default")]
    pub is_consolidated: bool,
}

impl<T> FieldValue<T> {
    pub fn new(value: T, is_consolidated: bool) -> Self {
        Self {
            value,
            is_consolidated,
        }
    }

    /// A consolidated value.
    pub fn consolidated(value: T) -> Self {
        Self::new(value, true)
    }
}

impl<T: Default> Default for FieldValue<T> {
    fn default() -> Self {
        Self::consolidated(T::default())
    }
}

/// The raw metadata record for a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageFile {
    pub filename: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Where a raw field entry stands after a shape check.
enum RawField<'a> {
    Absent,
    Present { value: &'a Value, consolidated: bool },
    Malformed,
}

impl ImageFile {
    pub fn new(filename: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            filename: filename.into(),
            metadata,
        }
    }

    fn raw_field(&self, name: &str) -> RawField<'_> {
        let Some(entry) = self.metadata.get(name) else {
            return RawField::Absent;
        };
        let Some(obj) = entry.as_object() else {
            return RawField::Malformed;
        };
        let Some(value) = obj.get("value") else {
            return RawField::Malformed;
        };
        let consolidated = match obj.get("isConsolidated") {
            None => true,
            Some(Value::Bool(b)) => *b,
            Some(_) => return RawField::Malformed,
        };
        RawField::Present {
            value,
            consolidated,
        }
    }

    /// Read a text field. Absent or malformed entries yield an empty,
    /// consolidated value.
    pub fn text_field(&self, name: &str) -> FieldValue<String> {
        match self.raw_field(name) {
            RawField::Absent => FieldValue::default(),
            RawField::Present {
                value,
                consolidated,
            } => match value {
                Value::String(s) => FieldValue::new(s.clone(), consolidated),
                Value::Number(n) => FieldValue::new(n.to_string(), consolidated),
                Value::Bool(b) => FieldValue::new(b.to_string(), consolidated),
                _ => self.degraded(name),
            },
            RawField::Malformed => self.degraded(name),
        }
    }

    /// The text field's value as stored, keeping numbers and booleans as
    /// JSON scalars. Anything else reads as the string from [`Self::text_field`].
    pub fn text_field_raw(&self, name: &str) -> Value {
        match self.raw_field(name) {
            RawField::Present { value, .. }
                if matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)) =>
            {
                value.clone()
            }
            _ => Value::String(self.text_field(name).value),
        }
    }

    /// Read the keyword list, trimmed and de-duplicated in first-seen order.
    pub fn keywords_field(&self) -> FieldValue<Vec<String>> {
        match self.raw_field(KEYWORDS) {
            RawField::Absent => FieldValue::default(),
            RawField::Present {
                value,
                consolidated,
            } => {
                let names: Vec<&str> = match value {
                    Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
                    Value::String(s) => vec![s.as_str()],
                    _ => return self.degraded(KEYWORDS),
                };
                let mut keywords: Vec<String> = Vec::with_capacity(names.len());
                for name in names.into_iter().map(str::trim) {
                    if name.is_empty() || keywords.iter().any(|k| k == name) {
                        continue;
                    }
                    keywords.push(name.to_string());
                }
                FieldValue::new(keywords, consolidated)
            }
            RawField::Malformed => self.degraded(KEYWORDS),
        }
    }

    fn degraded<T: Default>(&self, name: &str) -> FieldValue<T> {
        tracing::warn!(
            filename = %self.filename,
            field = name,
            "Malformed metadata field, treating as empty"
        );
        FieldValue::default()
    }

    /// Whether the backend reported `isConsolidated == false` for the field.
    ///
    /// Absent and malformed fields count as consolidated.
    pub fn is_field_unconsolidated(&self, name: &str) -> bool {
        match self.raw_field(name) {
            RawField::Present {
                value,
                consolidated: false,
            } if name == KEYWORDS => matches!(value, Value::Array(_) | Value::String(_)),
            RawField::Present {
                value,
                consolidated: false,
            } => matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_)),
            _ => false,
        }
    }

    /// Whether any tracked field of this file needs rewriting.
    pub fn needs_consolidation(&self) -> bool {
        FIELDS.iter().any(|d| self.is_field_unconsolidated(d.name))
    }
}
