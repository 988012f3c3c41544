//! Dirty and consolidation tracking for a loaded selection.

use crate::aggregate::AggregatedState;
use crate::error::Result;
use crate::fields::{self, FIELDS};
use crate::value::ImageFile;

/// Compares the edited aggregate with its load-time baseline and inspects
/// the raw records for fields the backend wants rewritten.
#[derive(Debug, Clone, Copy)]
pub struct ChangeTracker<'a> {
    files: &'a [ImageFile],
    current: &'a AggregatedState,
    original: &'a AggregatedState,
}

impl<'a> ChangeTracker<'a> {
    pub fn new(
        files: &'a [ImageFile],
        current: &'a AggregatedState,
        original: &'a AggregatedState,
    ) -> Self {
        Self {
            files,
            current,
            original,
        }
    }

    /// Whether the user changed the field, by value.
    pub fn is_field_dirty(&self, field: &str) -> Result<bool> {
        fields::descriptor(field)?;
        Ok(self.current.get(field) != self.original.get(field))
    }

    /// Names of every dirty field, in table order.
    pub fn dirty_fields(&self) -> Vec<&'static str> {
        FIELDS
            .iter()
            .map(|d| d.name)
            .filter(|name| self.current.get(name) != self.original.get(name))
            .collect()
    }

    pub fn has_any_field_dirty(&self) -> bool {
        FIELDS
            .iter()
            .any(|d| self.current.get(d.name) != self.original.get(d.name))
    }

    /// Whether any selected file has a tracked field the backend reported as
    /// not consolidated.
    pub fn needs_consolidation(&self) -> bool {
        self.files.iter().any(ImageFile::needs_consolidation)
    }

    /// Whether a save would do anything: user edits or pending repairs.
    pub fn is_saveable(&self) -> bool {
        self.has_any_field_dirty() || self.needs_consolidation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, KeywordEntry};
    use crate::edit::{apply_edit, with_keyword_added};
    use crate::error::MetadataError;
    use serde_json::json;

    fn files(records: serde_json::Value) -> Vec<ImageFile> {
        serde_json::from_value(records).unwrap()
    }

    #[test]
    fn test_noop_edit_is_not_dirty() {
        let files = files(json!([
            { "filename": "a.jpg", "metadata": { "Title": { "value": "Paris" } } },
        ]));
        let original = aggregate(&files);
        let current = apply_edit(&original, "Title", "Paris").unwrap();
        let tracker = ChangeTracker::new(&files, &current, &original);
        assert!(!tracker.is_field_dirty("Title").unwrap());
        assert!(!tracker.has_any_field_dirty());
        assert!(!tracker.is_saveable());
    }

    #[test]
    fn test_real_edit_is_dirty() {
        let files = files(json!([
            { "filename": "a.jpg", "metadata": { "Title": { "value": "Paris" } } },
        ]));
        let original = aggregate(&files);
        let current = apply_edit(&original, "Title", "Rome").unwrap();
        let tracker = ChangeTracker::new(&files, &current, &original);
        assert!(tracker.is_field_dirty("Title").unwrap());
        assert_eq!(tracker.dirty_fields(), vec!["Title"]);
        assert!(tracker.is_saveable());
    }

    #[test]
    fn test_keyword_edit_is_dirty() {
        let files = files(json!([{ "filename": "a.jpg" }]));
        let original = aggregate(&files);
        let current = with_keyword_added(&original, "sea").unwrap();
        let tracker = ChangeTracker::new(&files, &current, &original);
        assert!(tracker.is_field_dirty("Keywords").unwrap());
        assert_eq!(current.keyword_entries(), &[KeywordEntry::common("sea")]);
    }

    #[test]
    fn test_unconsolidated_file_is_saveable_without_edits() {
        let files = files(json!([
            { "filename": "a.jpg", "metadata": { "Title": { "value": "Paris", "isConsolidated": true } } },
            { "filename": "b.jpg", "metadata": { "Title": { "value": "Paris", "isConsolidated": false } } },
        ]));
        let original = aggregate(&files);
        let tracker = ChangeTracker::new(&files, &original, &original);
        assert!(!tracker.has_any_field_dirty());
        assert!(tracker.needs_consolidation());
        assert!(tracker.is_saveable());
    }

    #[test]
    fn test_empty_selection_not_saveable() {
        let empty = AggregatedState::default();
        let tracker = ChangeTracker::new(&[], &empty, &empty);
        assert!(!tracker.is_saveable());
        assert!(!tracker.is_field_dirty("Title").unwrap());
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let empty = AggregatedState::default();
        let tracker = ChangeTracker::new(&[], &empty, &empty);
        assert!(matches!(
            tracker.is_field_dirty("Bogus"),
            Err(MetadataError::UnknownField(_))
        ));
    }
}
