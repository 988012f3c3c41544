//! Batch photo metadata editing core.
//!
//! Collapses the EXIF/XMP metadata of many selected images into one editable
//! aggregate, tracks what the user changed, and computes the minimal per-file
//! patches needed to persist those changes.
//!
//! # Overview
//!
//! - [`aggregate`] builds an [`AggregatedState`] where each field is either
//!   unique across the selection or mixed, and keywords are a union tagged
//!   common/partial.
//! - [`edit`] applies user edits without touching the load-time baseline.
//! - [`tracker`] reports dirty fields and pending consolidation repairs.
//! - [`diff`] turns edits and repairs into a [`SavePayload`].
//! - [`session`] drives the whole cycle against a [`MetadataBackend`].
//!
//! # Examples
//!
//! ```
//! # use photo_meta_batch::{aggregate, build_save_payload, ImageFile};
//! # fn example() -> photo_meta_batch::error::Result<()> {
//! let files: Vec<ImageFile> = serde_json::from_str(r#"[
//!     {"filename": "a.jpg", "metadata": {"Title": {"value": "Paris", "isConsolidated": true}}},
//!     {"filename": "b.jpg", "metadata": {"Title": {"value": "Rome", "isConsolidated": true}}}
//! ]"#)?;
//! let original = aggregate(&files);
//! assert!(original.get("Title").unwrap().is_mixed());
//!
//! let current = photo_meta_batch::edit::apply_edit(&original, "Title", "Holiday")?;
//! let payload = build_save_payload(&files, &current, &original);
//! assert_eq!(payload.files_to_update.len(), 2);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod aggregate;
pub mod backend;
pub mod config;
pub mod diff;
pub mod edit;
pub mod error;
pub mod fields;
pub mod notify;
pub mod selection;
pub mod session;
pub mod tracker;
pub mod value;

// Re-export primary types at the crate root for convenience.
pub use crate::aggregate::{
    aggregate, AggregatedField, AggregatedState, FieldData, KeywordEntry, KeywordStatus, Snapshot,
};
pub use crate::backend::{HttpBackend, MetadataBackend};
pub use crate::config::BackendConfig;
pub use crate::diff::{build_save_payload, FileUpdate, KeywordDelta, SavePayload, SaveResponse};
pub use crate::error::MetadataError;
pub use crate::notify::{Notification, Notifier, Severity, TracingNotifier};
pub use crate::selection::Selection;
pub use crate::session::{EditorSession, SaveOutcome, SessionPhase};
pub use crate::tracker::ChangeTracker;
pub use crate::value::{FieldValue, ImageFile};

/// The crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
