//! The set of images chosen for batch editing.
//!
//! Filenames are filtered to images by extension (via `mime_guess`, plus the
//! camera RAW formats it does not classify as images). Each selection has a
//! stable key used to tell late responses for an older selection apart.

use std::path::Path;

use sha2::{Digest, Sha256};

/// Camera RAW extensions accepted even when `mime_guess` does not map them
/// to an `image/*` type.
const RAW_EXTENSIONS: &[&str] = &[
    "arw", "cr2", "cr3", "dng", "nef", "nrw", "orf", "raf", "rw2", "pef", "srw",
];

/// Whether a filename looks like an image we can edit metadata for.
pub fn is_image_filename(filename: &str) -> bool {
    let Some(ext) = Path::new(filename).extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();
    if RAW_EXTENSIONS.contains(&ext.as_str()) {
        return true;
    }
    mime_guess::from_ext(&ext)
        .first()
        .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE)
}

/// A folder plus the image filenames selected in it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    folder: String,
    filenames: Vec<String>,
}

impl Selection {
    /// Build a selection, dropping non-image and duplicate filenames while
    /// keeping first-seen order.
    pub fn new<I, S>(folder: impl Into<String>, filenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut kept: Vec<String> = Vec::new();
        for name in filenames {
            let name = name.into();
            if !is_image_filename(&name) {
                tracing::debug!(filename = %name, "Skipping non-image file in selection");
                continue;
            }
            if !kept.contains(&name) {
                kept.push(name);
            }
        }
        Self {
            folder: folder.into(),
            filenames: kept,
        }
    }

    pub fn folder(&self) -> &str {
        &self.folder
    }

    pub fn filenames(&self) -> &[String] {
        &self.filenames
    }

    pub fn is_empty(&self) -> bool {
        self.filenames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filenames.len()
    }

    /// Full paths to request metadata for.
    pub fn paths(&self) -> Vec<String> {
        self.filenames
            .iter()
            .map(|name| {
                if self.folder.is_empty() {
                    name.clone()
                } else {
                    Path::new(&self.folder)
                        .join(name)
                        .to_string_lossy()
                        .to_string()
                }
            })
            .collect()
    }

    /// SHA-256 hex digest of the sorted path list. Independent of selection
    /// order.
    pub fn key(&self) -> String {
        let mut paths = self.paths();
        paths.sort();
        let mut hasher = Sha256::new();
        for path in &paths {
            hasher.update(path.as_bytes());
            hasher.update([0u8]);
        }
        hex::encode(hasher.finalize())
    }
}
