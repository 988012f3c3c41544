//! The editing session for one selection at a time.
//!
//! ```text
//! Empty --select--> Loading --loaded--> Ready --save--> Saving --ok--> Ready (reloaded)
//!                      |                  ^               |
//!                      +--failed--> Empty +----failed-----+
//! ```
//!
//! Loads and saves are split into `begin_*`/`finish_*` halves around the
//! backend call. Each half-pair carries a ticket; a `finish_*` whose ticket no
//! longer matches the current selection is discarded instead of applied.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::aggregate::{AggregatedState, FieldData, Snapshot};
use crate::backend::MetadataBackend;
use crate::diff::{build_save_payload, SavePayload, SaveResponse};
use crate::edit::{apply_edit, with_keyword_added, with_keyword_removed};
use crate::error::{MetadataError, Result};
use crate::notify::{Notification, Notifier};
use crate::selection::Selection;
use crate::tracker::ChangeTracker;
use crate::value::ImageFile;

/// Where the session is in its load/edit/save cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Nothing selected, or the last load failed.
    Empty,
    /// Metadata fetch in flight.
    Loading,
    /// Aggregate built and editable.
    Ready,
    /// Save request in flight.
    Saving,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Empty => write!(f, "Empty"),
            SessionPhase::Loading => write!(f, "Loading"),
            SessionPhase::Ready => write!(f, "Ready"),
            SessionPhase::Saving => write!(f, "Saving"),
        }
    }
}

/// Identifies the selection a metadata fetch was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    selection_key: String,
    paths: Vec<String>,
}

impl LoadTicket {
    /// Paths to fetch metadata for.
    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

/// A save that has been computed and must be sent to the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSave {
    generation: u64,
    pub payload: SavePayload,
}

/// Result of a save attempt that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The computed diff was empty; no request was sent.
    NothingToSave,
    /// The backend accepted the payload.
    Saved { message: String, files: usize },
}

const NOTHING_TO_SAVE: &str = "No changes to save";

/// Batch metadata editor state for the current selection.
pub struct EditorSession<B, N> {
    backend: B,
    notifier: N,
    phase: SessionPhase,
    generation: u64,
    selection: Selection,
    files: Vec<ImageFile>,
    snapshot: Snapshot,
}

impl<B, N> EditorSession<B, N>
where
    B: MetadataBackend,
    N: Notifier,
{
    pub fn new(backend: B, notifier: N) -> Self {
        Self {
            backend,
            notifier,
            phase: SessionPhase::Empty,
            generation: 0,
            selection: Selection::default(),
            files: Vec::new(),
            snapshot: Snapshot::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Raw records of the loaded selection.
    pub fn files(&self) -> &[ImageFile] {
        &self.files
    }

    /// The aggregate including user edits.
    pub fn current(&self) -> &AggregatedState {
        self.snapshot.current()
    }

    /// The aggregate as loaded.
    pub fn original(&self) -> &AggregatedState {
        self.snapshot.original()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn tracker(&self) -> ChangeTracker<'_> {
        ChangeTracker::new(&self.files, self.snapshot.current(), self.snapshot.original())
    }

    pub fn is_field_dirty(&self, field: &str) -> Result<bool> {
        self.tracker().is_field_dirty(field)
    }

    /// Whether the Save action should be enabled.
    pub fn is_saveable(&self) -> bool {
        self.phase == SessionPhase::Ready && self.tracker().is_saveable()
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Switch to a new selection, discarding the previous aggregate.
    ///
    /// Returns `None` for an empty selection, which needs no fetch.
    pub fn begin_load(&mut self, selection: Selection) -> Option<LoadTicket> {
        self.generation += 1;
        self.files.clear();
        self.snapshot = Snapshot::default();
        self.selection = selection;

        if self.selection.is_empty() {
            self.phase = SessionPhase::Empty;
            return None;
        }

        self.phase = SessionPhase::Loading;
        Some(LoadTicket {
            generation: self.generation,
            selection_key: self.selection.key(),
            paths: self.selection.paths(),
        })
    }

    /// Apply a fetch result, unless it belongs to an older selection.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<ImageFile>>,
    ) -> Result<()> {
        if ticket.generation != self.generation || ticket.selection_key != self.selection.key() {
            tracing::warn!(
                ticket_generation = ticket.generation,
                generation = self.generation,
                "Discarding metadata for a stale selection"
            );
            return Err(MetadataError::StaleSelection);
        }

        match result {
            Ok(files) => {
                self.snapshot = Snapshot::from_files(&files);
                self.files = files;
                self.phase = SessionPhase::Ready;
                tracing::info!(files = self.files.len(), "Selection metadata loaded");
                Ok(())
            }
            Err(e) => {
                self.phase = SessionPhase::Empty;
                tracing::warn!(error = %e, "Failed to load selection metadata");
                self.notifier.notify(Notification::error(format!(
                    "Failed to load metadata: {}",
                    e.user_message()
                )));
                Err(e)
            }
        }
    }

    /// Select files and load their metadata.
    pub async fn select(&mut self, selection: Selection) -> Result<()> {
        let Some(ticket) = self.begin_load(selection) else {
            return Ok(());
        };
        let result = self.backend.fetch_metadata(ticket.paths()).await;
        self.finish_load(ticket, result)
    }

    /// Fetch the current selection again.
    pub async fn reload(&mut self) -> Result<()> {
        let selection = self.selection.clone();
        self.select(selection).await
    }

    // -----------------------------------------------------------------------
    // Editing
    // -----------------------------------------------------------------------

    fn ensure_ready(&self) -> Result<()> {
        match self.phase {
            SessionPhase::Ready => Ok(()),
            phase => Err(MetadataError::NotReady(phase)),
        }
    }

    /// Replace one field's aggregated value.
    pub fn edit(&mut self, field: &str, value: impl Into<FieldData>) -> Result<()> {
        self.ensure_ready()?;
        let next = apply_edit(self.snapshot.current(), field, value)?;
        self.snapshot.replace_current(next);
        Ok(())
    }

    pub fn add_keyword(&mut self, name: &str) -> Result<()> {
        self.ensure_ready()?;
        let next = with_keyword_added(self.snapshot.current(), name)?;
        self.snapshot.replace_current(next);
        Ok(())
    }

    pub fn remove_keyword(&mut self, name: &str) -> Result<()> {
        self.ensure_ready()?;
        let next = with_keyword_removed(self.snapshot.current(), name)?;
        self.snapshot.replace_current(next);
        Ok(())
    }

    /// Keyword autocomplete. Backend failures yield no suggestions.
    pub async fn suggest_keywords(&self, query: &str) -> Vec<String> {
        match self.backend.keyword_suggestions(query).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                tracing::warn!(error = %e, query, "Keyword suggestions unavailable");
                Vec::new()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Saving
    // -----------------------------------------------------------------------

    /// Compute the save payload and enter [`SessionPhase::Saving`].
    ///
    /// Returns `None` after notifying the user when there is nothing to write.
    pub fn begin_save(&mut self) -> Result<Option<PendingSave>> {
        match self.phase {
            SessionPhase::Saving => return Err(MetadataError::SaveInProgress),
            SessionPhase::Ready => {}
            phase => return Err(MetadataError::NotReady(phase)),
        }

        let payload = build_save_payload(
            &self.files,
            self.snapshot.current(),
            self.snapshot.original(),
        );
        if payload.is_empty() {
            self.notifier.notify(Notification::info(NOTHING_TO_SAVE));
            return Ok(None);
        }

        self.phase = SessionPhase::Saving;
        Ok(Some(PendingSave {
            generation: self.generation,
            payload,
        }))
    }

    /// Record the backend's answer to a save.
    ///
    /// On failure the edits stay in place so the user can retry.
    pub fn finish_save(
        &mut self,
        pending: PendingSave,
        result: Result<SaveResponse>,
    ) -> Result<SaveOutcome> {
        let stale = pending.generation != self.generation;
        if !stale {
            self.phase = SessionPhase::Ready;
        }

        match result {
            Ok(response) => {
                let files = pending.payload.files_to_update.len();
                let message = if response.message.trim().is_empty() {
                    format!("Saved metadata for {} file(s)", files)
                } else {
                    response.message
                };
                tracing::info!(files, "Metadata saved");
                self.notifier.notify(Notification::success(message.clone()));
                if stale {
                    return Err(MetadataError::StaleSelection);
                }
                Ok(SaveOutcome::Saved { message, files })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to save metadata");
                self.notifier.notify(Notification::error(format!(
                    "Failed to save metadata: {}",
                    e.user_message()
                )));
                Err(e)
            }
        }
    }

    /// Save pending edits and repairs, then reload the selection.
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        let Some(pending) = self.begin_save()? else {
            return Ok(SaveOutcome::NothingToSave);
        };
        let result = self.backend.save_metadata(&pending.payload).await;
        let outcome = self.finish_save(pending, result)?;

        if let Err(e) = self.reload().await {
            tracing::warn!(error = %e, "Reload after save failed");
        }
        Ok(outcome)
    }
}
