//! Error types for the photo-meta-batch library.

use thiserror::Error;

use crate::session::SessionPhase;

/// Errors that can occur while loading, editing, or saving batch metadata.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// A transport error occurred while talking to the metadata backend.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Api {
        status: u16,
        /// Message extracted from the response body, if any.
        detail: Option<String>,
    },

    /// A response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configured backend URL is invalid.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The field name is not part of the tracked field table.
    #[error("Unknown metadata field: {0}")]
    UnknownField(String),

    /// A value of the wrong shape was supplied for a field.
    #[error("Field {field} expects a {expected} value")]
    FieldKindMismatch {
        field: String,
        expected: &'static str,
    },

    /// A save was requested while another save is still in flight.
    #[error("A save is already in progress")]
    SaveInProgress,

    /// The session is not in a phase that allows the operation.
    #[error("Session is not ready (currently {0})")]
    NotReady(SessionPhase),

    /// A response arrived for a selection that is no longer current.
    #[error("Response belongs to a stale selection and was discarded")]
    StaleSelection,
}

impl MetadataError {
    /// Returns the message suitable for showing to the user.
    ///
    /// Backend rejections prefer the backend-provided detail.
    pub fn user_message(&self) -> String {
        match self {
            MetadataError::Api {
                detail: Some(detail),
                ..
            } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// Convenience type alias for Results using MetadataError.
pub type Result<T> = std::result::Result<T, MetadataError>;
