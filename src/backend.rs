//! The metadata extraction/write service.
//!
//! [`MetadataBackend`] is the seam the editing session talks through;
//! [`HttpBackend`] is the REST implementation.

use std::future::Future;

use reqwest::{Client, Response};
use serde::Serialize;
use serde_json::Value;

use crate::config::BackendConfig;
use crate::diff::{SavePayload, SaveResponse};
use crate::error::{MetadataError, Result};
use crate::value::ImageFile;

/// Operations the editing core needs from the metadata service.
pub trait MetadataBackend {
    /// Fetch per-file metadata for the given paths.
    fn fetch_metadata(&self, paths: &[String]) -> impl Future<Output = Result<Vec<ImageFile>>> + Send;

    /// Persist a save payload.
    fn save_metadata(&self, payload: &SavePayload) -> impl Future<Output = Result<SaveResponse>> + Send;

    /// Keyword autocomplete.
    fn keyword_suggestions(&self, query: &str) -> impl Future<Output = Result<Vec<String>>> + Send;
}

#[derive(Serialize)]
struct MetadataRequest<'a> {
    files: &'a [String],
}

/// REST client for the metadata service.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}

/// Turn a non-success response into [`MetadataError::Api`].
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(MetadataError::Api {
        status: status.as_u16(),
        detail: error_detail(&body),
    })
}

/// Pull a human-readable message out of an error body.
///
/// Prefers a JSON `detail` or `message` string, then the raw text.
fn error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(Value::String(s)) = obj.get(key) {
                return Some(s.clone());
            }
        }
    }
    Some(body.to_string())
}

impl MetadataBackend for HttpBackend {
    async fn fetch_metadata(&self, paths: &[String]) -> Result<Vec<ImageFile>> {
        let url = self.config.endpoint(&self.config.metadata_path)?;
        tracing::debug!(%url, files = paths.len(), "Fetching metadata");

        let response = self
            .client
            .post(url)
            .json(&MetadataRequest { files: paths })
            .send()
            .await?;
        let body = check_status(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn save_metadata(&self, payload: &SavePayload) -> Result<SaveResponse> {
        let url = self.config.endpoint(&self.config.save_path)?;
        tracing::debug!(%url, files = payload.files_to_update.len(), "Saving metadata");

        let response = self.client.post(url).json(payload).send().await?;
        let body = check_status(response).await?.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(SaveResponse::default());
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn keyword_suggestions(&self, query: &str) -> Result<Vec<String>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let mut url = self.config.endpoint(&self.config.suggestions_path)?;
        url.query_pairs_mut().append_pair("q", query);

        let response = self.client.get(url).send().await?;
        let body = check_status(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
