//! Translation job submission over HTTP.
//!
//! Uploads an EPUB plus its quote parameters to the translation server
//! as a multipart form. The server responds with the translated archive
//! bytes on success, or an error body otherwise. The actual translation
//! happens entirely server-side.

use crate::error::SubmissionError;
use crate::pricing::{SpeedMode, TranslationMode};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::time::Duration;

/// Parameters accompanying an uploaded book.
///
/// `word_count` must be the exact count produced by analysis; the server
/// bills by the same unit the quote was computed from.
#[derive(Debug, Clone, Copy)]
pub struct SubmissionRequest {
    pub speed: SpeedMode,
    pub mode: TranslationMode,
    pub word_count: u64,
}

/// Client for the remote translation service.
///
/// Stateless apart from the connection pool; construct one and share it.
#[derive(Debug, Clone)]
pub struct SubmissionClient {
    client: Client,
    base_url: String,
}

impl SubmissionClient {
    /// Creates a client for the given server base URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SubmissionError> {
        if base_url.is_empty() {
            return Err(SubmissionError::InvalidUrl("empty base URL".into()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Submits a book for translation and returns the translated archive bytes.
    ///
    /// Sends `file`, `translation_speed`, `translation_mode`, and
    /// `word_count` form fields. A non-200 response surfaces the server's
    /// error body.
    pub async fn submit(
        &self,
        epub_path: &Path,
        request: SubmissionRequest,
    ) -> Result<Vec<u8>, SubmissionError> {
        let file_name = epub_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "book.epub".to_string());

        let file_bytes = tokio::fs::read(epub_path).await?;

        let file_part = Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str("application/epub+zip")?;

        let form = Form::new()
            .part("file", file_part)
            .text("translation_speed", request.speed.as_str())
            .text("translation_mode", request.mode.as_str())
            .text("word_count", request.word_count.to_string());

        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let response = check_response(response).await?;
        let bytes = response.bytes().await?;

        Ok(bytes.to_vec())
    }

    /// Probes the server's `/health` endpoint.
    pub async fn health_check(&self) -> Result<bool, SubmissionError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}

/// Checks an HTTP response, turning non-200s into a detailed error
/// carrying the server's error body.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, SubmissionError> {
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(SubmissionError::ServerError(format!(
            "HTTP {}: {}",
            status, text
        )));
    }
    Ok(response)
}
