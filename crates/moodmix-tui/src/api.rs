//! Curator backend client.
//!
//! One `POST /generate-playlist` per generation cycle, plus `GET /health` for
//! the status-bar badge and plain GETs for downloads.  Every failure is an
//! `ApiError`; the generation layer decides what the user sees.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{debug, info, warn};

use moodmix_proto::config::ApiConfig;
use moodmix_proto::mood::Mood;
use moodmix_proto::playlist::resolve_url;
use moodmix_proto::upstream::{HealthStatus, SchemaError, UpstreamResponse, ValidatedResponse};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(StatusCode),

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("schema violation: {0}")]
    Schema(#[from] SchemaError),
}

impl ApiError {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Status(_) => "status",
            Self::Decode(_) => "decode",
            Self::Schema(SchemaError::Rejected) => "rejected",
            Self::Schema(_) => "schema",
        }
    }

    /// Connection failures, timeouts and 5xx are worth another attempt;
    /// anything the server said deliberately is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(status) => status.is_server_error(),
            Self::Decode(_) | Self::Schema(_) => false,
        }
    }
}

/// An image ready to be sent, plus the optional remix hint.
#[derive(Debug, Clone)]
pub struct Upload {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    pub mood_hint: Option<Mood>,
}

impl Upload {
    pub async fn from_path(path: &Path) -> anyhow::Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();
        Ok(Self {
            path: path.to_path_buf(),
            mime: guess_image_mime(path),
            file_name,
            bytes,
            mood_hint: None,
        })
    }

    pub fn with_mood_hint(mut self, hint: Mood) -> Self {
        self.mood_hint = Some(hint);
        self
    }

    /// Handle used for the `original` image entry.
    pub fn original_handle(&self) -> String {
        self.path.display().to_string()
    }
}

pub fn guess_image_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        _ => "application/octet-stream",
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_backoff: Duration,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff(),
        })
    }

    fn url(&self, path: &str) -> String {
        resolve_url(&self.base_url, path)
    }

    /// Upload the image once and validate the answer.
    pub async fn generate(&self, upload: &Upload) -> Result<ValidatedResponse, ApiError> {
        let part = Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(upload.mime)?;
        let mut form = Form::new().part("file", part);
        if let Some(hint) = &upload.mood_hint {
            form = form.text("mood_hint", serde_json::to_string(hint)?);
        }

        let url = self.url("/generate-playlist");
        info!(
            "api: POST {} ({} bytes, hint={})",
            url,
            upload.bytes.len(),
            upload.mood_hint.is_some()
        );
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let body = response.bytes().await?;
        debug!("api: generate-playlist returned {} bytes", body.len());
        let parsed = UpstreamResponse::parse(&body)?;
        Ok(parsed.validate()?)
    }

    /// `generate` with up to `max_retries` extra attempts and linear backoff.
    pub async fn generate_with_retry(&self, upload: &Upload) -> Result<ValidatedResponse, ApiError> {
        let mut attempt = 0u32;
        loop {
            match self.generate(upload).await {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_backoff * attempt;
                    warn!(
                        "api: attempt {} failed ({}), retrying in {:?}",
                        attempt, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let response = self.client.get(self.url("/health")).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// GET an absolute URL; returns the body and its content type.
    pub async fn fetch_bytes(&self, url: &str) -> Result<(Vec<u8>, Option<String>), ApiError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = response.bytes().await?;
        Ok((bytes.to_vec(), content_type))
    }
}
