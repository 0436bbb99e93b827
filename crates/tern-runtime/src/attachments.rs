// SPDX-FileCopyrightText: 2026 Tern Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Downloading image attachments to local disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tern_config::model::AttachmentConfig;
use tern_core::TernError;
use tracing::debug;

/// Something that can save a remote attachment.
#[async_trait]
pub trait AttachmentFetcher: Send + Sync {
    /// Fetch `url` and store it under `file_name` (or a generated name).
    async fn fetch(&self, url: &str, file_name: Option<&str>) -> Result<PathBuf, TernError>;
}

/// Fetches over HTTP into a directory.
pub struct HttpAttachmentFetcher {
    client: reqwest::Client,
    dir: PathBuf,
}

impl HttpAttachmentFetcher {
    pub fn new(dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, TernError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TernError::Internal(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            dir: dir.into(),
        })
    }

    pub fn from_config(config: &AttachmentConfig) -> Result<Self, TernError> {
        Self::new(&config.dir, Duration::from_secs(config.timeout_secs))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Reduce a gateway-supplied name to one safe path component.
fn sanitize(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(base.to_string())
}

#[async_trait]
impl AttachmentFetcher for HttpAttachmentFetcher {
    async fn fetch(&self, url: &str, file_name: Option<&str>) -> Result<PathBuf, TernError> {
        let name = file_name
            .and_then(sanitize)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let path = self.dir.join(name);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TernError::Internal(format!("download of {url} failed: {e}")))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TernError::Internal(format!("download of {url} failed: {e}")))?;

        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            TernError::Internal(format!("cannot create {}: {e}", self.dir.display()))
        })?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| TernError::Internal(format!("cannot write {}: {e}", path.display())))?;

        debug!(url, path = %path.display(), bytes = bytes.len(), "attachment saved");
        Ok(path)
    }
}
