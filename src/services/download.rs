//! PDF acquisition.
//!
//! Remote PDFs are fetched into a cache directory keyed by document id.
//! A file already at the cache path is reused without touching the
//! network, which is what makes re-runs cheap.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::utils::write_atomic;

/// Errors while fetching a remote PDF.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Unsupported URL: {0}")]
    InvalidUrl(String),

    #[error("{url} exceeds the {limit} byte limit")]
    TooLarge { url: String, limit: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a PDF ended up at its cache path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// The file was already cached.
    Cached,
    /// The file was fetched now.
    Downloaded { bytes: u64 },
}

/// HTTP downloader that counts the fetches it performs.
pub struct Downloader {
    client: Client,
    max_bytes: u64,
    downloads: AtomicUsize,
}

impl Downloader {
    /// Create a downloader with a per-request deadline.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self {
            client,
            max_bytes: u64::MAX,
            downloads: AtomicUsize::new(0),
        })
    }

    /// Refuse bodies larger than `max_bytes`.
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Number of successful network fetches so far.
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::Relaxed)
    }

    /// Make sure `url` is available at `target`, fetching it only when the
    /// file is not there yet.
    pub async fn acquire(&self, url: &Url, target: &Path) -> Result<Acquisition, DownloadError> {
        if tokio::fs::try_exists(target).await? {
            tracing::debug!(path = %target.display(), "Using cached PDF");
            return Ok(Acquisition::Cached);
        }
        let bytes = self.fetch_to(url, target).await?;
        Ok(Acquisition::Downloaded { bytes })
    }

    /// Fetch `url` and write the body to `target` atomically.
    pub async fn fetch_to(&self, url: &Url, target: &Path) -> Result<u64, DownloadError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DownloadError::InvalidUrl(url.to_string()));
        }

        tracing::debug!(url = %url, "Downloading PDF");
        let mut response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(DownloadError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let too_large = || DownloadError::TooLarge {
            url: url.to_string(),
            limit: self.max_bytes,
        };
        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(too_large());
        }
        let mut content = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (content.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(too_large());
            }
            content.extend_from_slice(&chunk);
        }

        let target = target.to_path_buf();
        let size = content.len() as u64;
        tokio::task::spawn_blocking(move || write_atomic(&target, &content))
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))??;

        self.downloads.fetch_add(1, Ordering::Relaxed);
        tracing::info!(url = %url, bytes = size, "Downloaded PDF");
        Ok(size)
    }
}
