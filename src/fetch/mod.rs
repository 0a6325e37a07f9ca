//! Artifact download, cache and checksum verification.

mod cache;
mod checksum;
mod fetcher;

pub use cache::CacheEntry;
pub use checksum::{read_sidecar, sha256_file, sidecar_path, write_sidecar};
pub use fetcher::ArtifactFetcher;

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while making an artifact available.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("network error fetching {url}: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Underlying error text.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// Status code.
        status: u16,
    },

    /// A cache or bundle file could not be read or written.
    #[error("I/O error on {}: {message}", path.display())]
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },

    /// The downloaded file does not have the pinned SHA-256.
    #[error("checksum mismatch for {}: expected {expected}, got {actual}", path.display())]
    ChecksumMismatch {
        /// Downloaded file (already removed).
        path: PathBuf,
        /// Pinned digest.
        expected: String,
        /// Digest of the downloaded bytes.
        actual: String,
    },

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    pub(crate) fn io(path: &Path, error: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            message: error.to_string(),
        }
    }

    pub(crate) fn network(url: &str, error: reqwest::Error) -> Self {
        Self::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }

    pub(crate) fn stalled(url: &str, limit: Duration) -> Self {
        Self::Network {
            url: url.to_string(),
            message: format!("no data received for {limit:?}"),
        }
    }

    /// Whether another attempt may succeed: connection failures, server
    /// errors and rate limiting.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
