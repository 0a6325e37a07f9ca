//! Cached artifact inspection.

use super::checksum::{read_sidecar, sha256_file};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// State of one file in the download cache.
///
/// The actual digest is always recomputed from disk, so a file modified
/// after download is noticed even when its sidecar is intact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Location of the cached file.
    pub path: PathBuf,
    /// Digest the file should have: the pinned checksum, or the sidecar
    /// record when nothing is pinned.
    pub expected: Option<String>,
    /// Digest computed from the file contents.
    pub actual: String,
    /// Last modification time of the file.
    pub downloaded_at: Option<SystemTime>,
}

impl CacheEntry {
    /// Inspect a cached file.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub async fn inspect(path: &Path, pinned: Option<&str>) -> io::Result<Option<Self>> {
        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };

        let expected = match pinned {
            Some(sum) => Some(sum.to_ascii_lowercase()),
            None => read_sidecar(path).await,
        };

        Ok(Some(Self {
            path: path.to_path_buf(),
            expected,
            actual: sha256_file(path).await?,
            downloaded_at: metadata.modified().ok(),
        }))
    }

    /// Whether the file can be used without downloading it again.
    pub fn is_valid(&self) -> bool {
        self.expected.as_deref() == Some(self.actual.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::checksum::write_sidecar;
    use tempfile::TempDir;

    const HELLO_SHA256: &str = "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f";

    #[tokio::test]
    async fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let entry = CacheEntry::inspect(&dir.path().join("none.msi"), Some(HELLO_SHA256))
            .await
            .unwrap();
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn test_directory_is_not_an_entry() {
        let dir = TempDir::new().unwrap();
        let entry = CacheEntry::inspect(dir.path(), None).await.unwrap();
        assert!(entry.is_none());
    }

    #[tokio::test]
    async fn test_pinned_checksum_match() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        tokio::fs::write(&path, b"Hello, World!").await.unwrap();

        let entry = CacheEntry::inspect(&path, Some(&HELLO_SHA256.to_uppercase()))
            .await
            .unwrap()
            .unwrap();
        assert!(entry.is_valid());
        assert!(entry.downloaded_at.is_some());
    }

    #[tokio::test]
    async fn test_corrupted_file_is_invalid_despite_sidecar() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        tokio::fs::write(&path, b"Hello, World!").await.unwrap();
        write_sidecar(&path, HELLO_SHA256).await.unwrap();

        tokio::fs::write(&path, b"Hello, Mallory!").await.unwrap();

        let entry = CacheEntry::inspect(&path, None).await.unwrap().unwrap();
        assert_eq!(entry.expected.as_deref(), Some(HELLO_SHA256));
        assert!(!entry.is_valid());
    }

    #[tokio::test]
    async fn test_unpinned_without_sidecar_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hello.txt");
        tokio::fs::write(&path, b"Hello, World!").await.unwrap();

        let entry = CacheEntry::inspect(&path, None).await.unwrap().unwrap();
        assert_eq!(entry.expected, None);
        assert!(!entry.is_valid());
    }
}
