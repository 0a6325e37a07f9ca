//! SHA-256 helpers and the `.sha256` sidecar format.
//!
//! A sidecar sits next to a cached artifact and holds one line in the
//! `sha256sum` binary-mode format: `<hex-digest> *<basename>`.

use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

const CHECKSUM_CHUNK_SIZE: usize = 8192;

/// Hash a file in fixed-size chunks.
pub async fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHECKSUM_CHUNK_SIZE];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Path of the sidecar for an artifact (`<file>.sha256`).
pub fn sidecar_path(artifact: &Path) -> PathBuf {
    let mut name = artifact.as_os_str().to_owned();
    name.push(".sha256");
    PathBuf::from(name)
}

/// Render a sidecar line.
pub fn format_sidecar(digest: &str, artifact: &Path) -> String {
    let base = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{digest} *{base}")
}

/// Extract the digest from sidecar text.
///
/// Returns `None` unless the first token is 64 hex digits.
pub fn parse_sidecar(text: &str) -> Option<String> {
    let digest = text.split_whitespace().next()?;
    if digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(digest.to_ascii_lowercase())
    } else {
        None
    }
}

/// Write the sidecar for an artifact.
pub async fn write_sidecar(artifact: &Path, digest: &str) -> io::Result<()> {
    tokio::fs::write(sidecar_path(artifact), format_sidecar(digest, artifact)).await
}

/// Read the digest recorded in an artifact's sidecar, if any.
pub async fn read_sidecar(artifact: &Path) -> Option<String> {
    let text = tokio::fs::read_to_string(sidecar_path(artifact)).await.ok()?;
    parse_sidecar(&text)
}
