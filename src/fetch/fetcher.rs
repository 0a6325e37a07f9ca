//! Cached, checksum-verified artifact downloads.

use super::cache::CacheEntry;
use super::checksum::{sidecar_path, write_sidecar};
use super::FetchError;
use crate::descriptor::Artifact;
use crate::options::FetchOptions;
use futures::future::{BoxFuture, FutureExt, Shared};
use futures::StreamExt;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;
use tracing::{debug, info, warn};

type SharedFetch = Shared<BoxFuture<'static, Result<PathBuf, FetchError>>>;

/// Resolves artifacts to local files.
///
/// Lookup order for [`ensure`](Self::ensure):
///
/// 1. the bundle directory, for artifacts shipped with an offline bundle
/// 2. the download cache, re-hashed so corrupted files are caught
/// 3. an HTTP download into the cache
///
/// Concurrent calls for the same component share one download.
#[derive(Clone)]
pub struct ArtifactFetcher {
    client: reqwest::Client,
    options: FetchOptions,
    in_flight: Arc<Mutex<HashMap<String, SharedFetch>>>,
}

impl std::fmt::Debug for ArtifactFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactFetcher")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ArtifactFetcher {
    /// Build a fetcher with its own HTTP client.
    pub fn new(options: FetchOptions) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(options.user_agent.clone())
            .connect_timeout(options.connect_timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            options,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// Fetcher configuration.
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Path the artifact is cached at.
    pub fn cache_path(&self, artifact: &Artifact) -> PathBuf {
        self.options.cache_dir.join(&artifact.file_name)
    }

    /// Make the artifact available locally and return its path.
    pub async fn ensure(&self, artifact: &Artifact) -> Result<PathBuf, FetchError> {
        let fetch = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
            match in_flight.get(&artifact.key) {
                Some(running) => {
                    debug!(key = %artifact.key, "joining in-flight fetch");
                    running.clone()
                }
                None => {
                    let fetch = fetch_artifact(
                        self.client.clone(),
                        self.options.clone(),
                        artifact.clone(),
                    )
                    .boxed()
                    .shared();
                    in_flight.insert(artifact.key.clone(), fetch.clone());
                    fetch
                }
            }
        };

        let mut waiter = InFlightWaiter {
            in_flight: &self.in_flight,
            key: &artifact.key,
            pending: fetch.clone(),
            fetch,
        };
        (&mut waiter.pending).await
    }
}

/// One caller's claim on an in-flight fetch.
///
/// Dropping the last claim, whether the fetch finished or the caller gave
/// up, removes the map entry so a later call starts over.
struct InFlightWaiter<'a> {
    in_flight: &'a Mutex<HashMap<String, SharedFetch>>,
    key: &'a str,
    /// Never polled, kept for identity checks.
    fetch: SharedFetch,
    pending: SharedFetch,
}

impl Drop for InFlightWaiter<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        let Some(running) = in_flight.get(self.key) else {
            return;
        };
        if !running.ptr_eq(&self.fetch) {
            return;
        }
        // the map entry plus our own handles; a completed handle no longer counts
        let ours = 2 + usize::from(self.pending.strong_count().is_some());
        if self.fetch.strong_count().map_or(true, |count| count <= ours) {
            in_flight.remove(self.key);
        }
    }
}

async fn fetch_artifact(
    client: reqwest::Client,
    options: FetchOptions,
    artifact: Artifact,
) -> Result<PathBuf, FetchError> {
    let pinned = artifact.sha256.as_deref();

    if artifact.bundle.is_shipped() {
        if let Some(bundle_dir) = &options.bundle_dir {
            let candidate = bundle_dir.join(&artifact.file_name);
            if let Some(entry) = CacheEntry::inspect(&candidate, pinned)
                .await
                .map_err(|e| FetchError::io(&candidate, e))?
            {
                if entry.is_valid() || entry.expected.is_none() {
                    info!(key = %artifact.key, path = %candidate.display(), "using bundled artifact");
                    return Ok(candidate);
                }
                warn!(
                    key = %artifact.key,
                    path = %candidate.display(),
                    "bundled artifact does not match its checksum, ignoring it"
                );
            }
        }
    }

    let cache_dir = &options.cache_dir;
    tokio::fs::create_dir_all(cache_dir)
        .await
        .map_err(|e| FetchError::io(cache_dir, e))?;

    let target = cache_dir.join(&artifact.file_name);
    match CacheEntry::inspect(&target, pinned)
        .await
        .map_err(|e| FetchError::io(&target, e))?
    {
        Some(entry) if entry.is_valid() => {
            info!(key = %artifact.key, path = %target.display(), "using cached artifact");
            return Ok(target);
        }
        Some(_) => {
            info!(key = %artifact.key, "cached artifact is stale, downloading again");
        }
        None => {}
    }

    let actual = download_with_retry(&client, &options, &artifact, &target).await?;

    if let Some(expected) = pinned {
        if !expected.eq_ignore_ascii_case(&actual) {
            if options.strict_checksum {
                let _ = tokio::fs::remove_file(&target).await;
                let _ = tokio::fs::remove_file(sidecar_path(&target)).await;
                return Err(FetchError::ChecksumMismatch {
                    path: target,
                    expected: expected.to_string(),
                    actual,
                });
            }
            warn!(
                key = %artifact.key,
                expected = %expected,
                actual = %actual,
                "downloaded artifact does not match its pinned checksum"
            );
        }
    }

    write_sidecar(&target, &actual)
        .await
        .map_err(|e| FetchError::io(&sidecar_path(&target), e))?;

    Ok(target)
}

async fn download_with_retry(
    client: &reqwest::Client,
    options: &FetchOptions,
    artifact: &Artifact,
    target: &Path,
) -> Result<String, FetchError> {
    let mut attempt = 0;
    loop {
        match download(client, &artifact.url, target, options.read_timeout).await {
            Ok(digest) => return Ok(digest),
            Err(e) if e.is_retryable() && attempt < options.retries => {
                attempt += 1;
                warn!(key = %artifact.key, attempt, error = %e, "download failed, retrying");
                tokio::time::sleep(options.retry_delay * attempt).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Stream `url` into `<target>.part`, then move it into place.
async fn download(
    client: &reqwest::Client,
    url: &str,
    target: &Path,
    read_timeout: Duration,
) -> Result<String, FetchError> {
    let mut part = target.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    info!(url, "downloading");
    let result = stream_to_file(client, url, &part, read_timeout).await;
    let digest = match result {
        Ok(digest) => digest,
        Err(e) => {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e);
        }
    };

    tokio::fs::rename(&part, target)
        .await
        .map_err(|e| FetchError::io(target, e))?;
    Ok(digest)
}

async fn stream_to_file(
    client: &reqwest::Client,
    url: &str,
    part: &Path,
    read_timeout: Duration,
) -> Result<String, FetchError> {
    let response = timeout(read_timeout, client.get(url).send())
        .await
        .map_err(|_| FetchError::stalled(url, read_timeout))?
        .map_err(|e| FetchError::network(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut file = tokio::fs::File::create(part)
        .await
        .map_err(|e| FetchError::io(part, e))?;
    let mut hasher = Sha256::new();
    let mut stream = response.bytes_stream();

    loop {
        let next = timeout(read_timeout, stream.next())
            .await
            .map_err(|_| FetchError::stalled(url, read_timeout))?;
        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk.map_err(|e| FetchError::network(url, e))?;
        hasher.update(&chunk);
        file.write_all(&chunk).await.map_err(|e| FetchError::io(part, e))?;
    }
    file.flush().await.map_err(|e| FetchError::io(part, e))?;

    Ok(hex::encode(hasher.finalize()))
}
