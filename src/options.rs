//! Engine and fetcher configuration.
//!
//! [`EngineOptions`] controls detection and installer execution,
//! [`FetchOptions`] controls where artifacts are cached and how downloads
//! are retried and verified. Both have sensible defaults and are meant to
//! be built with struct-update syntax.

use crate::component_kind::VmDriver;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for detection and installation.
///
/// # Default Behavior
///
/// Detection commands get 5 seconds each. Installers get 30 minutes, which
/// covers the slowest MSI packages on spinning disks. Installations are
/// verified by re-running detection afterwards.
///
/// # Example
///
/// ```rust
/// use devsuite_installer::EngineOptions;
/// use std::time::Duration;
///
/// let opts = EngineOptions {
///     detect_timeout: Duration::from_secs(10),
///     verify_after_install: false,
///     ..Default::default()
/// };
/// assert_eq!(opts.install_timeout, Duration::from_secs(30 * 60));
/// ```
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Limit for each detection command.
    ///
    /// Default: 5 seconds
    pub detect_timeout: Duration,

    /// Limit for each installer and post-install command.
    ///
    /// Default: 30 minutes
    pub install_timeout: Duration,

    /// Root directory components are installed under, substituted for
    /// `{target}` in install templates.
    ///
    /// Default: `<local data dir>/DevelopmentSuite`
    pub target_dir: PathBuf,

    /// Re-run detection after an installer succeeds and fail the component
    /// when it is still not found.
    ///
    /// Default: `true`
    pub verify_after_install: bool,

    /// Hypervisor handed to the CDK setup. `None` picks Hyper-V on Windows
    /// hosts where it is enabled and the platform's default otherwise.
    ///
    /// Default: `None`
    pub vm_driver: Option<VmDriver>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            detect_timeout: Duration::from_secs(5),
            install_timeout: Duration::from_secs(30 * 60),
            target_dir: dirs::data_local_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("DevelopmentSuite"),
            verify_after_install: true,
            vm_driver: None,
        }
    }
}

/// Configuration for the artifact fetcher.
///
/// # Checksum policy
///
/// By default a downloaded artifact whose SHA-256 differs from the pinned
/// value is logged as a warning and still used. Set `strict_checksum` to
/// reject it instead; the file is then deleted and the component fails.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Directory downloads are cached in.
    ///
    /// Default: `<cache dir>/devsuite/downloads`
    pub cache_dir: PathBuf,

    /// Directory holding artifacts shipped with an offline bundle.
    ///
    /// Default: `None`
    pub bundle_dir: Option<PathBuf>,

    /// Extra attempts after a network failure or server error.
    ///
    /// Default: 2
    pub retries: u32,

    /// Base delay between attempts; attempt `n` waits `n * retry_delay`.
    ///
    /// Default: 1 second
    pub retry_delay: Duration,

    /// Treat a checksum mismatch as a failure.
    ///
    /// Default: `false`
    pub strict_checksum: bool,

    /// Limit for establishing a connection.
    ///
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Longest wait for the response headers or the next body chunk. A
    /// stalled transfer fails as a network error and is retried.
    ///
    /// Default: 60 seconds
    pub read_timeout: Duration,

    /// User-Agent header sent with downloads.
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("devsuite")
                .join("downloads"),
            bundle_dir: None,
            retries: 2,
            retry_delay: Duration::from_secs(1),
            strict_checksum: false,
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            user_agent: format!("devsuite-installer/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_defaults() {
        let opts = EngineOptions::default();
        assert_eq!(opts.detect_timeout, Duration::from_secs(5));
        assert_eq!(opts.install_timeout, Duration::from_secs(1800));
        assert!(opts.verify_after_install);
        assert_eq!(opts.vm_driver, None);
        assert!(opts.target_dir.ends_with("DevelopmentSuite"));
    }

    #[test]
    fn test_fetch_defaults() {
        let opts = FetchOptions::default();
        assert_eq!(opts.retries, 2);
        assert_eq!(opts.read_timeout, Duration::from_secs(60));
        assert!(!opts.strict_checksum);
        assert!(opts.bundle_dir.is_none());
        assert!(opts.cache_dir.ends_with("downloads"));
        assert!(opts.user_agent.starts_with("devsuite-installer/"));
    }

    #[test]
    fn test_struct_update() {
        let opts = FetchOptions {
            strict_checksum: true,
            retries: 0,
            ..Default::default()
        };
        assert!(opts.strict_checksum);
        assert_eq!(opts.retries, 0);
        assert_eq!(opts.retry_delay, Duration::from_secs(1));
    }
}
