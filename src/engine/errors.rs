//! Error types for installation operations.
//!
//! Every variant carries an actionable fix suggestion so a CLI or UI can
//! tell the user what to do next, not only what went wrong.

use crate::fetch::FetchError;
use crate::platform::{Platform, ProbeError};
use crate::ComponentKind;
use std::io::ErrorKind;
use std::time::Duration;
use thiserror::Error;

/// Errors that fail a single component during an install session.
///
/// # Example
///
/// ```rust
/// use devsuite_installer::InstallError;
///
/// fn handle_error(error: InstallError) {
///     eprintln!("Installation failed: {}", error);
///     eprintln!("To fix: {}", error.fix_suggestion());
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum InstallError {
    /// The installer exited unsuccessfully or could not be started.
    #[error("{key} installer failed with exit code {exit_code:?}")]
    InstallCommandFailed {
        /// Component key.
        key: String,
        /// Exit code, `None` when the process never ran or was signalled.
        exit_code: Option<i32>,
        /// Standard error from the installer, if any.
        stderr: Option<String>,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The artifact could not be downloaded.
    #[error("Network error: {message}")]
    Network {
        /// Description of the network error.
        message: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The downloaded artifact does not match its pinned checksum.
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Pinned SHA-256.
        expected: String,
        /// SHA-256 of the downloaded bytes.
        actual: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The installer did not finish in time and was killed.
    #[error("Installation timed out after {duration:?}")]
    Timeout {
        /// How long the installer was allowed to run.
        duration: Duration,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The OS refused to run the installer or write its files.
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Description of what was denied.
        message: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The component cannot be installed on this platform.
    #[error("{} cannot be installed on {platform}", kind.display_name())]
    UnsupportedPlatform {
        /// The component.
        kind: ComponentKind,
        /// Platform of the run.
        platform: Platform,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// A component this one depends on failed earlier in the session.
    #[error("{key} was not installed because {prerequisite} failed")]
    PrerequisiteFailed {
        /// Component key.
        key: String,
        /// Key of the failed prerequisite.
        prerequisite: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The installer succeeded but detection still finds nothing.
    #[error("Verification failed: {} not detected after installation", kind.display_name())]
    VerificationFailed {
        /// The component.
        kind: ComponentKind,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// The session was cancelled while this component was running.
    #[error("Installation of {key} was cancelled")]
    Cancelled {
        /// Component key.
        key: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },

    /// A local file operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the failure.
        message: String,
        /// Actionable suggestion for resolving the issue.
        fix: String,
    },
}

impl InstallError {
    /// Get an actionable suggestion for fixing this error.
    ///
    /// # Example
    ///
    /// ```rust
    /// use devsuite_installer::InstallError;
    /// use std::time::Duration;
    ///
    /// let error = InstallError::Timeout {
    ///     duration: Duration::from_secs(300),
    ///     fix: "Try again with a longer timeout".to_string(),
    /// };
    /// assert!(error.fix_suggestion().contains("timeout"));
    /// ```
    pub fn fix_suggestion(&self) -> &str {
        match self {
            Self::InstallCommandFailed { fix, .. } => fix,
            Self::Network { fix, .. } => fix,
            Self::ChecksumMismatch { fix, .. } => fix,
            Self::Timeout { fix, .. } => fix,
            Self::PermissionDenied { fix, .. } => fix,
            Self::UnsupportedPlatform { fix, .. } => fix,
            Self::PrerequisiteFailed { fix, .. } => fix,
            Self::VerificationFailed { fix, .. } => fix,
            Self::Cancelled { fix, .. } => fix,
            Self::Io { fix, .. } => fix,
        }
    }

    pub(crate) fn cancelled(key: &str) -> Self {
        Self::Cancelled {
            key: key.to_string(),
            fix: "Run the installer again; completed components are detected and kept".to_string(),
        }
    }

    pub(crate) fn from_probe(key: &str, error: ProbeError) -> Self {
        match error {
            ProbeError::Spawn {
                kind: ErrorKind::PermissionDenied,
                message,
                ..
            } => Self::PermissionDenied {
                message,
                fix: "Run the installer from an account with administrator rights".to_string(),
            },
            ProbeError::Spawn { message, .. } => Self::InstallCommandFailed {
                key: key.to_string(),
                exit_code: None,
                stderr: Some(message),
                fix: "Check that the downloaded installer is complete and runnable".to_string(),
            },
            ProbeError::Timeout { duration, .. } => Self::Timeout {
                duration,
                fix: format!(
                    "The installer ran longer than {:?}; raise the install timeout or run it manually",
                    duration
                ),
            },
            ProbeError::NonZeroExit { output, .. } => {
                let stderr = output.stderr.trim();
                Self::InstallCommandFailed {
                    key: key.to_string(),
                    exit_code: output.exit_code,
                    stderr: (!stderr.is_empty()).then(|| stderr.to_string()),
                    fix: "See the installer output above; a reboot or a previous partial install is a common cause"
                        .to_string(),
                }
            }
        }
    }
}

impl From<FetchError> for InstallError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::ChecksumMismatch { expected, actual, .. } => Self::ChecksumMismatch {
                expected,
                actual,
                fix: "The download is corrupt or the requirements file is outdated; retry, or update the pinned checksum"
                    .to_string(),
            },
            FetchError::Io { .. } => Self::Io {
                message: error.to_string(),
                fix: "Check free space and permissions of the cache directory (--cache-dir)".to_string(),
            },
            FetchError::Network { .. } | FetchError::HttpStatus { .. } | FetchError::Client(_) => Self::Network {
                message: error.to_string(),
                fix: "Check your internet connection, or point --bundle-dir at an offline bundle".to_string(),
            },
        }
    }
}
