//! Host platform detection and OS command execution.
//!
//! Everything that touches the host goes through the [`PlatformProbe`]
//! trait so component detectors can be exercised against a scripted probe:
//!
//! - [`Platform`]: the operating system family a run targets
//! - [`StructuredCommand`]: a program plus arguments, with placeholder
//!   substitution for install templates
//! - [`SystemProbe`]: the real probe backed by `tokio::process`

mod command;
mod path_finder;
mod probe;

pub use command::StructuredCommand;
pub use probe::{CommandOutput, PlatformProbe, ProbeError, SystemProbe};

pub(crate) use path_finder::find_executable;

use std::fmt;
use std::str::FromStr;
use strum::IntoEnumIterator;
use thiserror::Error;

/// Operating system family.
///
/// `Display` uses the short names the installer has always reported
/// (`win32`, `darwin`, `linux`) so logs and requirement files stay
/// comparable with older runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::EnumIter)]
pub enum Platform {
    /// Microsoft Windows.
    Windows,
    /// Apple macOS.
    Macos,
    /// Any Linux distribution.
    Linux,
}

/// Returned when an OS name is not one of the supported families.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported operating system: {0}")]
pub struct PlatformParseError(pub String);

impl Platform {
    /// The platform this binary was compiled for.
    ///
    /// Targets outside the three supported families fall back to `Linux`,
    /// which only offers the portable components.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Macos
        } else {
            Self::Linux
        }
    }

    /// Parse an OS name.
    ///
    /// Accepts both the Node-style names (`win32`, `darwin`) and the Rust
    /// `std::env::consts::OS` names (`windows`, `macos`).
    ///
    /// # Example
    ///
    /// ```rust
    /// use devsuite_installer::Platform;
    ///
    /// assert_eq!(Platform::from_os_name("win32").unwrap(), Platform::Windows);
    /// assert_eq!(Platform::from_os_name("macos").unwrap(), Platform::Macos);
    /// assert!(Platform::from_os_name("plan9").is_err());
    /// ```
    pub fn from_os_name(name: &str) -> Result<Self, PlatformParseError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "win32" | "windows" => Ok(Self::Windows),
            "darwin" | "macos" => Ok(Self::Macos),
            "linux" => Ok(Self::Linux),
            other => Err(PlatformParseError(other.to_string())),
        }
    }

    /// Short OS name (`win32`, `darwin`, `linux`).
    pub fn os_name(&self) -> &'static str {
        match self {
            Self::Windows => "win32",
            Self::Macos => "darwin",
            Self::Linux => "linux",
        }
    }

    /// CPU architecture of the host (`x86_64`, `aarch64`, ...).
    pub fn arch() -> &'static str {
        std::env::consts::ARCH
    }

    /// Iterator over every supported platform.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.os_name())
    }
}

impl FromStr for Platform {
    type Err = PlatformParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_os_name(s)
    }
}
