//! PATH-based executable lookup with fallback locations.

use super::Platform;
use std::path::PathBuf;

/// Unix fallback directories checked when an executable is not in PATH.
const UNIX_FALLBACK_PATHS: &[&str] = &["/usr/local/bin", "/usr/bin", "/opt/homebrew/bin"];

/// Install locations of the suite's own tools on Windows.
const WINDOWS_FALLBACK_PATHS: &[&str] = &[
    r"C:\Program Files\Oracle\VirtualBox",
    r"C:\cygwin64\bin",
    r"C:\DevelopmentSuite\cdk\bin",
];

/// Find an executable by name.
///
/// The system PATH is searched first through the `which` crate. Freshly
/// installed tools are often not on the PATH of the running process yet,
/// so well-known install directories for the given platform are checked
/// afterwards.
pub(crate) fn find_executable(name: &str, platform: Platform) -> Option<PathBuf> {
    if let Ok(path) = which::which(name) {
        return Some(path);
    }

    let candidates: Vec<PathBuf> = match platform {
        Platform::Windows => WINDOWS_FALLBACK_PATHS
            .iter()
            .map(|dir| PathBuf::from(dir).join(format!("{name}.exe")))
            .collect(),
        Platform::Macos | Platform::Linux => {
            let mut paths: Vec<PathBuf> = UNIX_FALLBACK_PATHS
                .iter()
                .map(|dir| PathBuf::from(dir).join(name))
                .collect();
            if let Some(home) = dirs::home_dir() {
                paths.push(home.join(".local").join("bin").join(name));
                paths.push(home.join("bin").join(name));
            }
            paths
        }
    };

    candidates.into_iter().find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_find_common_executable() {
        let result = find_executable("sh", Platform::current());
        assert!(result.is_some());
        assert!(result.unwrap().exists());
    }

    #[test]
    fn test_find_nonexistent_executable() {
        let result = find_executable("definitely_not_a_real_executable_12345", Platform::current());
        assert!(result.is_none());
    }
}
