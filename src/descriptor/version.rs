//! Version extraction from raw detection output.

use regex::Regex;
use semver::Version;
use std::sync::OnceLock;

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+)\.(\d+)\.(\d+)").expect("version pattern is valid"))
}

/// Extract the first `major.minor.patch` triple from command output.
///
/// Only the numeric triple is kept. Whatever follows it (`_131` in a Java
/// version, `-1` in a Cygwin package release, `r115126` in a VirtualBox
/// build, `-beta` pre-release tags) is dropped, so `1.0.0-beta` compares
/// equal to `1.0.0`. Two-component versions and text without digits yield
/// `None`.
///
/// - `openjdk version "1.8.0_131"` -> 1.8.0
/// - `5.1.22r115126` -> 5.1.22
/// - `cygwin 2.8.0-1 OK` -> 2.8.0
pub fn parse_version(output: &str) -> Option<Version> {
    let caps = version_pattern().captures(output)?;
    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u64>().ok());
    Some(Version::new(part(1)?, part(2)?, part(3)?))
}
