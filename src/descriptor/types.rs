//! Type definitions for requirement descriptors.
//!
//! A requirements document maps component keys to [`RequirementDescriptor`]
//! records. They are validated into [`ComponentSpec`] values, which resolve
//! the downloadable [`Artifact`] for a given platform.

use super::{parse_version, DescriptorError};
use crate::platform::Platform;
use crate::ComponentKind;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Build-time classification of an artifact.
///
/// Only `yes` and `always` artifacts are shipped inside the offline bundle;
/// the engine looks for those in the bundle directory before downloading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bundle {
    /// Pre-fetched into the offline bundle.
    Yes,
    /// Fetched at install time.
    #[default]
    No,
    /// Shipped with every installer, bundled or not.
    Always,
    /// Build tooling, never installed on the host.
    Tools,
}

impl Bundle {
    /// Whether an installer package may already carry this artifact.
    pub fn is_shipped(&self) -> bool {
        matches!(self, Self::Yes | Self::Always)
    }
}

/// Download location of one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSource {
    /// Download URL.
    pub url: String,
    /// Expected SHA-256 as lowercase hex.
    #[serde(default)]
    pub sha256sum: Option<String>,
    /// Cache file name; derived from the URL when absent.
    #[serde(default)]
    pub file_name: Option<String>,
}

/// One entry of a requirements document.
///
/// ```json
/// "jdk": {
///   "url": "https://example.org/openjdk-1.8.0.131.msi",
///   "sha256sum": "…",
///   "fileName": "jdk.msi",
///   "bundle": "yes",
///   "version": "1.8.0",
///   "platforms": { "linux": { "url": "https://example.org/openjdk.tar.gz" } }
/// }
/// ```
///
/// Unknown fields are ignored so documents shared with the packaging
/// pipeline can be read unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementDescriptor {
    /// Default download URL; absent for detection-only components.
    #[serde(default)]
    pub url: Option<String>,
    /// Expected SHA-256 of the default artifact.
    #[serde(default)]
    pub sha256sum: Option<String>,
    /// Cache file name of the default artifact.
    #[serde(default)]
    pub file_name: Option<String>,
    /// Bundle classification.
    #[serde(default)]
    pub bundle: Bundle,
    /// Recommended version.
    #[serde(default)]
    pub version: Option<String>,
    /// Per-OS artifact overrides keyed by OS name (`win32`, `darwin`, `linux`).
    #[serde(default)]
    pub platforms: BTreeMap<String, ArtifactSource>,
}

/// A resolved, downloadable installer artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Key of the component the artifact belongs to.
    pub key: String,
    /// Download URL.
    pub url: String,
    /// Expected SHA-256 (lowercase hex), if pinned.
    pub sha256: Option<String>,
    /// File name inside the cache and bundle directories.
    pub file_name: String,
    /// Bundle classification.
    pub bundle: Bundle,
}

/// Validated description of one component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSpec {
    kind: ComponentKind,
    descriptor: RequirementDescriptor,
    recommended: Option<Version>,
    overrides: BTreeMap<Platform, ArtifactSource>,
}

impl ComponentSpec {
    /// Validate a descriptor for the given kind.
    pub fn new(kind: ComponentKind, descriptor: RequirementDescriptor) -> Result<Self, DescriptorError> {
        let key = kind.key();

        let recommended = match descriptor.version.as_deref() {
            Some(raw) => Some(parse_version(raw).ok_or_else(|| DescriptorError::InvalidVersion {
                key: key.to_string(),
                version: raw.to_string(),
            })?),
            None => None,
        };

        if let Some(sum) = &descriptor.sha256sum {
            validate_checksum(key, sum)?;
        }
        if let Some(name) = &descriptor.file_name {
            validate_file_name(key, name)?;
        }

        let mut overrides = BTreeMap::new();
        for (os, source) in &descriptor.platforms {
            let platform = Platform::from_os_name(os).map_err(|_| DescriptorError::UnknownPlatform {
                key: key.to_string(),
                platform: os.clone(),
            })?;
            if let Some(sum) = &source.sha256sum {
                validate_checksum(key, sum)?;
            }
            if let Some(name) = &source.file_name {
                validate_file_name(key, name)?;
            }
            overrides.insert(platform, source.clone());
        }

        Ok(Self {
            kind,
            descriptor,
            recommended,
            overrides,
        })
    }

    /// The component kind.
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Unique component key.
    pub fn key(&self) -> &'static str {
        self.kind.key()
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        self.kind.display_name()
    }

    /// Recommended version, when the document pins one.
    pub fn recommended(&self) -> Option<&Version> {
        self.recommended.as_ref()
    }

    /// The raw descriptor.
    pub fn descriptor(&self) -> &RequirementDescriptor {
        &self.descriptor
    }

    /// Bundle classification.
    pub fn bundle(&self) -> Bundle {
        self.descriptor.bundle
    }

    /// Whether the component is offered on the platform.
    pub fn is_applicable(&self, platform: Platform) -> bool {
        self.kind.is_applicable(platform)
    }

    /// Resolve the artifact to download on the platform.
    ///
    /// A platform override wins over the default URL. `None` when neither
    /// exists, which is the case for detection-only components.
    pub fn artifact(&self, platform: Platform) -> Option<Artifact> {
        let (url, sha256, file_name) = match self.overrides.get(&platform) {
            Some(source) => (&source.url, &source.sha256sum, &source.file_name),
            None => (
                self.descriptor.url.as_ref()?,
                &self.descriptor.sha256sum,
                &self.descriptor.file_name,
            ),
        };

        Some(Artifact {
            key: self.key().to_string(),
            url: url.clone(),
            sha256: sha256.as_ref().map(|s| s.trim().to_ascii_lowercase()),
            file_name: file_name
                .clone()
                .unwrap_or_else(|| file_name_from_url(url, self.key())),
            bundle: self.descriptor.bundle,
        })
    }
}

fn validate_checksum(key: &str, sum: &str) -> Result<(), DescriptorError> {
    let sum = sum.trim();
    if sum.len() == 64 && sum.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(DescriptorError::InvalidChecksum {
            key: key.to_string(),
            value: sum.to_string(),
        })
    }
}

/// Artifacts are stored directly inside the cache and bundle directories,
/// so a name must not reach outside them.
fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', ':'])
}

fn validate_file_name(key: &str, name: &str) -> Result<(), DescriptorError> {
    if is_bare_file_name(name) {
        Ok(())
    } else {
        Err(DescriptorError::InvalidFileName {
            key: key.to_string(),
            value: name.to_string(),
        })
    }
}

/// Last path segment of a URL, without query or fragment.
fn file_name_from_url(url: &str, fallback: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit('/').next() {
        Some(name) if is_bare_file_name(name) && path.contains('/') => name.to_string(),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUM: &str = "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f";

    fn descriptor(url: &str) -> RequirementDescriptor {
        RequirementDescriptor {
            url: Some(url.to_string()),
            sha256sum: Some(SUM.to_uppercase()),
            version: Some("1.8.0".to_string()),
            bundle: Bundle::Yes,
            ..Default::default()
        }
    }

    #[test]
    fn test_descriptor_deserializes_document_fields() {
        let json = r#"{
            "url": "https://example.org/cygwin/setup-x86_64.exe",
            "sha256sum": "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f",
            "bundle": "always",
            "fileName": "cygwin.exe",
            "targetFolderName": "cygwin"
        }"#;
        let parsed: RequirementDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.bundle, Bundle::Always);
        assert_eq!(parsed.file_name.as_deref(), Some("cygwin.exe"));
        assert!(parsed.platforms.is_empty());
    }

    #[test]
    fn test_bundle_defaults_to_no() {
        let parsed: RequirementDescriptor = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.bundle, Bundle::No);
        assert!(!parsed.bundle.is_shipped());
        assert!(Bundle::Yes.is_shipped());
        assert!(Bundle::Always.is_shipped());
        assert!(!Bundle::Tools.is_shipped());
    }

    #[test]
    fn test_spec_parses_recommended_version() {
        let spec = ComponentSpec::new(ComponentKind::Jdk, descriptor("https://example.org/jdk.msi")).unwrap();
        assert_eq!(spec.recommended(), Some(&Version::new(1, 8, 0)));
        assert_eq!(spec.key(), "jdk");
    }

    #[test]
    fn test_spec_rejects_bad_version() {
        let mut d = descriptor("https://example.org/jdk.msi");
        d.version = Some("latest".to_string());
        let err = ComponentSpec::new(ComponentKind::Jdk, d).unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidVersion { .. }));
    }

    #[test]
    fn test_spec_rejects_bad_checksum() {
        let mut d = descriptor("https://example.org/jdk.msi");
        d.sha256sum = Some("abc".to_string());
        let err = ComponentSpec::new(ComponentKind::Jdk, d).unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidChecksum { .. }));
    }

    #[test]
    fn test_spec_rejects_unknown_platform_override() {
        let mut d = descriptor("https://example.org/jdk.msi");
        d.platforms.insert(
            "solaris".to_string(),
            ArtifactSource {
                url: "https://example.org/jdk.pkg".to_string(),
                sha256sum: None,
                file_name: None,
            },
        );
        let err = ComponentSpec::new(ComponentKind::Jdk, d).unwrap_err();
        assert!(matches!(err, DescriptorError::UnknownPlatform { .. }));
    }

    #[test]
    fn test_artifact_defaults_and_normalizes_checksum() {
        let spec = ComponentSpec::new(
            ComponentKind::Jdk,
            descriptor("https://example.org/dl/openjdk-1.8.0.msi?mirror=1"),
        )
        .unwrap();
        let artifact = spec.artifact(Platform::Windows).unwrap();
        assert_eq!(artifact.file_name, "openjdk-1.8.0.msi");
        assert_eq!(artifact.sha256.as_deref(), Some(SUM));
        assert_eq!(artifact.bundle, Bundle::Yes);
    }

    #[test]
    fn test_artifact_platform_override() {
        let mut d = descriptor("https://example.org/jdk.msi");
        d.platforms.insert(
            "linux".to_string(),
            ArtifactSource {
                url: "https://example.org/jdk-linux.tar.gz".to_string(),
                sha256sum: None,
                file_name: Some("jdk.tar.gz".to_string()),
            },
        );
        let spec = ComponentSpec::new(ComponentKind::Jdk, d).unwrap();

        let linux = spec.artifact(Platform::Linux).unwrap();
        assert_eq!(linux.url, "https://example.org/jdk-linux.tar.gz");
        assert_eq!(linux.file_name, "jdk.tar.gz");
        assert_eq!(linux.sha256, None);

        let windows = spec.artifact(Platform::Windows).unwrap();
        assert_eq!(windows.file_name, "jdk.msi");
    }

    #[test]
    fn test_detection_only_has_no_artifact() {
        let spec = ComponentSpec::new(ComponentKind::Hyperv, RequirementDescriptor::default()).unwrap();
        assert!(spec.artifact(Platform::Windows).is_none());
    }

    #[test]
    fn test_file_name_from_url_fallback() {
        assert_eq!(file_name_from_url("https://example.org/", "cdk"), "cdk");
        assert_eq!(file_name_from_url("not-a-url", "cdk"), "cdk");
        assert_eq!(file_name_from_url("https://example.org/a/minishift.zip", "cdk"), "minishift.zip");
        assert_eq!(file_name_from_url("https://example.org/a/..", "cdk"), "cdk");
        assert_eq!(file_name_from_url("https://example.org/a\\..\\x.exe", "cdk"), "cdk");
    }

    #[test]
    fn test_spec_rejects_file_name_outside_cache() {
        for name in ["../x", "..", "dir/x.msi", "..\\x.msi", "C:x.msi", ""] {
            let mut d = descriptor("https://example.org/jdk.msi");
            d.file_name = Some(name.to_string());
            let err = ComponentSpec::new(ComponentKind::Jdk, d).unwrap_err();
            assert!(matches!(err, DescriptorError::InvalidFileName { .. }), "{name:?}");
        }

        let mut d = descriptor("https://example.org/jdk.msi");
        d.platforms.insert(
            "linux".to_string(),
            ArtifactSource {
                url: "https://example.org/jdk.tar.gz".to_string(),
                sha256sum: None,
                file_name: Some("../../etc/profile".to_string()),
            },
        );
        let err = ComponentSpec::new(ComponentKind::Jdk, d).unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidFileName { .. }));
    }
}
