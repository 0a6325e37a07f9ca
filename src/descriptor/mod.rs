//! Static descriptions of the installable requirements.
//!
//! A [`DescriptorSet`] is read once at startup from a requirements document
//! (JSON mapping component key to download metadata) and never changes
//! afterwards. The per-platform commands each component runs live in the
//! `catalog` submodule and are reached through [`ComponentKind`].
//!
//! # Example
//!
//! ```rust
//! use devsuite_installer::{ComponentKind, DescriptorSet, Platform};
//!
//! let set = DescriptorSet::from_json(r#"{
//!     "jdk": { "url": "https://example.org/jdk.msi", "version": "1.8.0", "bundle": "yes" }
//! }"#).unwrap();
//!
//! let jdk = set.describe(ComponentKind::Jdk).unwrap();
//! assert_eq!(jdk.artifact(Platform::Windows).unwrap().file_name, "jdk.msi");
//! assert!(set.describe(ComponentKind::Cdk).is_err());
//! ```

pub(crate) mod catalog;
mod types;
mod version;

pub use types::{Artifact, ArtifactSource, Bundle, ComponentSpec, RequirementDescriptor};
pub use version::parse_version;

use crate::ComponentKind;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Requirements document compiled into the binary.
pub const BUILTIN_REQUIREMENTS: &str = include_str!("../../requirements.json");

/// Errors raised while loading or querying descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DescriptorError {
    /// No descriptor exists for the requested component.
    #[error("no descriptor for component '{0}'")]
    NotFound(String),

    /// The document names a component the installer does not know.
    #[error("unknown component '{0}' in requirements")]
    UnknownComponent(String),

    /// The document is not valid JSON of the expected shape.
    #[error("invalid requirements document: {0}")]
    Parse(String),

    /// The recommended version is not a `major.minor.patch` string.
    #[error("invalid version '{version}' for {key}")]
    InvalidVersion {
        /// Component key.
        key: String,
        /// Offending value.
        version: String,
    },

    /// A checksum is not 64 hex digits.
    #[error("invalid sha256sum for {key}: '{value}'")]
    InvalidChecksum {
        /// Component key.
        key: String,
        /// Offending value.
        value: String,
    },

    /// A `fileName` is not a bare file name.
    #[error("invalid fileName for {key}: '{value}'")]
    InvalidFileName {
        /// Component key.
        key: String,
        /// Offending value.
        value: String,
    },

    /// A platform override uses an unknown OS name.
    #[error("unknown platform '{platform}' for {key}")]
    UnknownPlatform {
        /// Component key.
        key: String,
        /// Offending OS name.
        platform: String,
    },

    /// The document could not be read.
    #[error("failed to read {}: {message}", path.display())]
    Io {
        /// Path of the document.
        path: PathBuf,
        /// OS error message.
        message: String,
    },
}

/// Immutable registry of component descriptions.
#[derive(Debug, Clone, Default)]
pub struct DescriptorSet {
    specs: BTreeMap<ComponentKind, ComponentSpec>,
}

impl DescriptorSet {
    /// The requirements shipped with this build.
    pub fn builtin() -> Result<Self, DescriptorError> {
        Self::from_json(BUILTIN_REQUIREMENTS)
    }

    /// Parse a requirements document.
    pub fn from_json(json: &str) -> Result<Self, DescriptorError> {
        let raw: BTreeMap<String, RequirementDescriptor> =
            serde_json::from_str(json).map_err(|e| DescriptorError::Parse(e.to_string()))?;

        let mut specs = BTreeMap::new();
        for (key, descriptor) in raw {
            let kind = ComponentKind::from_key(&key)
                .ok_or_else(|| DescriptorError::UnknownComponent(key.clone()))?;
            specs.insert(kind, ComponentSpec::new(kind, descriptor)?);
        }

        Ok(Self { specs })
    }

    /// Read and parse a requirements document from disk.
    pub fn from_path(path: &Path) -> Result<Self, DescriptorError> {
        let json = std::fs::read_to_string(path).map_err(|e| DescriptorError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    /// Look up the description of a component.
    pub fn describe(&self, kind: ComponentKind) -> Result<&ComponentSpec, DescriptorError> {
        self.specs
            .get(&kind)
            .ok_or_else(|| DescriptorError::NotFound(kind.key().to_string()))
    }

    /// Look up a component by key.
    pub fn describe_key(&self, key: &str) -> Result<&ComponentSpec, DescriptorError> {
        let kind =
            ComponentKind::from_key(key).ok_or_else(|| DescriptorError::NotFound(key.to_string()))?;
        self.describe(kind)
    }

    /// All described components, in install order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentSpec> {
        self.specs.values()
    }

    /// Number of described components.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether no component is described.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
