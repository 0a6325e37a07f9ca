//! # devsuite-installer
//!
//! Requirement installation engine for the developer platform suite: a
//! hypervisor (Hyper-V or VirtualBox), a JDK, the Cygwin toolchain and the
//! Container Development Kit.
//!
//! The engine detects what is already on the host, decides per component
//! whether to install, upgrade or keep it, fetches verified installer
//! artifacts and runs the platform installers in dependency order.
//!
//! ## Features
//!
//! - [`ComponentKind`] identifying the supported components
//! - [`DescriptorSet`] parsed from a `requirements.json` document
//! - [`RequirementSet`] and [`Component`] holding per-run state and options
//! - [`InstallEngine`] for concurrent detection and sequential installation
//! - [`ArtifactFetcher`] for cached, checksum-verified downloads
//! - [`PlatformProbe`] as the seam to the host OS
//!
//! ## Example
//!
//! ```rust,no_run
//! use devsuite_installer::{
//!     ArtifactFetcher, DescriptorSet, EngineOptions, FetchOptions, InstallEngine, LogReporter,
//!     Platform, RequirementSet, SystemProbe,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let descriptors = DescriptorSet::builtin().unwrap();
//!     let mut set = RequirementSet::for_platform(&descriptors, Platform::current());
//!
//!     let fetcher = ArtifactFetcher::new(FetchOptions::default()).unwrap();
//!     let engine = InstallEngine::new(SystemProbe::new(), fetcher, EngineOptions::default());
//!
//!     engine.detect_all(&mut set, &LogReporter).await;
//!     for component in &set {
//!         println!("{}: {}", component.key(), component.state());
//!     }
//!
//!     let summary = engine.install(&mut set, &LogReporter, &CancellationToken::new()).await;
//!     println!("failed: {:?}", summary.failed);
//! }
//! ```

mod component;
mod component_kind;
mod descriptor;
mod engine;
mod fetch;
mod options;
mod platform;

pub use component::{
    Action, Component, ComponentState, Detection, InstallOption, OptionEntry, OptionSet,
    SelectionError, VersionWarning,
};
pub use component_kind::{ComponentKind, VmDriver};
pub use descriptor::{
    parse_version, Artifact, ArtifactSource, Bundle, ComponentSpec, DescriptorError,
    DescriptorSet, RequirementDescriptor, BUILTIN_REQUIREMENTS,
};
pub use engine::{
    ComponentEvent, InstallEngine, InstallError, InstallSession, InstallSummary, LogReporter,
    Outcome, Reporter, RequirementSet, RequirementSetError,
};
pub use fetch::{
    read_sidecar, sha256_file, sidecar_path, write_sidecar, ArtifactFetcher, CacheEntry,
    FetchError,
};
pub use options::{EngineOptions, FetchOptions};
pub use platform::{
    CommandOutput, Platform, PlatformParseError, PlatformProbe, ProbeError, StructuredCommand,
    SystemProbe,
};
