//! The installation engine.
//!
//! [`InstallEngine`] drives every component of a [`RequirementSet`] through
//! detection, the option decision, artifact fetching and the platform
//! installer:
//!
//! - detection runs concurrently for all components
//! - installation runs strictly in set order, one component at a time
//! - a failed component never aborts the session
//! - a [`CancellationToken`](tokio_util::sync::CancellationToken) stops the
//!   running installer and skips the rest

mod detect;
mod errors;
mod executor;
mod progress;
mod requirements;
mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::InstallError;
pub use progress::{ComponentEvent, LogReporter, Reporter};
pub use requirements::{RequirementSet, RequirementSetError};
pub use session::{InstallSession, InstallSummary, Outcome};

use crate::fetch::ArtifactFetcher;
use crate::options::EngineOptions;
use crate::platform::{Platform, PlatformProbe};

/// Detects and installs components through a [`PlatformProbe`].
///
/// # Example
///
/// ```rust,no_run
/// use devsuite_installer::{
///     ArtifactFetcher, DescriptorSet, EngineOptions, FetchOptions, InstallEngine, LogReporter,
///     Platform, RequirementSet, SystemProbe,
/// };
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() {
///     let descriptors = DescriptorSet::builtin().unwrap();
///     let mut set = RequirementSet::for_platform(&descriptors, Platform::current());
///
///     let fetcher = ArtifactFetcher::new(FetchOptions::default()).unwrap();
///     let engine = InstallEngine::new(SystemProbe::new(), fetcher, EngineOptions::default());
///
///     engine.detect_all(&mut set, &LogReporter).await;
///     let summary = engine.install(&mut set, &LogReporter, &CancellationToken::new()).await;
///     std::process::exit(summary.exit_code());
/// }
/// ```
#[derive(Debug)]
pub struct InstallEngine<P> {
    probe: P,
    fetcher: ArtifactFetcher,
    options: EngineOptions,
}

impl<P: PlatformProbe> InstallEngine<P> {
    /// Create an engine.
    pub fn new(probe: P, fetcher: ArtifactFetcher, options: EngineOptions) -> Self {
        Self {
            probe,
            fetcher,
            options,
        }
    }

    /// The probe commands run through.
    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Platform of the probe.
    pub fn platform(&self) -> Platform {
        self.probe.platform()
    }

    /// Engine configuration.
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }
}
