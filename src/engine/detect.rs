//! Component detection.

use super::{ComponentEvent, InstallEngine, Reporter, RequirementSet};
use crate::component::{Component, ComponentState, Detection};
use crate::platform::{Platform, PlatformProbe, StructuredCommand};
use crate::ComponentKind;
use futures::future::join_all;
use tracing::debug;

impl<P: PlatformProbe> InstallEngine<P> {
    /// Detect one component and apply the decision rule to the result.
    ///
    /// Components the platform does not offer never reach the probe and end
    /// up `NotApplicable`. Any failure of the detection command counts as
    /// not installed. The reporter sees `Detecting` and then the detected
    /// state, with any version warning.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use devsuite_installer::{
    ///     ArtifactFetcher, Component, ComponentKind, DescriptorSet, EngineOptions, FetchOptions,
    ///     InstallEngine, LogReporter, Platform, SystemProbe,
    /// };
    ///
    /// #[tokio::main(flavor = "current_thread")]
    /// async fn main() {
    ///     let descriptors = DescriptorSet::builtin().unwrap();
    ///     let spec = descriptors.describe(ComponentKind::Jdk).unwrap().clone();
    ///     let mut jdk = Component::new(spec, Platform::current());
    ///
    ///     let fetcher = ArtifactFetcher::new(FetchOptions::default()).unwrap();
    ///     let engine = InstallEngine::new(SystemProbe::new(), fetcher, EngineOptions::default());
    ///     engine.detect(&mut jdk, &LogReporter).await;
    ///     println!("{}: {} {:?}", jdk.key(), jdk.state(), jdk.installed_version());
    /// }
    /// ```
    pub async fn detect<R>(&self, component: &mut Component, reporter: &R) -> ComponentState
    where
        R: Reporter + ?Sized,
    {
        if !component.is_applicable() {
            component.set_state(ComponentState::NotApplicable);
            reporter.report(ComponentEvent::from_component(component));
            return component.state();
        }

        component.set_state(ComponentState::Detecting);
        reporter.report(ComponentEvent::from_component(component));

        let detection = self.run_detection(component.kind(), component.platform()).await;
        component.apply_detection(detection);
        reporter.report(ComponentEvent::from_component(component));

        debug!(
            key = component.key(),
            state = %component.state(),
            version = ?component.installed_version(),
            "detected"
        );
        component.state()
    }

    /// Detect every component of the set concurrently.
    pub async fn detect_all<R>(&self, set: &mut RequirementSet, reporter: &R)
    where
        R: Reporter + ?Sized,
    {
        join_all(set.iter_mut().map(|component| self.detect(component, reporter))).await;
    }

    pub(crate) async fn run_detection(&self, kind: ComponentKind, platform: Platform) -> Detection {
        let Some(command) = kind.detection_command(platform) else {
            return Detection::NotInstalled;
        };
        let command = self.resolve_program(command).await;

        match self.probe.run_command(&command, self.options.detect_timeout).await {
            Ok(output) => kind.interpret_detection(&output),
            Err(e) => {
                debug!(key = kind.key(), error = %e, "detection inconclusive");
                Detection::NotInstalled
            }
        }
    }

    /// Replace a bare program name with its full path when the probe can
    /// find it outside PATH.
    async fn resolve_program(&self, mut command: StructuredCommand) -> StructuredCommand {
        if let Some(path) = self.probe.find_executable(&command.program).await {
            command.program = path.to_string_lossy().into_owned();
        }
        command
    }
}
