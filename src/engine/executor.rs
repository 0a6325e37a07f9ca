//! Sequential installation of the selected components.

use super::{
    ComponentEvent, InstallEngine, InstallError, InstallSession, InstallSummary, Outcome, Reporter,
    RequirementSet,
};
use crate::component::{Component, ComponentState, Detection};
use crate::component_kind::{ComponentKind, VmDriver};
use crate::platform::{PlatformProbe, StructuredCommand};
use semver::Version;
use std::io::ErrorKind;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

impl<P: PlatformProbe> InstallEngine<P> {
    /// Install every component whose selected option is `install`.
    ///
    /// Components run one at a time in set order:
    ///
    /// 1. prerequisite check against this session's failures
    /// 2. artifact fetch (bundle, cache, download)
    /// 3. the platform installer with `{artifact}` and `{target}` filled in
    /// 4. optional re-detection to verify the result
    ///
    /// A failing component is recorded and the session moves on. Once all
    /// installers ran, post-install hooks of the components installed in
    /// this session run in the same order. Cancelling `cancel` kills the
    /// running installer and skips whatever is left.
    pub async fn install<R>(
        &self,
        set: &mut RequirementSet,
        reporter: &R,
        cancel: &CancellationToken,
    ) -> InstallSummary
    where
        R: Reporter + ?Sized,
    {
        for component in set.iter_mut() {
            component.decide();
            reporter.report(ComponentEvent::from_component(component));
        }

        let mut session = InstallSession::new(set);

        while let Some(key) = session.start_next() {
            if cancel.is_cancelled() {
                session.cancel();
                break;
            }
            let Some(component) = set.get_mut(&key) else {
                continue;
            };

            if let Some(prerequisite) = component
                .kind()
                .requires()
                .iter()
                .find(|required| session.outcome(required.key()) == Some(Outcome::Failed))
            {
                let error = InstallError::PrerequisiteFailed {
                    key: key.clone(),
                    prerequisite: prerequisite.key().to_string(),
                    fix: format!(
                        "Fix the {} installation first, then run the installer again",
                        prerequisite.display_name()
                    ),
                };
                self.fail(component, &error, reporter);
                session.finish(&key, Outcome::Failed);
                continue;
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(InstallError::cancelled(&key)),
                result = self.install_component(component, reporter) => result,
            };

            match result {
                Ok(version) => {
                    component.mark_succeeded(version);
                    reporter.report(ComponentEvent::from_component(component));
                    info!(key = %key, "installed");
                    session.finish(&key, Outcome::Success);
                }
                Err(error @ InstallError::Cancelled { .. }) => {
                    self.fail(component, &error, reporter);
                    session.finish(&key, Outcome::Failed);
                    session.cancel();
                    break;
                }
                Err(error) => {
                    self.fail(component, &error, reporter);
                    session.finish(&key, Outcome::Failed);
                }
            }
        }

        if cancel.is_cancelled() && !session.is_cancelled() {
            session.cancel();
        }

        if !session.is_cancelled() {
            let driver = self.vm_driver(set);
            for component in set.iter_mut() {
                if session.outcome(component.key()) != Some(Outcome::Success) {
                    continue;
                }
                let key = component.key();
                let result = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(InstallError::cancelled(key)),
                    result = self.run_post_install(component, driver) => result,
                };
                match result {
                    Ok(()) => {}
                    Err(error @ InstallError::Cancelled { .. }) => {
                        self.fail(component, &error, reporter);
                        session.finish(key, Outcome::Failed);
                        session.cancel();
                        break;
                    }
                    Err(error) => {
                        self.fail(component, &error, reporter);
                        session.finish(key, Outcome::Failed);
                    }
                }
            }
        }

        let summary = session.summary();
        info!(
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            skipped = summary.skipped.len(),
            cancelled = summary.cancelled,
            "install session finished"
        );
        summary
    }

    /// Run the post-install step of a component.
    ///
    /// Kinds without one resolve `Ok(())` whatever state the component is
    /// in. Kinds with one only run it once the component is configured.
    /// The CDK is pointed at [`EngineOptions::vm_driver`] or, when unset,
    /// the platform's default hypervisor; [`install`](Self::install) also
    /// takes a Hyper-V detected in the set into account.
    ///
    /// [`EngineOptions::vm_driver`]: crate::EngineOptions::vm_driver
    pub async fn install_after_requirements(&self, component: &Component) -> Result<(), InstallError> {
        let driver = self
            .options
            .vm_driver
            .unwrap_or_else(|| VmDriver::default_for(component.platform()));
        self.run_post_install(component, driver).await
    }

    /// Hypervisor the CDK should use on this host.
    fn vm_driver(&self, set: &RequirementSet) -> VmDriver {
        if let Some(driver) = self.options.vm_driver {
            return driver;
        }
        let hyperv_enabled = set
            .get(ComponentKind::Hyperv.key())
            .is_some_and(Component::is_configured);
        VmDriver::select(self.platform(), hyperv_enabled)
    }

    async fn run_post_install(&self, component: &Component, driver: VmDriver) -> Result<(), InstallError> {
        let Some(template) = component.kind().post_install_command(component.platform()) else {
            return Ok(());
        };
        if !component.is_configured() {
            debug!(key = component.key(), "not configured, skipping post-install step");
            return Ok(());
        }

        let target = self.options.target_dir.display().to_string();
        let driver = driver.to_string();
        let command = template.substitute(&[("target", &target), ("driver", &driver)]);
        info!(key = component.key(), command = %command, "running post-install step");
        self.run_installer(component.key(), &command).await
    }

    async fn install_component<R>(
        &self,
        component: &mut Component,
        reporter: &R,
    ) -> Result<Option<Version>, InstallError>
    where
        R: Reporter + ?Sized,
    {
        let platform = component.platform();
        let key = component.key();

        let (Some(template), Some(artifact)) = (
            component.kind().install_command(platform),
            component.spec().artifact(platform),
        ) else {
            return Err(InstallError::UnsupportedPlatform {
                kind: component.kind(),
                platform,
                fix: format!("Install {} manually for this platform", component.spec().display_name()),
            });
        };

        component.set_state(ComponentState::Fetching);
        reporter.report(ComponentEvent::from_component(component));
        let artifact_path = self.fetcher.ensure(&artifact).await?;

        component.set_state(ComponentState::Installing);
        reporter.report(ComponentEvent::from_component(component));

        let target_dir = &self.options.target_dir;
        tokio::fs::create_dir_all(target_dir).await.map_err(|e| {
            let message = format!("cannot create {}: {e}", target_dir.display());
            if e.kind() == ErrorKind::PermissionDenied {
                InstallError::PermissionDenied {
                    message,
                    fix: "Choose a writable directory with --target-dir".to_string(),
                }
            } else {
                InstallError::Io {
                    message,
                    fix: "Choose another directory with --target-dir".to_string(),
                }
            }
        })?;

        let artifact_path = artifact_path.display().to_string();
        let target = target_dir.display().to_string();
        let command = template.substitute(&[("artifact", &artifact_path), ("target", &target)]);
        info!(key, command = %command, "running installer");
        self.run_installer(key, &command).await?;

        if !self.options.verify_after_install {
            return Ok(None);
        }
        match self.run_detection(component.kind(), platform).await {
            Detection::Installed { version } => Ok(version),
            Detection::NotInstalled => Err(InstallError::VerificationFailed {
                kind: component.kind(),
                fix: "The installer finished but the component is not found; open a new terminal so PATH changes apply, or reboot"
                    .to_string(),
            }),
        }
    }

    async fn run_installer(&self, key: &str, command: &StructuredCommand) -> Result<(), InstallError> {
        self.probe
            .run_command(command, self.options.install_timeout)
            .await
            .map(|_| ())
            .map_err(|e| InstallError::from_probe(key, e))
    }

    fn fail<R>(&self, component: &mut Component, error: &InstallError, reporter: &R)
    where
        R: Reporter + ?Sized,
    {
        warn!(key = component.key(), error = %error, fix = error.fix_suggestion(), "component failed");
        component.mark_failed(error.to_string());
        reporter.report(ComponentEvent::from_component(component));
    }
}
