//! Component state, install options and the per-component decision rule.

use crate::descriptor::ComponentSpec;
use crate::platform::Platform;
use crate::ComponentKind;
use semver::Version;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Outcome of a detection command after component-specific parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Nothing usable was found. Also the result of any failed or
    /// unrecognised detection.
    NotInstalled,

    /// The component is present.
    Installed {
        /// Parsed version, `None` for components that only report a state
        /// (such as a Windows feature being enabled).
        version: Option<Version>,
    },
}

/// A choice the user can make for a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallOption {
    /// Keep the copy already on the machine.
    Detected,
    /// Install (or reinstall over) the component.
    Install,
    /// Leave the component alone.
    Skip,
}

impl InstallOption {
    /// Lowercase name used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detected => "detected",
            Self::Install => "install",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for InstallOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the engine will do with a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// No installer runs.
    Skip,
    /// Fresh install.
    Install,
    /// Install over an older detected copy.
    Upgrade,
}

/// Detected version relative to the recommended one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionWarning {
    /// Older than recommended.
    Older,
    /// Newer than recommended.
    Newer,
}

/// Lifecycle of one component through a run.
///
/// ```text
/// Unknown -> Detecting -> {NotInstalled, InstalledOk, InstalledOutdated, InstalledNewer}
///         -> Decided(action) -> (Fetching ->) Installing -> {Succeeded, Failed}
/// ```
///
/// `NotApplicable` is terminal for components the platform does not offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentState {
    /// Not yet detected.
    Unknown,
    /// Not offered on this platform; never detected or installed.
    NotApplicable,
    /// Detection command running.
    Detecting,
    /// Detection found nothing usable.
    NotInstalled,
    /// Detected at (or without) the recommended version.
    InstalledOk,
    /// Detected, older than recommended.
    InstalledOutdated,
    /// Detected, newer than recommended.
    InstalledNewer,
    /// Selection confirmed for the install session.
    Decided(Action),
    /// Artifact download or cache verification running.
    Fetching,
    /// Installer command running.
    Installing,
    /// Installer finished successfully.
    Succeeded,
    /// Installer or download failed.
    Failed,
}

impl ComponentState {
    /// Short name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::NotApplicable => "not_applicable",
            Self::Detecting => "detecting",
            Self::NotInstalled => "not_installed",
            Self::InstalledOk => "installed_ok",
            Self::InstalledOutdated => "installed_outdated",
            Self::InstalledNewer => "installed_newer",
            Self::Decided(Action::Skip) => "decided_skip",
            Self::Decided(Action::Install) => "decided_install",
            Self::Decided(Action::Upgrade) => "decided_upgrade",
            Self::Fetching => "fetching",
            Self::Installing => "installing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Whether detection has produced a result.
    pub fn is_detected_state(&self) -> bool {
        matches!(
            self,
            Self::NotInstalled | Self::InstalledOk | Self::InstalledOutdated | Self::InstalledNewer
        )
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One offered option and whether it can be chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionEntry {
    /// The option.
    pub option: InstallOption,
    /// `false` when shown but not selectable.
    pub enabled: bool,
}

/// Ordered set of options offered for a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSet {
    entries: Vec<OptionEntry>,
}

impl OptionSet {
    fn new(entries: &[(InstallOption, bool)]) -> Self {
        Self {
            entries: entries
                .iter()
                .map(|&(option, enabled)| OptionEntry { option, enabled })
                .collect(),
        }
    }

    /// Whether the option is offered at all.
    pub fn contains(&self, option: InstallOption) -> bool {
        self.entries.iter().any(|e| e.option == option)
    }

    /// Whether the option is offered and selectable.
    pub fn is_enabled(&self, option: InstallOption) -> bool {
        self.entries.iter().any(|e| e.option == option && e.enabled)
    }

    /// Offered options in display order.
    pub fn iter(&self) -> impl Iterator<Item = &OptionEntry> {
        self.entries.iter()
    }
}

/// Rejected option selection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// The option is not offered for the component.
    #[error("option '{option}' is not offered for {key}")]
    NotOffered {
        /// Component key.
        key: String,
        /// Requested option.
        option: InstallOption,
    },

    /// The option is offered but disabled.
    #[error("option '{option}' is disabled for {key}")]
    Disabled {
        /// Component key.
        key: String,
        /// Requested option.
        option: InstallOption,
    },
}

/// A requirement as seen during one installer run.
///
/// Built from a [`ComponentSpec`] for a given platform, updated by
/// detection and by the install session.
///
/// # Example
///
/// ```rust
/// use devsuite_installer::{Component, ComponentKind, DescriptorSet, Detection, InstallOption, Platform};
///
/// let set = DescriptorSet::builtin().unwrap();
/// let spec = set.describe(ComponentKind::Hyperv).unwrap().clone();
///
/// let mut hyperv = Component::new(spec, Platform::Windows);
/// hyperv.apply_detection(Detection::Installed { version: None });
/// assert!(hyperv.has_option(InstallOption::Detected));
/// assert!(hyperv.is_configured());
/// assert!(hyperv.is_skipped());
/// ```
#[derive(Debug, Clone)]
pub struct Component {
    spec: ComponentSpec,
    platform: Platform,
    state: ComponentState,
    installed_version: Option<Version>,
    detected: bool,
    options: OptionSet,
    selected: InstallOption,
    configured: bool,
    warning: Option<VersionWarning>,
    error_message: Option<String>,
}

impl Component {
    /// Create an undetected component for the platform.
    pub fn new(spec: ComponentSpec, platform: Platform) -> Self {
        let mut component = Self {
            spec,
            platform,
            state: ComponentState::Unknown,
            installed_version: None,
            detected: false,
            options: OptionSet::new(&[(InstallOption::Skip, true)]),
            selected: InstallOption::Skip,
            configured: false,
            warning: None,
            error_message: None,
        };

        if !component.is_applicable() {
            component.state = ComponentState::NotApplicable;
        } else if component.is_installable() {
            component.options =
                OptionSet::new(&[(InstallOption::Install, true), (InstallOption::Skip, true)]);
            component.selected = InstallOption::Install;
        }
        component
    }

    /// Unique key.
    pub fn key(&self) -> &'static str {
        self.spec.key()
    }

    /// Component kind.
    pub fn kind(&self) -> ComponentKind {
        self.spec.kind()
    }

    /// Descriptor this component was built from.
    pub fn spec(&self) -> &ComponentSpec {
        &self.spec
    }

    /// Platform of the run.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ComponentState {
        self.state
    }

    /// Version found by detection.
    pub fn installed_version(&self) -> Option<&Version> {
        self.installed_version.as_ref()
    }

    /// Offered options.
    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    /// Whether the option is offered.
    pub fn has_option(&self, option: InstallOption) -> bool {
        self.options.contains(option)
    }

    /// Currently selected option.
    pub fn selected_option(&self) -> InstallOption {
        self.selected
    }

    /// Version warning raised by detection.
    pub fn warning(&self) -> Option<VersionWarning> {
        self.warning
    }

    /// Message of the last failure.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Whether the platform offers this component.
    pub fn is_applicable(&self) -> bool {
        self.spec.is_applicable(self.platform)
    }

    /// Whether an installer and an artifact exist for this component on the
    /// platform.
    pub fn is_installable(&self) -> bool {
        self.kind().install_command(self.platform).is_some()
            && self.spec.artifact(self.platform).is_some()
    }

    /// Whether detection found the component.
    pub fn is_detected(&self) -> bool {
        self.detected
    }

    /// Whether the detected copy already satisfies the requirement.
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Whether the installer never acts on this component in this run.
    ///
    /// True for components the platform does not offer and for
    /// detection-only components, whatever detection found.
    pub fn is_skipped(&self) -> bool {
        !self.is_applicable() || !self.is_installable()
    }

    /// Change the selected option.
    pub fn select(&mut self, option: InstallOption) -> Result<(), SelectionError> {
        if !self.options.contains(option) {
            return Err(SelectionError::NotOffered {
                key: self.key().to_string(),
                option,
            });
        }
        if !self.options.is_enabled(option) {
            return Err(SelectionError::Disabled {
                key: self.key().to_string(),
                option,
            });
        }
        self.selected = option;
        Ok(())
    }

    /// Action implied by the current selection.
    pub fn action(&self) -> Action {
        if self.is_skipped() {
            return Action::Skip;
        }
        match self.selected {
            InstallOption::Install if self.detected => Action::Upgrade,
            InstallOption::Install => Action::Install,
            InstallOption::Detected | InstallOption::Skip => Action::Skip,
        }
    }

    /// Apply a detection result and pick the default option.
    ///
    /// - not installed: `install` selected (detection-only kinds get `skip`)
    /// - installed, MSI-like: `install` disabled, configured, `detected`
    /// - installed, older than recommended: `older` warning, `install`
    ///   enabled and selected
    /// - installed, newer than recommended: `newer` warning, `detected`
    /// - installed otherwise: configured, `detected`, `install` disabled
    pub fn apply_detection(&mut self, detection: Detection) {
        self.warning = None;
        self.configured = false;
        self.error_message = None;

        if !self.is_applicable() {
            self.state = ComponentState::NotApplicable;
            self.detected = false;
            self.installed_version = None;
            self.options = OptionSet::new(&[(InstallOption::Skip, true)]);
            self.selected = InstallOption::Skip;
            return;
        }

        let installable = self.is_installable();

        match detection {
            Detection::NotInstalled => {
                self.state = ComponentState::NotInstalled;
                self.detected = false;
                self.installed_version = None;
                if installable {
                    self.options =
                        OptionSet::new(&[(InstallOption::Install, true), (InstallOption::Skip, true)]);
                    self.selected = InstallOption::Install;
                } else {
                    self.options = OptionSet::new(&[(InstallOption::Skip, true)]);
                    self.selected = InstallOption::Skip;
                }
            }
            Detection::Installed { version } => {
                let ordering = match (&version, self.spec.recommended()) {
                    (Some(found), Some(recommended)) => found.cmp(recommended),
                    _ => Ordering::Equal,
                };

                self.detected = true;
                self.installed_version = version;
                self.state = match ordering {
                    Ordering::Less => ComponentState::InstalledOutdated,
                    Ordering::Greater => ComponentState::InstalledNewer,
                    Ordering::Equal => ComponentState::InstalledOk,
                };
                self.warning = match ordering {
                    Ordering::Less => Some(VersionWarning::Older),
                    Ordering::Greater => Some(VersionWarning::Newer),
                    Ordering::Equal => None,
                };

                let upgrade = installable && ordering == Ordering::Less && !self.kind().is_msi_like();
                self.options = if installable {
                    OptionSet::new(&[(InstallOption::Detected, true), (InstallOption::Install, upgrade)])
                } else {
                    OptionSet::new(&[(InstallOption::Detected, true)])
                };
                self.selected = if upgrade {
                    InstallOption::Install
                } else {
                    InstallOption::Detected
                };
                self.configured = !upgrade;
            }
        }
    }

    /// Freeze the selection for an install session.
    pub fn decide(&mut self) -> Action {
        let action = self.action();
        if self.state != ComponentState::NotApplicable {
            self.state = ComponentState::Decided(action);
        }
        action
    }

    pub(crate) fn set_state(&mut self, state: ComponentState) {
        self.state = state;
    }

    pub(crate) fn mark_failed(&mut self, message: impl Into<String>) {
        self.state = ComponentState::Failed;
        self.error_message = Some(message.into());
    }

    pub(crate) fn mark_succeeded(&mut self, version: Option<Version>) {
        self.state = ComponentState::Succeeded;
        self.error_message = None;
        self.detected = true;
        self.configured = true;
        if version.is_some() {
            self.installed_version = version;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::RequirementDescriptor;

    fn component(kind: ComponentKind, recommended: Option<&str>, platform: Platform) -> Component {
        let descriptor = RequirementDescriptor {
            url: Some(format!("https://example.org/{}.bin", kind.key())),
            version: recommended.map(str::to_string),
            ..Default::default()
        };
        Component::new(ComponentSpec::new(kind, descriptor).unwrap(), platform)
    }

    fn installed(major: u64, minor: u64, patch: u64) -> Detection {
        Detection::Installed {
            version: Some(Version::new(major, minor, patch)),
        }
    }

    #[test]
    fn test_new_defaults_to_install() {
        let c = component(ComponentKind::Cdk, Some("1.0.0"), Platform::Linux);
        assert_eq!(c.state(), ComponentState::Unknown);
        assert_eq!(c.selected_option(), InstallOption::Install);
        assert_eq!(c.action(), Action::Install);
        assert!(!c.is_skipped());
    }

    #[test]
    fn test_not_installed_selects_install() {
        let mut c = component(ComponentKind::Cdk, Some("1.0.0"), Platform::Linux);
        c.apply_detection(Detection::NotInstalled);
        assert_eq!(c.state(), ComponentState::NotInstalled);
        assert_eq!(c.selected_option(), InstallOption::Install);
        assert!(!c.has_option(InstallOption::Detected));
        assert!(!c.is_configured());
        assert_eq!(c.warning(), None);
    }

    #[test]
    fn test_msi_like_disables_install_whatever_the_version() {
        for found in [installed(1, 7, 0), installed(1, 8, 0), installed(9, 0, 0)] {
            let mut c = component(ComponentKind::Jdk, Some("1.8.0"), Platform::Windows);
            c.apply_detection(found.clone());
            assert!(c.has_option(InstallOption::Install), "{found:?}");
            assert!(!c.options().is_enabled(InstallOption::Install), "{found:?}");
            assert_eq!(c.selected_option(), InstallOption::Detected);
            assert!(c.is_configured());
            assert_eq!(c.action(), Action::Skip);
            assert!(c.select(InstallOption::Install).is_err());
        }
    }

    #[test]
    fn test_older_non_msi_offers_upgrade() {
        let mut c = component(ComponentKind::Cdk, Some("1.0.0"), Platform::Linux);
        c.apply_detection(installed(0, 9, 3));
        assert_eq!(c.state(), ComponentState::InstalledOutdated);
        assert_eq!(c.warning(), Some(VersionWarning::Older));
        assert!(c.options().is_enabled(InstallOption::Install));
        assert_eq!(c.selected_option(), InstallOption::Install);
        assert_eq!(c.action(), Action::Upgrade);
        assert!(!c.is_configured());

        c.select(InstallOption::Detected).unwrap();
        assert_eq!(c.action(), Action::Skip);
    }

    #[test]
    fn test_newer_flags_warning_without_reinstall() {
        let mut c = component(ComponentKind::Cdk, Some("1.0.0"), Platform::Linux);
        c.apply_detection(installed(1, 2, 0));
        assert_eq!(c.state(), ComponentState::InstalledNewer);
        assert_eq!(c.warning(), Some(VersionWarning::Newer));
        assert_eq!(c.selected_option(), InstallOption::Detected);
        assert!(c.is_configured());
        assert!(!c.options().is_enabled(InstallOption::Install));
    }

    #[test]
    fn test_msi_like_older_still_warns() {
        let mut c = component(ComponentKind::Virtualbox, Some("5.1.22"), Platform::Windows);
        c.apply_detection(installed(5, 0, 0));
        assert_eq!(c.warning(), Some(VersionWarning::Older));
        assert_eq!(c.selected_option(), InstallOption::Detected);
        assert!(c.is_configured());
    }

    #[test]
    fn test_matching_version_is_configured() {
        let mut c = component(ComponentKind::Cygwin, Some("2.8.0"), Platform::Windows);
        c.apply_detection(installed(2, 8, 0));
        assert_eq!(c.state(), ComponentState::InstalledOk);
        assert!(c.is_configured());
        assert_eq!(c.selected_option(), InstallOption::Detected);
    }

    #[test]
    fn test_no_recommended_version_counts_as_ok() {
        let mut c = component(ComponentKind::Cdk, None, Platform::Linux);
        c.apply_detection(installed(0, 1, 0));
        assert_eq!(c.state(), ComponentState::InstalledOk);
        assert_eq!(c.warning(), None);
    }

    #[test]
    fn test_not_applicable_offers_only_skip() {
        let c = component(ComponentKind::Cygwin, Some("2.8.0"), Platform::Macos);
        assert_eq!(c.state(), ComponentState::NotApplicable);
        assert!(c.is_skipped());
        assert!(!c.is_configured());
        assert_eq!(c.selected_option(), InstallOption::Skip);
        assert!(!c.has_option(InstallOption::Install));
        assert!(!c.has_option(InstallOption::Detected));
    }

    #[test]
    fn test_select_rejects_unoffered_option() {
        let mut c = component(ComponentKind::Cdk, None, Platform::Linux);
        c.apply_detection(Detection::NotInstalled);
        let err = c.select(InstallOption::Detected).unwrap_err();
        assert_eq!(
            err,
            SelectionError::NotOffered {
                key: "cdk".to_string(),
                option: InstallOption::Detected
            }
        );
        c.select(InstallOption::Skip).unwrap();
        assert_eq!(c.action(), Action::Skip);
    }

    #[test]
    fn test_decide_records_action() {
        let mut c = component(ComponentKind::Cdk, None, Platform::Linux);
        c.apply_detection(Detection::NotInstalled);
        assert_eq!(c.decide(), Action::Install);
        assert_eq!(c.state(), ComponentState::Decided(Action::Install));

        let mut na = component(ComponentKind::Cygwin, None, Platform::Linux);
        assert_eq!(na.decide(), Action::Skip);
        assert_eq!(na.state(), ComponentState::NotApplicable);
    }

    #[test]
    fn test_selected_option_always_enabled() {
        let detections = [
            Detection::NotInstalled,
            Detection::Installed { version: None },
            installed(0, 1, 0),
            installed(99, 0, 0),
        ];
        for kind in ComponentKind::all() {
            for platform in Platform::all() {
                for detection in &detections {
                    let mut c = component(kind, Some("1.0.0"), platform);
                    c.apply_detection(detection.clone());
                    assert!(
                        c.options().is_enabled(c.selected_option()),
                        "{kind:?} {platform} {detection:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_state_names() {
        assert_eq!(ComponentState::InstalledOk.to_string(), "installed_ok");
        assert_eq!(ComponentState::Decided(Action::Upgrade).name(), "decided_upgrade");
        assert!(ComponentState::NotInstalled.is_detected_state());
        assert!(!ComponentState::Installing.is_detected_state());
    }
}
