//! Component kind enum identifying the installable requirements.

use crate::component::Detection;
use crate::descriptor::catalog;
use crate::platform::{CommandOutput, Platform, StructuredCommand};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

/// The fixed set of requirements the installer knows how to handle.
///
/// Variants are declared in install order: a kind only ever depends on
/// kinds declared before it, so iterating [`ComponentKind::all`] yields a
/// valid install sequence.
///
/// Each kind supplies its own detection parsing and installer invocation;
/// the engine drives the shared state machine uniformly over all of them.
///
/// # Example
///
/// ```rust
/// use devsuite_installer::{ComponentKind, Platform};
///
/// for kind in ComponentKind::all() {
///     println!("{} ({}): windows={}", kind.display_name(), kind.key(),
///         kind.is_applicable(Platform::Windows));
/// }
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ComponentKind {
    /// Microsoft Hyper-V hypervisor (Windows feature, detection only).
    Hyperv,
    /// Oracle VirtualBox hypervisor.
    Virtualbox,
    /// Java Development Kit.
    Jdk,
    /// Cygwin toolchain (ssh, rsync) for Windows.
    Cygwin,
    /// Container Development Kit CLI (minishift), runs VMs on a hypervisor.
    Cdk,
}

impl ComponentKind {
    /// Unique key used in requirement documents and reports.
    ///
    /// ```rust
    /// use devsuite_installer::ComponentKind;
    ///
    /// assert_eq!(ComponentKind::Hyperv.key(), "hyperv");
    /// assert_eq!(ComponentKind::Jdk.key(), "jdk");
    /// ```
    pub fn key(&self) -> &'static str {
        match self {
            Self::Hyperv => "hyperv",
            Self::Virtualbox => "virtualbox",
            Self::Jdk => "jdk",
            Self::Cygwin => "cygwin",
            Self::Cdk => "cdk",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Hyperv => "Hyper-V",
            Self::Virtualbox => "Oracle VirtualBox",
            Self::Jdk => "OpenJDK",
            Self::Cygwin => "Cygwin",
            Self::Cdk => "Red Hat Container Development Kit",
        }
    }

    /// Look a kind up by its key.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().find(|kind| kind.key() == key)
    }

    /// Iterator over all kinds, in install order.
    pub fn all() -> impl Iterator<Item = Self> {
        <Self as IntoEnumIterator>::iter()
    }

    /// Operating systems this kind is offered on.
    pub fn platforms(&self) -> &'static [Platform] {
        match self {
            Self::Hyperv | Self::Cygwin => &[Platform::Windows],
            Self::Virtualbox => &[Platform::Windows, Platform::Macos],
            Self::Jdk | Self::Cdk => &[Platform::Windows, Platform::Macos, Platform::Linux],
        }
    }

    /// Whether this kind is offered on the given platform.
    pub fn is_applicable(&self, platform: Platform) -> bool {
        self.platforms().contains(&platform)
    }

    /// Whether the installer format forbids reinstalling over a detected
    /// copy.
    ///
    /// MSI-style installers for hypervisors and the JDK cannot be safely
    /// re-run or repaired, so once such a component is detected its install
    /// option is disabled.
    pub fn is_msi_like(&self) -> bool {
        matches!(self, Self::Hyperv | Self::Virtualbox | Self::Jdk)
    }

    /// Kinds that must be installed before this one.
    pub fn requires(&self) -> &'static [ComponentKind] {
        match self {
            Self::Cdk => &[Self::Virtualbox],
            Self::Hyperv | Self::Virtualbox | Self::Jdk | Self::Cygwin => &[],
        }
    }

    /// Command that reports an existing installation, if this kind can be
    /// detected on the platform.
    pub fn detection_command(&self, platform: Platform) -> Option<StructuredCommand> {
        if !self.is_applicable(platform) {
            return None;
        }
        catalog::detection_command(*self, platform)
    }

    /// Interpret the output of a successful detection command.
    ///
    /// Anything unrecognised, including empty output, means the component
    /// is not installed.
    pub fn interpret_detection(&self, output: &CommandOutput) -> Detection {
        catalog::interpret_detection(*self, output)
    }

    /// Installer invocation template for the platform.
    ///
    /// `None` means the installer never installs this kind on the platform
    /// (it is detection only).
    pub fn install_command(&self, platform: Platform) -> Option<StructuredCommand> {
        if !self.is_applicable(platform) {
            return None;
        }
        catalog::install_command(*self, platform)
    }

    /// Step run once every requirement has been installed.
    pub fn post_install_command(&self, platform: Platform) -> Option<StructuredCommand> {
        if !self.is_applicable(platform) {
            return None;
        }
        catalog::post_install_command(*self, platform)
    }
}

/// Hypervisor driver the CDK configures for its virtual machine.
///
/// Substituted into the CDK post-install step as `{driver}`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VmDriver {
    /// Microsoft Hyper-V (Windows).
    Hyperv,
    /// Oracle VirtualBox (Windows, macOS).
    Virtualbox,
    /// libvirt KVM (Linux).
    Kvm,
}

impl VmDriver {
    /// Driver to use on a platform when nothing is known about the host.
    pub fn default_for(platform: Platform) -> Self {
        match platform {
            Platform::Windows | Platform::Macos => Self::Virtualbox,
            Platform::Linux => Self::Kvm,
        }
    }

    /// Driver to use on a platform given whether Hyper-V was found enabled.
    ///
    /// An enabled Hyper-V owns the virtualization extensions on Windows, so
    /// VirtualBox cannot start VMs next to it.
    ///
    /// ```rust
    /// use devsuite_installer::{Platform, VmDriver};
    ///
    /// assert_eq!(VmDriver::select(Platform::Windows, true), VmDriver::Hyperv);
    /// assert_eq!(VmDriver::select(Platform::Windows, false), VmDriver::Virtualbox);
    /// assert_eq!(VmDriver::select(Platform::Linux, true), VmDriver::Kvm);
    /// ```
    pub fn select(platform: Platform, hyperv_enabled: bool) -> Self {
        match platform {
            Platform::Windows if hyperv_enabled => Self::Hyperv,
            other => Self::default_for(other),
        }
    }
}
