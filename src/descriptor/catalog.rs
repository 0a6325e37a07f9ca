//! Per-component detection and installer commands.
//!
//! Each function returns the command for one component on one platform.
//! Install templates use `{artifact}` for the cached installer and
//! `{target}` for the install root; the CDK post-install step also takes
//! `{driver}`. See [`StructuredCommand::substitute`].
//!
//! Windows templates never embed double quotes: the argument quoting of
//! `CreateProcess` escapes them as `\"`, which `cmd.exe` does not undo.

use super::parse_version;
use crate::component::Detection;
use crate::platform::{CommandOutput, Platform, StructuredCommand};
use crate::ComponentKind;

/// Token printed by the Hyper-V feature query when the hypervisor is on.
const HYPERV_ENABLED: &str = "Enabled";

fn powershell(script: &str) -> StructuredCommand {
    StructuredCommand::new(
        "powershell",
        [
            "-NoProfile",
            "-NonInteractive",
            "-ExecutionPolicy",
            "Bypass",
            "-Command",
            script,
        ],
    )
}

pub(crate) fn detection_command(kind: ComponentKind, platform: Platform) -> Option<StructuredCommand> {
    let command = match (kind, platform) {
        (ComponentKind::Hyperv, Platform::Windows) => powershell(
            "(Get-WindowsOptionalFeature -FeatureName Microsoft-Hyper-V-All -Online).State",
        ),
        (ComponentKind::Hyperv, _) => return None,
        (ComponentKind::Virtualbox, Platform::Windows) => {
            StructuredCommand::new("VBoxManage.exe", ["--version"])
        }
        (ComponentKind::Virtualbox, _) => StructuredCommand::new("VBoxManage", ["--version"]),
        (ComponentKind::Jdk, _) => StructuredCommand::new("java", ["-version"]),
        (ComponentKind::Cygwin, Platform::Windows) => {
            StructuredCommand::new("cygcheck", ["-c", "cygwin"])
        }
        (ComponentKind::Cygwin, _) => return None,
        (ComponentKind::Cdk, _) => StructuredCommand::new("minishift", ["version"]),
    };
    Some(command)
}

pub(crate) fn interpret_detection(kind: ComponentKind, output: &CommandOutput) -> Detection {
    match kind {
        ComponentKind::Hyperv => {
            if output.stdout.trim() == HYPERV_ENABLED {
                Detection::Installed { version: None }
            } else {
                Detection::NotInstalled
            }
        }
        // cygcheck lists the package with an empty version column when it
        // is known but not installed, so a missing version means absent.
        ComponentKind::Virtualbox | ComponentKind::Jdk | ComponentKind::Cygwin | ComponentKind::Cdk => {
            match parse_version(output.text()) {
                Some(version) => Detection::Installed {
                    version: Some(version),
                },
                None => Detection::NotInstalled,
            }
        }
    }
}

pub(crate) fn install_command(kind: ComponentKind, platform: Platform) -> Option<StructuredCommand> {
    let command = match (kind, platform) {
        // Hyper-V is switched on through Windows features and needs a
        // reboot; the installer only reports it.
        (ComponentKind::Hyperv, _) => return None,
        (ComponentKind::Virtualbox, Platform::Windows) => StructuredCommand::new(
            "{artifact}",
            ["--silent", "--msiparams", "INSTALLDIR={target}\\virtualbox"],
        ),
        (ComponentKind::Virtualbox, Platform::Macos) => {
            StructuredCommand::new("sh", ["-c", MACOS_DMG_INSTALL, "sh", "{artifact}"])
        }
        (ComponentKind::Virtualbox, Platform::Linux) => return None,
        (ComponentKind::Jdk, Platform::Windows) => StructuredCommand::new(
            "msiexec",
            [
                "/i",
                "{artifact}",
                "INSTALLDIR={target}\\jdk8",
                "/qn",
                "/norestart",
            ],
        ),
        (ComponentKind::Jdk, Platform::Macos) => {
            StructuredCommand::new("sh", ["-c", MACOS_DMG_INSTALL, "sh", "{artifact}"])
        }
        (ComponentKind::Jdk, Platform::Linux) => StructuredCommand::new(
            "sh",
            [
                "-c",
                "mkdir -p \"$2\" && tar -xzf \"$1\" -C \"$2\" --strip-components=1",
                "sh",
                "{artifact}",
                "{target}/jdk",
            ],
        ),
        (ComponentKind::Cygwin, Platform::Windows) => StructuredCommand::new(
            "{artifact}",
            [
                "--no-admin",
                "--quiet-mode",
                "--only-site",
                "--site",
                "http://mirrors.xmission.com/cygwin",
                "--categories",
                "Base",
                "--packages",
                "openssh,rsync",
                "--root",
                "{target}\\cygwin",
                "--local-package-dir",
                "{target}\\cygwin\\packages",
            ],
        ),
        (ComponentKind::Cygwin, _) => return None,
        (ComponentKind::Cdk, Platform::Windows) => powershell(
            "New-Item -ItemType Directory -Force -Path '{target}\\cdk\\bin' | Out-Null; \
             Copy-Item -Force -LiteralPath '{artifact}' -Destination '{target}\\cdk\\bin\\minishift.exe'",
        ),
        (ComponentKind::Cdk, _) => StructuredCommand::new(
            "sh",
            [
                "-c",
                "mkdir -p \"$2\" && install -m 755 \"$1\" \"$2/minishift\"",
                "sh",
                "{artifact}",
                "{target}/cdk/bin",
            ],
        ),
    };
    Some(command)
}

/// Mount a disk image, run the first package inside it, detach.
const MACOS_DMG_INSTALL: &str = "set -e; mnt=$(mktemp -d); hdiutil attach -nobrowse -mountpoint \"$mnt\" \"$1\"; \
     pkg=$(ls \"$mnt\"/*.pkg | head -n 1); installer -pkg \"$pkg\" -target /; hdiutil detach \"$mnt\"";

pub(crate) fn post_install_command(kind: ComponentKind, platform: Platform) -> Option<StructuredCommand> {
    match (kind, platform) {
        (ComponentKind::Cdk, Platform::Windows) => Some(StructuredCommand::new(
            "{target}\\cdk\\bin\\minishift.exe",
            ["setup-cdk", "--force", "--default-vm-driver", "{driver}"],
        )),
        (ComponentKind::Cdk, _) => Some(StructuredCommand::new(
            "{target}/cdk/bin/minishift",
            ["setup-cdk", "--force", "--default-vm-driver", "{driver}"],
        )),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semver::Version;

    fn stdout(text: &str) -> CommandOutput {
        CommandOutput {
            exit_code: Some(0),
            stdout: text.to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_hyperv_enabled_token() {
        let detection = interpret_detection(ComponentKind::Hyperv, &stdout("Enabled\r\n"));
        assert_eq!(detection, Detection::Installed { version: None });
    }

    #[test]
    fn test_hyperv_other_output_is_not_installed() {
        for text in ["Disabled", "", "DisabledWithPayloadRemoved", "enabled", "Enabled Disabled"] {
            assert_eq!(
                interpret_detection(ComponentKind::Hyperv, &stdout(text)),
                Detection::NotInstalled,
                "output {text:?}"
            );
        }
    }

    #[test]
    fn test_jdk_reads_stderr() {
        let output = CommandOutput {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: "openjdk version \"1.8.0_131\"\n".to_string(),
        };
        assert_eq!(
            interpret_detection(ComponentKind::Jdk, &output),
            Detection::Installed {
                version: Some(Version::new(1, 8, 0))
            }
        );
    }

    #[test]
    fn test_versioned_kinds_unrecognized_output() {
        for kind in [ComponentKind::Virtualbox, ComponentKind::Cygwin, ComponentKind::Cdk] {
            assert_eq!(interpret_detection(kind, &stdout("")), Detection::NotInstalled);
            assert_eq!(
                interpret_detection(kind, &stdout("command not recognized")),
                Detection::NotInstalled
            );
        }
    }

    #[test]
    fn test_cygwin_package_listing() {
        let listing = "Cygwin Package Information\nPackage              Version        Status\ncygwin               2.8.0-1        OK\n";
        assert_eq!(
            interpret_detection(ComponentKind::Cygwin, &stdout(listing)),
            Detection::Installed {
                version: Some(Version::new(2, 8, 0))
            }
        );
    }

    #[test]
    fn test_every_applicable_kind_has_detection() {
        for kind in ComponentKind::all() {
            for platform in kind.platforms() {
                assert!(
                    detection_command(kind, *platform).is_some(),
                    "{kind:?} on {platform}"
                );
            }
        }
    }

    #[test]
    fn test_install_templates_reference_artifact() {
        for kind in ComponentKind::all() {
            for platform in kind.platforms() {
                if let Some(cmd) = install_command(kind, *platform) {
                    let mentions = cmd.program.contains("{artifact}")
                        || cmd.args.iter().any(|a| a.contains("{artifact}"));
                    assert!(mentions, "{kind:?} on {platform} ignores the artifact");
                }
            }
        }
    }

    #[test]
    fn test_only_cdk_has_post_install() {
        for kind in ComponentKind::all() {
            let has_step = post_install_command(kind, Platform::Linux).is_some();
            assert_eq!(has_step, kind == ComponentKind::Cdk);
        }
    }

    #[test]
    fn test_windows_jdk_msi_template() {
        let cmd = install_command(ComponentKind::Jdk, Platform::Windows)
            .unwrap()
            .substitute(&[("artifact", "C:\\cache\\jdk.msi"), ("target", "C:\\DevSuite")]);
        assert_eq!(cmd.program, "msiexec");
        assert_eq!(
            cmd.args,
            vec!["/i", "C:\\cache\\jdk.msi", "INSTALLDIR=C:\\DevSuite\\jdk8", "/qn", "/norestart"]
        );
    }

    #[test]
    fn test_windows_templates_have_no_double_quotes() {
        for kind in ComponentKind::all() {
            let commands = [
                install_command(kind, Platform::Windows),
                post_install_command(kind, Platform::Windows),
            ];
            for cmd in commands.into_iter().flatten() {
                assert!(
                    !cmd.program.contains('"') && cmd.args.iter().all(|a| !a.contains('"')),
                    "{kind:?}: {cmd}"
                );
            }
        }
    }

    #[test]
    fn test_windows_cdk_copies_with_powershell() {
        let cmd = install_command(ComponentKind::Cdk, Platform::Windows)
            .unwrap()
            .substitute(&[("artifact", "C:\\cache\\cdk.exe"), ("target", "C:\\Dev Suite")]);
        assert_eq!(cmd.program, "powershell");
        let script = cmd.args.last().unwrap();
        assert!(script.contains("-Path 'C:\\Dev Suite\\cdk\\bin'"), "{script}");
        assert!(script.contains("-LiteralPath 'C:\\cache\\cdk.exe'"), "{script}");
        assert!(
            script.ends_with("-Destination 'C:\\Dev Suite\\cdk\\bin\\minishift.exe'"),
            "{script}"
        );
    }

    #[test]
    fn test_cdk_setup_takes_driver() {
        for platform in Platform::all() {
            let cmd = post_install_command(ComponentKind::Cdk, platform)
                .unwrap()
                .substitute(&[("target", "/opt/devsuite"), ("driver", "kvm")]);
            assert_eq!(
                cmd.args,
                ["setup-cdk", "--force", "--default-vm-driver", "kvm"],
                "{platform}"
            );
        }
    }
}
