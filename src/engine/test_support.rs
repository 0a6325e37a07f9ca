//! A scripted probe for engine tests.

use crate::descriptor::DescriptorSet;
use crate::fetch::ArtifactFetcher;
use crate::options::FetchOptions;
use crate::platform::{CommandOutput, Platform, PlatformProbe, ProbeError, StructuredCommand};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

struct Rule {
    pattern: String,
    delay: Option<Duration>,
    response: Result<CommandOutput, ProbeError>,
}

/// Answers commands by substring match on their rendered form and records
/// every command it receives. Unmatched commands fail to spawn.
pub(crate) struct ScriptedProbe {
    platform: Platform,
    rules: Vec<Rule>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProbe {
    pub(crate) fn new(platform: Platform) -> Self {
        Self {
            platform,
            rules: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn on(self, pattern: &str, stdout: &str) -> Self {
        self.on_output(
            pattern,
            CommandOutput {
                exit_code: Some(0),
                stdout: stdout.to_string(),
                stderr: String::new(),
            },
        )
    }

    pub(crate) fn on_output(mut self, pattern: &str, output: CommandOutput) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            delay: None,
            response: Ok(output),
        });
        self
    }

    pub(crate) fn on_error(mut self, pattern: &str, error: ProbeError) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            delay: None,
            response: Err(error),
        });
        self
    }

    pub(crate) fn on_slow(mut self, pattern: &str, delay: Duration) -> Self {
        self.rules.push(Rule {
            pattern: pattern.to_string(),
            delay: Some(delay),
            response: Ok(CommandOutput::default()),
        });
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Index of the first recorded call containing `pattern`.
    pub(crate) fn position(&self, pattern: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.contains(pattern))
    }
}

impl PlatformProbe for ScriptedProbe {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn run_command(
        &self,
        command: &StructuredCommand,
        _limit: Duration,
    ) -> Result<CommandOutput, ProbeError> {
        let rendered = command.to_string();
        self.calls.lock().unwrap().push(rendered.clone());

        let Some(rule) = self.rules.iter().find(|r| rendered.contains(&r.pattern)) else {
            return Err(ProbeError::Spawn {
                program: command.program.clone(),
                kind: ErrorKind::NotFound,
                message: "program not found".to_string(),
            });
        };
        if let Some(delay) = rule.delay {
            tokio::time::sleep(delay).await;
        }
        rule.response.clone()
    }

    async fn find_executable(&self, _name: &str) -> Option<PathBuf> {
        None
    }
}

/// Descriptors whose artifacts all come from a bundle directory.
pub(crate) fn bundled_descriptors() -> DescriptorSet {
    DescriptorSet::from_json(
        r#"{
            "hyperv": {},
            "virtualbox": {
                "url": "https://downloads.invalid/virtualbox.exe",
                "fileName": "virtualbox.exe",
                "bundle": "yes",
                "version": "5.1.22"
            },
            "jdk": {
                "url": "https://downloads.invalid/jdk8.msi",
                "fileName": "jdk8.msi",
                "bundle": "yes",
                "version": "1.8.0"
            },
            "cygwin": {
                "url": "https://downloads.invalid/cygwin.exe",
                "fileName": "cygwin.exe",
                "bundle": "always",
                "version": "2.8.0"
            },
            "cdk": {
                "url": "https://downloads.invalid/cdk.exe",
                "fileName": "cdk.exe",
                "bundle": "yes",
                "version": "1.0.0",
                "platforms": {
                    "linux": { "url": "https://downloads.invalid/minishift", "fileName": "minishift" }
                }
            }
        }"#,
    )
    .unwrap()
}

/// A fetcher that finds every artifact of [`bundled_descriptors`] in
/// `bundle_dir` and never touches the network.
pub(crate) fn offline_fetcher(bundle_dir: &Path, cache_dir: &Path) -> ArtifactFetcher {
    for name in ["virtualbox.exe", "jdk8.msi", "cygwin.exe", "cdk.exe", "minishift"] {
        std::fs::write(bundle_dir.join(name), name.as_bytes()).unwrap();
    }
    ArtifactFetcher::new(FetchOptions {
        cache_dir: cache_dir.to_path_buf(),
        bundle_dir: Some(bundle_dir.to_path_buf()),
        retries: 0,
        ..Default::default()
    })
    .unwrap()
}
