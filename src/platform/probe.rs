//! The platform probe seam and its process-backed implementation.

use super::{find_executable, Platform, StructuredCommand};
use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
}

impl CommandOutput {
    /// Standard output if non-empty, standard error otherwise.
    ///
    /// Several detection commands (`java -version` among them) report on
    /// stderr while exiting successfully.
    pub fn text(&self) -> &str {
        if self.stdout.trim().is_empty() {
            &self.stderr
        } else {
            &self.stdout
        }
    }
}

/// Typed failure of a probe command.
///
/// Output written to stderr by a command that exits with status zero is
/// never an error on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ProbeError {
    /// The process could not be started.
    #[error("failed to start {program}: {message}")]
    Spawn {
        /// Program that was being started.
        program: String,
        /// I/O error kind reported by the OS.
        kind: ErrorKind,
        /// OS error message.
        message: String,
    },

    /// The process did not finish in time and was killed.
    #[error("{program} timed out after {duration:?}")]
    Timeout {
        /// Program that timed out.
        program: String,
        /// The limit that was exceeded.
        duration: Duration,
    },

    /// The process finished with a non-zero exit status.
    #[error("{program} exited with code {:?}", output.exit_code)]
    NonZeroExit {
        /// Program that failed.
        program: String,
        /// Everything the process printed.
        output: CommandOutput,
    },
}

/// Access to the host operating system.
///
/// Component detection and installation never spawn processes directly;
/// they go through a probe so the engine can be driven against a scripted
/// host in tests or pointed at another platform for a dry run.
pub trait PlatformProbe: Send + Sync {
    /// Operating system family the run targets.
    fn platform(&self) -> Platform;

    /// Run a command to completion, capturing its output.
    ///
    /// Resolves to `Ok` only when the process exits with status zero.
    fn run_command(
        &self,
        command: &StructuredCommand,
        limit: Duration,
    ) -> impl Future<Output = Result<CommandOutput, ProbeError>> + Send;

    /// Locate an executable on PATH or in well-known install directories.
    ///
    /// The default lookup stats files and runs on the blocking pool.
    fn find_executable(&self, name: &str) -> impl Future<Output = Option<PathBuf>> + Send {
        let name = name.to_string();
        let platform = self.platform();
        async move {
            tokio::task::spawn_blocking(move || find_executable(&name, platform))
                .await
                .ok()
                .flatten()
        }
    }
}

/// Probe backed by real OS processes.
///
/// # Example
///
/// ```rust,no_run
/// use devsuite_installer::{PlatformProbe, StructuredCommand, SystemProbe};
/// use std::time::Duration;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let probe = SystemProbe::new();
///     let cmd = StructuredCommand::new("java", ["-version"]);
///     match probe.run_command(&cmd, Duration::from_secs(5)).await {
///         Ok(out) => println!("{}", out.text()),
///         Err(e) => println!("java not usable: {e}"),
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SystemProbe {
    platform: Platform,
}

impl SystemProbe {
    /// Probe for the platform this binary runs on.
    pub fn new() -> Self {
        Self {
            platform: Platform::current(),
        }
    }

    /// Probe that reports a different platform than the host.
    ///
    /// Commands still execute on the host; this is meant for dry runs and
    /// for inspecting what a run would decide on another OS.
    pub fn with_platform(platform: Platform) -> Self {
        Self { platform }
    }
}

impl Default for SystemProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformProbe for SystemProbe {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn run_command(
        &self,
        command: &StructuredCommand,
        limit: Duration,
    ) -> Result<CommandOutput, ProbeError> {
        debug!(command = %command, "running command");

        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .envs(command.env_vars.iter().cloned())
            .kill_on_drop(true)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = timeout(limit, process.output())
            .await
            .map_err(|_| ProbeError::Timeout {
                program: command.program.clone(),
                duration: limit,
            })?
            .map_err(|e| ProbeError::Spawn {
                program: command.program.clone(),
                kind: e.kind(),
                message: e.to_string(),
            })?;

        let captured = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if !output.status.success() {
            return Err(ProbeError::NonZeroExit {
                program: command.program.clone(),
                output: captured,
            });
        }

        Ok(captured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_text_prefers_stdout() {
        let out = CommandOutput {
            exit_code: Some(0),
            stdout: "Enabled\n".to_string(),
            stderr: "note".to_string(),
        };
        assert_eq!(out.text(), "Enabled\n");
    }

    #[test]
    fn test_output_text_falls_back_to_stderr() {
        let out = CommandOutput {
            exit_code: Some(0),
            stdout: "  \n".to_string(),
            stderr: "openjdk version \"17.0.2\"".to_string(),
        };
        assert_eq!(out.text(), "openjdk version \"17.0.2\"");
    }

    #[test]
    fn test_with_platform_override() {
        let probe = SystemProbe::with_platform(Platform::Windows);
        assert_eq!(probe.platform(), Platform::Windows);
        assert_eq!(SystemProbe::default().platform(), Platform::current());
    }

    #[tokio::test]
    async fn test_spawn_error_for_missing_program() {
        let probe = SystemProbe::new();
        let cmd = StructuredCommand::new("/nonexistent/path/to/detector", Vec::<String>::new());
        let result = probe.run_command(&cmd, Duration::from_secs(2)).await;
        assert!(matches!(result, Err(ProbeError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stderr_on_success_is_not_failure() {
        let probe = SystemProbe::new();
        let cmd = StructuredCommand::new("sh", ["-c", "echo Enabled; echo informational >&2"]);
        let out = probe.run_command(&cmd, Duration::from_secs(5)).await.unwrap();
        assert_eq!(out.exit_code, Some(0));
        assert_eq!(out.stdout.trim(), "Enabled");
        assert_eq!(out.stderr.trim(), "informational");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_typed_failure() {
        let probe = SystemProbe::new();
        let cmd = StructuredCommand::new("sh", ["-c", "echo boom >&2; exit 3"]);
        match probe.run_command(&cmd, Duration::from_secs(5)).await {
            Err(ProbeError::NonZeroExit { program, output }) => {
                assert_eq!(program, "sh");
                assert_eq!(output.exit_code, Some(3));
                assert_eq!(output.stderr.trim(), "boom");
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_command() {
        let probe = SystemProbe::new();
        let cmd = StructuredCommand::new("sleep", ["5"]);
        let result = probe.run_command(&cmd, Duration::from_millis(100)).await;
        assert!(matches!(result, Err(ProbeError::Timeout { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_env_vars_are_passed() {
        let probe = SystemProbe::new();
        let mut cmd = StructuredCommand::new("sh", ["-c", "echo $DEVSUITE_PROBE_TEST"]);
        cmd.env_vars.push(("DEVSUITE_PROBE_TEST".to_string(), "42".to_string()));
        let out = probe.run_command(&cmd, Duration::from_secs(5)).await.unwrap();
        assert_eq!(out.stdout.trim(), "42");
    }

    #[tokio::test]
    async fn test_find_executable_missing_program() {
        let probe = SystemProbe::new();
        assert_eq!(probe.find_executable("devsuite-no-such-tool").await, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_find_executable_on_path() {
        let probe = SystemProbe::with_platform(Platform::Linux);
        let found = probe.find_executable("sh").await.unwrap();
        assert!(found.ends_with("sh"), "{}", found.display());
    }
}
