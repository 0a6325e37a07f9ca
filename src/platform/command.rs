//! Structured command description with placeholder substitution.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A structured command for programmatic execution.
///
/// Install templates use `{name}` placeholders in their arguments (for
/// example `{artifact}` for the downloaded installer and `{target}` for the
/// install directory); [`StructuredCommand::substitute`] fills them in.
///
/// # Example
///
/// ```rust
/// use devsuite_installer::StructuredCommand;
///
/// let template = StructuredCommand::new("msiexec", ["/i", "{artifact}", "/qn"]);
/// let cmd = template.substitute(&[("artifact", "C:\\cache\\jdk.msi")]);
/// assert_eq!(cmd.args[1], "C:\\cache\\jdk.msi");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredCommand {
    /// The program to execute (e.g., "powershell", "msiexec", "tar").
    pub program: String,

    /// Arguments to pass to the program.
    pub args: Vec<String>,

    /// Environment variables to set before execution (key, value pairs).
    pub env_vars: Vec<(String, String)>,
}

impl StructuredCommand {
    /// Build a command with no extra environment.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            env_vars: Vec::new(),
        }
    }

    /// Return a copy with every `{name}` placeholder replaced.
    ///
    /// Placeholders without a value are left untouched. Substitution happens
    /// per argument, so values containing spaces never split an argument.
    pub fn substitute(&self, vars: &[(&str, &str)]) -> Self {
        let fill = |text: &str| {
            vars.iter().fold(text.to_string(), |acc, (name, value)| {
                acc.replace(&format!("{{{name}}}"), value)
            })
        };

        Self {
            program: fill(&self.program),
            args: self.args.iter().map(|arg| fill(arg)).collect(),
            env_vars: self
                .env_vars
                .iter()
                .map(|(k, v)| (k.clone(), fill(v)))
                .collect(),
        }
    }
}

impl fmt::Display for StructuredCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(' ') {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}
