//! Bookkeeping for one install run.

use super::requirements::RequirementSet;
use crate::component::Action;
use serde::Serialize;

/// Progress of one component within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Selected, not started yet.
    Pending,
    /// Currently being fetched or installed.
    Running,
    /// Installed.
    Success,
    /// Failed; the session carries on with the next component.
    Failed,
    /// Not selected, or never reached because the session was cancelled.
    Skipped,
}

/// State of an install run over a [`RequirementSet`].
///
/// Created with the selections frozen, then walked front to back with
/// [`start_next`](Self::start_next) and [`finish`](Self::finish).
#[derive(Debug, Clone)]
pub struct InstallSession {
    entries: Vec<(String, Outcome)>,
    cursor: usize,
    error: bool,
    cancelled: bool,
}

impl InstallSession {
    /// Start a session over the current selections of `set`.
    ///
    /// Components whose action is `Skip` start out `Skipped`.
    pub fn new(set: &RequirementSet) -> Self {
        let entries = set
            .iter()
            .map(|c| {
                let outcome = match c.action() {
                    Action::Skip => Outcome::Skipped,
                    Action::Install | Action::Upgrade => Outcome::Pending,
                };
                (c.key().to_string(), outcome)
            })
            .collect();

        Self {
            entries,
            cursor: 0,
            error: false,
            cancelled: false,
        }
    }

    /// Mark the next pending component `Running` and return its key.
    pub fn start_next(&mut self) -> Option<String> {
        if self.cancelled {
            return None;
        }
        while let Some((key, outcome)) = self.entries.get_mut(self.cursor) {
            self.cursor += 1;
            if *outcome == Outcome::Pending {
                *outcome = Outcome::Running;
                return Some(key.clone());
            }
        }
        None
    }

    /// Record the result of a component.
    ///
    /// A `Failed` outcome sets the session error flag. A component that
    /// succeeded may still be failed later by its post-install step.
    pub fn finish(&mut self, key: &str, outcome: Outcome) {
        if let Some((_, current)) = self.entries.iter_mut().find(|(k, _)| k == key) {
            *current = outcome;
        }
        if outcome == Outcome::Failed {
            self.error = true;
        }
    }

    /// Stop the session: everything not yet finished becomes `Skipped`.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        for (_, outcome) in &mut self.entries {
            if matches!(outcome, Outcome::Pending | Outcome::Running) {
                *outcome = Outcome::Skipped;
            }
        }
    }

    /// Outcome recorded for a component.
    pub fn outcome(&self, key: &str) -> Option<Outcome> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, o)| *o)
    }

    /// Whether any component failed.
    pub fn has_errors(&self) -> bool {
        self.error
    }

    /// Whether the session was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Final tally.
    pub fn summary(&self) -> InstallSummary {
        let keys = |wanted: Outcome| {
            self.entries
                .iter()
                .filter(|(_, o)| *o == wanted)
                .map(|(k, _)| k.clone())
                .collect()
        };
        InstallSummary {
            succeeded: keys(Outcome::Success),
            failed: keys(Outcome::Failed),
            skipped: keys(Outcome::Skipped),
            cancelled: self.cancelled,
        }
    }
}

/// Result of an install session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallSummary {
    /// Keys installed successfully.
    pub succeeded: Vec<String>,
    /// Keys that failed.
    pub failed: Vec<String>,
    /// Keys not acted on.
    pub skipped: Vec<String>,
    /// Whether the session was cancelled.
    pub cancelled: bool,
}

impl InstallSummary {
    /// No failures and not cancelled.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.cancelled
    }

    /// Process exit code: 0 on success, 1 on failure, 130 when cancelled.
    pub fn exit_code(&self) -> i32 {
        if self.cancelled {
            130
        } else if !self.failed.is_empty() {
            1
        } else {
            0
        }
    }
}
