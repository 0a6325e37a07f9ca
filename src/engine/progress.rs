//! Per-component progress events.
//!
//! The engine reports every state transition of a component as a
//! [`ComponentEvent`] to a [`Reporter`]. How events are rendered is up to
//! the caller; any `Fn(ComponentEvent)` closure is a reporter.

use crate::component::{Component, ComponentState, VersionWarning};
use semver::Version;
use tracing::{debug, info, warn};

/// Snapshot of one component after a state transition.
///
/// # Example
///
/// ```rust
/// use devsuite_installer::{ComponentEvent, ComponentState};
///
/// fn on_event(event: ComponentEvent) {
///     match event.state {
///         ComponentState::Installing => println!("Installing {}...", event.key),
///         ComponentState::Failed => {
///             println!("{} failed: {}", event.key, event.error_message.unwrap_or_default())
///         }
///         _ => {}
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentEvent {
    /// Component key.
    pub key: String,
    /// State just entered.
    pub state: ComponentState,
    /// Detected or installed version.
    pub installed_version: Option<Version>,
    /// Version warning from detection.
    pub warning: Option<VersionWarning>,
    /// Failure message when `state` is `Failed`.
    pub error_message: Option<String>,
}

impl ComponentEvent {
    /// Capture the current state of a component.
    pub fn from_component(component: &Component) -> Self {
        Self {
            key: component.key().to_string(),
            state: component.state(),
            installed_version: component.installed_version().cloned(),
            warning: component.warning(),
            error_message: component.error_message().map(str::to_string),
        }
    }

    /// Whether the component reached a final install state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            ComponentState::Succeeded | ComponentState::Failed | ComponentState::NotApplicable
        )
    }
}

impl From<&Component> for ComponentEvent {
    fn from(component: &Component) -> Self {
        Self::from_component(component)
    }
}

/// Sink for component events.
pub trait Reporter: Send + Sync {
    /// Receive one event.
    fn report(&self, event: ComponentEvent);
}

impl<F> Reporter for F
where
    F: Fn(ComponentEvent) + Send + Sync,
{
    fn report(&self, event: ComponentEvent) {
        self(event)
    }
}

/// Reporter that writes events to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: ComponentEvent) {
        let version = event
            .installed_version
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        match event.state {
            ComponentState::Detecting => debug!(key = %event.key, "detecting"),
            ComponentState::Failed => warn!(
                key = %event.key,
                error = event.error_message.as_deref().unwrap_or("unknown error"),
                "component failed"
            ),
            _ => info!(
                key = %event.key,
                state = %event.state,
                version = %version,
                warning = ?event.warning,
                "component update"
            ),
        }
    }
}
