//! The ordered set of components considered in one run.

use crate::component::{Component, InstallOption, SelectionError};
use crate::descriptor::DescriptorSet;
use crate::platform::Platform;
use thiserror::Error;

/// Rejected change to a [`RequirementSet`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequirementSetError {
    /// A component with the same key is already present.
    #[error("component {0} is already in the requirement set")]
    DuplicateComponent(String),

    /// A component would be installed before one it depends on.
    #[error("{key} requires {requires}, which must come first")]
    OutOfOrder {
        /// Component that depends on `requires`.
        key: String,
        /// Component being inserted too late.
        requires: String,
    },

    /// No component has the key.
    #[error("unknown component {0}")]
    UnknownComponent(String),

    /// The option cannot be selected.
    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// Components of one run, in install order.
///
/// Keys are unique and every component sits after the components it
/// requires, so installing front to back respects dependencies.
///
/// # Example
///
/// ```rust
/// use devsuite_installer::{DescriptorSet, Platform, RequirementSet};
///
/// let descriptors = DescriptorSet::builtin().unwrap();
/// let set = RequirementSet::for_platform(&descriptors, Platform::Linux);
/// let keys: Vec<_> = set.keys().collect();
/// assert_eq!(keys, ["jdk", "cdk"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequirementSet {
    components: Vec<Component>,
}

impl RequirementSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every described component the platform offers, in install order.
    pub fn for_platform(descriptors: &DescriptorSet, platform: Platform) -> Self {
        let components = descriptors
            .iter()
            .filter(|spec| spec.is_applicable(platform))
            .map(|spec| Component::new(spec.clone(), platform))
            .collect();
        Self { components }
    }

    /// Append a component.
    pub fn insert(&mut self, component: Component) -> Result<(), RequirementSetError> {
        if self.get(component.key()).is_some() {
            return Err(RequirementSetError::DuplicateComponent(component.key().to_string()));
        }
        if let Some(dependent) = self
            .components
            .iter()
            .find(|c| c.kind().requires().contains(&component.kind()))
        {
            return Err(RequirementSetError::OutOfOrder {
                key: dependent.key().to_string(),
                requires: component.key().to_string(),
            });
        }
        self.components.push(component);
        Ok(())
    }

    /// Look up a component by key.
    pub fn get(&self, key: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.key() == key)
    }

    /// Look up a component by key for modification.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.key() == key)
    }

    /// Change the selected option of a component.
    pub fn select(&mut self, key: &str, option: InstallOption) -> Result<(), RequirementSetError> {
        let component = self
            .get_mut(key)
            .ok_or_else(|| RequirementSetError::UnknownComponent(key.to_string()))?;
        component.select(option)?;
        Ok(())
    }

    /// Components in install order.
    pub fn iter(&self) -> std::slice::Iter<'_, Component> {
        self.components.iter()
    }

    /// Components in install order, mutably.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Component> {
        self.components.iter_mut()
    }

    /// Keys in install order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.components.iter().map(Component::key)
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Whether every component is either configured or skipped.
    pub fn is_configured(&self) -> bool {
        self.components.iter().all(|c| c.is_configured() || c.is_skipped())
    }
}

impl<'a> IntoIterator for &'a RequirementSet {
    type Item = &'a Component;
    type IntoIter = std::slice::Iter<'a, Component>;

    fn into_iter(self) -> Self::IntoIter {
        self.components.iter()
    }
}
