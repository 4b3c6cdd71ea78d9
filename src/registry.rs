//! Name to component lookup.

use std::collections::BTreeMap;
use crate::components::ComponentType;

/// Components of the robot by name. The component name is also the name of its frame.
#[derive(Default, Clone)]
pub struct ResourceRegistry {
    components: BTreeMap<String, ComponentType>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the component, replacing and returning any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, component: ComponentType) -> Option<ComponentType> {
        self.components.insert(name.into(), component)
    }

    /// None if there is no such component.
    pub fn get(&self, name: &str) -> Option<ComponentType> {
        self.components.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.components.keys().map(|name| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ComponentType)> {
        self.components.iter().map(|(name, component)| (name.as_str(), component))
    }
}
