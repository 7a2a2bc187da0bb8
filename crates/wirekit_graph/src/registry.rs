// SPDX-License-Identifier: MIT OR Apache-2.0
//! The xtype registry: string tags resolved to container class definitions.
//!
//! Resolution is explicit, not a namespace lookup: a registry is built once
//! and handed to the [`Layer`](crate::Layer). Resolving an unknown tag is a
//! construction-time error; an absent tag falls back to the default class.

use crate::container::{Container, ContainerConfig};
use crate::terminal::TerminalConfig;
use indexmap::IndexMap;
use serde_json::Value;

/// Tag of the always-registered default container class.
pub const DEFAULT_CONTAINER_XTYPE: &str = "container";

/// Error from xtype resolution
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No class registered under the given tag
    #[error("no class registered for xtype {0:?}")]
    UnknownXtype(String),
}

/// Declarative container class: the terminal set and flags instances start with.
#[derive(Debug, Clone, Default)]
pub struct ContainerDef {
    /// Default terminal set for instances of this class
    pub terminals: Vec<TerminalConfig>,
    /// Default size for instances of this class
    pub size: Option<[f32; 2]>,
    /// Reject wires between two terminals of the same instance
    pub prevent_self_wiring: bool,
    /// Initial value payload when the config carries none
    pub default_value: Value,
}

impl ContainerDef {
    /// Create a def with the given terminal set
    pub fn with_terminals(terminals: impl IntoIterator<Item = TerminalConfig>) -> Self {
        Self {
            terminals: terminals.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Flag instances as rejecting self-wires
    pub fn prevent_self_wiring(mut self) -> Self {
        self.prevent_self_wiring = true;
        self
    }

    /// Set the initial value payload
    pub fn with_default_value(mut self, value: Value) -> Self {
        self.default_value = value;
        self
    }
}

/// Registry of container classes by xtype tag.
#[derive(Debug, Clone)]
pub struct Registry {
    classes: IndexMap<String, ContainerDef>,
}

impl Registry {
    /// Create a registry holding only the default class (no terminals).
    pub fn new() -> Self {
        let mut classes = IndexMap::new();
        classes.insert(DEFAULT_CONTAINER_XTYPE.to_string(), ContainerDef::default());
        Self { classes }
    }

    /// Register a class under a tag, replacing any previous definition.
    pub fn register(&mut self, xtype: impl Into<String>, def: ContainerDef) {
        self.classes.insert(xtype.into(), def);
    }

    /// Look up a class definition
    pub fn get(&self, xtype: &str) -> Option<&ContainerDef> {
        self.classes.get(xtype)
    }

    /// All registered tags, in registration order
    pub fn xtypes(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Build a container from a config.
    ///
    /// An explicit unknown tag is a hard error. A missing tag resolves to the
    /// default class. Inline terminals in the config replace the class's set.
    pub fn build(&self, config: &ContainerConfig) -> Result<Container, RegistryError> {
        let xtype = config.xtype.as_deref().unwrap_or(DEFAULT_CONTAINER_XTYPE);
        let def = self
            .get(xtype)
            .ok_or_else(|| RegistryError::UnknownXtype(xtype.to_string()))?;
        let terminals = config.terminals.as_deref().unwrap_or(&def.terminals);
        let prevent_self_wiring = config.prevent_self_wiring.unwrap_or(def.prevent_self_wiring);
        let mut container = Container::build(
            xtype.to_string(),
            config,
            terminals,
            prevent_self_wiring,
            &def.default_value,
        );
        if container.size.is_none() {
            container.size = def.size.map(glam::Vec2::from);
        }
        Ok(container)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_class_fallback() {
        let registry = Registry::new();
        let container = registry.build(&ContainerConfig::default()).expect("default class");
        assert_eq!(container.xtype, DEFAULT_CONTAINER_XTYPE);
        assert!(container.terminals().is_empty());
    }

    #[test]
    fn test_unknown_xtype_is_fatal() {
        let registry = Registry::new();
        let err = registry.build(&ContainerConfig::new("bpmn.task")).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownXtype(tag) if tag == "bpmn.task"));
    }

    #[test]
    fn test_registered_class_terminals() {
        let mut registry = Registry::new();
        registry.register(
            "gate",
            ContainerDef::with_terminals([
                TerminalConfig::new("in1").with_type("input"),
                TerminalConfig::new("out").with_type("output"),
            ])
            .prevent_self_wiring(),
        );

        let container = registry.build(&ContainerConfig::new("gate")).expect("gate");
        assert_eq!(container.terminals().len(), 2);
        assert!(container.prevent_self_wiring);

        // Inline terminals override the class set.
        let container = registry
            .build(&ContainerConfig::new("gate").with_terminals([TerminalConfig::new("solo")]))
            .expect("gate");
        assert_eq!(container.terminals().len(), 1);
        assert_eq!(container.terminals()[0].name, "solo");
    }
}
