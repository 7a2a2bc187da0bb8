// SPDX-License-Identifier: MIT OR Apache-2.0
//! Container definitions: the visual nodes that own terminals.

use crate::terminal::{Terminal, TerminalConfig, TerminalId, TERMINAL_CENTER};
use crate::wire::WireId;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Unique identifier for a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub Uuid);

impl ContainerId {
    /// Create a new random container ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

/// One entry of the `containers` array in a serialized wiring.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Container class tag; a missing tag selects the default class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xtype: Option<String>,
    /// Position on the layer
    #[serde(default)]
    pub position: [f32; 2],
    /// Display title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Width and height, when fixed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<[f32; 2]>,
    /// Inline terminal set, overriding the registered class definition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminals: Option<Vec<TerminalConfig>>,
    /// Reject wires between two terminals of this container
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prevent_self_wiring: Option<bool>,
    /// Node-specific payload
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    /// Remaining node-config fields, preserved across save/load
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl ContainerConfig {
    /// Create a config for the given class tag
    pub fn new(xtype: impl Into<String>) -> Self {
        Self {
            xtype: Some(xtype.into()),
            ..Self::default()
        }
    }

    /// Set the position
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Set the inline terminal set
    pub fn with_terminals(mut self, terminals: impl IntoIterator<Item = TerminalConfig>) -> Self {
        self.terminals = Some(terminals.into_iter().collect());
        self
    }

    /// Set the display title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Error from the value-payload setters
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// A field update was applied to a non-object payload
    #[error("container value is not an object (found {0})")]
    ExpectedObject(&'static str),
}

/// A node on the layer: owns a terminal set and a derived wire list.
#[derive(Debug, Clone)]
pub struct Container {
    /// Unique container ID
    pub id: ContainerId,
    /// Resolved class tag
    pub xtype: String,
    /// Display title
    pub title: Option<String>,
    /// Position on the layer
    pub position: Vec2,
    /// Width and height, when fixed
    pub size: Option<Vec2>,
    /// Reject wires between two terminals of this container
    pub prevent_self_wiring: bool,
    terminals: Vec<Terminal>,
    wires: Vec<WireId>,
    value: Value,
    extra: serde_json::Map<String, Value>,
}

impl Container {
    pub(crate) fn build(
        xtype: String,
        config: &ContainerConfig,
        terminals: &[TerminalConfig],
        prevent_self_wiring: bool,
        default_value: &Value,
    ) -> Self {
        let value = if config.value.is_null() {
            default_value.clone()
        } else {
            config.value.clone()
        };
        Self {
            id: ContainerId::new(),
            xtype,
            title: config.title.clone(),
            position: Vec2::from(config.position),
            size: config.size.map(Vec2::from),
            prevent_self_wiring,
            terminals: terminals.iter().map(Terminal::from_config).collect(),
            wires: Vec::new(),
            value,
            extra: config.extra.clone(),
        }
    }

    /// Append a terminal built from the given config, returning its id.
    pub fn add_terminal(&mut self, config: &TerminalConfig) -> TerminalId {
        let terminal = Terminal::from_config(config);
        let id = terminal.id;
        self.terminals.push(terminal);
        id
    }

    /// All terminals, in declaration order
    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    pub(crate) fn terminals_mut(&mut self) -> &mut [Terminal] {
        &mut self.terminals
    }

    /// Look up a terminal by id
    pub fn terminal(&self, id: TerminalId) -> Option<&Terminal> {
        self.terminals.iter().find(|t| t.id == id)
    }

    pub(crate) fn terminal_mut(&mut self, id: TerminalId) -> Option<&mut Terminal> {
        self.terminals.iter_mut().find(|t| t.id == id)
    }

    /// Look up a terminal by name
    pub fn terminal_by_name(&self, name: &str) -> Option<&Terminal> {
        self.terminals.iter().find(|t| t.name == name)
    }

    /// Absolute position of a terminal's center: container position plus the
    /// terminal offset plus the fixed center offset. The offset accumulation
    /// stops at the layer boundary.
    pub fn terminal_position(&self, id: TerminalId) -> Option<Vec2> {
        self.terminal(id)
            .map(|t| self.position + t.offset + Vec2::splat(TERMINAL_CENTER))
    }

    /// Derived wire list: the deduplicated union of all terminals' wires,
    /// maintained incrementally as wires come and go.
    pub fn wires(&self) -> &[WireId] {
        &self.wires
    }

    pub(crate) fn add_wire(&mut self, wire: WireId) {
        if !self.wires.contains(&wire) {
            self.wires.push(wire);
        }
    }

    pub(crate) fn remove_wire(&mut self, wire: WireId) {
        // Keep the entry while any terminal still references the wire
        // (a self-wire detaches one endpoint at a time).
        if self.terminals.iter().all(|t| !t.wires().contains(&wire)) {
            self.wires.retain(|w| *w != wire);
        }
    }

    /// Node-specific payload
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Replace the node-specific payload wholesale
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
    }

    /// Update one field of an object-shaped payload.
    ///
    /// Fails when the current payload is a scalar or array: typed containers
    /// expect an object here, and a shape mismatch is a caller bug.
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) -> Result<(), ValueError> {
        match &mut self.value {
            Value::Object(map) => {
                map.insert(name.into(), value);
                Ok(())
            }
            Value::Null => {
                let mut map = serde_json::Map::new();
                map.insert(name.into(), value);
                self.value = Value::Object(map);
                Ok(())
            }
            Value::Bool(_) => Err(ValueError::ExpectedObject("bool")),
            Value::Number(_) => Err(ValueError::ExpectedObject("number")),
            Value::String(_) => Err(ValueError::ExpectedObject("string")),
            Value::Array(_) => Err(ValueError::ExpectedObject("array")),
        }
    }

    /// Serializable config reproducing this container
    pub fn config(&self) -> ContainerConfig {
        ContainerConfig {
            xtype: Some(self.xtype.clone()),
            position: self.position.into(),
            title: self.title.clone(),
            size: self.size.map(Into::into),
            terminals: Some(self.terminals.iter().map(Terminal::config).collect()),
            prevent_self_wiring: self.prevent_self_wiring.then_some(true),
            value: self.value.clone(),
            extra: self.extra.clone(),
        }
    }
}
