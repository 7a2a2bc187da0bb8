// SPDX-License-Identifier: MIT OR Apache-2.0
//! The wiring JSON format: save and load of a whole layer.
//!
//! Wire endpoints are encoded as `{ moduleId, terminal }` pairs where
//! `moduleId` is the container's position in the `containers` array in load
//! order. Within one process lifetime the arena keeps that order stable, but
//! the index is a transient foreign key, not an entity id: removing and
//! re-adding containers between a save and an independent load can rebind
//! saved wires. Loads validate every reference and fail as a whole on the
//! first bad one, leaving the layer empty.

use crate::container::ContainerConfig;
use crate::layer::{ConnectError, Layer};
use crate::registry::RegistryError;
use crate::wire::{TerminalRef, Wire, WireKind};
use serde::{Deserialize, Serialize};

/// One wire endpoint in a serialized wiring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEnd {
    /// Container position in the `containers` array, in load order
    #[serde(rename = "moduleId")]
    pub module_id: usize,
    /// Terminal name on that container
    pub terminal: String,
}

/// One wire in a serialized wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSpec {
    /// Wire variant tag; a missing tag selects the default variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xtype: Option<String>,
    /// Optional wire label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Terminal 1
    pub src: WireEnd,
    /// Terminal 2
    pub tgt: WireEnd,
}

/// A complete serialized graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Wiring {
    /// Container configs, in layer order
    pub containers: Vec<ContainerConfig>,
    /// Wire specs referencing `containers` by position
    pub wires: Vec<WireSpec>,
}

impl Wiring {
    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String, WiringError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, WiringError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Error while loading a wiring
#[derive(Debug, thiserror::Error)]
pub enum WiringError {
    /// A container config used an unregistered xtype, or a wire spec an
    /// unknown variant tag
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A wire referenced a container position that does not exist
    #[error("wire {index}: moduleId {module_id} does not resolve to a container")]
    InvalidModuleId {
        /// Position of the wire in the `wires` array
        index: usize,
        /// The unresolvable container position
        module_id: usize,
    },

    /// A wire referenced a terminal name missing from its container
    #[error("wire {index}: container {module_id} has no terminal {terminal:?}")]
    UnknownTerminal {
        /// Position of the wire in the `wires` array
        index: usize,
        /// The referenced container position
        module_id: usize,
        /// The missing terminal name
        terminal: String,
    },

    /// A wire in the file violated a connection rule
    #[error("wire {index}: {source}")]
    InvalidWire {
        /// Position of the wire in the `wires` array
        index: usize,
        /// The violated rule
        source: ConnectError,
    },

    /// Malformed JSON
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Layer {
    /// Serialize the whole graph to a [`Wiring`].
    pub fn get_wiring(&self) -> Wiring {
        Wiring {
            containers: self.containers().map(|c| c.config()).collect(),
            wires: self.wires().filter_map(|w| self.wire_spec(w)).collect(),
        }
    }

    fn wire_spec(&self, wire: &Wire) -> Option<WireSpec> {
        Some(WireSpec {
            xtype: Some(wire.kind.tag().to_string()),
            label: wire.label.clone(),
            src: self.wire_end(&wire.src)?,
            tgt: self.wire_end(&wire.tgt)?,
        })
    }

    fn wire_end(&self, at: &TerminalRef) -> Option<WireEnd> {
        Some(WireEnd {
            module_id: self.container_index(at.container)?,
            terminal: self.terminal(at)?.name.clone(),
        })
    }

    /// Clear the graph and rebuild it from a [`Wiring`], containers first,
    /// then wires, in the order given.
    ///
    /// Any unresolvable reference or rule violation fails the whole load and
    /// leaves the layer empty.
    pub fn set_wiring(&mut self, wiring: &Wiring) -> Result<(), WiringError> {
        self.clear();
        if let Err(err) = self.load_wiring(wiring) {
            self.clear();
            return Err(err);
        }
        tracing::debug!(
            containers = wiring.containers.len(),
            wires = wiring.wires.len(),
            "wiring loaded"
        );
        Ok(())
    }

    fn load_wiring(&mut self, wiring: &Wiring) -> Result<(), WiringError> {
        for config in &wiring.containers {
            self.add_container(config)?;
        }
        for (index, spec) in wiring.wires.iter().enumerate() {
            let kind = WireKind::from_tag(spec.xtype.as_deref())?;
            let src = self.resolve_end(index, &spec.src)?;
            let tgt = self.resolve_end(index, &spec.tgt)?;
            self.connect(src, tgt, kind, spec.label.clone())
                .map_err(|source| WiringError::InvalidWire { index, source })?;
        }
        Ok(())
    }

    fn resolve_end(&self, index: usize, end: &WireEnd) -> Result<TerminalRef, WiringError> {
        let container = self
            .container_at(end.module_id)
            .ok_or(WiringError::InvalidModuleId {
                index,
                module_id: end.module_id,
            })?;
        let terminal = container
            .terminal_by_name(&end.terminal)
            .ok_or_else(|| WiringError::UnknownTerminal {
                index,
                module_id: end.module_id,
                terminal: end.terminal.clone(),
            })?;
        Ok(TerminalRef {
            container: container.id,
            terminal: terminal.id,
        })
    }
}
