// SPDX-License-Identifier: MIT OR Apache-2.0
//! Terminal definitions: typed connection points owned by containers.

use crate::wire::WireId;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Offset from a terminal's top-left corner to its visual center.
pub const TERMINAL_CENTER: f32 = 15.0;

/// Unique identifier for a terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerminalId(pub Uuid);

impl TerminalId {
    /// Create a new random terminal ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TerminalId {
    fn default() -> Self {
        Self::new()
    }
}

/// Declarative terminal description, as it appears in container configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Terminal name, unique within its container
    pub name: String,
    /// Direction vector used for bezier tangents and the editing wire
    #[serde(default = "default_direction")]
    pub direction: [f32; 2],
    /// Position of the terminal within its container
    #[serde(default)]
    pub offset: [f32; 2],
    /// Connection type tag
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub wire_type: Option<String>,
    /// Types this terminal accepts; when set, the peer's type must be a member
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_types: Option<Vec<String>>,
    /// Maximum number of attached wires; `None` means unbounded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_wires: Option<usize>,
    /// When set, wires dropped onto this terminal keep it as terminal 1
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub always_src: bool,
}

fn default_direction() -> [f32; 2] {
    [0.0, 1.0]
}

impl TerminalConfig {
    /// Create a config with the given name and defaults everywhere else
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: default_direction(),
            offset: [0.0, 0.0],
            wire_type: None,
            allowed_types: None,
            max_wires: None,
            always_src: false,
        }
    }

    /// Set the direction vector
    pub fn with_direction(mut self, x: f32, y: f32) -> Self {
        self.direction = [x, y];
        self
    }

    /// Set the offset within the container
    pub fn with_offset(mut self, x: f32, y: f32) -> Self {
        self.offset = [x, y];
        self
    }

    /// Set the connection type tag
    pub fn with_type(mut self, wire_type: impl Into<String>) -> Self {
        self.wire_type = Some(wire_type.into());
        self
    }

    /// Set the accepted peer types
    pub fn with_allowed_types(mut self, types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Set the wire capacity
    pub fn with_max_wires(mut self, max: usize) -> Self {
        self.max_wires = Some(max);
        self
    }

    /// Mark wires dropped here as keeping this terminal as terminal 1
    pub fn always_src(mut self) -> Self {
        self.always_src = true;
        self
    }
}

/// A connection point on a container.
///
/// The attached wire list is maintained by the [`Layer`](crate::Layer);
/// capacity is validated by callers before [`add_wire`](Terminal::add_wire)
/// so that the auto-replace policy can run first.
#[derive(Debug, Clone)]
pub struct Terminal {
    /// Unique terminal ID
    pub id: TerminalId,
    /// Terminal name, unique within its container
    pub name: String,
    /// Direction vector used for tangents and the editing wire
    pub direction: Vec2,
    /// Position within the owning container
    pub offset: Vec2,
    /// Connection type tag
    pub wire_type: Option<String>,
    /// Accepted peer types
    pub allowed_types: Option<Vec<String>>,
    /// Wire capacity; `None` means unbounded
    pub max_wires: Option<usize>,
    /// Keep this terminal as terminal 1 when a wire is dropped on it
    pub always_src: bool,
    wires: Vec<WireId>,
    invited: bool,
}

impl Terminal {
    /// Build a terminal from its declarative config
    pub fn from_config(config: &TerminalConfig) -> Self {
        Self {
            id: TerminalId::new(),
            name: config.name.clone(),
            direction: Vec2::from(config.direction),
            offset: Vec2::from(config.offset),
            wire_type: config.wire_type.clone(),
            allowed_types: config.allowed_types.clone(),
            max_wires: config.max_wires,
            always_src: config.always_src,
            wires: Vec::new(),
            invited: false,
        }
    }

    /// Declarative config reproducing this terminal
    pub fn config(&self) -> TerminalConfig {
        TerminalConfig {
            name: self.name.clone(),
            direction: self.direction.into(),
            offset: self.offset.into(),
            wire_type: self.wire_type.clone(),
            allowed_types: self.allowed_types.clone(),
            max_wires: self.max_wires,
            always_src: self.always_src,
        }
    }

    /// Attach a wire. Redundant adds of the same wire are ignored.
    pub fn add_wire(&mut self, wire: WireId) {
        if !self.wires.contains(&wire) {
            self.wires.push(wire);
        }
    }

    /// Detach a wire. Unknown ids are ignored.
    pub fn remove_wire(&mut self, wire: WireId) {
        self.wires.retain(|w| *w != wire);
    }

    /// Wires currently attached to this terminal
    pub fn wires(&self) -> &[WireId] {
        &self.wires
    }

    /// Number of attached wires
    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    /// Whether at least one wire is attached (the "connected" visual state)
    pub fn is_connected(&self) -> bool {
        !self.wires.is_empty()
    }

    /// Whether the terminal holds as many wires as its capacity allows
    pub fn at_capacity(&self) -> bool {
        self.max_wires.is_some_and(|max| self.wires.len() >= max)
    }

    /// Symmetric type-compatibility check.
    ///
    /// If either side declares `allowed_types`, the other side's type must be
    /// a member; otherwise both type tags must be equal.
    pub fn compatible_with(&self, other: &Terminal) -> bool {
        accepts(self, other) && accepts(other, self)
    }

    /// Drop-invitation highlight state, toggled while a drag is in progress
    pub fn invited(&self) -> bool {
        self.invited
    }

    pub(crate) fn set_invited(&mut self, invited: bool) {
        self.invited = invited;
    }
}

fn accepts(terminal: &Terminal, peer: &Terminal) -> bool {
    match &terminal.allowed_types {
        Some(allowed) => peer
            .wire_type
            .as_ref()
            .is_some_and(|t| allowed.iter().any(|a| a == t)),
        None => {
            // Only compare raw tags when the peer does not restrict either;
            // the peer's allowed_types check runs from the other side.
            if peer.allowed_types.is_some() {
                true
            } else {
                terminal.wire_type == peer.wire_type
            }
        }
    }
}
