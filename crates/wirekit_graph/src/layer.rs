// SPDX-License-Identifier: MIT OR Apache-2.0
//! The layer: graph root owning all containers and the derived wire set.

use crate::container::{Container, ContainerConfig, ContainerId};
use crate::event::{LayerEvents, WireEvent};
use crate::registry::{Registry, RegistryError};
use crate::terminal::{Terminal, TerminalId};
use crate::wire::{TerminalRef, Wire, WireId, WireKind};
use glam::Vec2;
use indexmap::IndexMap;

/// Error when creating a wire
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Container not found
    #[error("container not found: {0:?}")]
    ContainerNotFound(ContainerId),

    /// Terminal not found on its container
    #[error("terminal not found: {0:?}")]
    TerminalNotFound(TerminalId),

    /// The symmetric type check failed
    #[error("incompatible terminal types")]
    IncompatibleTypes,

    /// Both endpoints on a container that prevents self-wiring, or the same terminal
    #[error("self-wiring not allowed")]
    SelfWiring,

    /// A wire already connects this terminal pair
    #[error("wire already exists between these terminals")]
    DuplicateWire,

    /// A multi-capacity endpoint is full
    #[error("terminal is at capacity: {0:?}")]
    TerminalFull(TerminalId),
}

/// The graph root.
///
/// Containers and wires live in insertion-ordered arenas keyed by stable ids;
/// ids are never reused, and removal preserves the order of the survivors.
/// Serialization (see [`Wiring`](crate::Wiring)) encodes wire endpoints by
/// container position in that order.
#[derive(Debug)]
pub struct Layer {
    containers: IndexMap<ContainerId, Container>,
    wires: IndexMap<WireId, Wire>,
    registry: Registry,
    /// Event channels fired on structural mutation
    pub events: LayerEvents,
}

impl Layer {
    /// Create an empty layer with a default registry
    pub fn new() -> Self {
        Self::with_registry(Registry::new())
    }

    /// Create an empty layer with the given registry
    pub fn with_registry(registry: Registry) -> Self {
        Self {
            containers: IndexMap::new(),
            wires: IndexMap::new(),
            registry,
            events: LayerEvents::default(),
        }
    }

    /// The xtype registry used for container construction
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable access to the registry
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    // ---- containers ------------------------------------------------------

    /// Build a container from its config and add it to the layer.
    pub fn add_container(&mut self, config: &ContainerConfig) -> Result<ContainerId, RegistryError> {
        let container = self.registry.build(config)?;
        let id = container.id;
        tracing::debug!(?id, xtype = %container.xtype, "add container");
        self.containers.insert(id, container);
        self.events.changed.emit(&());
        Ok(id)
    }

    /// Remove a container, cascading to every wire touching any of its
    /// terminals. Unknown ids are a no-op.
    pub fn remove_container(&mut self, id: ContainerId) -> Option<Container> {
        if !self.containers.contains_key(&id) {
            return None;
        }
        let attached: Vec<WireId> = self
            .wires
            .values()
            .filter(|w| w.involves_container(id))
            .map(|w| w.id)
            .collect();
        for wire in attached {
            self.disconnect(wire);
        }
        tracing::debug!(?id, "remove container");
        let container = self.containers.shift_remove(&id);
        self.events.changed.emit(&());
        container
    }

    /// Get a container by ID
    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.get(&id)
    }

    /// Get a mutable container by ID
    pub fn container_mut(&mut self, id: ContainerId) -> Option<&mut Container> {
        self.containers.get_mut(&id)
    }

    /// All containers, in insertion order
    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.values()
    }

    /// All container IDs, in insertion order
    pub fn container_ids(&self) -> impl Iterator<Item = ContainerId> + '_ {
        self.containers.keys().copied()
    }

    /// Number of containers
    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    pub(crate) fn container_index(&self, id: ContainerId) -> Option<usize> {
        self.containers.get_index_of(&id)
    }

    pub(crate) fn container_at(&self, index: usize) -> Option<&Container> {
        self.containers.get_index(index).map(|(_, c)| c)
    }

    /// Move a container and recompute every attached wire path.
    pub fn move_container(&mut self, id: ContainerId, position: Vec2) {
        if let Some(container) = self.containers.get_mut(&id) {
            container.position = position;
            self.redraw_container(id);
        }
    }

    /// Resize a container and recompute every attached wire path.
    pub fn resize_container(&mut self, id: ContainerId, size: Vec2) {
        if let Some(container) = self.containers.get_mut(&id) {
            container.size = Some(size);
            self.redraw_container(id);
        }
    }

    // ---- terminals -------------------------------------------------------

    /// Resolve a terminal by container id and terminal name.
    pub fn terminal_ref(&self, container: ContainerId, name: &str) -> Option<TerminalRef> {
        let terminal = self.containers.get(&container)?.terminal_by_name(name)?;
        Some(TerminalRef {
            container,
            terminal: terminal.id,
        })
    }

    /// Look up the terminal behind an endpoint address
    pub fn terminal(&self, at: &TerminalRef) -> Option<&Terminal> {
        self.containers.get(&at.container)?.terminal(at.terminal)
    }

    /// Absolute position of a terminal's center, in layer space
    pub fn terminal_position(&self, at: &TerminalRef) -> Option<Vec2> {
        self.containers
            .get(&at.container)?
            .terminal_position(at.terminal)
    }

    /// Remove every wire attached to a terminal, first-to-last.
    pub fn remove_terminal_wires(&mut self, at: &TerminalRef) {
        // Wires unregister themselves from the terminal's list as they go,
        // so drain by always taking the current first entry.
        while let Some(&wire) = self.terminal(at).and_then(|t| t.wires().first()) {
            self.disconnect(wire);
        }
    }

    // ---- wires -----------------------------------------------------------

    /// Create a wire between two terminals.
    ///
    /// Validation order: endpoint resolution, symmetric type compatibility,
    /// self-wiring prevention, duplicate prevention, then capacity. A
    /// single-capacity endpoint at capacity has its existing wire evicted; a
    /// multi-capacity endpoint at capacity rejects the connection.
    ///
    /// Endpoint roles: `src` becomes terminal 1 unless the target declares
    /// `always_src`, in which case the roles swap.
    pub fn connect(
        &mut self,
        src: TerminalRef,
        tgt: TerminalRef,
        kind: WireKind,
        label: Option<String>,
    ) -> Result<WireId, ConnectError> {
        if src == tgt {
            return Err(ConnectError::SelfWiring);
        }

        let src_container = self
            .containers
            .get(&src.container)
            .ok_or(ConnectError::ContainerNotFound(src.container))?;
        let tgt_container = self
            .containers
            .get(&tgt.container)
            .ok_or(ConnectError::ContainerNotFound(tgt.container))?;
        let src_terminal = src_container
            .terminal(src.terminal)
            .ok_or(ConnectError::TerminalNotFound(src.terminal))?;
        let tgt_terminal = tgt_container
            .terminal(tgt.terminal)
            .ok_or(ConnectError::TerminalNotFound(tgt.terminal))?;

        if !src_terminal.compatible_with(tgt_terminal) {
            return Err(ConnectError::IncompatibleTypes);
        }

        if src.container == tgt.container
            && (src_container.prevent_self_wiring || tgt_container.prevent_self_wiring)
        {
            return Err(ConnectError::SelfWiring);
        }

        if self.wires.values().any(|w| w.connects(&src, &tgt)) {
            return Err(ConnectError::DuplicateWire);
        }

        // Capacity: single-capacity endpoints auto-replace, larger ones reject.
        let mut evictions = Vec::new();
        for (at, terminal) in [(src, src_terminal), (tgt, tgt_terminal)] {
            if terminal.at_capacity() {
                if terminal.max_wires == Some(1) {
                    evictions.push(terminal.wires()[0]);
                } else {
                    return Err(ConnectError::TerminalFull(at.terminal));
                }
            }
        }
        let swap_roles = tgt_terminal.always_src && !src_terminal.always_src;
        for wire in evictions {
            self.disconnect(wire);
        }

        let (term1, term2) = if swap_roles { (tgt, src) } else { (src, tgt) };
        let mut wire = Wire::new(kind, term1, term2);
        wire.label = label;
        let id = wire.id;
        tracing::debug!(?id, ?kind, "add wire");
        self.wires.insert(id, wire);
        self.attach(id, term1, term2);
        self.redraw_wire(id);
        self.events.wire_added.emit(&WireEvent {
            wire: id,
            src: term1,
            tgt: term2,
        });
        Ok(id)
    }

    fn attach(&mut self, wire: WireId, term1: TerminalRef, term2: TerminalRef) {
        for at in [term1, term2] {
            if let Some(container) = self.containers.get_mut(&at.container) {
                if let Some(terminal) = container.terminal_mut(at.terminal) {
                    terminal.add_wire(wire);
                }
                container.add_wire(wire);
            }
        }
    }

    /// Remove a wire, detaching it from both terminals and containers.
    /// Redundant removal is a no-op.
    pub fn disconnect(&mut self, id: WireId) -> Option<Wire> {
        let wire = self.wires.shift_remove(&id)?;
        tracing::debug!(?id, "remove wire");
        for at in [wire.src, wire.tgt] {
            if let Some(container) = self.containers.get_mut(&at.container) {
                if let Some(terminal) = container.terminal_mut(at.terminal) {
                    terminal.remove_wire(id);
                }
                container.remove_wire(id);
            }
        }
        self.events.wire_removed.emit(&WireEvent {
            wire: id,
            src: wire.src,
            tgt: wire.tgt,
        });
        Some(wire)
    }

    /// Get a wire by ID
    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(&id)
    }

    /// All wires, in insertion order
    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        self.wires.values()
    }

    /// Number of wires
    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    /// Derived wire list of one container
    pub fn container_wires(&self, id: ContainerId) -> &[WireId] {
        self.containers.get(&id).map(Container::wires).unwrap_or(&[])
    }

    // ---- geometry --------------------------------------------------------

    /// Recompute one wire's path from its current endpoint positions.
    pub fn redraw_wire(&mut self, id: WireId) -> bool {
        let Some(wire) = self.wires.get(&id) else {
            return false;
        };
        let (src, tgt, kind, style) = (wire.src, wire.tgt, wire.kind, wire.style.clone());
        let path = match (
            self.terminal_position(&src),
            self.terminal_position(&tgt),
            self.terminal(&src),
            self.terminal(&tgt),
        ) {
            (Some(p1), Some(p2), Some(t1), Some(t2)) => {
                tracing::trace!(?id, "redraw wire");
                kind.compute(p1, p2, t1.direction, t2.direction, &style)
            }
            _ => None,
        };
        match self.wires.get_mut(&id) {
            Some(wire) => {
                wire.path = path;
                true
            }
            None => false,
        }
    }

    /// Recompute every wire touching a container (after a move or resize).
    pub fn redraw_container(&mut self, id: ContainerId) {
        let attached: Vec<WireId> = self.container_wires(id).to_vec();
        for wire in attached {
            self.redraw_wire(wire);
        }
    }

    // ---- drop invitation -------------------------------------------------

    /// Terminals a drag from `src` may legally land on: type-compatible and
    /// not blocked by self-wiring. Capacity is deliberately ignored; it is
    /// only checked at drop time.
    pub fn drop_candidates(&self, src: &TerminalRef) -> Vec<TerminalRef> {
        let Some(src_terminal) = self.terminal(src) else {
            return Vec::new();
        };
        let src_prevents = self
            .containers
            .get(&src.container)
            .is_some_and(|c| c.prevent_self_wiring);
        let mut candidates = Vec::new();
        for container in self.containers.values() {
            if container.id == src.container && (src_prevents || container.prevent_self_wiring) {
                continue;
            }
            for terminal in container.terminals() {
                let at = TerminalRef {
                    container: container.id,
                    terminal: terminal.id,
                };
                if at != *src && terminal.compatible_with(src_terminal) {
                    candidates.push(at);
                }
            }
        }
        candidates
    }

    /// Toggle the drop-invitation highlight on all candidates for `src`.
    /// Turning invitations off clears every flag on the layer.
    pub fn set_drop_invitations(&mut self, src: &TerminalRef, on: bool) {
        if on {
            for at in self.drop_candidates(src) {
                if let Some(container) = self.containers.get_mut(&at.container) {
                    if let Some(terminal) = container.terminal_mut(at.terminal) {
                        terminal.set_invited(true);
                    }
                }
            }
        } else {
            for container in self.containers.values_mut() {
                for terminal in container.terminals_mut() {
                    terminal.set_invited(false);
                }
            }
        }
    }

    /// Remove every container, cascading to all terminals and wires.
    pub fn clear(&mut self) {
        let ids: Vec<ContainerId> = self.containers.keys().copied().collect();
        for id in ids {
            self.remove_container(id);
        }
    }
}

impl Default for Layer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::TerminalConfig;
    use std::cell::Cell;
    use std::rc::Rc;

    fn two_containers(layer: &mut Layer) -> (TerminalRef, TerminalRef) {
        let a = layer
            .add_container(
                &ContainerConfig::new("container")
                    .at(0.0, 0.0)
                    .with_terminals([TerminalConfig::new("out")
                        .with_type("output")
                        .with_direction(1.0, 0.0)]),
            )
            .unwrap();
        let b = layer
            .add_container(
                &ContainerConfig::new("container")
                    .at(100.0, 0.0)
                    .with_terminals([TerminalConfig::new("in")
                        .with_type("input")
                        .with_allowed_types(["output"])
                        .with_direction(-1.0, 0.0)
                        .with_max_wires(1)]),
            )
            .unwrap();
        (
            layer.terminal_ref(a, "out").unwrap(),
            layer.terminal_ref(b, "in").unwrap(),
        )
    }

    #[test]
    fn test_connect_registers_everywhere() {
        let mut layer = Layer::new();
        let (src, tgt) = two_containers(&mut layer);
        let wire = layer.connect(src, tgt, WireKind::Bezier, None).unwrap();

        assert_eq!(layer.wire_count(), 1);
        assert_eq!(layer.terminal(&src).unwrap().wires(), &[wire]);
        assert_eq!(layer.terminal(&tgt).unwrap().wires(), &[wire]);
        assert_eq!(layer.container_wires(src.container), &[wire]);
        assert_eq!(layer.container_wires(tgt.container), &[wire]);
        assert!(layer.wire(wire).unwrap().path().is_some());
    }

    #[test]
    fn test_duplicate_rejected_either_order() {
        let mut layer = Layer::new();
        let (src, tgt) = two_containers(&mut layer);
        layer.connect(src, tgt, WireKind::Straight, None).unwrap();

        assert!(matches!(
            layer.connect(src, tgt, WireKind::Straight, None),
            Err(ConnectError::DuplicateWire)
        ));
        assert!(matches!(
            layer.connect(tgt, src, WireKind::Straight, None),
            Err(ConnectError::DuplicateWire)
        ));
        assert_eq!(layer.wire_count(), 1);
    }

    #[test]
    fn test_incompatible_types_rejected() {
        let mut layer = Layer::new();
        let a = layer
            .add_container(&ContainerConfig::default().with_terminals([
                TerminalConfig::new("x").with_type("power"),
            ]))
            .unwrap();
        let b = layer
            .add_container(&ContainerConfig::default().with_terminals([
                TerminalConfig::new("y").with_type("signal"),
            ]))
            .unwrap();
        let x = layer.terminal_ref(a, "x").unwrap();
        let y = layer.terminal_ref(b, "y").unwrap();
        assert!(matches!(
            layer.connect(x, y, WireKind::Straight, None),
            Err(ConnectError::IncompatibleTypes)
        ));
    }

    #[test]
    fn test_self_wiring_prevention() {
        let mut layer = Layer::new();
        let id = layer
            .add_container(&ContainerConfig {
                prevent_self_wiring: Some(true),
                ..ContainerConfig::default()
            }
            .with_terminals([TerminalConfig::new("a"), TerminalConfig::new("b")]))
            .unwrap();
        let a = layer.terminal_ref(id, "a").unwrap();
        let b = layer.terminal_ref(id, "b").unwrap();

        assert!(matches!(
            layer.connect(a, b, WireKind::Straight, None),
            Err(ConnectError::SelfWiring)
        ));
        // Same terminal twice is always a self-wire.
        assert!(matches!(
            layer.connect(a, a, WireKind::Straight, None),
            Err(ConnectError::SelfWiring)
        ));
    }

    #[test]
    fn test_self_wiring_allowed_when_not_prevented() {
        let mut layer = Layer::new();
        let id = layer
            .add_container(&ContainerConfig::default().with_terminals([
                TerminalConfig::new("a"),
                TerminalConfig::new("b"),
            ]))
            .unwrap();
        let a = layer.terminal_ref(id, "a").unwrap();
        let b = layer.terminal_ref(id, "b").unwrap();
        layer.connect(a, b, WireKind::Straight, None).unwrap();

        // The container's derived list holds the self-wire once.
        assert_eq!(layer.container_wires(id).len(), 1);
    }

    #[test]
    fn test_capacity_eviction_single() {
        let mut layer = Layer::new();
        let (src, tgt) = two_containers(&mut layer);
        let other = layer
            .add_container(&ContainerConfig::default().with_terminals([
                TerminalConfig::new("out2").with_type("output"),
            ]))
            .unwrap();
        let src2 = layer.terminal_ref(other, "out2").unwrap();

        let first = layer.connect(src, tgt, WireKind::Bezier, None).unwrap();
        let second = layer.connect(src2, tgt, WireKind::Bezier, None).unwrap();

        // The single-capacity target auto-replaced its wire.
        assert!(layer.wire(first).is_none());
        assert_eq!(layer.terminal(&tgt).unwrap().wires(), &[second]);
        assert_eq!(layer.wire_count(), 1);
    }

    #[test]
    fn test_capacity_reject_multi() {
        let mut layer = Layer::new();
        let hub = layer
            .add_container(&ContainerConfig::default().with_terminals([
                TerminalConfig::new("in").with_max_wires(2),
            ]))
            .unwrap();
        let tgt = layer.terminal_ref(hub, "in").unwrap();

        let mut sources = Vec::new();
        for name in ["s1", "s2", "s3"] {
            let c = layer
                .add_container(
                    &ContainerConfig::default().with_terminals([TerminalConfig::new(name)]),
                )
                .unwrap();
            sources.push(layer.terminal_ref(c, name).unwrap());
        }

        layer.connect(sources[0], tgt, WireKind::Straight, None).unwrap();
        layer.connect(sources[1], tgt, WireKind::Straight, None).unwrap();
        assert!(matches!(
            layer.connect(sources[2], tgt, WireKind::Straight, None),
            Err(ConnectError::TerminalFull(_))
        ));

        // Capacity invariant holds after every operation.
        let t = layer.terminal(&tgt).unwrap();
        assert!(t.wire_count() <= t.max_wires.unwrap());
    }

    #[test]
    fn test_always_src_swaps_roles() {
        let mut layer = Layer::new();
        let a = layer
            .add_container(&ContainerConfig::default().with_terminals([
                TerminalConfig::new("drag"),
            ]))
            .unwrap();
        let b = layer
            .add_container(&ContainerConfig::default().with_terminals([
                TerminalConfig::new("anchor").always_src(),
            ]))
            .unwrap();
        let drag = layer.terminal_ref(a, "drag").unwrap();
        let anchor = layer.terminal_ref(b, "anchor").unwrap();

        let wire = layer.connect(drag, anchor, WireKind::Arrow, None).unwrap();
        let wire = layer.wire(wire).unwrap();
        assert_eq!(wire.src, anchor);
        assert_eq!(wire.tgt, drag);
    }

    #[test]
    fn test_cascade_on_container_removal() {
        let mut layer = Layer::new();
        let (src, tgt) = two_containers(&mut layer);
        let wire = layer.connect(src, tgt, WireKind::Bezier, None).unwrap();

        let removed = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&removed);
        layer
            .events
            .wire_removed
            .subscribe(move |_| counter.set(counter.get() + 1));

        layer.remove_container(src.container);
        assert!(layer.wire(wire).is_none());
        assert_eq!(layer.wire_count(), 0);
        assert_eq!(layer.container_count(), 1);
        assert_eq!(removed.get(), 1);
        // The surviving terminal lost its reference too.
        assert!(!layer.terminal(&tgt).unwrap().is_connected());
    }

    #[test]
    fn test_remove_terminal_wires_drains() {
        let mut layer = Layer::new();
        let hub = layer
            .add_container(&ContainerConfig::default().with_terminals([
                TerminalConfig::new("in"),
            ]))
            .unwrap();
        let tgt = layer.terminal_ref(hub, "in").unwrap();
        for name in ["s1", "s2", "s3"] {
            let c = layer
                .add_container(
                    &ContainerConfig::default().with_terminals([TerminalConfig::new(name)]),
                )
                .unwrap();
            let src = layer.terminal_ref(c, name).unwrap();
            layer.connect(src, tgt, WireKind::Straight, None).unwrap();
        }

        layer.remove_terminal_wires(&tgt);
        assert_eq!(layer.wire_count(), 0);
        assert!(!layer.terminal(&tgt).unwrap().is_connected());
    }

    #[test]
    fn test_move_container_redraws() {
        let mut layer = Layer::new();
        let (src, tgt) = two_containers(&mut layer);
        let wire = layer.connect(src, tgt, WireKind::Straight, None).unwrap();
        let before = layer.wire(wire).unwrap().path().unwrap().bounds;

        layer.move_container(src.container, Vec2::new(0.0, 300.0));
        let after = layer.wire(wire).unwrap().path().unwrap().bounds;
        assert_ne!(before, after);
        assert_eq!(after.min.y, before.min.y);
        assert!(after.size.y > before.size.y);
    }

    #[test]
    fn test_drop_candidates_ignore_capacity() {
        let mut layer = Layer::new();
        let (src, tgt) = two_containers(&mut layer);
        layer.connect(src, tgt, WireKind::Bezier, None).unwrap();

        // The target is at capacity but still a candidate.
        assert_eq!(layer.drop_candidates(&src), vec![tgt]);

        layer.set_drop_invitations(&src, true);
        assert!(layer.terminal(&tgt).unwrap().invited());
        layer.set_drop_invitations(&src, false);
        assert!(!layer.terminal(&tgt).unwrap().invited());
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut layer = Layer::new();
        let (src, tgt) = two_containers(&mut layer);
        layer.connect(src, tgt, WireKind::Bezier, None).unwrap();

        layer.clear();
        assert_eq!(layer.container_count(), 0);
        assert_eq!(layer.wire_count(), 0);
    }
}
