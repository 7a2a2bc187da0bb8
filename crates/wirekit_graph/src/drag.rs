// SPDX-License-Identifier: MIT OR Apache-2.0
//! The drag-to-connect state machine.
//!
//! A [`TerminalDrag`] is created on drag start over a terminal and driven by
//! the drag collaborator's callbacks with cursor coordinates already
//! translated into layer space. While dragging it owns a transient editing
//! wire (source terminal to a synthetic cursor terminal); on drop it either
//! builds a permanent wire through [`Layer::connect`] or cancels. Connection
//! failures at drop time are silent: the gesture simply produces no wire.

use crate::geometry::PathGeometry;
use crate::layer::Layer;
use crate::wire::{TerminalRef, WireId, WireKind, WireStyle};
use glam::Vec2;

/// Result of ending a drag gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// A permanent wire was created
    Connected(WireId),
    /// No wire was created (no target, or a validation check failed)
    Cancelled,
}

#[derive(Debug)]
enum DragState {
    /// No gesture in progress; all callbacks are no-ops. A drag start on a
    /// full multi-capacity terminal lands here.
    Idle,
    Dragging {
        source: TerminalRef,
        fake_direction: Vec2,
        kind: WireKind,
        style: WireStyle,
        path: Option<PathGeometry>,
    },
}

/// Drag controller bound to one source terminal for the duration of a gesture.
#[derive(Debug)]
pub struct TerminalDrag {
    state: DragState,
}

impl TerminalDrag {
    /// Start a drag from a terminal.
    ///
    /// A source at capacity with `max_wires == 1` has its wire removed first
    /// (auto-replace); at capacity with a larger limit the gesture is rejected
    /// and every subsequent callback is a no-op. Drop invitations are set on
    /// all valid candidate terminals.
    pub fn begin(layer: &mut Layer, source: TerminalRef, kind: WireKind) -> Self {
        let Some(terminal) = layer.terminal(&source) else {
            return Self {
                state: DragState::Idle,
            };
        };

        if terminal.at_capacity() {
            if terminal.max_wires == Some(1) {
                let existing = terminal.wires()[0];
                layer.disconnect(existing);
            } else {
                tracing::debug!(?source, "drag rejected: terminal full");
                return Self {
                    state: DragState::Idle,
                };
            }
        }

        // The synthetic cursor terminal points back at the source.
        let terminal = match layer.terminal(&source) {
            Some(t) => t,
            None => {
                return Self {
                    state: DragState::Idle,
                }
            }
        };
        let fake_direction = -terminal.direction;
        layer.set_drop_invitations(&source, true);
        tracing::debug!(?source, "drag start");
        Self {
            state: DragState::Dragging {
                source,
                fake_direction,
                kind,
                style: WireStyle::default(),
                path: None,
            },
        }
    }

    /// Whether a gesture is actually in progress
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Update the synthetic terminal to the cursor position and recompute the
    /// editing wire. No-op when the gesture was rejected.
    pub fn drag_move(&mut self, layer: &Layer, cursor: Vec2) {
        let DragState::Dragging {
            source,
            fake_direction,
            kind,
            style,
            path,
        } = &mut self.state
        else {
            return;
        };
        *path = match (layer.terminal_position(source), layer.terminal(source)) {
            (Some(p1), Some(terminal)) => {
                kind.compute(p1, cursor, terminal.direction, *fake_direction, style)
            }
            _ => None,
        };
    }

    /// The editing wire's geometry, for rendering during the gesture
    pub fn editing_path(&self) -> Option<&PathGeometry> {
        match &self.state {
            DragState::Dragging { path, .. } => path.as_ref(),
            DragState::Idle => None,
        }
    }

    /// End the gesture over an optional target terminal.
    ///
    /// The editing wire is destroyed either way. With a valid target a
    /// permanent wire is created; any connection-rule failure is swallowed
    /// and reported as [`DropOutcome::Cancelled`].
    pub fn drop_on(mut self, layer: &mut Layer, target: Option<TerminalRef>) -> DropOutcome {
        let DragState::Dragging { source, kind, .. } =
            std::mem::replace(&mut self.state, DragState::Idle)
        else {
            return DropOutcome::Cancelled;
        };
        layer.set_drop_invitations(&source, false);

        let Some(target) = target else {
            tracing::debug!(?source, "drag cancelled");
            return DropOutcome::Cancelled;
        };
        match layer.connect(source, target, kind, None) {
            Ok(wire) => DropOutcome::Connected(wire),
            Err(err) => {
                // Invalid drops fail without surfacing an error to the user.
                tracing::debug!(?source, ?target, %err, "drop rejected");
                DropOutcome::Cancelled
            }
        }
    }

    /// Explicitly end the gesture with no target.
    pub fn cancel(self, layer: &mut Layer) -> DropOutcome {
        self.drop_on(layer, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ContainerConfig;
    use crate::terminal::TerminalConfig;

    fn scenario() -> (Layer, TerminalRef, TerminalRef) {
        let mut layer = Layer::new();
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
        let src = layer.terminal_ref(a, "out").unwrap();
        let tgt = layer.terminal_ref(b, "in").unwrap();
        (layer, src, tgt)
    }

    #[test]
    fn test_drag_connects_default_bezier() {
        let (mut layer, src, tgt) = scenario();

        let mut drag = TerminalDrag::begin(&mut layer, src, WireKind::Bezier);
        assert!(drag.is_dragging());
        assert!(layer.terminal(&tgt).unwrap().invited());

        drag.drag_move(&layer, Vec2::new(60.0, 40.0));
        assert!(drag.editing_path().is_some());

        let outcome = drag.drop_on(&mut layer, Some(tgt));
        let DropOutcome::Connected(wire) = outcome else {
            panic!("expected connection, got {outcome:?}");
        };
        let wire = layer.wire(wire).unwrap();
        assert_eq!(wire.kind, WireKind::Bezier);
        assert_eq!(wire.src, src);
        assert_eq!(wire.tgt, tgt);
        assert_eq!(layer.wire_count(), 1);
        assert!(!layer.terminal(&tgt).unwrap().invited());
    }

    #[test]
    fn test_second_drag_rejected_as_duplicate() {
        let (mut layer, src, tgt) = scenario();
        let drag = TerminalDrag::begin(&mut layer, src, WireKind::Bezier);
        drag.drop_on(&mut layer, Some(tgt));

        let drag = TerminalDrag::begin(&mut layer, src, WireKind::Bezier);
        assert_eq!(drag.drop_on(&mut layer, Some(tgt)), DropOutcome::Cancelled);
        assert_eq!(layer.wire_count(), 1);
    }

    #[test]
    fn test_drop_without_target_cancels() {
        let (mut layer, src, _) = scenario();
        let mut drag = TerminalDrag::begin(&mut layer, src, WireKind::Bezier);
        drag.drag_move(&layer, Vec2::new(300.0, 300.0));
        assert_eq!(drag.drop_on(&mut layer, None), DropOutcome::Cancelled);
        assert_eq!(layer.wire_count(), 0);
    }

    #[test]
    fn test_auto_replace_on_single_capacity_source() {
        let (mut layer, src, tgt) = scenario();
        let wire = layer.connect(src, tgt, WireKind::Bezier, None).unwrap();

        // Dragging from the single-capacity end removes its wire up front.
        let drag = TerminalDrag::begin(&mut layer, tgt, WireKind::Bezier);
        assert!(drag.is_dragging());
        assert!(layer.wire(wire).is_none());
        assert_eq!(layer.wire_count(), 0);

        // Dropping back on the original peer rebuilds a single wire.
        let outcome = drag.drop_on(&mut layer, Some(src));
        assert!(matches!(outcome, DropOutcome::Connected(_)));
        assert_eq!(layer.wire_count(), 1);
    }

    #[test]
    fn test_full_multi_capacity_source_is_inert() {
        let mut layer = Layer::new();
        let hub = layer
            .add_container(&ContainerConfig::default().with_terminals([
                TerminalConfig::new("in").with_max_wires(2),
            ]))
            .unwrap();
        let tgt = layer.terminal_ref(hub, "in").unwrap();
        for name in ["s1", "s2"] {
            let c = layer
                .add_container(
                    &ContainerConfig::default().with_terminals([TerminalConfig::new(name)]),
                )
                .unwrap();
            let src = layer.terminal_ref(c, name).unwrap();
            layer.connect(src, tgt, WireKind::Straight, None).unwrap();
        }

        let mut drag = TerminalDrag::begin(&mut layer, tgt, WireKind::Straight);
        assert!(!drag.is_dragging());
        drag.drag_move(&layer, Vec2::new(10.0, 10.0));
        assert!(drag.editing_path().is_none());
        assert_eq!(drag.drop_on(&mut layer, None), DropOutcome::Cancelled);
        // Nothing was removed by the rejected gesture.
        assert_eq!(layer.wire_count(), 2);
    }
}
