// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wiring graph engine.
//!
//! This crate is the graph and geometry core of a node-link wiring editor:
//! containers expose typed terminals, wires connect exactly two terminals,
//! and a layer owns the whole graph. It is deliberately headless - rendering,
//! mouse tracking and DOM/layout concerns live in the embedding editor, which
//! drives this crate through drag callbacks and reads back path geometry.
//!
//! ## Architecture
//!
//! - [`Terminal`]: a typed connection point with a direction vector and a
//!   wire capacity
//! - [`Wire`]: an edge between two terminals, in one of five geometric
//!   variants ([`WireKind`])
//! - [`Container`]: a node owning a terminal set and a position
//! - [`Layer`]: the graph root; add/remove, connection validation,
//!   serialization to the wiring JSON format
//! - [`TerminalDrag`]: the drag-to-connect state machine
//! - [`Registry`]: explicit xtype-tag resolution for container classes
//!
//! All state lives in insertion-ordered arenas keyed by stable ids, and all
//! mutation is single-threaded: the engine is driven synchronously from UI
//! event callbacks.

pub mod container;
pub mod drag;
pub mod event;
pub mod geometry;
pub mod layer;
pub mod registry;
pub mod terminal;
pub mod wire;
pub mod wiring;

pub use container::{Container, ContainerConfig, ContainerId, ValueError};
pub use drag::{DropOutcome, TerminalDrag};
pub use event::{LayerEvents, Signal, SubscriptionId, WireEvent};
pub use geometry::{Arrowhead, PathGeometry, Rect, WirePath};
pub use layer::{ConnectError, Layer};
pub use registry::{ContainerDef, Registry, RegistryError, DEFAULT_CONTAINER_XTYPE};
pub use terminal::{Terminal, TerminalConfig, TerminalId};
pub use wire::{LineCap, TerminalRef, Wire, WireId, WireKind, WireStyle};
pub use wiring::{WireEnd, WireSpec, Wiring, WiringError};
