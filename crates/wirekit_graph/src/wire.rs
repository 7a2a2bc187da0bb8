// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wire (edge) definitions and the closed set of geometric variants.

use crate::container::ContainerId;
use crate::geometry::{self, PathGeometry, ARROW_HALF_WIDTH, ARROW_LENGTH};
use crate::registry::RegistryError;
use crate::terminal::TerminalId;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WireId(pub Uuid);

impl WireId {
    /// Create a new random wire ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for WireId {
    fn default() -> Self {
        Self::new()
    }
}

/// Address of one wire endpoint: a terminal within a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerminalRef {
    /// Owning container
    pub container: ContainerId,
    /// Terminal within that container
    pub terminal: TerminalId,
}

/// Geometric wire variant, selected by xtype tag at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WireKind {
    /// Single straight segment
    Straight,
    /// Horizontal-then-vertical L path
    Step,
    /// Straight segment with an arrowhead at terminal 2
    Arrow,
    /// Cubic bezier along the terminal directions
    #[default]
    Bezier,
    /// Bezier with an arrowhead at terminal 2
    BezierArrow,
}

impl WireKind {
    /// Resolve a wire xtype tag. A missing tag selects the default variant;
    /// an unknown tag is a construction-time error.
    pub fn from_tag(tag: Option<&str>) -> Result<Self, RegistryError> {
        match tag {
            None => Ok(Self::default()),
            Some("straight") => Ok(Self::Straight),
            Some("step") => Ok(Self::Step),
            Some("arrow") => Ok(Self::Arrow),
            Some("bezier") => Ok(Self::Bezier),
            Some("bezier-arrow") => Ok(Self::BezierArrow),
            Some(other) => Err(RegistryError::UnknownXtype(other.to_string())),
        }
    }

    /// The xtype tag used in serialized wirings
    pub fn tag(self) -> &'static str {
        match self {
            Self::Straight => "straight",
            Self::Step => "step",
            Self::Arrow => "arrow",
            Self::Bezier => "bezier",
            Self::BezierArrow => "bezier-arrow",
        }
    }

    /// Compute the path between two terminal positions.
    ///
    /// `d1`/`d2` are the terminal direction vectors; only the bezier variants
    /// use them for tangents. Returns `None` for degenerate arrow geometry.
    pub fn compute(
        self,
        p1: Vec2,
        p2: Vec2,
        d1: Vec2,
        d2: Vec2,
        style: &WireStyle,
    ) -> Option<PathGeometry> {
        match self {
            Self::Straight => Some(geometry::line(p1, p2)),
            Self::Step => Some(geometry::step(p1, p2)),
            Self::Arrow => geometry::arrow(p1, p2, ARROW_LENGTH, ARROW_HALF_WIDTH),
            Self::Bezier => Some(geometry::bezier(p1, p2, d1, d2, style.bezier_tangent)),
            Self::BezierArrow => {
                geometry::bezier_arrow(p1, p2, d1, d2, style.bezier_tangent, style.width)
            }
        }
    }
}

/// Stroke line-cap style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    /// Rounded cap
    #[default]
    Round,
    /// Flat cap at the endpoint
    Butt,
    /// Flat cap extending past the endpoint
    Square,
}

/// Visual style attributes of a wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireStyle {
    /// Inner stroke width
    pub width: f32,
    /// Inner stroke color
    pub color: String,
    /// Border stroke width (drawn under the inner stroke)
    pub border_width: f32,
    /// Border stroke color
    pub border_color: String,
    /// Line-cap style
    pub cap: LineCap,
    /// Bezier tangent length before distance clamping
    pub bezier_tangent: f32,
}

impl Default for WireStyle {
    fn default() -> Self {
        Self {
            width: 3.0,
            color: "rgb(173, 216, 230)".to_string(),
            border_width: 1.0,
            border_color: "#0000ff".to_string(),
            cap: LineCap::Round,
            bezier_tangent: 100.0,
        }
    }
}

/// An edge between exactly two terminals.
///
/// Endpoint order matters: `src` is terminal 1 (rendering start), `tgt` is
/// terminal 2 (arrow placement). A wire is registered with both terminals for
/// its entire lifetime.
#[derive(Debug, Clone)]
pub struct Wire {
    /// Unique wire ID
    pub id: WireId,
    /// Geometric variant
    pub kind: WireKind,
    /// Visual style
    pub style: WireStyle,
    /// Optional label, anchored at the bounding-box midpoint
    pub label: Option<String>,
    /// Terminal 1
    pub src: TerminalRef,
    /// Terminal 2
    pub tgt: TerminalRef,
    pub(crate) path: Option<PathGeometry>,
}

impl Wire {
    /// Create a wire between two endpoints
    pub fn new(kind: WireKind, src: TerminalRef, tgt: TerminalRef) -> Self {
        Self {
            id: WireId::new(),
            kind,
            style: WireStyle::default(),
            label: None,
            src,
            tgt,
            path: None,
        }
    }

    /// Set the label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whether either endpoint lives on the given container
    pub fn involves_container(&self, container: ContainerId) -> bool {
        self.src.container == container || self.tgt.container == container
    }

    /// Whether the given terminal is one of the endpoints
    pub fn involves_terminal(&self, terminal: &TerminalRef) -> bool {
        self.src == *terminal || self.tgt == *terminal
    }

    /// Whether this wire connects the given pair, in either order
    pub fn connects(&self, a: &TerminalRef, b: &TerminalRef) -> bool {
        (self.src == *a && self.tgt == *b) || (self.src == *b && self.tgt == *a)
    }

    /// The endpoint opposite to the given one, if the given one is an endpoint
    pub fn other_end(&self, terminal: &TerminalRef) -> Option<TerminalRef> {
        if self.src == *terminal {
            Some(self.tgt)
        } else if self.tgt == *terminal {
            Some(self.src)
        } else {
            None
        }
    }

    /// The most recently computed path geometry, if any
    pub fn path(&self) -> Option<&PathGeometry> {
        self.path.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint() -> TerminalRef {
        TerminalRef {
            container: ContainerId::new(),
            terminal: TerminalId::new(),
        }
    }

    #[test]
    fn test_kind_tags_round_trip() {
        for kind in [
            WireKind::Straight,
            WireKind::Step,
            WireKind::Arrow,
            WireKind::Bezier,
            WireKind::BezierArrow,
        ] {
            assert_eq!(WireKind::from_tag(Some(kind.tag())).unwrap(), kind);
        }
    }

    #[test]
    fn test_default_kind_is_bezier() {
        assert_eq!(WireKind::from_tag(None).unwrap(), WireKind::Bezier);
    }

    #[test]
    fn test_unknown_kind_tag_fails() {
        let err = WireKind::from_tag(Some("zigzag")).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownXtype(tag) if tag == "zigzag"));
    }

    #[test]
    fn test_connects_is_unordered() {
        let a = endpoint();
        let b = endpoint();
        let wire = Wire::new(WireKind::Straight, a, b);
        assert!(wire.connects(&a, &b));
        assert!(wire.connects(&b, &a));
        assert!(!wire.connects(&a, &endpoint()));
        assert_eq!(wire.other_end(&a), Some(b));
        assert_eq!(wire.other_end(&endpoint()), None);
    }
}
