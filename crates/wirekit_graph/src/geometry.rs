// SPDX-License-Identifier: MIT OR Apache-2.0
//! Wire path geometry.
//!
//! Every wire variant reduces to the same contract: given the two terminal
//! positions (layer space) and their direction vectors, compute an axis-aligned
//! bounding box with a fixed margin, translate the drawn points into that box's
//! local space, and attach an optional arrowhead triangle. Renderers consume
//! [`PathGeometry`] verbatim; nothing in this module touches a drawing surface.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Margin added on every side of a wire's bounding box.
pub const PATH_MARGIN: f32 = 4.0;

/// Arrowhead length along the wire for the plain [`Arrow`](crate::WireKind::Arrow) variant.
pub const ARROW_LENGTH: f32 = 20.0;

/// Half the arrowhead base width for the plain arrow variant.
pub const ARROW_HALF_WIDTH: f32 = 10.0;

/// Axis-aligned rectangle in layer space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner
    pub min: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Rect {
    /// Smallest rectangle covering all given points. Empty input yields a zero rect.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Self {
        let mut iter = points.into_iter();
        let Some(first) = iter.next() else {
            return Self {
                min: Vec2::ZERO,
                size: Vec2::ZERO,
            };
        };
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Self {
            min,
            size: max - min,
        }
    }

    /// Grow the rectangle by `margin` on every side.
    pub fn expand(self, margin: f32) -> Self {
        Self {
            min: self.min - Vec2::splat(margin),
            size: self.size + Vec2::splat(2.0 * margin),
        }
    }

    /// Center point of the rectangle.
    pub fn center(self) -> Vec2 {
        self.min + self.size * 0.5
    }
}

/// The drawable path of a wire, in coordinates local to its bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WirePath {
    /// Single straight segment
    Line {
        /// Segment start (terminal 1)
        from: Vec2,
        /// Segment end (terminal 2)
        to: Vec2,
    },
    /// L-shaped path: horizontal run, then vertical run
    Step {
        /// Start, corner, end
        points: [Vec2; 3],
    },
    /// Cubic bezier curve
    Bezier {
        /// Curve start (terminal 1)
        from: Vec2,
        /// Control point near the start
        ctrl1: Vec2,
        /// Control point near the end
        ctrl2: Vec2,
        /// Curve end (terminal 2)
        to: Vec2,
    },
}

/// Arrowhead triangle, filled then stroked. Local to the wire's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arrowhead {
    /// Triangle tip, at the target terminal
    pub tip: Vec2,
    /// First base corner
    pub wing1: Vec2,
    /// Second base corner
    pub wing2: Vec2,
}

/// Computed visual geometry of one wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathGeometry {
    /// Bounding box in layer space, margin included
    pub bounds: Rect,
    /// Path in `bounds`-local coordinates
    pub path: WirePath,
    /// Arrowhead in `bounds`-local coordinates, for arrow variants
    pub arrowhead: Option<Arrowhead>,
    /// Label anchor in layer space: the midpoint of `bounds`
    pub label_pos: Vec2,
}

/// Straight segment between two terminals.
pub fn line(p1: Vec2, p2: Vec2) -> PathGeometry {
    let bounds = Rect::from_points([p1, p2]).expand(PATH_MARGIN);
    PathGeometry {
        bounds,
        path: WirePath::Line {
            from: p1 - bounds.min,
            to: p2 - bounds.min,
        },
        arrowhead: None,
        label_pos: bounds.center(),
    }
}

/// L-shaped path bending at the second point's x, first point's y.
pub fn step(p1: Vec2, p2: Vec2) -> PathGeometry {
    let corner = Vec2::new(p2.x, p1.y);
    let bounds = Rect::from_points([p1, p2]).expand(PATH_MARGIN);
    PathGeometry {
        bounds,
        path: WirePath::Step {
            points: [p1 - bounds.min, corner - bounds.min, p2 - bounds.min],
        },
        arrowhead: None,
        label_pos: bounds.center(),
    }
}

/// Straight segment plus an arrowhead at `p2`.
///
/// Returns `None` for degenerate geometry (coincident endpoints, negative
/// discriminant in the wing solve).
pub fn arrow(p1: Vec2, p2: Vec2, length: f32, half_width: f32) -> Option<PathGeometry> {
    let head = arrowhead(p1, p2, length, half_width)?;
    let bounds =
        Rect::from_points([p1, p2, head.wing1, head.wing2]).expand(PATH_MARGIN);
    Some(PathGeometry {
        bounds,
        path: WirePath::Line {
            from: p1 - bounds.min,
            to: p2 - bounds.min,
        },
        arrowhead: Some(Arrowhead {
            tip: head.tip - bounds.min,
            wing1: head.wing1 - bounds.min,
            wing2: head.wing2 - bounds.min,
        }),
        label_pos: bounds.center(),
    })
}

/// Cubic bezier between two terminals, tangents along the terminal directions.
///
/// The tangent coefficient is `tangent`, reduced to half the endpoint distance
/// when the endpoints are closer than that. The bounding box covers all four
/// control points, not just the endpoints.
pub fn bezier(p1: Vec2, p2: Vec2, d1: Vec2, d2: Vec2, tangent: f32) -> PathGeometry {
    let (ctrl1, ctrl2) = bezier_controls(p1, p2, d1, d2, tangent);
    let bounds = Rect::from_points([p1, ctrl1, ctrl2, p2]).expand(PATH_MARGIN);
    PathGeometry {
        bounds,
        path: WirePath::Bezier {
            from: p1 - bounds.min,
            ctrl1: ctrl1 - bounds.min,
            ctrl2: ctrl2 - bounds.min,
            to: p2 - bounds.min,
        },
        arrowhead: None,
        label_pos: bounds.center(),
    }
}

/// Bezier curve with an arrowhead at `p2`.
///
/// The wing solve is the same as [`arrow`]'s, but anchored on the curve's
/// second control point as the approach direction, with the arrow dimensions
/// scaled from the stroke width.
pub fn bezier_arrow(
    p1: Vec2,
    p2: Vec2,
    d1: Vec2,
    d2: Vec2,
    tangent: f32,
    stroke_width: f32,
) -> Option<PathGeometry> {
    let (ctrl1, ctrl2) = bezier_controls(p1, p2, d1, d2, tangent);
    let length = 3.0 * stroke_width;
    let half_width = 1.5 * stroke_width;
    let head = arrowhead(ctrl2, p2, length, half_width)?;
    let bounds =
        Rect::from_points([p1, ctrl1, ctrl2, p2, head.wing1, head.wing2]).expand(PATH_MARGIN);
    Some(PathGeometry {
        bounds,
        path: WirePath::Bezier {
            from: p1 - bounds.min,
            ctrl1: ctrl1 - bounds.min,
            ctrl2: ctrl2 - bounds.min,
            to: p2 - bounds.min,
        },
        arrowhead: Some(Arrowhead {
            tip: head.tip - bounds.min,
            wing1: head.wing1 - bounds.min,
            wing2: head.wing2 - bounds.min,
        }),
        label_pos: bounds.center(),
    })
}

fn bezier_controls(p1: Vec2, p2: Vec2, d1: Vec2, d2: Vec2, tangent: f32) -> (Vec2, Vec2) {
    let distance = p1.distance(p2);
    let coeff = if distance < tangent {
        distance / 2.0
    } else {
        tangent
    };
    (p1 + d1 * coeff, p2 + d2 * coeff)
}

/// Arrowhead triangle for the segment `t1 -> t2`, tip at `t2`, in layer space.
///
/// The wing points sit on the perpendicular through the point `z` at distance
/// `length` back from the tip, `half_width` away on each side. Solved as a
/// line/circle intersection; a negative discriminant aborts the computation.
pub fn arrowhead(t1: Vec2, t2: Vec2, length: f32, half_width: f32) -> Option<Arrowhead> {
    let distance = t1.distance(t2);
    if distance <= f32::EPSILON {
        return None;
    }

    // Horizontal segment: the perpendicular-line solve divides by zero, so
    // place the wings directly.
    if t1.y == t2.y {
        let back = if t1.x < t2.x { -length } else { length };
        return Some(Arrowhead {
            tip: t2,
            wing1: Vec2::new(t2.x + back, t2.y - half_width),
            wing2: Vec2::new(t2.x + back, t2.y + half_width),
        });
    }

    // Anchor point at `length` back from the tip along the segment.
    let t = 1.0 - length / distance;
    let z = (t1 + (t2 - t1) * t).abs();

    // Perpendicular to the terminal-to-terminal line, through z.
    let a = (t2.y - t1.y) / (t2.x - t1.x);
    let a_prost = if a == 0.0 { 0.0 } else { -1.0 / a };
    let b_prost = z.y - a_prost * z.x;

    // Points on the perpendicular at distance `half_width` from z:
    // substitute y = a_prost*x + b_prost into the circle around z.
    let k = b_prost - z.y;
    let qa = 1.0 + a_prost * a_prost;
    let qb = 2.0 * (a_prost * k - z.x);
    let qc = z.x * z.x + k * k - half_width * half_width;
    let delta = qb * qb - 4.0 * qa * qc;
    if delta < 0.0 {
        return None;
    }

    let sqrt_delta = delta.sqrt();
    let x1 = (-qb + sqrt_delta) / (2.0 * qa);
    let x2 = (-qb - sqrt_delta) / (2.0 * qa);
    Some(Arrowhead {
        tip: t2,
        wing1: Vec2::new(x1, a_prost * x1 + b_prost),
        wing2: Vec2::new(x2, a_prost * x2 + b_prost),
    })
}
