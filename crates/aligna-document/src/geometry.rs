// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plane geometry helpers shared by the detector, rectifier, and ratio adjuster.

use aligna_core::{CornerSet, Point};

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

/// Arithmetic mean of a set of points. Returns the origin for an empty slice.
pub fn centroid(points: &[Point]) -> Point {
    if points.is_empty() {
        return Point::default();
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Point::new(sx / n, sy / n)
}

/// Greatest common divisor (Euclid).
pub fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// Reduce a width:height pair to its simplest integer form, e.g.
/// `(1200.4, 900.0)` becomes `(4, 3)`.
///
/// Both sides are rounded first. A zero side yields `(0, 0)`.
pub fn simplify_ratio(width: f64, height: f64) -> (u32, u32) {
    let w = width.round().max(0.0) as u64;
    let h = height.round().max(0.0) as u64;
    if w == 0 || h == 0 {
        return (0, 0);
    }
    let divisor = gcd(w, h);
    ((w / divisor) as u32, (h / divisor) as u32)
}

/// Position of a point relative to a centre, in image coordinates (y grows
/// downwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Quadrant {
    /// All quadrants in corner-set order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomRight,
        Quadrant::BottomLeft,
    ];

    /// Classify `point` by the sign of `point - center` on each axis.
    ///
    /// Points lying exactly on either axis through the centre belong to no
    /// quadrant.
    pub fn classify(point: Point, center: Point) -> Option<Self> {
        let left = point.x < center.x;
        let right = point.x > center.x;
        let above = point.y < center.y;
        let below = point.y > center.y;
        match (left, right, above, below) {
            (true, _, true, _) => Some(Self::TopLeft),
            (_, true, true, _) => Some(Self::TopRight),
            (_, true, _, true) => Some(Self::BottomRight),
            (true, _, _, true) => Some(Self::BottomLeft),
            _ => None,
        }
    }

    /// Index of this quadrant's corner inside a [`CornerSet`].
    pub fn corner_index(self) -> usize {
        match self {
            Self::TopLeft => 0,
            Self::TopRight => 1,
            Self::BottomRight => 2,
            Self::BottomLeft => 3,
        }
    }
}

/// Area of a simple polygon given by its vertices in order (shoelace
/// formula). Orientation does not matter.
pub fn polygon_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x * points[j].y;
        twice_area -= points[j].x * points[i].y;
    }
    twice_area.abs() / 2.0
}

/// Lengths of the four edges of a corner set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeLengths {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl EdgeLengths {
    pub fn of(corners: &CornerSet) -> Self {
        Self {
            top: distance(corners.top_left(), corners.top_right()),
            right: distance(corners.top_right(), corners.bottom_right()),
            bottom: distance(corners.bottom_left(), corners.bottom_right()),
            left: distance(corners.top_left(), corners.bottom_left()),
        }
    }
}

/// Width and height of the document described by `corners`: the longer of
/// each pair of opposite edges.
pub fn document_size(corners: &CornerSet) -> (f64, f64) {
    let edges = EdgeLengths::of(corners);
    (edges.top.max(edges.bottom), edges.left.max(edges.right))
}
