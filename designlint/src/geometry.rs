//! Plane geometry for crossing detection.
//!
//! Wires and net segments are straight lines between two endpoints, so the
//! whole crossing story reduces to the classic orientation-based segment
//! intersection test. Arcs and circles are not handled here.

use serde::{Deserialize, Serialize};

/// A point in the document coordinate system (millimeters).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Turn direction of the ordered triple (p, q, r).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Collinear,
    Clockwise,
    CounterClockwise,
}

/// Orientation of the ordered triple (p, q, r) from the sign of the cross
/// product. Exactly zero means collinear.
pub fn orientation(p: Point, q: Point, r: Point) -> Orientation {
    let val = (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y);
    if val > 0.0 {
        Orientation::Clockwise
    } else if val < 0.0 {
        Orientation::CounterClockwise
    } else {
        Orientation::Collinear
    }
}

/// Whether q lies inside the axis-aligned bounding box of p and r.
///
/// Only meaningful when p, q, r are already known to be collinear; with that
/// precondition it decides whether q is on the segment pr.
pub fn on_segment(p: Point, q: Point, r: Point) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Whether segment p1q1 intersects segment p2q2.
///
/// Touching endpoints and overlapping collinear segments count as an
/// intersection; this is what makes the test usable for short-circuit
/// detection, where a shared point is exactly the problem.
pub fn segments_intersect(p1: Point, q1: Point, p2: Point, q2: Point) -> bool {
    let o1 = orientation(p1, q1, p2);
    let o2 = orientation(p1, q1, q2);
    let o3 = orientation(p2, q2, p1);
    let o4 = orientation(p2, q2, q1);

    // General position: the endpoints of each segment straddle the other.
    if o1 != o2 && o3 != o4 {
        return true;
    }

    // Collinear containment.
    if o1 == Orientation::Collinear && on_segment(p1, p2, q1) {
        return true;
    }
    if o2 == Orientation::Collinear && on_segment(p1, q2, q1) {
        return true;
    }
    if o3 == Orientation::Collinear && on_segment(p2, p1, q2) {
        return true;
    }
    if o4 == Orientation::Collinear && on_segment(p2, q1, q2) {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_orientation_turns() {
        assert_eq!(
            orientation(p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0)),
            Orientation::Collinear
        );
        assert_eq!(
            orientation(p(0.0, 0.0), p(1.0, 1.0), p(2.0, 0.0)),
            Orientation::Clockwise
        );
        assert_eq!(
            orientation(p(0.0, 0.0), p(1.0, -1.0), p(2.0, 0.0)),
            Orientation::CounterClockwise
        );
    }

    #[test]
    fn test_parallel_segments_do_not_intersect() {
        assert!(!segments_intersect(
            p(1.0, 1.0),
            p(10.0, 1.0),
            p(1.0, 2.0),
            p(10.0, 2.0)
        ));
    }

    #[test]
    fn test_crossing_segments_intersect() {
        assert!(segments_intersect(
            p(10.0, 0.0),
            p(0.0, 10.0),
            p(0.0, 0.0),
            p(10.0, 10.0)
        ));
    }

    #[test]
    fn test_collinear_disjoint_segments_do_not_intersect() {
        assert!(!segments_intersect(
            p(-5.0, -5.0),
            p(0.0, 0.0),
            p(1.0, 1.0),
            p(10.0, 10.0)
        ));
    }

    #[test]
    fn test_collinear_touching_endpoint_intersects() {
        assert!(segments_intersect(
            p(-5.0, -5.0),
            p(0.0, 0.0),
            p(0.0, 0.0),
            p(10.0, 10.0)
        ));
    }

    #[test]
    fn test_collinear_overlap_intersects() {
        assert!(segments_intersect(
            p(0.0, 0.0),
            p(5.0, 0.0),
            p(3.0, 0.0),
            p(8.0, 0.0)
        ));
    }

    #[test]
    fn test_t_junction_intersects() {
        // One endpoint of the vertical segment lies in the middle of the
        // horizontal one.
        assert!(segments_intersect(
            p(0.0, 0.0),
            p(10.0, 0.0),
            p(5.0, 0.0),
            p(5.0, 5.0)
        ));
    }

    #[test]
    fn test_near_miss_does_not_intersect() {
        assert!(!segments_intersect(
            p(0.0, 0.0),
            p(10.0, 0.0),
            p(5.0, 0.1),
            p(5.0, 5.0)
        ));
    }
}
