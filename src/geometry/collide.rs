//! Pairwise collision dispatch
//!
//! One arm per supported shape pair. The match is exhaustive over the
//! closed [`Shape`] enum, so adding a shape kind without its collision rules
//! does not compile. Reversed pairs delegate to the canonical order.

use super::distance::{
    arc_arc_distance, arc_polygon_distance, point_arc_distance, point_polygon_distance,
    point_segment_distance, polygon_polygon_distance, segment_arc_distance, segment_distance,
    segment_polygon_distance,
};
use super::shapes::Shape;
use super::types::Coord;

fn half(width: Coord) -> f64 {
    width as f64 / 2.0
}

/// Minimum distance between the copper of two shapes, zero when they
/// touch or overlap
pub fn shape_distance(a: &Shape, b: &Shape) -> f64 {
    let raw = match (a, b) {
        (Shape::Compound { shapes }, _) => {
            return shapes.iter().map(|s| shape_distance(s, b)).fold(f64::MAX, f64::min);
        }
        (_, Shape::Compound { shapes }) => {
            return shapes.iter().map(|s| shape_distance(a, s)).fold(f64::MAX, f64::min);
        }

        (Shape::Segment(s), Shape::Segment(t)) => {
            segment_distance(&s.a, &s.b, &t.a, &t.b) - half(s.width) - half(t.width)
        }
        (Shape::Segment(s), Shape::Circle(c)) => {
            point_segment_distance(&c.center, &s.a, &s.b) - half(s.width) - c.radius as f64
        }
        (Shape::Segment(s), Shape::Arc(arc)) => {
            segment_arc_distance(&s.a, &s.b, arc) - half(s.width) - half(arc.width)
        }
        (Shape::Segment(s), Shape::Rect(r)) => {
            segment_polygon_distance(&s.a, &s.b, &r.corners(), true) - half(s.width)
        }
        (Shape::Segment(s), Shape::Polygon(p)) => {
            segment_polygon_distance(&s.a, &s.b, &p.vertices, p.filled) - half(s.width)
        }

        (Shape::Circle(c), Shape::Circle(d)) => {
            c.center.distance(&d.center) - c.radius as f64 - d.radius as f64
        }
        (Shape::Circle(c), Shape::Arc(arc)) => {
            point_arc_distance(&c.center, arc) - c.radius as f64 - half(arc.width)
        }
        (Shape::Circle(c), Shape::Rect(r)) => {
            point_polygon_distance(&c.center, &r.corners(), true) - c.radius as f64
        }
        (Shape::Circle(c), Shape::Polygon(p)) => {
            point_polygon_distance(&c.center, &p.vertices, p.filled) - c.radius as f64
        }

        (Shape::Arc(x), Shape::Arc(y)) => arc_arc_distance(x, y) - half(x.width) - half(y.width),
        (Shape::Arc(arc), Shape::Rect(r)) => {
            arc_polygon_distance(arc, &r.corners(), true) - half(arc.width)
        }
        (Shape::Arc(arc), Shape::Polygon(p)) => {
            arc_polygon_distance(arc, &p.vertices, p.filled) - half(arc.width)
        }

        (Shape::Rect(r), Shape::Rect(q)) => {
            polygon_polygon_distance(&r.corners(), true, &q.corners(), true)
        }
        (Shape::Rect(r), Shape::Polygon(p)) => {
            polygon_polygon_distance(&r.corners(), true, &p.vertices, p.filled)
        }

        (Shape::Polygon(p), Shape::Polygon(q)) => {
            polygon_polygon_distance(&p.vertices, p.filled, &q.vertices, q.filled)
        }

        // Reversed pairs
        (Shape::Circle(_), Shape::Segment(_))
        | (Shape::Arc(_), Shape::Segment(_) | Shape::Circle(_))
        | (Shape::Rect(_), Shape::Segment(_) | Shape::Circle(_) | Shape::Arc(_))
        | (
            Shape::Polygon(_),
            Shape::Segment(_) | Shape::Circle(_) | Shape::Arc(_) | Shape::Rect(_),
        ) => return shape_distance(b, a),
    };
    raw.max(0.0)
}

impl Shape {
    /// Minimum copper-to-copper distance to `other`
    pub fn distance(&self, other: &Shape) -> f64 {
        shape_distance(self, other)
    }

    /// True iff the two shapes are closer than `clearance`
    pub fn collide(&self, other: &Shape, clearance: Coord) -> bool {
        shape_distance(self, other) < clearance as f64
    }
}
