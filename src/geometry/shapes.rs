//! Shape primitives for conductive board features
//!
//! A closed set of shape kinds. Every kind exposes a sound bounding box, an
//! in-place translation and an exact clearance test against every other
//! kind (see [`super::collide`]).

use serde::{Deserialize, Serialize};

use super::types::{normalize_degrees, BoundingBox, Coord, Point, Vector, MAX_COORD};

/// Straight trace stroke: the set of points within `width / 2` of the
/// segment `a`-`b`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
    pub width: Coord,
}

/// Filled disc
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Point,
    pub radius: Coord,
}

/// Curved trace stroke around `center`, starting at `start` and sweeping
/// `angle` degrees (positive = counter-clockwise)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub center: Point,
    pub start: Point,
    pub angle: f64,
    pub width: Coord,
}

/// Axis-aligned filled rectangle with its lower-left corner at `p0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub p0: Point,
    pub size: Vector,
}

/// Closed polygon. A filled polygon collides with anything inside it, an
/// unfilled one only with its outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Point>,
    pub filled: bool,
}

/// Any conductive shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Segment(Segment),
    Circle(Circle),
    Arc(Arc),
    Rect(Rect),
    Polygon(Polygon),
    Compound { shapes: Vec<Shape> },
}

/// Half of a stroke width, rounded up so boxes never shrink
fn half_width_ceil(width: Coord) -> Coord {
    (width + 1) / 2
}

impl Segment {
    pub fn new(a: Point, b: Point, width: Coord) -> Self {
        Self { a, b, width }
    }
}

impl Circle {
    pub fn new(center: Point, radius: Coord) -> Self {
        Self { center, radius }
    }
}

impl Arc {
    pub fn new(center: Point, start: Point, angle: f64, width: Coord) -> Self {
        Self { center, start, angle, width }
    }

    /// Distance from center to start
    pub fn radius(&self) -> f64 {
        self.center.distance(&self.start)
    }

    /// Bearing of the start point, in [0, 360)
    pub fn start_bearing(&self) -> f64 {
        self.start.bearing_from(&self.center)
    }

    /// Bearing of the end point, in [0, 360)
    pub fn end_bearing(&self) -> f64 {
        normalize_degrees(self.start_bearing() + self.angle)
    }

    /// End point: start rotated about the center by the central angle
    pub fn end(&self) -> Point {
        self.start.rotated(&self.center, self.angle)
    }

    /// Unrounded end point
    pub(crate) fn end_f64(&self) -> [f64; 2] {
        self.point_at_bearing(self.end_bearing())
    }

    pub(crate) fn point_at_bearing(&self, bearing: f64) -> [f64; 2] {
        let r = self.radius();
        let (sin, cos) = bearing.to_radians().sin_cos();
        [self.center.x as f64 + r * cos, self.center.y as f64 + r * sin]
    }

    pub fn is_full_circle(&self) -> bool {
        self.angle.abs() >= 360.0
    }

    /// Whether a bearing (degrees) lies on the swept range
    pub fn contains_bearing(&self, bearing: f64) -> bool {
        const EPS: f64 = 1e-9;
        if self.is_full_circle() {
            return true;
        }
        let offset = if self.angle >= 0.0 {
            normalize_degrees(bearing - self.start_bearing())
        } else {
            normalize_degrees(self.start_bearing() - bearing)
        };
        offset <= self.angle.abs() + EPS || offset >= 360.0 - EPS
    }

    fn bounding_box(&self) -> BoundingBox {
        let [ex, ey] = self.end_f64();
        let mut min = [ex.min(self.start.x as f64), ey.min(self.start.y as f64)];
        let mut max = [ex.max(self.start.x as f64), ey.max(self.start.y as f64)];
        for bearing in [0.0, 90.0, 180.0, 270.0] {
            if self.contains_bearing(bearing) {
                let [x, y] = self.point_at_bearing(bearing);
                min = [min[0].min(x), min[1].min(y)];
                max = [max[0].max(x), max[1].max(y)];
            }
        }
        // Round outwards by one extra unit to absorb trigonometric error
        BoundingBox::new(
            Point::new(min[0].floor() as Coord - 1, min[1].floor() as Coord - 1),
            Point::new(max[0].ceil() as Coord + 1, max[1].ceil() as Coord + 1),
        )
    }
}

impl Rect {
    pub fn new(p0: Point, size: Vector) -> Self {
        Self { p0, size }
    }

    /// Corners in counter-clockwise order
    pub fn corners(&self) -> [Point; 4] {
        let (x0, y0) = (self.p0.x, self.p0.y);
        let (x1, y1) = (x0 + self.size.x, y0 + self.size.y);
        [Point::new(x0, y0), Point::new(x1, y0), Point::new(x1, y1), Point::new(x0, y1)]
    }
}

impl Polygon {
    pub fn new(vertices: Vec<Point>, filled: bool) -> Self {
        Self { vertices, filled }
    }

    pub fn filled(vertices: Vec<Point>) -> Self {
        Self::new(vertices, true)
    }
}

impl Shape {
    /// Box enclosing the shape grown by `clearance` on every side. Never an
    /// underestimate of the true extent.
    pub fn bounding_box(&self, clearance: Coord) -> BoundingBox {
        match self {
            Shape::Segment(s) => BoundingBox::from_points(&[s.a, s.b])
                .inflate(half_width_ceil(s.width) + clearance),
            Shape::Circle(c) => BoundingBox::new(c.center, c.center).inflate(c.radius + clearance),
            Shape::Arc(a) => a.bounding_box().inflate(half_width_ceil(a.width) + clearance),
            Shape::Rect(r) => BoundingBox::from_points(&r.corners()).inflate(clearance),
            Shape::Polygon(p) => {
                assert!(!p.vertices.is_empty(), "polygon without vertices");
                BoundingBox::from_points(&p.vertices).inflate(clearance)
            }
            Shape::Compound { shapes } => {
                assert!(!shapes.is_empty(), "compound shape without children");
                shapes[1..]
                    .iter()
                    .fold(shapes[0].bounding_box(clearance), |acc, s| {
                        acc.merge(&s.bounding_box(clearance))
                    })
            }
        }
    }

    /// Whether every point and size of the shape lies within [`MAX_COORD`]
    pub fn in_range(&self) -> bool {
        let size_ok = |v: Coord| (0..=MAX_COORD).contains(&v);
        match self {
            Shape::Segment(s) => s.a.in_range() && s.b.in_range() && size_ok(s.width),
            Shape::Circle(c) => c.center.in_range() && size_ok(c.radius),
            Shape::Arc(a) => {
                a.center.in_range() && a.start.in_range() && size_ok(a.width) && a.angle.is_finite()
            }
            Shape::Rect(r) => {
                r.p0.in_range() && r.size.x.unsigned_abs() <= MAX_COORD as u64
                    && r.size.y.unsigned_abs() <= MAX_COORD as u64
                    && r.corners().iter().all(Point::in_range)
            }
            Shape::Polygon(p) => p.vertices.iter().all(Point::in_range),
            Shape::Compound { shapes } => shapes.iter().all(Shape::in_range),
        }
    }

    /// Translate in place
    pub fn translate(&mut self, v: Vector) {
        match self {
            Shape::Segment(s) => {
                s.a = s.a + v;
                s.b = s.b + v;
            }
            Shape::Circle(c) => c.center = c.center + v,
            Shape::Arc(a) => {
                a.center = a.center + v;
                a.start = a.start + v;
            }
            Shape::Rect(r) => r.p0 = r.p0 + v,
            Shape::Polygon(p) => p.vertices.iter_mut().for_each(|pt| *pt = *pt + v),
            Shape::Compound { shapes } => shapes.iter_mut().for_each(|s| s.translate(v)),
        }
    }

    /// Translated copy
    pub fn translated(&self, v: Vector) -> Shape {
        let mut shape = self.clone();
        shape.translate(v);
        shape
    }

    /// Whether interior overlap counts as a collision. Strokes and discs are
    /// solid; a polygon only when filled.
    pub fn is_solid(&self) -> bool {
        match self {
            Shape::Segment(_) | Shape::Circle(_) | Shape::Arc(_) | Shape::Rect(_) => true,
            Shape::Polygon(p) => p.filled,
            Shape::Compound { shapes } => shapes.iter().any(Shape::is_solid),
        }
    }

    /// Human-readable kind, used in log output
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Segment(_) => "segment",
            Shape::Circle(_) => "circle",
            Shape::Arc(_) => "arc",
            Shape::Rect(_) => "rect",
            Shape::Polygon(_) => "polygon",
            Shape::Compound { .. } => "compound",
        }
    }
}

impl From<Segment> for Shape {
    fn from(s: Segment) -> Self {
        Shape::Segment(s)
    }
}

impl From<Circle> for Shape {
    fn from(c: Circle) -> Self {
        Shape::Circle(c)
    }
}

impl From<Arc> for Shape {
    fn from(a: Arc) -> Self {
        Shape::Arc(a)
    }
}

impl From<Rect> for Shape {
    fn from(r: Rect) -> Self {
        Shape::Rect(r)
    }
}

impl From<Polygon> for Shape {
    fn from(p: Polygon) -> Self {
        Shape::Polygon(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arc_derived_parameters() {
        let arc = Arc::new(Point::new(0, 0), Point::new(1000, 0), 90.0, 0);
        assert!((arc.radius() - 1000.0).abs() < 1e-9);
        assert_eq!(arc.end(), Point::new(0, 1000));
        assert!((arc.start_bearing() - 0.0).abs() < 1e-9);
        assert!((arc.end_bearing() - 90.0).abs() < 1e-9);
        assert!(arc.contains_bearing(45.0));
        assert!(!arc.contains_bearing(180.0));
    }

    #[test]
    fn test_clockwise_arc_contains() {
        let arc = Arc::new(Point::new(0, 0), Point::new(0, 1000), -90.0, 0);
        assert_eq!(arc.end(), Point::new(1000, 0));
        assert!(arc.contains_bearing(45.0));
        assert!(!arc.contains_bearing(135.0));
    }

    #[test]
    fn test_arc_bbox_includes_axis_extreme() {
        // Quarter arc from 45 to 135 degrees passes through the top at 90
        let start = Point::new(707, 707);
        let arc = Arc::new(Point::new(0, 0), start, 90.0, 0);
        let bbox = Shape::Arc(arc).bounding_box(0);
        assert!(bbox.max.y >= 1000);
        assert!(bbox.min.y <= 707);
    }

    #[test]
    fn test_segment_bbox_with_width_and_clearance() {
        let seg = Shape::Segment(Segment::new(Point::new(0, 0), Point::new(100, 0), 11));
        let bbox = seg.bounding_box(10);
        assert_eq!(bbox.min, Point::new(-16, -16));
        assert_eq!(bbox.max, Point::new(116, 16));
    }

    #[test]
    fn test_translate_compound() {
        let mut shape = Shape::Compound {
            shapes: vec![
                Circle::new(Point::new(0, 0), 5).into(),
                Rect::new(Point::new(10, 10), Vector::new(4, 4)).into(),
            ],
        };
        shape.translate(Vector::new(100, -100));
        let bbox = shape.bounding_box(0);
        assert_eq!(bbox.min, Point::new(95, -105));
        assert_eq!(bbox.max, Point::new(114, -86));
    }

    #[test]
    fn test_is_solid() {
        assert!(Shape::Circle(Circle::new(Point::new(0, 0), 1)).is_solid());
        assert!(!Shape::Polygon(Polygon::new(vec![Point::new(0, 0)], false)).is_solid());
    }
}
