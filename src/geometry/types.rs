//! Core geometry types for board copper data
//!
//! Coordinates are fixed-point integers (the board's base unit, typically
//! nanometers). Products of two coordinate differences are computed in
//! `ECoord` (i128); they cannot overflow while every coordinate stays
//! within [`MAX_COORD`].

use rstar::AABB;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Neg, Sub};

/// Fixed-point coordinate
pub type Coord = i64;

/// Extended-width coordinate for squared distances and cross products
pub type ECoord = i128;

/// Largest supported coordinate magnitude (about 1.15e9 mm in nanometers).
/// Differences of in-range coordinates, grown by an in-range width or
/// clearance, stay below 2^62, so sums of two products stay below 2^125.
pub const MAX_COORD: Coord = 1 << 60;

/// A 2D point in board units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

/// A 2D translation vector in board units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates lie within [`MAX_COORD`]
    pub fn in_range(&self) -> bool {
        self.x.unsigned_abs() <= MAX_COORD as u64 && self.y.unsigned_abs() <= MAX_COORD as u64
    }

    /// Squared Euclidean distance, exact for in-range points
    pub fn distance_sq(&self, other: &Point) -> ECoord {
        let dx = (other.x as ECoord) - (self.x as ECoord);
        let dy = (other.y as ECoord) - (self.y as ECoord);
        dx * dx + dy * dy
    }

    /// Euclidean distance
    pub fn distance(&self, other: &Point) -> f64 {
        (self.distance_sq(other) as f64).sqrt()
    }

    /// Bearing of `self` seen from `center`, normalized to [0, 360) degrees
    pub fn bearing_from(&self, center: &Point) -> f64 {
        let dx = (self.x - center.x) as f64;
        let dy = (self.y - center.y) as f64;
        normalize_degrees(dy.atan2(dx).to_degrees())
    }

    /// Rotate around `center` by `angle_deg` (counter-clockwise), rounding
    /// to the nearest board unit
    pub fn rotated(&self, center: &Point, angle_deg: f64) -> Point {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        let dx = (self.x - center.x) as f64;
        let dy = (self.y - center.y) as f64;
        Point::new(
            center.x + (dx * cos - dy * sin).round() as Coord,
            center.y + (dx * sin + dy * cos).round() as Coord,
        )
    }

    pub fn as_f64(&self) -> [f64; 2] {
        [self.x as f64, self.y as f64]
    }
}

impl Vector {
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }
}

impl Add<Vector> for Point {
    type Output = Point;
    fn add(self, v: Vector) -> Point {
        Point::new(self.x + v.x, self.y + v.y)
    }
}

impl Sub for Point {
    type Output = Vector;
    fn sub(self, other: Point) -> Vector {
        Vector::new(self.x - other.x, self.y - other.y)
    }
}

impl Neg for Vector {
    type Output = Vector;
    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y)
    }
}

/// Orientation of `c` relative to the directed line `a -> b`:
/// positive = left (counter-clockwise), negative = right, zero = collinear.
/// Exact for points within [`MAX_COORD`].
pub fn orient(a: &Point, b: &Point, c: &Point) -> ECoord {
    let abx = (b.x as ECoord) - (a.x as ECoord);
    let aby = (b.y as ECoord) - (a.y as ECoord);
    let acx = (c.x as ECoord) - (a.x as ECoord);
    let acy = (c.y as ECoord) - (a.y as ECoord);
    abx * acy - aby * acx
}

/// Normalize an angle to [0, 360) degrees
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle % 360.0;
    if a < 0.0 { a + 360.0 } else { a }
}

/// Axis-aligned bounding box with inclusive integer corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point. Panics on an empty slice,
    /// which callers rule out by construction.
    pub fn from_points(points: &[Point]) -> Self {
        assert!(!points.is_empty(), "bounding box of zero points");
        let mut bbox = BoundingBox::new(points[0], points[0]);
        for p in &points[1..] {
            bbox.include(p);
        }
        bbox
    }

    pub fn include(&mut self, p: &Point) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn merge(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }

    /// Grow by `amount` on every side
    pub fn inflate(&self, amount: Coord) -> BoundingBox {
        BoundingBox::new(
            Point::new(self.min.x - amount, self.min.y - amount),
            Point::new(self.max.x + amount, self.max.y + amount),
        )
    }

    pub fn translated(&self, v: Vector) -> BoundingBox {
        BoundingBox::new(self.min + v, self.max + v)
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        self.contains(&other.min) && self.contains(&other.max)
    }

    /// Intersection of two boxes, `None` if they are disjoint
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let min = Point::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y));
        let max = Point::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y));
        (min.x <= max.x && min.y <= max.y).then(|| BoundingBox::new(min, max))
    }

    /// Squared gap between two boxes (zero when they touch or overlap)
    pub fn squared_distance(&self, other: &BoundingBox) -> ECoord {
        let gap = |lo_a: Coord, hi_a: Coord, lo_b: Coord, hi_b: Coord| -> ECoord {
            if hi_a < lo_b {
                (lo_b as ECoord) - (hi_a as ECoord)
            } else if hi_b < lo_a {
                (lo_a as ECoord) - (hi_b as ECoord)
            } else {
                0
            }
        };
        let dx = gap(self.min.x, self.max.x, other.min.x, other.max.x);
        let dy = gap(self.min.y, self.max.y, other.min.y, other.max.y);
        dx * dx + dy * dy
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.min.x + (self.max.x - self.min.x) / 2,
            self.min.y + (self.max.y - self.min.y) / 2,
        )
    }

    /// R-tree envelope for this box
    pub fn envelope(&self) -> AABB<[Coord; 2]> {
        AABB::from_corners([self.min.x, self.min.y], [self.max.x, self.max.y])
    }
}
