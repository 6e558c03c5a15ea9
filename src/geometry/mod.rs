//! Copper geometry: fixed-point primitives, exact clearance tests and a
//! spatial index for clearance queries
//!
//! # Submodules
//! - `types` - Point, Vector, BoundingBox and extended-width arithmetic
//! - `shapes` - The closed set of conductive shape kinds
//! - `distance` - Exact primitive distance kernels
//! - `collide` - Pairwise dispatch over every shape combination
//! - `spatial` - Arena-backed R-tree Shape Index

mod types;
mod shapes;
pub mod distance;
mod collide;
mod spatial;

pub use types::{orient, normalize_degrees, BoundingBox, Coord, ECoord, Point, Vector, MAX_COORD};
pub use shapes::{Arc, Circle, Polygon, Rect, Segment, Shape};
pub use collide::shape_distance;
pub use spatial::{EntryId, ShapeArena, ShapeEntry, ShapeIndex, ShapeMatch};
