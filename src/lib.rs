//! Connectivity and clearance verification for printed circuit boards
//!
//! Checks whether a board's copper is electrically complete (every point of
//! a net reachable from every other) and physically valid (no two copper
//! features of different nets closer than their clearance).
//!
//! # Modules
//! - `geometry` - Fixed-point shapes, exact clearance tests, Shape Index
//! - `connectivity` - Candidate-edge reduction and the AirWire builder
//! - `drc` - Board snapshot, rule checks, messages, approvals and runs
//!
//! # Example
//! ```
//! use copper_drc::connectivity::AirWireBuilder;
//! use copper_drc::geometry::Point;
//!
//! let mut builder = AirWireBuilder::new();
//! let a = builder.add_point(Point::new(0, 0));
//! let b = builder.add_point(Point::new(1_000_000, 0));
//! builder.add_point(Point::new(5_000_000, 0));
//! builder.add_edge(a, b);
//! assert_eq!(builder.build_air_wires().len(), 1);
//! ```

pub mod geometry;
pub mod connectivity;
pub mod drc;

pub use connectivity::{AirWireBuilder, PointId};
pub use drc::{BoardSnapshot, DesignRuleCheck, DrcError, DrcReport, DrcSettings, RuleCheckMessage};
pub use geometry::{Point, Shape, ShapeIndex};
