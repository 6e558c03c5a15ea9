//! Net connectivity: which required connections are still missing
//!
//! # Submodules
//! - `triangulation` - Sparse candidate edges (Delaunay) containing the EMST
//! - `airwires` - Point registry, union-find seeding and Kruskal selection

mod triangulation;
mod airwires;

pub use triangulation::candidate_edges;
pub use airwires::{brute_force_air_wires, AirWireBuilder, PointId};
