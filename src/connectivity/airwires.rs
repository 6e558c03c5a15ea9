//! AirWire builder: minimal missing connections of one net
//!
//! Points are registered once, already-routed connections are declared with
//! [`AirWireBuilder::add_edge`], and [`AirWireBuilder::build_air_wires`] runs
//! Kruskal over the triangulation candidates with a union-find seeded by
//! those connections. Every returned pair joins two different components,
//! and together they connect everything at minimum total length.

use petgraph::unionfind::UnionFind;
use tracing::debug;

use super::triangulation::candidate_edges;
use crate::geometry::{ECoord, Point};

/// Dense, zero-based handle of a registered point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(pub usize);

/// Point registry plus the pre-existing connections between its points
#[derive(Debug, Clone, Default)]
pub struct AirWireBuilder {
    points: Vec<Point>,
    edges: Vec<(usize, usize)>,
}

impl AirWireBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a point. Ids are assigned 0, 1, 2, ...
    pub fn add_point(&mut self, position: Point) -> PointId {
        self.points.push(position);
        PointId(self.points.len() - 1)
    }

    /// Declare two registered points as already connected
    pub fn add_edge(&mut self, a: PointId, b: PointId) {
        assert!(
            a.0 < self.points.len() && b.0 < self.points.len(),
            "edge {:?}-{:?} references an unregistered point ({} registered)",
            a,
            b,
            self.points.len()
        );
        self.edges.push((a.0, b.0));
    }

    pub fn position(&self, id: PointId) -> Point {
        self.points[id.0]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Union-find over all points with every declared edge already merged
    fn components(&self) -> UnionFind<usize> {
        let mut uf = UnionFind::new(self.points.len());
        for &(a, b) in &self.edges {
            uf.union(a, b);
        }
        uf
    }

    /// Missing connections, at minimum total Euclidean length. Does not
    /// mutate the builder; repeated calls return the same pairs.
    pub fn build_air_wires(&self) -> Vec<(PointId, PointId)> {
        let candidates = candidate_edges(&self.points);
        let wires = self.kruskal(candidates);
        debug!(
            points = self.points.len(),
            connections = self.edges.len(),
            airwires = wires.len(),
            "built airwires"
        );
        wires
    }

    fn kruskal(&self, candidates: Vec<(usize, usize)>) -> Vec<(PointId, PointId)> {
        let mut weighted: Vec<(ECoord, usize, usize)> = candidates
            .into_iter()
            .map(|(a, b)| (self.points[a].distance_sq(&self.points[b]), a, b))
            .collect();
        weighted.sort_unstable();

        let mut uf = self.components();
        let mut wires = Vec::new();
        for (_, a, b) in weighted {
            if uf.union(a, b) {
                wires.push((PointId(a), PointId(b)));
            }
        }
        wires
    }
}

/// Reference result over the complete graph of all point pairs. O(n²);
/// meant as a test oracle for [`AirWireBuilder::build_air_wires`].
pub fn brute_force_air_wires(builder: &AirWireBuilder) -> Vec<(PointId, PointId)> {
    let n = builder.points.len();
    let all_pairs = (0..n).flat_map(|a| (a + 1..n).map(move |b| (a, b))).collect();
    builder.kruskal(all_pairs)
}
