//! Candidate-edge reduction via Delaunay triangulation
//!
//! The Euclidean minimum spanning tree of a point set is a subgraph of any
//! Delaunay triangulation of it, so the spanning-tree search only needs the
//! triangulation's edges instead of all O(n²) pairs.
//!
//! Construction is a lexicographic sweep: points are sorted by (x, y), the
//! first non-collinear point is fanned to the collinear prefix, and every
//! later point is connected to the hull edges it can strictly see. The
//! result is then made Delaunay by Lawson edge flips. All predicates are
//! exact integer arithmetic; the incircle test falls back to `f64` only when
//! the 128-bit determinant would overflow.
//!
//! Degenerate input never fails:
//! - duplicate positions get a zero-length edge to their first occurrence
//! - a fully collinear set gets edges between line neighbors only

use tracing::debug;

use crate::geometry::{orient, ECoord, Point};

const NONE: usize = usize::MAX;

/// Triangles over a set of distinct points. Vertices are CCW; edge `i` runs
/// from `verts[i]` to `verts[(i + 1) % 3]` and `adj[i]` is the triangle on
/// its other side.
struct Mesh {
    verts: Vec<[usize; 3]>,
    adj: Vec<[usize; 3]>,
}

impl Mesh {
    fn with_capacity(n: usize) -> Self {
        Self {
            verts: Vec::with_capacity(2 * n),
            adj: Vec::with_capacity(2 * n),
        }
    }

    fn push(&mut self, verts: [usize; 3]) -> usize {
        self.verts.push(verts);
        self.adj.push([NONE; 3]);
        self.verts.len() - 1
    }

    fn link(&mut self, t: usize, i: usize, u: usize, j: usize) {
        self.adj[t][i] = u;
        self.adj[u][j] = t;
    }

    fn replace_neighbor(&mut self, tri: usize, old: usize, new: usize) {
        if tri == NONE {
            return;
        }
        if let Some(slot) = self.adj[tri].iter_mut().find(|n| **n == old) {
            *slot = new;
        }
    }
}

/// Sign of the incircle determinant: positive iff `d` lies strictly inside
/// the circumcircle of the CCW triangle `a, b, c`
fn incircle(a: &Point, b: &Point, c: &Point, d: &Point) -> i8 {
    match incircle_exact(a, b, c, d) {
        Some(det) => det.signum() as i8,
        None => {
            let det = incircle_f64(a, b, c, d);
            if det > 0.0 {
                1
            } else if det < 0.0 {
                -1
            } else {
                0
            }
        }
    }
}

fn incircle_exact(a: &Point, b: &Point, c: &Point, d: &Point) -> Option<ECoord> {
    let rel = |p: &Point| ((p.x as ECoord) - (d.x as ECoord), (p.y as ECoord) - (d.y as ECoord));
    let (adx, ady) = rel(a);
    let (bdx, bdy) = rel(b);
    let (cdx, cdy) = rel(c);
    let lift = |x: ECoord, y: ECoord| x.checked_mul(x)?.checked_add(y.checked_mul(y)?);
    let al = lift(adx, ady)?;
    let bl = lift(bdx, bdy)?;
    let cl = lift(cdx, cdy)?;
    let minor = |p: ECoord, q: ECoord, r: ECoord, s: ECoord| {
        p.checked_mul(q)?.checked_sub(r.checked_mul(s)?)
    };
    let m1 = minor(bdy, cl, cdy, bl)?;
    let m2 = minor(bdx, cl, cdx, bl)?;
    let m3 = minor(bdx, cdy, cdx, bdy)?;
    adx.checked_mul(m1)?
        .checked_sub(ady.checked_mul(m2)?)?
        .checked_add(al.checked_mul(m3)?)
}

fn incircle_f64(a: &Point, b: &Point, c: &Point, d: &Point) -> f64 {
    let rel = |p: &Point| ((p.x - d.x) as f64, (p.y - d.y) as f64);
    let (adx, ady) = rel(a);
    let (bdx, bdy) = rel(b);
    let (cdx, cdy) = rel(c);
    let al = adx * adx + ady * ady;
    let bl = bdx * bdx + bdy * bdy;
    let cl = cdx * cdx + cdy * cdy;
    adx * (bdy * cl - cdy * bl) - ady * (bdx * cl - cdx * bl) + al * (bdx * cdy - cdx * bdy)
}

/// Sweep triangulation of distinct, lexicographically sorted points whose
/// first `prefix` points are collinear and whose point `prefix` is not
fn sweep(pts: &[Point], prefix: usize) -> Mesh {
    let n = pts.len();
    let mut mesh = Mesh::with_capacity(n);
    let mut hull_next = vec![NONE; n];
    let mut hull_prev = vec![NONE; n];
    // Triangle and edge index owning the hull edge v -> hull_next[v]
    let mut hull_tri = vec![(NONE, 0usize); n];

    let apex = prefix;
    let p = pts[apex];
    let last = prefix - 1;
    if orient(&pts[0], &pts[last], &p) > 0 {
        for i in 0..last {
            let t = mesh.push([i, i + 1, apex]);
            if i > 0 {
                mesh.link(t, 2, t - 1, 1);
            }
            hull_next[i] = i + 1;
            hull_prev[i + 1] = i;
            hull_tri[i] = (t, 0);
        }
        hull_next[last] = apex;
        hull_prev[apex] = last;
        hull_tri[last] = (last - 1, 1);
        hull_next[apex] = 0;
        hull_prev[0] = apex;
        hull_tri[apex] = (0, 2);
    } else {
        for i in 0..last {
            let t = mesh.push([i + 1, i, apex]);
            if i > 0 {
                mesh.link(t, 1, t - 1, 2);
            }
            hull_next[i + 1] = i;
            hull_prev[i] = i + 1;
            hull_tri[i + 1] = (t, 0);
        }
        hull_next[0] = apex;
        hull_prev[apex] = 0;
        hull_tri[0] = (0, 1);
        hull_next[apex] = last;
        hull_prev[last] = apex;
        hull_tri[apex] = (last - 1, 2);
    }

    // The previous point is lexicographically greatest so far, hence a
    // strictly convex hull vertex visible from the next one
    for v in apex + 1..n {
        let q = v - 1;
        let p = pts[v];
        let mut right = q;
        while orient(&pts[right], &pts[hull_next[right]], &p) < 0 {
            right = hull_next[right];
        }
        let mut left = q;
        while orient(&pts[hull_prev[left]], &pts[left], &p) < 0 {
            left = hull_prev[left];
        }
        assert!(left != right, "sweep point sees no hull edge");

        let mut cur = left;
        let mut prev_tri = NONE;
        let mut first_tri = NONE;
        while cur != right {
            let next = hull_next[cur];
            let t = mesh.push([next, cur, v]);
            let (owner, edge) = hull_tri[cur];
            mesh.link(t, 0, owner, edge);
            if prev_tri == NONE {
                first_tri = t;
            } else {
                mesh.link(t, 1, prev_tri, 2);
            }
            prev_tri = t;
            cur = next;
        }

        hull_next[left] = v;
        hull_prev[v] = left;
        hull_next[v] = right;
        hull_prev[right] = v;
        hull_tri[left] = (first_tri, 1);
        hull_tri[v] = (prev_tri, 2);
    }
    mesh
}

/// Lawson flips until every interior edge is locally Delaunay
fn legalize(mesh: &mut Mesh, pts: &[Point]) -> usize {
    let mut stack: Vec<(usize, usize)> = (0..mesh.verts.len())
        .flat_map(|t| (0..3).map(move |i| (t, i)))
        .collect();
    let mut flips = 0;

    while let Some((t, i)) = stack.pop() {
        let u = mesh.adj[t][i];
        if u == NONE {
            continue;
        }
        let [a, b, c] = [
            mesh.verts[t][i],
            mesh.verts[t][(i + 1) % 3],
            mesh.verts[t][(i + 2) % 3],
        ];
        let Some(j) = mesh.adj[u].iter().position(|&n| n == t) else {
            continue;
        };
        let d = mesh.verts[u][(j + 2) % 3];
        if incircle(&pts[a], &pts[b], &pts[c], &pts[d]) <= 0 {
            continue;
        }

        let n_bc = mesh.adj[t][(i + 1) % 3];
        let n_ca = mesh.adj[t][(i + 2) % 3];
        let n_ad = mesh.adj[u][(j + 1) % 3];
        let n_db = mesh.adj[u][(j + 2) % 3];

        mesh.verts[t] = [a, d, c];
        mesh.adj[t] = [n_ad, u, n_ca];
        mesh.verts[u] = [d, b, c];
        mesh.adj[u] = [n_db, n_bc, t];
        mesh.replace_neighbor(n_ad, u, t);
        mesh.replace_neighbor(n_bc, t, u);

        stack.extend([(t, 0), (t, 2), (u, 0), (u, 1)]);
        flips += 1;
    }
    flips
}

/// Candidate edges guaranteed to contain a Euclidean minimum spanning tree
/// of `points`. Pairs are indices into `points`, smaller index first, each
/// listed once.
pub fn candidate_edges(points: &[Point]) -> Vec<(usize, usize)> {
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| (points[i], i));

    let mut edges = Vec::new();
    let mut pts: Vec<Point> = Vec::with_capacity(points.len());
    let mut orig: Vec<usize> = Vec::with_capacity(points.len());
    for &i in &order {
        match pts.last() {
            Some(last) if *last == points[i] => {
                // Duplicate position: zero-length edge to the first occurrence
                let rep = orig[orig.len() - 1];
                edges.push((rep.min(i), rep.max(i)));
            }
            _ => {
                pts.push(points[i]);
                orig.push(i);
            }
        }
    }

    let pair = |a: usize, b: usize| {
        let (x, y) = (orig[a], orig[b]);
        (x.min(y), x.max(y))
    };

    let n = pts.len();
    let prefix = (2..n)
        .find(|&k| orient(&pts[0], &pts[1], &pts[k]) != 0)
        .unwrap_or(n);
    if prefix == n {
        // Collinear (or fewer than three distinct points): sorted order is
        // line order, so only consecutive points are neighbors
        edges.extend((1..n).map(|k| pair(k - 1, k)));
        debug!(points = points.len(), edges = edges.len(), "collinear candidate edges");
        return edges;
    }

    let mut mesh = sweep(&pts, prefix);
    let flips = legalize(&mut mesh, &pts);

    for (t, verts) in mesh.verts.iter().enumerate() {
        for i in 0..3 {
            let neighbor = mesh.adj[t][i];
            if neighbor == NONE || t < neighbor {
                edges.push(pair(verts[i], verts[(i + 1) % 3]));
            }
        }
    }
    debug!(
        points = points.len(),
        triangles = mesh.verts.len(),
        flips,
        edges = edges.len(),
        "triangulated candidate edges"
    );
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn pts(coords: &[(i64, i64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn edge_set(points: &[Point]) -> BTreeSet<(usize, usize)> {
        let edges = candidate_edges(points);
        let set: BTreeSet<_> = edges.iter().copied().collect();
        assert_eq!(set.len(), edges.len(), "duplicate candidate edge");
        set
    }

    /// Deterministic pseudo-random points on a coarse grid, so duplicates
    /// and collinear triples are common
    fn scattered(n: usize, seed: u64, grid: i64) -> Vec<Point> {
        let mut state = seed;
        let mut next = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            ((state >> 33) as i64).rem_euclid(grid)
        };
        (0..n).map(|_| Point::new(next() * 1000, next() * 1000)).collect()
    }

    #[test]
    fn test_trivial_inputs() {
        assert!(candidate_edges(&[]).is_empty());
        assert!(candidate_edges(&pts(&[(5, 5)])).is_empty());
        assert_eq!(candidate_edges(&pts(&[(0, 0), (9, 9)])), vec![(0, 1)]);
    }

    #[test]
    fn test_duplicates_get_zero_length_edge() {
        let set = edge_set(&pts(&[(7, 7), (7, 7), (7, 7)]));
        assert_eq!(set, BTreeSet::from([(0, 1), (0, 2)]));
    }

    #[test]
    fn test_collinear_points_only_link_neighbors() {
        // Shuffled along a diagonal
        let set = edge_set(&pts(&[(300, 300), (0, 0), (200, 200), (100, 100)]));
        assert_eq!(set, BTreeSet::from([(1, 3), (2, 3), (0, 2)]));
    }

    #[test]
    fn test_square_has_one_diagonal() {
        let set = edge_set(&pts(&[(0, 0), (10, 0), (10, 10), (0, 10)]));
        assert_eq!(set.len(), 5);
        for side in [(0, 1), (1, 2), (2, 3), (0, 3)] {
            assert!(set.contains(&side));
        }
    }

    #[test]
    fn test_collinear_prefix_fan() {
        // Three points on the x axis followed by an apex below the line
        let set = edge_set(&pts(&[(0, 0), (10, 0), (20, 0), (30, -5)]));
        assert!(set.contains(&(0, 1)));
        assert!(set.contains(&(1, 2)));
        assert!(!set.contains(&(0, 2)));
    }

    #[test]
    fn test_triangulation_is_delaunay() {
        for seed in 1..20 {
            let points = scattered(60, seed, 40);
            let mut sorted = points.clone();
            sorted.sort();
            sorted.dedup();
            let prefix = (2..sorted.len())
                .find(|&k| orient(&sorted[0], &sorted[1], &sorted[k]) != 0)
                .unwrap();
            let mut mesh = sweep(&sorted, prefix);
            legalize(&mut mesh, &sorted);

            for [a, b, c] in &mesh.verts {
                let (a, b, c) = (&sorted[*a], &sorted[*b], &sorted[*c]);
                assert!(orient(a, b, c) > 0, "triangle not counter-clockwise");
                for d in &sorted {
                    assert!(incircle(a, b, c, d) <= 0, "point inside circumcircle");
                }
            }
            for (t, adj) in mesh.adj.iter().enumerate() {
                for &u in adj.iter().filter(|&&u| u != NONE) {
                    assert!(mesh.adj[u].contains(&t), "asymmetric adjacency");
                }
            }
        }
    }

    #[test]
    fn test_edge_count_is_linear() {
        let points = scattered(500, 42, 1000);
        let edges = candidate_edges(&points);
        assert!(edges.len() <= 3 * points.len());
    }

    #[test]
    fn test_incircle_falls_back_on_overflow() {
        let big = 1i64 << 60;
        let a = Point::new(-big, 0);
        let b = Point::new(big, 0);
        let c = Point::new(0, big);
        assert!(incircle_exact(&a, &b, &c, &Point::new(0, 0)).is_none());
        assert_eq!(incircle(&a, &b, &c, &Point::new(0, 0)), 1);
        assert_eq!(incircle(&a, &b, &c, &Point::new(0, -2 * big)), -1);
    }
}
