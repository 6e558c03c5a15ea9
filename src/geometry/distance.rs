//! Exact distance kernels between shape skeletons
//!
//! Strokes are handled as skeleton + half width: a segment stroke is its
//! centerline, a circle is its center point, an arc stroke its centerline
//! arc. The kernels return the minimum Euclidean distance between two
//! skeletons (zero when they touch or overlap). Predicates on integer input
//! run in extended-width integers; only the final square root and the arc
//! trigonometry use floating point.

use super::shapes::Arc;
use super::types::{orient, ECoord, Point};

/// Squared distance from point `p` to segment `a`-`b`
pub fn point_segment_distance_sq(p: &Point, a: &Point, b: &Point) -> f64 {
    let abx = (b.x as ECoord) - (a.x as ECoord);
    let aby = (b.y as ECoord) - (a.y as ECoord);
    let apx = (p.x as ECoord) - (a.x as ECoord);
    let apy = (p.y as ECoord) - (a.y as ECoord);
    let len_sq = abx * abx + aby * aby;
    if len_sq == 0 {
        // Degenerate segment
        return p.distance_sq(a) as f64;
    }
    let dot = apx * abx + apy * aby;
    if dot <= 0 {
        return p.distance_sq(a) as f64;
    }
    if dot >= len_sq {
        return p.distance_sq(b) as f64;
    }
    let cross = (abx * apy - aby * apx) as f64;
    cross * cross / len_sq as f64
}

/// Point-to-segment minimum distance
pub fn point_segment_distance(p: &Point, a: &Point, b: &Point) -> f64 {
    point_segment_distance_sq(p, a, b).sqrt()
}

/// `p` lies on segment `a`-`b`, given that the three are collinear
fn on_segment(a: &Point, b: &Point, p: &Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Whether two closed segments share at least one point
pub fn segments_intersect(a: &Point, b: &Point, c: &Point, d: &Point) -> bool {
    let d1 = orient(c, d, a).signum();
    let d2 = orient(c, d, b).signum();
    let d3 = orient(a, b, c).signum();
    let d4 = orient(a, b, d).signum();

    if d1 * d2 < 0 && d3 * d4 < 0 {
        return true;
    }

    (d1 == 0 && on_segment(c, d, a))
        || (d2 == 0 && on_segment(c, d, b))
        || (d3 == 0 && on_segment(a, b, c))
        || (d4 == 0 && on_segment(a, b, d))
}

/// Segment-to-segment minimum distance
pub fn segment_distance(a: &Point, b: &Point, c: &Point, d: &Point) -> f64 {
    if segments_intersect(a, b, c, d) {
        return 0.0;
    }
    point_segment_distance_sq(a, c, d)
        .min(point_segment_distance_sq(b, c, d))
        .min(point_segment_distance_sq(c, a, b))
        .min(point_segment_distance_sq(d, a, b))
        .sqrt()
}

/// Even-odd point-in-polygon test. Points on the boundary may report
/// either side; callers combine it with a boundary distance.
pub fn point_in_polygon(p: &Point, vertices: &[Point]) -> bool {
    let mut inside = false;
    let n = vertices.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let vi = &vertices[i];
        let vj = &vertices[j];
        if (vi.y > p.y) != (vj.y > p.y) {
            // Compare p.x against the edge's x at p.y without division
            let lhs = ((p.x as ECoord) - (vi.x as ECoord)) * ((vj.y as ECoord) - (vi.y as ECoord));
            let rhs = ((p.y as ECoord) - (vi.y as ECoord)) * ((vj.x as ECoord) - (vi.x as ECoord));
            let crosses = if vj.y > vi.y { lhs < rhs } else { lhs > rhs };
            if crosses {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Closed polygon edges, including the closing one
pub fn polygon_edges(vertices: &[Point]) -> impl Iterator<Item = (&Point, &Point)> {
    assert!(!vertices.is_empty(), "polygon without vertices");
    let n = vertices.len();
    (0..n).map(move |i| (&vertices[i], &vertices[(i + 1) % n]))
}

// ---------------------------------------------------------------------------
// Arc kernels
// ---------------------------------------------------------------------------

fn dist_f64(a: [f64; 2], b: [f64; 2]) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt()
}

fn bearing_f64(center: [f64; 2], p: [f64; 2]) -> f64 {
    super::types::normalize_degrees((p[1] - center[1]).atan2(p[0] - center[0]).to_degrees())
}

fn arc_endpoints(arc: &Arc) -> [[f64; 2]; 2] {
    [arc.start.as_f64(), arc.end_f64()]
}

/// Minimum distance from a point (float) to an arc centerline
fn point_f64_arc_distance(p: [f64; 2], arc: &Arc) -> f64 {
    let c = arc.center.as_f64();
    let r = arc.radius();
    let d = dist_f64(p, c);
    if d < 1e-9 {
        // Every arc point is equally far from the center
        return r;
    }
    if arc.contains_bearing(bearing_f64(c, p)) {
        return (d - r).abs();
    }
    let [e0, e1] = arc_endpoints(arc);
    dist_f64(p, e0).min(dist_f64(p, e1))
}

/// Point-to-arc minimum distance
pub fn point_arc_distance(p: &Point, arc: &Arc) -> f64 {
    point_f64_arc_distance(p.as_f64(), arc)
}

fn point_f64_segment_distance(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let len_sq = ab[0] * ab[0] + ab[1] * ab[1];
    if len_sq == 0.0 {
        return dist_f64(p, a);
    }
    let t = (((p[0] - a[0]) * ab[0] + (p[1] - a[1]) * ab[1]) / len_sq).clamp(0.0, 1.0);
    dist_f64(p, [a[0] + t * ab[0], a[1] + t * ab[1]])
}

/// Segment-to-arc minimum distance
///
/// The minimum is attained at an endpoint of either curve, at the foot of
/// the arc center on the segment (the only interior pair with a common
/// normal), or is zero at an intersection.
pub fn segment_arc_distance(a: &Point, b: &Point, arc: &Arc) -> f64 {
    let pa = a.as_f64();
    let pb = b.as_f64();
    let c = arc.center.as_f64();
    let r = arc.radius();

    let mut best = point_f64_arc_distance(pa, arc).min(point_f64_arc_distance(pb, arc));
    for e in arc_endpoints(arc) {
        best = best.min(point_f64_segment_distance(e, pa, pb));
    }

    let ab = [pb[0] - pa[0], pb[1] - pa[1]];
    let len_sq = ab[0] * ab[0] + ab[1] * ab[1];
    if len_sq == 0.0 {
        return best;
    }

    // Foot of the center on the segment
    let t = ((c[0] - pa[0]) * ab[0] + (c[1] - pa[1]) * ab[1]) / len_sq;
    if (0.0..=1.0).contains(&t) {
        let foot = [pa[0] + t * ab[0], pa[1] + t * ab[1]];
        let d = dist_f64(foot, c);
        if d < 1e-9 || arc.contains_bearing(bearing_f64(c, foot)) {
            best = best.min((d - r).abs());
        }
    }

    // Intersections of the segment with the full circle
    let fx = pa[0] - c[0];
    let fy = pa[1] - c[1];
    let qa = len_sq;
    let qb = 2.0 * (fx * ab[0] + fy * ab[1]);
    let qc = fx * fx + fy * fy - r * r;
    let disc = qb * qb - 4.0 * qa * qc;
    if disc >= 0.0 {
        let root = disc.sqrt();
        for t in [(-qb - root) / (2.0 * qa), (-qb + root) / (2.0 * qa)] {
            if (0.0..=1.0).contains(&t) {
                let q = [pa[0] + t * ab[0], pa[1] + t * ab[1]];
                if arc.contains_bearing(bearing_f64(c, q)) {
                    return 0.0;
                }
            }
        }
    }

    best
}

/// Arc-to-arc minimum distance
///
/// Interior critical pairs lie on the line through both centers; the rest
/// of the candidates are endpoints and circle intersections.
pub fn arc_arc_distance(x: &Arc, y: &Arc) -> f64 {
    let mut best = f64::MAX;
    for e in arc_endpoints(x) {
        best = best.min(point_f64_arc_distance(e, y));
    }
    for e in arc_endpoints(y) {
        best = best.min(point_f64_arc_distance(e, x));
    }

    let cx = x.center.as_f64();
    let cy = y.center.as_f64();
    let rx = x.radius();
    let ry = y.radius();
    let d = dist_f64(cx, cy);

    if d < 1e-9 {
        // Concentric: equal spacing wherever the sweeps overlap
        let overlap = x.contains_bearing(y.start_bearing())
            || x.contains_bearing(y.end_bearing())
            || y.contains_bearing(x.start_bearing());
        if overlap {
            best = best.min((rx - ry).abs());
        }
        return best;
    }

    let u = [(cy[0] - cx[0]) / d, (cy[1] - cx[1]) / d];
    let on_x = [
        [cx[0] + rx * u[0], cx[1] + rx * u[1]],
        [cx[0] - rx * u[0], cx[1] - rx * u[1]],
    ];
    let on_y = [
        [cy[0] + ry * u[0], cy[1] + ry * u[1]],
        [cy[0] - ry * u[0], cy[1] - ry * u[1]],
    ];
    for px in on_x {
        if !x.contains_bearing(bearing_f64(cx, px)) {
            continue;
        }
        for py in on_y {
            if y.contains_bearing(bearing_f64(cy, py)) {
                best = best.min(dist_f64(px, py));
            }
        }
    }

    // Circle-circle intersections
    if d <= rx + ry && d >= (rx - ry).abs() {
        let along = (rx * rx - ry * ry + d * d) / (2.0 * d);
        let h = (rx * rx - along * along).max(0.0).sqrt();
        let base = [cx[0] + along * u[0], cx[1] + along * u[1]];
        for sign in [1.0, -1.0] {
            let q = [base[0] - sign * h * u[1], base[1] + sign * h * u[0]];
            if x.contains_bearing(bearing_f64(cx, q)) && y.contains_bearing(bearing_f64(cy, q)) {
                return 0.0;
            }
        }
    }

    best
}

// ---------------------------------------------------------------------------
// Polygon kernels
// ---------------------------------------------------------------------------

/// Point-to-polygon distance (zero inside a filled polygon)
pub fn point_polygon_distance(p: &Point, vertices: &[Point], filled: bool) -> f64 {
    if filled && point_in_polygon(p, vertices) {
        return 0.0;
    }
    polygon_edges(vertices)
        .map(|(a, b)| point_segment_distance_sq(p, a, b))
        .fold(f64::MAX, f64::min)
        .sqrt()
}

/// Segment-to-polygon distance
pub fn segment_polygon_distance(a: &Point, b: &Point, vertices: &[Point], filled: bool) -> f64 {
    if filled && (point_in_polygon(a, vertices) || point_in_polygon(b, vertices)) {
        return 0.0;
    }
    polygon_edges(vertices)
        .map(|(c, d)| segment_distance(a, b, c, d))
        .fold(f64::MAX, f64::min)
}

/// Arc-to-polygon distance
pub fn arc_polygon_distance(arc: &Arc, vertices: &[Point], filled: bool) -> f64 {
    // An arc that does not cross the outline is either wholly inside or
    // wholly outside, so testing its start point suffices.
    if filled && point_in_polygon(&arc.start, vertices) {
        return 0.0;
    }
    polygon_edges(vertices)
        .map(|(c, d)| segment_arc_distance(c, d, arc))
        .fold(f64::MAX, f64::min)
}

/// Polygon-to-polygon distance
pub fn polygon_polygon_distance(a: &[Point], a_filled: bool, b: &[Point], b_filled: bool) -> f64 {
    if a_filled && b.iter().any(|p| point_in_polygon(p, a)) {
        return 0.0;
    }
    if b_filled && a.iter().any(|p| point_in_polygon(p, b)) {
        return 0.0;
    }
    let mut best = f64::MAX;
    for (p, q) in polygon_edges(a) {
        for (r, s) in polygon_edges(b) {
            best = best.min(segment_distance(p, q, r, s));
            if best == 0.0 {
                return 0.0;
            }
        }
    }
    best
}
