//! Boolean union of polygons that share boundary.
//!
//! Used when a chamber is merged with the doorway stub that joins it to a
//! connection, so the combined outline carries the doorway with no seam.
//! The inputs are expected to share a boundary stretch or overlap
//! slightly; shared-edge-only contact cancels cleanly without slivers.

use std::collections::HashMap;

use crate::errors::Infeasible;

use super::{Line, Point, Polygon, SegX, cross, on_segment, seg_intersect};

/// Union two polygons into one simple outline.
///
/// Shared boundary stretches appear once in the result; interior seams
/// cancel. Inputs that touch nowhere are `Infeasible::DisjointUnion`;
/// inputs whose union is not a single simple ring (a pinch point, an
/// enclosed hole) are `Infeasible::UnsupportedUnion`.
pub fn union(a: &Polygon, b: &Polygon) -> Result<Polygon, Infeasible> {
    if contains_poly(a, b) {
        return Ok(a.clone());
    }
    if contains_poly(b, a) {
        return Ok(b.clone());
    }
    if !a.bounds().intersects(&b.bounds()) {
        return Err(Infeasible::DisjointUnion);
    }

    let mut kept: Vec<Line> = Vec::new();
    let mut touched = false;

    for e in split_against(a, b) {
        let mid = e.midpoint();
        if b.contains_strict(mid) {
            touched = true;
        } else if b.on_boundary(mid) {
            touched = true;
            // A shared stretch survives once (this copy) when both
            // boundaries run the same way; opposite senses are an
            // interior seam and cancel entirely.
            if boundary_sense(b, &e, mid) {
                kept.push(e);
            }
        } else {
            kept.push(e);
        }
    }
    for e in split_against(b, a) {
        let mid = e.midpoint();
        if a.contains_strict(mid) || a.on_boundary(mid) {
            touched = true;
        } else {
            kept.push(e);
        }
    }

    if !touched {
        return Err(Infeasible::DisjointUnion);
    }

    let ring = stitch(kept)?;
    let ring = simplify_collinear(ring);
    Polygon::new(ring).map_err(|_| Infeasible::UnsupportedUnion)
}

/// True when the other boundary at `mid` runs the same way as edge `e`.
fn boundary_sense(other: &Polygon, e: &Line, mid: Point) -> bool {
    for f in other.edges() {
        if on_segment(mid, f.a, f.b) {
            let dot = (e.b.x - e.a.x) * (f.b.x - f.a.x) + (e.b.y - e.a.y) * (f.b.y - f.a.y);
            return dot > 0.0;
        }
    }
    true
}

fn contains_poly(outer: &Polygon, inner: &Polygon) -> bool {
    inner.points().iter().all(|&p| outer.covers(p))
        && inner.edges().all(|e| outer.covers(e.midpoint()))
}

/// Split every edge of `poly` at its intersections with `other`'s edges.
fn split_against(poly: &Polygon, other: &Polygon) -> Vec<Line> {
    let mut out = Vec::new();
    for e in poly.edges() {
        let mut cuts: Vec<Point> = Vec::new();
        for f in other.edges() {
            match seg_intersect(&e, &f) {
                SegX::None => {}
                SegX::At(p) => cuts.push(p),
                SegX::Overlap(l) => {
                    cuts.push(l.a);
                    cuts.push(l.b);
                }
            }
        }
        cuts.retain(|&c| c != e.a && c != e.b);
        let along =
            |c: &Point| (c.x - e.a.x) * (e.b.x - e.a.x) + (c.y - e.a.y) * (e.b.y - e.a.y);
        cuts.sort_by(|p, q| along(p).total_cmp(&along(q)));
        cuts.dedup();

        let mut prev = e.a;
        for c in cuts {
            if c != prev {
                out.push(Line::new(prev, c));
                prev = c;
            }
        }
        if prev != e.b {
            out.push(Line::new(prev, e.b));
        }
    }
    out
}

/// Walk the kept edges into a single closed ring, taking the leftmost
/// (most counterclockwise) turn at any branch so the outer boundary wins.
fn stitch(edges: Vec<Line>) -> Result<Vec<Point>, Infeasible> {
    if edges.is_empty() {
        return Err(Infeasible::UnsupportedUnion);
    }

    let mut by_start: HashMap<Point, Vec<usize>> = HashMap::new();
    for (i, e) in edges.iter().enumerate() {
        by_start.entry(e.a).or_default().push(i);
    }
    for ids in by_start.values_mut() {
        ids.sort_unstable();
    }

    let first = (0..edges.len())
        .min_by(|&i, &j| {
            let (p, q) = (edges[i].a, edges[j].a);
            p.x.total_cmp(&q.x).then(p.y.total_cmp(&q.y))
        })
        .unwrap_or(0);

    let mut used = vec![false; edges.len()];
    let mut ring = vec![edges[first].a];
    let mut current = first;
    used[first] = true;

    for _ in 0..edges.len() {
        let tail = edges[current].b;
        if tail == ring[0] {
            if used.iter().all(|&u| u) {
                return Ok(ring);
            }
            // A closed loop with edges left over: a hole or a second piece.
            return Err(Infeasible::UnsupportedUnion);
        }
        ring.push(tail);

        let candidates: Vec<usize> = by_start
            .get(&tail)
            .map(|ids| ids.iter().copied().filter(|&i| !used[i]).collect())
            .unwrap_or_default();
        let next = match candidates.len() {
            0 => return Err(Infeasible::UnsupportedUnion),
            1 => candidates[0],
            _ => {
                // Leftmost turn relative to the incoming edge.
                let inc = edges[current];
                let (vx, vy) = (inc.b.x - inc.a.x, inc.b.y - inc.a.y);
                *candidates
                    .iter()
                    .max_by(|&&i, &&j| {
                        let angle = |k: usize| {
                            let e = edges[k];
                            let (wx, wy) = (e.b.x - e.a.x, e.b.y - e.a.y);
                            (vx * wy - vy * wx).atan2(vx * wx + vy * wy)
                        };
                        angle(i).total_cmp(&angle(j))
                    })
                    .unwrap_or(&candidates[0])
            }
        };
        used[next] = true;
        current = next;
    }
    Err(Infeasible::UnsupportedUnion)
}

/// Drop vertices where the boundary continues straight through.
fn simplify_collinear(ring: Vec<Point>) -> Vec<Point> {
    let n = ring.len();
    if n < 4 {
        return ring;
    }
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let prev = ring[(i + n - 1) % n];
        let here = ring[i];
        let next = ring[(i + 1) % n];
        let straight = cross(prev, here, next) == 0.0
            && (here.x - prev.x) * (next.x - here.x) + (here.y - prev.y) * (next.y - here.y) > 0.0;
        if !straight {
            out.push(here);
        }
    }
    if out.len() >= 3 { out } else { ring }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point;

    fn rect(x0: f64, y0: f64, w: f64, h: f64) -> Polygon {
        Polygon::new(vec![
            point(x0, y0),
            point(x0 + w, y0),
            point(x0 + w, y0 + h),
            point(x0, y0 + h),
        ])
        .unwrap()
    }

    #[test]
    fn test_shared_edge_merges_without_slivers() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(10.0, 0.0, 10.0, 10.0);
        let u = union(&a, &b).unwrap();
        assert_eq!(u.area(), 200.0);
        // The seam is gone entirely: just the four outer corners.
        assert_eq!(u.points().len(), 4);
    }

    #[test]
    fn test_partial_shared_edge() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(10.0, 0.0, 10.0, 5.0);
        let u = union(&a, &b).unwrap();
        assert_eq!(u.area(), 150.0);
        assert_eq!(u.points().len(), 6);
    }

    #[test]
    fn test_vestibule_shape() {
        // A chamber with a doorway stub hanging off its south side.
        let chamber = rect(0.0, 10.0, 30.0, 20.0);
        let stub = rect(10.0, 0.0, 10.0, 10.0);
        let u = union(&chamber, &stub).unwrap();
        assert_eq!(u.area(), 700.0);
        assert_eq!(u.points().len(), 8);
        // The stub's far edge is interior now; its doorway edge survives.
        let doorway = Line::new(point(10.0, 0.0), point(20.0, 0.0));
        assert!(u.boundary_contains(&doorway));
    }

    #[test]
    fn test_slight_overlap() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(5.0, 0.0, 10.0, 10.0);
        let u = union(&a, &b).unwrap();
        assert_eq!(u.area(), 150.0);
        assert_eq!(u.points().len(), 4);
    }

    #[test]
    fn test_contained_polygon() {
        let a = rect(0.0, 0.0, 30.0, 30.0);
        let b = rect(10.0, 10.0, 5.0, 5.0);
        assert_eq!(union(&a, &b).unwrap(), a);
        assert_eq!(union(&b, &a).unwrap(), a);
    }

    #[test]
    fn test_disjoint_is_infeasible() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(50.0, 50.0, 10.0, 10.0);
        assert_eq!(union(&a, &b), Err(Infeasible::DisjointUnion));
    }

    #[test]
    fn test_corner_touch_rejected() {
        // Meeting at a single point cannot merge into a simple ring.
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(10.0, 10.0, 10.0, 10.0);
        let r = union(&a, &b);
        assert!(r.is_err());
    }
}
