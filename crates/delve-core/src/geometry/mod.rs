//! Computational geometry for map construction.
//!
//! Pure values and functions: points, line segments, simple polygons, and
//! the construction operations the generator drives (sweeps, junction
//! chambers, boolean union). Coordinates are f64 feet, but every
//! constructor that approximates a curve snaps to a quarter-grid lattice,
//! and lattice arithmetic is exact in f64, so equality is exact.
//!
//! Distance along diagonals is taxicab distance (see [`crate::direction`]),
//! which keeps all 45-degree geometry on the 5-foot half-grid.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::errors::{Infeasible, PolygonError};
use crate::{Direction, GRID, HALF_GRID};

mod intersect;
mod merge;
pub mod shapes;

pub use intersect::{Bias, construct_intersection};
pub use merge::union;

/// A point in map feet. Equality is exact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Convenience constructor.
pub fn point(x: f64, y: f64) -> Point {
    Point { x, y }
}

impl Point {
    pub fn translated(self, dx: f64, dy: f64) -> Point {
        point(self.x + dx, self.y + dy)
    }
}

// Coordinates never hold NaN: they come from lattice arithmetic and
// snapped constructors only.
impl Eq for Point {}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        fn bits(v: f64) -> u64 {
            if v == 0.0 { 0f64.to_bits() } else { v.to_bits() }
        }
        bits(self.x).hash(state);
        bits(self.y).hash(state);
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Point ({}, {})>", fmt_num(self.x), fmt_num(self.y))
    }
}

/// A line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line {
    pub a: Point,
    pub b: Point,
}

impl Line {
    pub fn new(a: Point, b: Point) -> Line {
        Line { a, b }
    }

    /// Taxicab length: the width a doorway or passage cross-section spans
    /// on the grid. Equals Euclidean length for cardinal segments.
    pub fn width(&self) -> f64 {
        (self.b.x - self.a.x).abs() + (self.b.y - self.a.y).abs()
    }

    pub fn midpoint(&self) -> Point {
        point((self.a.x + self.b.x) / 2.0, (self.a.y + self.b.y) / 2.0)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Line {
        Line::new(self.a.translated(dx, dy), self.b.translated(dx, dy))
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            min_x: self.a.x.min(self.b.x),
            min_y: self.a.y.min(self.b.y),
            max_x: self.a.x.max(self.b.x),
            max_y: self.a.y.max(self.b.y),
        }
    }

    /// Euclidean distance from a point to this segment, for hit-testing.
    pub fn distance_to(&self, p: Point) -> f64 {
        let (vx, vy) = (self.b.x - self.a.x, self.b.y - self.a.y);
        let (wx, wy) = (p.x - self.a.x, p.y - self.a.y);
        let len2 = vx * vx + vy * vy;
        if len2 == 0.0 {
            return (wx * wx + wy * wy).sqrt();
        }
        let t = ((wx * vx + wy * vy) / len2).clamp(0.0, 1.0);
        let (cx, cy) = (self.a.x + t * vx - p.x, self.a.y + t * vy - p.y);
        (cx * cx + cy * cy).sqrt()
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Line: [({}, {}), ({}, {})]>",
            fmt_num(self.a.x),
            fmt_num(self.a.y),
            fmt_num(self.b.x),
            fmt_num(self.b.y)
        )
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.max_x >= other.min_x
            && other.max_x >= self.min_x
            && self.max_y >= other.min_y
            && other.max_y >= self.min_y
    }

    pub fn expanded(&self, margin: f64) -> Bounds {
        Bounds {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }
}

/// A simple polygon: an ordered closed ring of at least 3 points with no
/// implicit closing duplicate, validated non-self-intersecting and
/// normalized counterclockwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Polygon {
    points: Vec<Point>,
}

impl TryFrom<Vec<Point>> for Polygon {
    type Error = PolygonError;

    fn try_from(points: Vec<Point>) -> Result<Polygon, PolygonError> {
        Polygon::new(points)
    }
}

impl From<Polygon> for Vec<Point> {
    fn from(p: Polygon) -> Vec<Point> {
        p.points
    }
}

impl Polygon {
    /// Validate and normalize a ring of points. Consecutive duplicates and
    /// a closing duplicate are dropped; orientation is normalized to
    /// counterclockwise; self-intersecting or zero-area rings are rejected.
    pub fn new(points: Vec<Point>) -> Result<Polygon, PolygonError> {
        let mut pts = points;
        dedup_ring(&mut pts);
        if pts.len() < 3 {
            return Err(PolygonError::TooFewPoints(pts.len()));
        }
        let ta = twice_signed_area(&pts);
        if ta == 0.0 {
            return Err(PolygonError::ZeroArea);
        }
        if ta < 0.0 {
            pts.reverse();
        }
        check_simple(&pts)?;
        Ok(Polygon { points: pts })
    }

    /// Build from a ring already known to be simple (convex constructions,
    /// translations). Still dedupes and orients.
    pub(crate) fn from_ring(points: Vec<Point>) -> Polygon {
        let mut pts = points;
        dedup_ring(&mut pts);
        if twice_signed_area(&pts) < 0.0 {
            pts.reverse();
        }
        Polygon { points: pts }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn edges(&self) -> impl Iterator<Item = Line> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| Line::new(self.points[i], self.points[(i + 1) % n]))
    }

    pub fn area(&self) -> f64 {
        twice_signed_area(&self.points).abs() / 2.0
    }

    pub fn bounds(&self) -> Bounds {
        let mut b = Bounds {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in &self.points {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x);
            b.max_y = b.max_y.max(p.y);
        }
        b
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Polygon {
        Polygon {
            points: self.points.iter().map(|p| p.translated(dx, dy)).collect(),
        }
    }

    pub fn on_boundary(&self, p: Point) -> bool {
        self.edges().any(|e| on_segment(p, e.a, e.b))
    }

    /// True when `p` is strictly interior (boundary points excluded).
    pub fn contains_strict(&self, p: Point) -> bool {
        if self.on_boundary(p) {
            return false;
        }
        let n = self.points.len();
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (pi, pj) = (self.points[i], self.points[j]);
            if (pi.y > p.y) != (pj.y > p.y) {
                let x_cross = pi.x + (p.y - pi.y) * (pj.x - pi.x) / (pj.y - pi.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// True when `p` is interior or on the boundary.
    pub fn covers(&self, p: Point) -> bool {
        self.on_boundary(p) || self.contains_strict(p)
    }

    /// True when the given segment lies entirely along this boundary.
    pub fn boundary_contains(&self, line: &Line) -> bool {
        self.on_boundary(line.a) && self.on_boundary(line.b) && self.on_boundary(line.midpoint())
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Polygon: [")?;
        for (i, p) in self.points.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "({}, {})", fmt_num(p.x), fmt_num(p.y))?;
        }
        write!(f, "]>")
    }
}

/// Rigid shift of a polygon. Never fails; exact round-trip with `(-dx, -dy)`.
pub fn translate(polygon: &Polygon, dx: f64, dy: f64) -> Polygon {
    polygon.translated(dx, dy)
}

/// The cross-section a passage of `width` presents when traveling through
/// `center` in `direction`: a segment of taxicab length `width`, centered
/// on the point, perpendicular to the direction. The segment runs so that
/// its right-hand normal is `direction`.
pub fn point_sweep(center: Point, direction: Direction, width: f64) -> Line {
    let (ox, oy) = direction.rotate(90).offset(width / 2.0);
    Line::new(
        point(center.x - ox, center.y - oy),
        point(center.x + ox, center.y + oy),
    )
}

/// Extrude a boundary line forward by `distance`, producing the swept quad
/// and the new leading edge. Segment length is preserved, so a passage
/// keeps its width along a straight sweep.
pub fn sweep(line: &Line, direction: Direction, distance: f64) -> Result<(Line, Polygon), Infeasible> {
    if distance <= 0.0 {
        return Err(Infeasible::BadDistance(distance));
    }
    let (dx, dy) = direction.offset(distance);
    let moved = line.translated(dx, dy);
    let quad = Polygon::new(vec![line.a, line.b, moved.b, moved.a])
        .map_err(|_| Infeasible::DegenerateSweep(*line, direction))?;
    Ok((moved, quad))
}

/// Whether a doorway line sits on the generation grid, which is what makes
/// it an archway rather than a secret door. Cardinal doorways need both
/// endpoints on 10-foot grid lines; diagonal doorways need endpoints on
/// the half-grid lattice lines that 45-degree walls follow.
pub fn grid_aligned(line: &Line, direction: Direction) -> bool {
    fn on_full_grid(p: Point) -> bool {
        p.x.rem_euclid(GRID) == 0.0 && p.y.rem_euclid(GRID) == 0.0
    }
    fn on_diag_grid(p: Point) -> bool {
        p.x.rem_euclid(HALF_GRID) == 0.0
            && p.y.rem_euclid(HALF_GRID) == 0.0
            && (p.x + p.y).rem_euclid(GRID) == 0.0
    }
    if direction.is_cardinal() {
        on_full_grid(line.a) && on_full_grid(line.b)
    } else {
        on_diag_grid(line.a) && on_diag_grid(line.b)
    }
}

/// Whether two polygons overlap in area. Touching along edges or at
/// corners does not count; that is how regions legitimately share
/// connection boundaries.
pub fn overlaps(a: &Polygon, b: &Polygon) -> bool {
    if !a.bounds().intersects(&b.bounds()) {
        return false;
    }
    for ea in a.edges() {
        for eb in b.edges() {
            if properly_cross(&ea, &eb) {
                return true;
            }
        }
    }
    if a.points().iter().any(|&p| b.contains_strict(p))
        || b.points().iter().any(|&p| a.contains_strict(p))
    {
        return true;
    }
    if a.edges().any(|e| b.contains_strict(e.midpoint()))
        || b.edges().any(|e| a.contains_strict(e.midpoint()))
    {
        return true;
    }
    // Identical rings have no strict containment and no crossings.
    same_point_set(a, b)
}

fn same_point_set(a: &Polygon, b: &Polygon) -> bool {
    if a.points().len() != b.points().len() {
        return false;
    }
    let key = |p: &Point| (p.x.to_bits(), p.y.to_bits());
    let mut pa: Vec<_> = a.points().iter().map(key).collect();
    let mut pb: Vec<_> = b.points().iter().map(key).collect();
    pa.sort_unstable();
    pb.sort_unstable();
    pa == pb
}

// --- segment primitives -------------------------------------------------

pub(crate) fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

pub(crate) fn on_segment(p: Point, a: Point, b: Point) -> bool {
    cross(a, b, p) == 0.0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// How two segments meet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum SegX {
    None,
    /// A single shared point (a crossing or an endpoint touch).
    At(Point),
    /// A collinear shared stretch of nonzero length.
    Overlap(Line),
}

pub(crate) fn seg_intersect(s1: &Line, s2: &Line) -> SegX {
    let d1 = cross(s2.a, s2.b, s1.a);
    let d2 = cross(s2.a, s2.b, s1.b);
    let d3 = cross(s1.a, s1.b, s2.a);
    let d4 = cross(s1.a, s1.b, s2.b);

    if d1 == 0.0 && d2 == 0.0 && d3 == 0.0 && d4 == 0.0 {
        return collinear_overlap(s1, s2);
    }

    let straddles = |u: f64, v: f64| (u <= 0.0 && v >= 0.0) || (u >= 0.0 && v <= 0.0);
    if !(straddles(d1, d2) && straddles(d3, d4)) {
        return SegX::None;
    }

    if d1 != 0.0 && d2 != 0.0 && d3 != 0.0 && d4 != 0.0 {
        // Proper crossing: solve for the intersection point.
        let t = d1 / (d1 - d2);
        return SegX::At(point(
            s1.a.x + t * (s1.b.x - s1.a.x),
            s1.a.y + t * (s1.b.y - s1.a.y),
        ));
    }

    // An endpoint of one lies on the other.
    for p in [s1.a, s1.b] {
        if on_segment(p, s2.a, s2.b) {
            return SegX::At(p);
        }
    }
    for p in [s2.a, s2.b] {
        if on_segment(p, s1.a, s1.b) {
            return SegX::At(p);
        }
    }
    SegX::None
}

fn collinear_overlap(s1: &Line, s2: &Line) -> SegX {
    // Project onto the dominant axis of s1.
    let horizontal = (s1.b.x - s1.a.x).abs() >= (s1.b.y - s1.a.y).abs();
    let coord = |p: Point| if horizontal { p.x } else { p.y };
    let mut pts = [s1.a, s1.b, s2.a, s2.b];
    pts.sort_by(|p, q| coord(*p).total_cmp(&coord(*q)));

    let (lo1, hi1) = (
        coord(s1.a).min(coord(s1.b)),
        coord(s1.a).max(coord(s1.b)),
    );
    let (lo2, hi2) = (
        coord(s2.a).min(coord(s2.b)),
        coord(s2.a).max(coord(s2.b)),
    );
    let lo = lo1.max(lo2);
    let hi = hi1.min(hi2);
    if lo > hi {
        SegX::None
    } else if lo == hi {
        SegX::At(pts[1])
    } else {
        SegX::Overlap(Line::new(pts[1], pts[2]))
    }
}

/// True when the segments cross at a point strictly interior to both.
pub(crate) fn properly_cross(s1: &Line, s2: &Line) -> bool {
    let d1 = cross(s2.a, s2.b, s1.a);
    let d2 = cross(s2.a, s2.b, s1.b);
    let d3 = cross(s1.a, s1.b, s2.a);
    let d4 = cross(s1.a, s1.b, s2.b);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

fn dedup_ring(pts: &mut Vec<Point>) {
    pts.dedup();
    while pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
}

fn twice_signed_area(pts: &[Point]) -> f64 {
    let n = pts.len();
    let mut sum = 0.0;
    for i in 0..n {
        let p = pts[i];
        let q = pts[(i + 1) % n];
        sum += p.x * q.y - q.x * p.y;
    }
    sum
}

fn check_simple(pts: &[Point]) -> Result<(), PolygonError> {
    let n = pts.len();
    let edge = |i: usize| Line::new(pts[i], pts[(i + 1) % n]);
    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            match seg_intersect(&edge(i), &edge(j)) {
                SegX::None => {}
                SegX::At(_) if adjacent => {}
                _ => return Err(PolygonError::SelfIntersecting),
            }
        }
    }
    Ok(())
}

fn fmt_num(v: f64) -> String {
    let s = format!("{v:.2}");
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

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
    fn test_polygon_rejects_degenerates() {
        assert_eq!(
            Polygon::new(vec![point(0.0, 0.0), point(10.0, 0.0)]),
            Err(PolygonError::TooFewPoints(2))
        );
        assert_eq!(
            Polygon::new(vec![point(0.0, 0.0), point(10.0, 0.0), point(20.0, 0.0)]),
            Err(PolygonError::ZeroArea)
        );
        // Bowtie.
        assert_eq!(
            Polygon::new(vec![
                point(0.0, 0.0),
                point(10.0, 10.0),
                point(10.0, 0.0),
                point(0.0, 10.0),
            ]),
            Err(PolygonError::SelfIntersecting)
        );
    }

    #[test]
    fn test_polygon_normalizes_ccw() {
        let cw = Polygon::new(vec![
            point(0.0, 0.0),
            point(0.0, 10.0),
            point(10.0, 10.0),
            point(10.0, 0.0),
        ])
        .unwrap();
        assert!(twice_signed_area(cw.points()) > 0.0);
    }

    #[test]
    fn test_polygon_allows_collinear_vertices() {
        // A doorway split point on a wall is a legitimate collinear vertex.
        let p = Polygon::new(vec![
            point(0.0, 0.0),
            point(5.0, 0.0),
            point(10.0, 0.0),
            point(10.0, 10.0),
            point(0.0, 10.0),
        ])
        .unwrap();
        assert_eq!(p.points().len(), 5);
        assert_eq!(p.area(), 100.0);
    }

    #[test]
    fn test_containment() {
        let r = rect(0.0, 0.0, 20.0, 10.0);
        assert!(r.contains_strict(point(5.0, 5.0)));
        assert!(!r.contains_strict(point(0.0, 5.0))); // boundary
        assert!(r.covers(point(0.0, 5.0)));
        assert!(!r.covers(point(-1.0, 5.0)));
    }

    #[test]
    fn test_overlaps_vs_touching() {
        let a = rect(0.0, 0.0, 10.0, 10.0);
        let b = rect(10.0, 0.0, 10.0, 10.0); // shares an edge
        let c = rect(5.0, 5.0, 10.0, 10.0); // real overlap
        let d = rect(10.0, 10.0, 5.0, 5.0); // corner touch
        assert!(!overlaps(&a, &b));
        assert!(overlaps(&a, &c));
        assert!(!overlaps(&a, &d));
        // A polygon overlaps itself.
        assert!(overlaps(&a, &a.clone()));
        // Containment counts as overlap.
        let inner = rect(2.0, 2.0, 4.0, 4.0);
        assert!(overlaps(&a, &inner));
    }

    #[test]
    fn test_cross_shape_overlap() {
        // Two crossing bars share area but no vertices inside each other.
        let horiz = rect(0.0, 10.0, 30.0, 10.0);
        let vert = rect(10.0, 0.0, 10.0, 30.0);
        assert!(overlaps(&horiz, &vert));
    }

    #[test]
    fn test_point_sweep() {
        let line = point_sweep(point(10.0, 10.0), Direction::North, 10.0);
        assert_eq!(line.width(), 10.0);
        assert_eq!(line.midpoint(), point(10.0, 10.0));
        assert_eq!(Direction::normal_to(&line), Some(Direction::North));

        let diag = point_sweep(point(10.0, 10.0), Direction::Northeast, 10.0);
        assert_eq!(diag.width(), 10.0);
        assert_eq!(Direction::normal_to(&diag), Some(Direction::Northeast));
    }

    #[test]
    fn test_sweep_preserves_width() {
        let line = Line::new(point(0.0, 0.0), point(10.0, 0.0));
        let (end, poly) = sweep(&line, Direction::North, 30.0).unwrap();
        assert_eq!(end.width(), line.width());
        assert_eq!(poly.area(), 300.0);
        assert!(poly.boundary_contains(&line));

        let (end, poly) = sweep(&end, Direction::Northeast, 20.0).unwrap();
        assert_eq!(end.width(), 10.0);
        assert!(poly.area() > 0.0);
    }

    #[test]
    fn test_sweep_degenerate() {
        let line = Line::new(point(0.0, 0.0), point(10.0, 0.0));
        assert!(matches!(
            sweep(&line, Direction::East, 10.0),
            Err(Infeasible::DegenerateSweep(_, _))
        ));
        assert!(matches!(
            sweep(&line, Direction::North, 0.0),
            Err(Infeasible::BadDistance(_))
        ));
    }

    #[test]
    fn test_grid_aligned() {
        let on = Line::new(point(0.0, 0.0), point(10.0, 0.0));
        let off = Line::new(point(5.0, 0.0), point(15.0, 0.0));
        assert!(grid_aligned(&on, Direction::North));
        assert!(!grid_aligned(&off, Direction::North));

        let diag = Line::new(point(5.0, 5.0), point(10.0, 0.0));
        assert!(grid_aligned(&diag, Direction::Northeast));
        let diag_off = Line::new(point(5.0, 10.0), point(10.0, 5.0));
        assert!(!grid_aligned(&diag_off, Direction::Northeast));
    }

    #[test]
    fn test_display_trims_zeros() {
        assert_eq!(point(7.5, -20.0).to_string(), "<Point (7.5, -20)>");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn translate_round_trips_exactly(
            x0 in -40i32..40, y0 in -40i32..40,
            w in 1i32..20, h in 1i32..20,
            dx in -40i32..40, dy in -40i32..40,
        ) {
            let r = rect(
                x0 as f64 * 5.0, y0 as f64 * 5.0,
                w as f64 * 10.0, h as f64 * 10.0,
            );
            let dx = dx as f64 * 5.0;
            let dy = dy as f64 * 5.0;
            let back = translate(&translate(&r, dx, dy), -dx, -dy);
            prop_assert_eq!(r, back);
        }

        #[test]
        fn sweep_keeps_leading_edge_width(
            len in 1i32..8, dir_idx in 0i32..8,
        ) {
            let line = Line::new(point(0.0, 0.0), point(10.0, 0.0));
            let dir = Direction::from_index(dir_idx);
            if let Ok((end, _)) = sweep(&line, dir, len as f64 * 10.0) {
                prop_assert_eq!(end.width(), line.width());
            }
        }
    }
}
