//! Junction-chamber construction.
//!
//! Where passages meet — a turn, tee, wye, four-way, or X — the map grows
//! an octagonal hub chamber. One face reproduces the entry wall exactly,
//! each requested exit direction is assigned one boundary edge of the
//! requested width on its own face, and the remaining faces are solid
//! wall. A hub with half-width `h` has cardinal faces of width `2h` and
//! diagonal faces of taxicab width `2h`, so every face can host a doorway
//! and the whole ring stays on the half-grid.

use crate::errors::Infeasible;
use crate::{Direction, GRID};

use super::{Line, Point, Polygon, point};

/// Rotational sense used to order exits that sit at equal angular offsets
/// from the entry direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bias {
    /// Counterclockwise exits first.
    #[default]
    Left,
    /// Clockwise exits first.
    Right,
}

/// Build the junction chamber for an entry wall and a set of exits.
///
/// `base_line` is the entry wall segment, already facing `base_dir` (the
/// direction of travel into the chamber). `exits` may hold one direction
/// for a plain turn, two for a tee or wye, three for a four-way, four for
/// an X, or nothing for a dead-end cap. Returns the chamber polygon and
/// the realized exit line for each requested direction, ordered by
/// increasing angular offset from `base_dir` with ties broken by `bias`.
///
/// Infeasible requests — a duplicate exit, an exit folded back through the
/// entry wall, a width off the grid or wider than twice the entry — are
/// rejected placements, not fatal errors.
pub fn construct_intersection(
    base_line: &Line,
    base_dir: Direction,
    exits: &[Direction],
    exit_width: f64,
    bias: Bias,
) -> Result<(Polygon, Vec<(Direction, Line)>), Infeasible> {
    let entry_width = base_line.width();
    if !grid_multiple(entry_width) {
        return Err(Infeasible::BadWidth(entry_width));
    }
    if !grid_multiple(exit_width) {
        return Err(Infeasible::BadWidth(exit_width));
    }
    if exit_width > 2.0 * entry_width {
        return Err(Infeasible::ExitTooWide {
            width: exit_width,
            entry: entry_width,
        });
    }
    match Direction::normal_to(base_line) {
        Some(n) if n == base_dir || n == base_dir.opposite() => {}
        _ => return Err(Infeasible::SkewedBase(*base_line, base_dir)),
    }

    let entry_face = base_dir.opposite();
    let mut requested = [false; 8];
    for &e in exits {
        if e == entry_face {
            return Err(Infeasible::ExitThroughEntry(e));
        }
        let slot = &mut requested[e.index() as usize];
        if *slot {
            return Err(Infeasible::DuplicateExit(e));
        }
        *slot = true;
    }

    let h = entry_width.max(exit_width) / 2.0;
    let face_width = 2.0 * h;
    let mid = base_line.midpoint();
    // The entry face sits 2h behind the center for a cardinal entry and
    // 3h (taxicab) for a diagonal one.
    let advance = if base_dir.is_cardinal() { 2.0 * h } else { 3.0 * h };
    let (ax, ay) = base_dir.offset(advance);
    let center = point(mid.x + ax, mid.y + ay);

    // Hub corners, counterclockwise; corner k closes face k-1 and opens
    // face k, faces indexed like Direction (east = 0, counterclockwise).
    let local: [(f64, f64); 8] = [
        (2.0 * h, h),
        (h, 2.0 * h),
        (-h, 2.0 * h),
        (-2.0 * h, h),
        (-2.0 * h, -h),
        (-h, -2.0 * h),
        (h, -2.0 * h),
        (2.0 * h, -h),
    ];
    let corner = |k: i32| {
        let (lx, ly) = local[k.rem_euclid(8) as usize];
        point(center.x + lx, center.y + ly)
    };

    let mut ring: Vec<Point> = Vec::with_capacity(8 + 2 * exits.len() + 2);
    let mut exit_lines: Vec<(Direction, Line)> = Vec::with_capacity(exits.len());

    for k in 0..8 {
        let fi = (entry_face.index() + k).rem_euclid(8);
        let face_dir = Direction::from_index(fi);
        let start = corner(fi + 7);
        let end = corner(fi);
        ring.push(start);

        if face_dir == entry_face {
            let (p, q) = order_along(start, end, base_line.a, base_line.b);
            ring.push(p);
            ring.push(q);
        } else if requested[fi as usize] {
            if exit_width < face_width {
                let trim = (face_width - exit_width) / 2.0;
                let ux = (end.x - start.x) / face_width;
                let uy = (end.y - start.y) / face_width;
                let p = point(start.x + ux * trim, start.y + uy * trim);
                let q = point(
                    start.x + ux * (trim + exit_width),
                    start.y + uy * (trim + exit_width),
                );
                ring.push(p);
                ring.push(q);
                exit_lines.push((face_dir, Line::new(p, q)));
            } else {
                exit_lines.push((face_dir, Line::new(start, end)));
            }
        }
    }

    exit_lines.sort_by_key(|(d, _)| exit_sort_key(*d, base_dir, bias));

    // Convex by construction: an octagon ring with collinear doorway
    // splits, so no validation pass is needed.
    Ok((Polygon::from_ring(ring), exit_lines))
}

/// Exits are laid out by angular offset from the entry direction,
/// proceeding in the configured rotational sense first on ties.
fn exit_sort_key(d: Direction, base: Direction, bias: Bias) -> (i32, i32) {
    let ccw = (d.index() - base.index()).rem_euclid(8);
    let magnitude = ccw.min(8 - ccw) * 45;
    let ccw_side = ccw <= 4;
    let preferred = match bias {
        Bias::Left => ccw_side,
        Bias::Right => !ccw_side || ccw == 0,
    };
    (magnitude, if preferred { 0 } else { 1 })
}

fn grid_multiple(v: f64) -> bool {
    v > 0.0 && v.rem_euclid(GRID) == 0.0
}

/// Order two points along the start→end sense of a face.
fn order_along(start: Point, end: Point, p: Point, q: Point) -> (Point, Point) {
    let along = |r: Point| (r.x - start.x) * (end.x - start.x) + (r.y - start.y) * (end.y - start.y);
    if along(p) <= along(q) { (p, q) } else { (q, p) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point_sweep;

    fn entry(base_dir: Direction, width: f64) -> Line {
        point_sweep(point(0.0, 0.0), base_dir, width)
    }

    #[test]
    fn test_simple_turn() {
        let base = entry(Direction::East, 10.0);
        let (poly, exit_map) =
            construct_intersection(&base, Direction::East, &[Direction::North], 10.0, Bias::Left)
                .unwrap();

        assert_eq!(poly.points().len(), 8);
        assert!(poly.boundary_contains(&base));
        assert_eq!(exit_map.len(), 1);
        let (dir, line) = exit_map[0];
        assert_eq!(dir, Direction::North);
        assert_eq!(line.width(), 10.0);
        assert_eq!(Direction::normal_to(&line), Some(Direction::North));
        // Still a valid simple polygon after re-validation.
        assert!(Polygon::new(poly.points().to_vec()).is_ok());
    }

    #[test]
    fn test_four_way() {
        let base = entry(Direction::North, 10.0);
        let exits = [Direction::North, Direction::East, Direction::West];
        let (poly, exit_map) =
            construct_intersection(&base, Direction::North, &exits, 10.0, Bias::Left).unwrap();

        assert_eq!(poly.points().len(), 8);
        assert_eq!(exit_map.len(), 3);
        for (_, line) in &exit_map {
            assert_eq!(line.width(), 10.0);
        }
        // Straight-ahead exit first, then the two 90-degree exits with the
        // counterclockwise one (west) preferred under the left bias.
        assert_eq!(exit_map[0].0, Direction::North);
        assert_eq!(exit_map[1].0, Direction::West);
        assert_eq!(exit_map[2].0, Direction::East);
    }

    #[test]
    fn test_right_bias_tiebreak() {
        let base = entry(Direction::North, 10.0);
        let exits = [Direction::West, Direction::East];
        let (_, exit_map) =
            construct_intersection(&base, Direction::North, &exits, 10.0, Bias::Right).unwrap();
        assert_eq!(exit_map[0].0, Direction::East);
        assert_eq!(exit_map[1].0, Direction::West);
    }

    #[test]
    fn test_narrow_exits_get_split_edges() {
        let base = entry(Direction::North, 20.0);
        let exits = [Direction::North, Direction::East];
        let (poly, exit_map) =
            construct_intersection(&base, Direction::North, &exits, 10.0, Bias::Left).unwrap();

        // 8 faces plus 2 collinear split vertices per narrowed exit.
        assert_eq!(poly.points().len(), 8 + 2 * exits.len());
        for (_, line) in &exit_map {
            assert_eq!(line.width(), 10.0);
            assert!(poly.boundary_contains(line));
        }
        assert!(poly.boundary_contains(&base));
        assert!(Polygon::new(poly.points().to_vec()).is_ok());
    }

    #[test]
    fn test_wide_entry_reproduced_exactly() {
        // Entry wider than the exits: the hub is sized by the entry and the
        // entry wall appears verbatim as an edge.
        let base = entry(Direction::East, 20.0);
        let (poly, _) =
            construct_intersection(&base, Direction::East, &[Direction::North], 10.0, Bias::Left)
                .unwrap();
        assert!(poly.points().contains(&base.a));
        assert!(poly.points().contains(&base.b));
        assert!(poly.boundary_contains(&base));
    }

    #[test]
    fn test_diagonal_entry() {
        let base = entry(Direction::Northeast, 10.0);
        let exits = [Direction::Northeast, Direction::Northwest];
        let (poly, exit_map) =
            construct_intersection(&base, Direction::Northeast, &exits, 10.0, Bias::Left).unwrap();

        assert!(poly.boundary_contains(&base));
        assert_eq!(exit_map.len(), 2);
        for (dir, line) in &exit_map {
            assert_eq!(line.width(), 10.0);
            assert_eq!(Direction::normal_to(line), Some(*dir));
        }
        assert!(Polygon::new(poly.points().to_vec()).is_ok());
    }

    #[test]
    fn test_dead_end_cap() {
        let base = entry(Direction::South, 10.0);
        let (poly, exit_map) =
            construct_intersection(&base, Direction::South, &[], 10.0, Bias::Left).unwrap();
        assert!(exit_map.is_empty());
        assert_eq!(poly.points().len(), 8);
        assert!(poly.boundary_contains(&base));
    }

    #[test]
    fn test_infeasible_requests() {
        let base = entry(Direction::North, 10.0);
        assert_eq!(
            construct_intersection(&base, Direction::North, &[Direction::South], 10.0, Bias::Left),
            Err(Infeasible::ExitThroughEntry(Direction::South))
        );
        assert_eq!(
            construct_intersection(
                &base,
                Direction::North,
                &[Direction::East, Direction::East],
                10.0,
                Bias::Left
            ),
            Err(Infeasible::DuplicateExit(Direction::East))
        );
        assert_eq!(
            construct_intersection(&base, Direction::North, &[Direction::East], 30.0, Bias::Left),
            Err(Infeasible::ExitTooWide {
                width: 30.0,
                entry: 10.0
            })
        );
        assert_eq!(
            construct_intersection(&base, Direction::North, &[Direction::East], 15.0, Bias::Left),
            Err(Infeasible::BadWidth(15.0))
        );
        // A wall parallel to travel can never be an entry.
        let skewed = Line::new(point(0.0, 0.0), point(0.0, 10.0));
        assert!(matches!(
            construct_intersection(&skewed, Direction::North, &[], 10.0, Bias::Left),
            Err(Infeasible::SkewedBase(_, _))
        ));
    }

    #[test]
    fn test_exit_lines_on_grid() {
        // A grid-aligned entry yields grid-aligned cardinal exits.
        let base = Line::new(point(0.0, 0.0), point(10.0, 0.0));
        let (_, exit_map) =
            construct_intersection(&base, Direction::North, &[Direction::North], 10.0, Bias::Left)
                .unwrap();
        let (dir, line) = exit_map[0];
        assert!(crate::geometry::grid_aligned(&line, dir));
    }
}
