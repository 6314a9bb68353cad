//! Grid spatial index over placed geometry.
//!
//! A cache mapping 10-foot cells to the ids whose bounding boxes touch
//! them, rebuilt wholesale by `flush`. Never a source of truth: queries
//! narrow candidates here, then test exact geometry.

use std::collections::HashMap;

use super::{Connection, ConnectionId, Region, RegionId};
use crate::geometry::{Bounds, Point};
use crate::{GRID, HIT_BAND};

#[derive(Debug, Clone, Default)]
struct Cell {
    regions: Vec<RegionId>,
    connections: Vec<ConnectionId>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct GridIndex {
    cells: HashMap<(i64, i64), Cell>,
}

fn cell_range(b: &Bounds) -> (i64, i64, i64, i64) {
    (
        (b.min_x / GRID).floor() as i64,
        (b.min_y / GRID).floor() as i64,
        (b.max_x / GRID).floor() as i64,
        (b.max_y / GRID).floor() as i64,
    )
}

impl GridIndex {
    pub fn rebuild(&mut self, regions: &[Region], connections: &[Connection]) {
        self.cells.clear();
        for (i, region) in regions.iter().enumerate() {
            let (x0, y0, x1, y1) = cell_range(&region.polygon.bounds());
            for cx in x0..=x1 {
                for cy in y0..=y1 {
                    self.cells
                        .entry((cx, cy))
                        .or_default()
                        .regions
                        .push(RegionId(i as u32));
                }
            }
        }
        // Connections get their hit-test band so a near-miss click still
        // lands in the right cell.
        for (i, conn) in connections.iter().enumerate() {
            let (x0, y0, x1, y1) = cell_range(&conn.line.bounds().expanded(HIT_BAND));
            for cx in x0..=x1 {
                for cy in y0..=y1 {
                    self.cells
                        .entry((cx, cy))
                        .or_default()
                        .connections
                        .push(ConnectionId(i as u32));
                }
            }
        }
        for cell in self.cells.values_mut() {
            cell.regions.sort_unstable_by_key(|id| id.0);
            cell.connections.sort_unstable_by_key(|id| id.0);
        }
    }

    /// Candidate occupants of the cell containing a point, id-ordered.
    pub fn at(&self, p: Point) -> (&[RegionId], &[ConnectionId]) {
        let key = ((p.x / GRID).floor() as i64, (p.y / GRID).floor() as i64);
        match self.cells.get(&key) {
            Some(cell) => (&cell.regions, &cell.connections),
            None => (&[], &[]),
        }
    }

    /// Candidate regions whose cells intersect the given bounds,
    /// id-ordered and deduplicated.
    pub fn regions_near(&self, b: &Bounds) -> Vec<RegionId> {
        let (x0, y0, x1, y1) = cell_range(b);
        let mut out = Vec::new();
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                if let Some(cell) = self.cells.get(&(cx, cy)) {
                    out.extend_from_slice(&cell.regions);
                }
            }
        }
        out.sort_unstable_by_key(|id| id.0);
        out.dedup();
        out
    }
}
