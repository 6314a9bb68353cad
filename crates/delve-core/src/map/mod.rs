//! The dungeon map graph.
//!
//! A collection of regions and the connections straddling their borders,
//! plus a derived grid index answering the generator's placement
//! questions: does this polygon collide with anything, what is at this
//! point, and where along a region's walls could a new doorway sit. All
//! query results come back in id order so generation stays reproducible.

use serde::{Deserialize, Serialize};

use crate::errors::MapError;
use crate::geometry::{self, Bounds, Line, Point, Polygon, SegX, point, seg_intersect};
use crate::{Direction, GRID, HIT_BAND};

mod connection;
mod index;
mod region;

pub use connection::{Connection, ConnectionKind};
pub use region::{Region, RegionKind};

use index::GridIndex;

/// Index of a region in its map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u32);

/// Index of a connection in its map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u32);

/// What a point query resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapObject {
    Region(RegionId),
    Connection(ConnectionId),
}

/// A feasible placement for a new doorway on a region's boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionSite {
    pub line: Line,
    pub direction: Direction,
}

/// The master map structure. Mutations mark the spatial index stale;
/// queries demand a `flush()` first and fail loudly otherwise. A fresh
/// map is a fresh value — callers wanting to start over construct a new
/// one and swap, rather than re-initializing in place.
#[derive(Debug, Clone, Default)]
pub struct DungeonMap {
    regions: Vec<Region>,
    connections: Vec<Connection>,
    index: GridIndex,
    dirty: bool,
}

impl DungeonMap {
    pub fn new() -> DungeonMap {
        DungeonMap::default()
    }

    /// Rebuild a map from decoded parts, validating the cross-references.
    pub fn from_parts(
        regions: Vec<Region>,
        connections: Vec<Connection>,
    ) -> Result<DungeonMap, MapError> {
        for (i, conn) in connections.iter().enumerate() {
            let cid = ConnectionId(i as u32);
            if conn.region_ids().next().is_none() {
                return Err(MapError::OrphanConnection(cid));
            }
            for rid in conn.region_ids() {
                let region = regions
                    .get(rid.0 as usize)
                    .ok_or(MapError::UnknownRegion(rid))?;
                if !region.connections.contains(&cid) {
                    return Err(MapError::BrokenLink { conn: cid, region: rid });
                }
            }
        }
        for (i, region) in regions.iter().enumerate() {
            let rid = RegionId(i as u32);
            for &cid in &region.connections {
                let conn = connections
                    .get(cid.0 as usize)
                    .ok_or(MapError::UnknownConnection(cid))?;
                if !conn.region_ids().any(|r| r == rid) {
                    return Err(MapError::BrokenLink { conn: cid, region: rid });
                }
            }
        }
        Ok(DungeonMap {
            regions,
            connections,
            index: GridIndex::default(),
            dirty: true,
        })
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn region(&self, id: RegionId) -> Result<&Region, MapError> {
        self.regions
            .get(id.0 as usize)
            .ok_or(MapError::UnknownRegion(id))
    }

    pub fn connection(&self, id: ConnectionId) -> Result<&Connection, MapError> {
        self.connections
            .get(id.0 as usize)
            .ok_or(MapError::UnknownConnection(id))
    }

    /// Register a region. The index is stale until the next `flush()`.
    pub fn add_region(&mut self, region: Region) -> RegionId {
        let id = RegionId(self.regions.len() as u32);
        log::info!(
            "adding {:?} region {} ({} sq ft)",
            region.kind,
            id.0,
            region.area()
        );
        self.regions.push(region);
        self.dirty = true;
        id
    }

    /// Register a connection and wire it to its owning region(s). The
    /// index is stale until the next `flush()`.
    pub fn add_connection(&mut self, connection: Connection) -> Result<ConnectionId, MapError> {
        for rid in connection.region_ids() {
            if rid.0 as usize >= self.regions.len() {
                return Err(MapError::UnknownRegion(rid));
            }
        }
        let id = ConnectionId(self.connections.len() as u32);
        log::info!(
            "adding {:?} connection {} facing {:?}",
            connection.kind,
            id.0,
            connection.direction
        );
        for rid in connection.region_ids() {
            let owned = &mut self.regions[rid.0 as usize].connections;
            if !owned.contains(&id) {
                owned.push(id);
            }
        }
        self.connections.push(connection);
        self.dirty = true;
        Ok(id)
    }

    /// Reclassify a connection. Occupancy is unchanged, so the index
    /// stays valid.
    pub fn set_connection_kind(
        &mut self,
        id: ConnectionId,
        kind: ConnectionKind,
    ) -> Result<(), MapError> {
        let conn = self
            .connections
            .get_mut(id.0 as usize)
            .ok_or(MapError::UnknownConnection(id))?;
        conn.kind = kind;
        Ok(())
    }

    /// Record the second owning region of a connection.
    pub fn attach_region(&mut self, id: ConnectionId, region: RegionId) -> Result<(), MapError> {
        if region.0 as usize >= self.regions.len() {
            return Err(MapError::UnknownRegion(region));
        }
        let conn = self
            .connections
            .get_mut(id.0 as usize)
            .ok_or(MapError::UnknownConnection(id))?;
        if !conn.attach(region) {
            return Err(MapError::ConnectionFull(id));
        }
        let owned = &mut self.regions[region.0 as usize].connections;
        if !owned.contains(&id) {
            owned.push(id);
        }
        Ok(())
    }

    /// Rebuild the spatial index from the current region/connection set.
    /// Idempotent; safe to call when nothing changed.
    pub fn flush(&mut self) {
        if self.dirty {
            self.index.rebuild(&self.regions, &self.connections);
            self.dirty = false;
        }
    }

    fn ensure_fresh(&self) -> Result<(), MapError> {
        if self.dirty {
            Err(MapError::StaleIndex)
        } else {
            Ok(())
        }
    }

    /// Unresolved stubs available for further growth.
    pub fn frontier_connections(&self) -> Vec<ConnectionId> {
        self.connections
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_frontier())
            .map(|(i, _)| ConnectionId(i as u32))
            .collect()
    }

    /// The most specific object containing a point: connections match
    /// first (within a thin band around their line), then regions
    /// (boundary inclusive).
    pub fn object_at(&self, p: Point) -> Result<Option<MapObject>, MapError> {
        self.ensure_fresh()?;
        let (region_ids, conn_ids) = self.index.at(p);
        for &cid in conn_ids {
            if self.connections[cid.0 as usize].line.distance_to(p) <= HIT_BAND {
                return Ok(Some(MapObject::Connection(cid)));
            }
        }
        for &rid in region_ids {
            if self.regions[rid.0 as usize].polygon.covers(p) {
                return Ok(Some(MapObject::Region(rid)));
            }
        }
        Ok(None)
    }

    /// Whether a candidate polygon overlaps any placed region in area.
    /// Boundary touching is fine; that is how connections work.
    pub fn overlaps_any(&self, polygon: &Polygon, exclude: &[RegionId]) -> Result<bool, MapError> {
        self.ensure_fresh()?;
        Ok(self.overlaps_internal(polygon, exclude))
    }

    fn overlaps_internal(&self, polygon: &Polygon, exclude: &[RegionId]) -> bool {
        self.index
            .regions_near(&polygon.bounds())
            .into_iter()
            .filter(|id| !exclude.contains(id))
            .any(|id| geometry::overlaps(polygon, &self.regions[id.0 as usize].polygon))
    }

    /// Search a region's walls for places a doorway of the given width
    /// could sit facing `direction` (or, with `allow_rotation`, any
    /// compatible rotation, nearest angles first). Candidates slide along
    /// each suitable wall a grid unit at a time; a site survives when it
    /// avoids the region's existing connections and its one-grid-forward
    /// stub opens into unmapped space. Deterministically ordered.
    pub fn find_options_for_connection(
        &self,
        width: f64,
        region: RegionId,
        direction: Direction,
        allow_rotation: bool,
    ) -> Result<Vec<ConnectionSite>, MapError> {
        self.ensure_fresh()?;
        let reg = self.region(region)?;

        let dirs: Vec<Direction> = if allow_rotation {
            let mut ds: Vec<Direction> = (0..8).map(Direction::from_index).collect();
            ds.sort_by_key(|d| {
                let ccw = (d.index() - direction.index()).rem_euclid(8);
                (d.angle_from(direction), if ccw <= 4 { 0 } else { 1 })
            });
            ds
        } else {
            vec![direction]
        };

        let mut sites = Vec::new();
        for d in dirs {
            for edge in reg.polygon.edges() {
                if Direction::normal_to(&edge) != Some(d) {
                    continue;
                }
                let len = edge.width();
                if len < width {
                    continue;
                }
                let ux = (edge.b.x - edge.a.x) / len;
                let uy = (edge.b.y - edge.a.y) / len;
                let steps = ((len - width) / GRID).floor() as i64;
                for k in 0..=steps {
                    let t = k as f64 * GRID;
                    let site = Line::new(
                        point(edge.a.x + ux * t, edge.a.y + uy * t),
                        point(edge.a.x + ux * (t + width), edge.a.y + uy * (t + width)),
                    );
                    if self.site_conflicts(reg, &site) {
                        continue;
                    }
                    let Ok((_, stub)) = geometry::sweep(&site, d, GRID) else {
                        continue;
                    };
                    if self.overlaps_internal(&stub, &[]) {
                        continue;
                    }
                    sites.push(ConnectionSite { line: site, direction: d });
                }
            }
        }
        log::debug!(
            "{} doorway sites of width {} on region {:?} toward {:?}",
            sites.len(),
            width,
            region,
            direction
        );
        Ok(sites)
    }

    /// A new doorway may touch an existing connection at a corner but not
    /// share any stretch of wall with one.
    fn site_conflicts(&self, region: &Region, site: &Line) -> bool {
        region.connections.iter().any(|cid| {
            let conn = &self.connections[cid.0 as usize];
            matches!(seg_intersect(site, &conn.line), SegX::Overlap(_))
        })
    }

    /// Extent of the mapped area.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut it = self.regions.iter().map(|r| r.polygon.bounds());
        let first = it.next()?;
        Some(it.fold(first, |acc, b| Bounds {
            min_x: acc.min_x.min(b.min_x),
            min_y: acc.min_y.min(b.min_y),
            max_x: acc.max_x.max(b.max_x),
            max_y: acc.max_y.max(b.max_y),
        }))
    }

    /// One-line description for logs and the driver.
    pub fn summary(&self) -> String {
        let unresolved = self.connections.iter().filter(|c| c.is_frontier()).count();
        let area: f64 = self.regions.iter().map(|r| r.area()).sum();
        format!(
            "{} regions, {} connections ({} unresolved), {} square feet",
            self.regions.len(),
            self.connections.len(),
            unresolved,
            area
        )
    }
}
