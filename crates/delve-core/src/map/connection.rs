//! Connections: the doorways and open boundaries joining regions.

use serde::{Deserialize, Serialize};

use super::RegionId;
use crate::Direction;
use crate::geometry::Line;

/// How a connection presents in the dungeon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// A provisional stub not yet resolved into wall geometry; the
    /// generator's frontier.
    Oneway,
    /// An open, grid-aligned doorway.
    Arch,
    /// A doorway off the grid or otherwise disguised.
    Secret,
    /// A fully open boundary, e.g. where one passage segment meets the
    /// next.
    Open,
}

/// The only kind of graph edge: a line segment straddling the border
/// between regions, facing the direction growth proceeds through it.
/// Created with a single owner (a frontier stub) and resolved to two when
/// it joins regions; reclassified as generation proceeds, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub kind: ConnectionKind,
    pub line: Line,
    pub direction: Direction,
    pub regions: [Option<RegionId>; 2],
}

impl Connection {
    pub fn new(kind: ConnectionKind, line: Line, direction: Direction, owner: RegionId) -> Connection {
        Connection {
            kind,
            line,
            direction,
            regions: [Some(owner), None],
        }
    }

    /// True while only one side of the connection is mapped.
    pub fn is_frontier(&self) -> bool {
        self.kind == ConnectionKind::Oneway
    }

    pub fn is_resolved(&self) -> bool {
        self.regions.iter().flatten().count() == 2
    }

    pub fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.regions.iter().flatten().copied()
    }

    /// Record the second owning region. Returns false when the connection
    /// already joins two regions.
    pub(crate) fn attach(&mut self, region: RegionId) -> bool {
        if self.regions.contains(&Some(region)) {
            return true;
        }
        for slot in &mut self.regions {
            if slot.is_none() {
                *slot = Some(region);
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Line, point};

    #[test]
    fn test_attach_two_regions() {
        let line = Line::new(point(0.0, 0.0), point(10.0, 0.0));
        let mut conn = Connection::new(ConnectionKind::Oneway, line, Direction::North, RegionId(0));
        assert!(conn.is_frontier());
        assert!(!conn.is_resolved());

        assert!(conn.attach(RegionId(1)));
        assert!(conn.is_resolved());
        // Re-attaching an existing owner is a no-op, a third region is not.
        assert!(conn.attach(RegionId(1)));
        assert!(!conn.attach(RegionId(2)));
        assert_eq!(conn.region_ids().collect::<Vec<_>>(), vec![RegionId(0), RegionId(1)]);
    }

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&ConnectionKind::Oneway).unwrap(),
            "\"oneway\""
        );
        assert_eq!(
            serde_json::to_string(&ConnectionKind::Secret).unwrap(),
            "\"secret\""
        );
    }
}
