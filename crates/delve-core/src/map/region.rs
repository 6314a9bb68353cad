//! Regions: the placed rooms and passages of the map.

use serde::{Deserialize, Serialize};

use super::ConnectionId;
use crate::geometry::Polygon;

/// What a region is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    /// A room.
    Chamber,
    /// A corridor segment or junction.
    Passage,
}

/// A single contiguous piece of mapped floor. Owns its polygon and the
/// ordered list of connections along its boundary. Regions are never
/// mutated geometrically in place: merging with a doorway stub produces a
/// new polygon committed as a fresh value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub kind: RegionKind,
    pub polygon: Polygon,
    #[serde(default)]
    pub connections: Vec<ConnectionId>,
}

impl Region {
    pub fn new(kind: RegionKind, polygon: Polygon) -> Region {
        Region {
            kind,
            polygon,
            connections: Vec::new(),
        }
    }

    pub fn area(&self) -> f64 {
        self.polygon.area()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point;

    #[test]
    fn test_region_area() {
        let poly = Polygon::new(vec![
            point(0.0, 0.0),
            point(30.0, 0.0),
            point(30.0, 20.0),
            point(0.0, 20.0),
        ])
        .unwrap();
        let region = Region::new(RegionKind::Chamber, poly);
        assert_eq!(region.area(), 600.0);
        assert!(region.connections.is_empty());
    }

    #[test]
    fn test_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&RegionKind::Passage).unwrap(),
            "\"passage\""
        );
    }
}
