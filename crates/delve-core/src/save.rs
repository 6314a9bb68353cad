//! Encode and decode the map graph.
//!
//! A self-describing JSON document carrying every region (kind, polygon,
//! owned connection ids) and connection (kind, line, facing, region ids),
//! wrapped in a format/version envelope. Decoding validates structure —
//! polygon validity, id ranges, region↔connection cross-references — and
//! refuses inconsistent documents; the decoded map is stale until its
//! first `flush()`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::SaveError;
use crate::map::{Connection, DungeonMap, Region};

/// Document type marker.
pub const MAP_FORMAT: &str = "delve-map";

/// Current document version.
pub const MAP_VERSION: u32 = 1;

#[derive(Serialize)]
struct MapDocumentRef<'a> {
    format: &'static str,
    version: u32,
    regions: &'a [Region],
    connections: &'a [Connection],
}

#[derive(Deserialize)]
struct MapDocument {
    format: String,
    version: u32,
    regions: Vec<Region>,
    connections: Vec<Connection>,
}

/// Serialize a map to the textual document format.
pub fn encode_map(map: &DungeonMap) -> Result<String, SaveError> {
    let doc = MapDocumentRef {
        format: MAP_FORMAT,
        version: MAP_VERSION,
        regions: map.regions(),
        connections: map.connections(),
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Reconstruct a map from its document. The result is observably
/// identical to the encoded graph and must be `flush()`ed before queries.
pub fn decode_map(text: &str) -> Result<DungeonMap, SaveError> {
    let doc: MapDocument = serde_json::from_str(text)?;
    if doc.format != MAP_FORMAT {
        return Err(SaveError::BadFormat(doc.format));
    }
    if doc.version != MAP_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: MAP_VERSION,
            found: doc.version,
        });
    }
    Ok(DungeonMap::from_parts(doc.regions, doc.connections)?)
}

/// Write a map document to disk.
pub fn save_to_path(map: &DungeonMap, path: &Path) -> Result<(), SaveError> {
    fs::write(path, encode_map(map)?)?;
    Ok(())
}

/// Load a map document from disk.
pub fn load_from_path(path: &Path) -> Result<DungeonMap, SaveError> {
    decode_map(&fs::read_to_string(path)?)
}
