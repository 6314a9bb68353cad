//! Error taxonomy for the generation core.
//!
//! Two tiers: `Infeasible` is the recoverable kind — a candidate placement
//! the geometry cannot realize, which the generator answers by trying the
//! next option. Everything else is fatal and propagates to the caller with
//! enough context (seed, step index, offending geometry) to reproduce.

use thiserror::Error;

use crate::Direction;
use crate::geometry::Line;
use crate::map::{ConnectionId, RegionId};

/// A placement the geometry library cannot realize. Never fatal: callers
/// treat this as a rejected candidate and move on to the next one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Infeasible {
    #[error("duplicate exit direction {0:?}")]
    DuplicateExit(Direction),

    #[error("exit {0:?} faces back through the entry wall")]
    ExitThroughEntry(Direction),

    #[error("exit width {width} exceeds the available span (entry width {entry})")]
    ExitTooWide { width: f64, entry: f64 },

    #[error("width {0} is not a positive grid multiple")]
    BadWidth(f64),

    #[error("sweep distance {0} is not positive")]
    BadDistance(f64),

    #[error("cannot sweep {0} along {1:?}")]
    DegenerateSweep(Line, Direction),

    #[error("base line {0} is not perpendicular to {1:?}")]
    SkewedBase(Line, Direction),

    #[error("polygons share no boundary to merge along")]
    DisjointUnion,

    #[error("union is not a single simple polygon")]
    UnsupportedUnion,
}

/// A structurally invalid polygon. Reaching map validation with one of
/// these is an internal invariant violation, not a placement rejection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolygonError {
    #[error("polygon needs at least 3 distinct points, got {0}")]
    TooFewPoints(usize),

    #[error("polygon has zero area")]
    ZeroArea,

    #[error("polygon edges self-intersect")]
    SelfIntersecting,
}

/// Map graph failures. All fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("spatial index is stale; call flush() before querying")]
    StaleIndex,

    #[error("unknown region id {0:?}")]
    UnknownRegion(RegionId),

    #[error("unknown connection id {0:?}")]
    UnknownConnection(ConnectionId),

    #[error("connection {0:?} already joins two regions")]
    ConnectionFull(ConnectionId),

    #[error("connection {0:?} references no region at all")]
    OrphanConnection(ConnectionId),

    #[error("connection {conn:?} and region {region:?} do not reference each other")]
    BrokenLink { conn: ConnectionId, region: RegionId },

    #[error(transparent)]
    Polygon(#[from] PolygonError),
}

/// Fatal generator failures, tagged with the seed and step index so a run
/// can be replayed from a bug report.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("map failure at step {step} (seed {seed}): {source}")]
    Map {
        seed: u64,
        step: u64,
        source: MapError,
    },

    #[error("geometry invariant violated at step {step} (seed {seed}): {source}")]
    Geometry {
        seed: u64,
        step: u64,
        source: PolygonError,
    },
}

/// Persistence failures.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not a delve map document (format {0:?})")]
    BadFormat(String),

    #[error("unsupported map document version {found} (expected {expected})")]
    VersionMismatch { expected: u32, found: u32 },

    #[error("inconsistent map document: {0}")]
    Inconsistent(#[from] MapError),
}
